//! CLI command definitions using clap

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use orderprobe::{BrowserKind, Environment, SuiteConfig};

use crate::config::{CliConfig, ColorChoice, Verbosity};
use crate::error::CliResult;

/// Default location of the feature files, relative to the repository root
pub const DEFAULT_FEATURES_DIR: &str = "crates/orderprobe/features";

/// Orderprobe: end-to-end checks for the food ordering front end
#[derive(Parser, Debug)]
#[command(name = "orderprobe")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output (auto, always, never)
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorArg,

    /// YAML config file (overrides ORDERPROBE_CONFIG)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Deployment environment (dev, staging, prod)
    #[arg(long, global = true, value_name = "ENV")]
    pub env: Option<String>,

    /// Browser (chromium, chrome, firefox, webkit, safari)
    #[arg(long, global = true)]
    pub browser: Option<String>,

    /// Device profile (see `orderprobe devices`)
    #[arg(long, global = true)]
    pub device: Option<String>,

    /// Run without a visible browser window
    #[arg(long, global = true)]
    pub headless: bool,

    /// Show the browser window, overriding HEADLESS
    #[arg(long, global = true, conflicts_with = "headless")]
    pub headed: bool,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the order page feature files against a browser
    Run(RunArgs),

    /// Show the resolved configuration
    Config(ConfigArgs),

    /// List built-in device profiles
    Devices,
}

/// Arguments for the run command
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Feature file or directory
    #[arg(long, default_value = DEFAULT_FEATURES_DIR, value_name = "DIR")]
    pub features: PathBuf,

    /// Only run scenarios carrying this tag (e.g. @successful_order_page_load)
    #[arg(long, value_name = "TAG")]
    pub tags: Option<String>,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Output format
    #[arg(long, value_enum, default_value = "yaml")]
    pub format: ConfigFormat,
}

/// Output format for `orderprobe config`
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConfigFormat {
    /// JSON object
    Json,
    /// YAML document
    #[default]
    Yaml,
}

/// Color argument for CLI
#[derive(ValueEnum, Clone, Debug, Default)]
pub enum ColorArg {
    /// Automatic color detection
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

impl From<ColorArg> for ColorChoice {
    fn from(arg: ColorArg) -> Self {
        match arg {
            ColorArg::Auto => Self::Auto,
            ColorArg::Always => Self::Always,
            ColorArg::Never => Self::Never,
        }
    }
}

impl Cli {
    /// Presentation settings from the global flags
    #[must_use]
    pub fn cli_config(&self) -> CliConfig {
        CliConfig::new()
            .with_verbosity(Verbosity::from_flags(self.quiet, self.verbose))
            .with_color(self.color.clone().into())
    }

    /// Suite configuration from the process environment plus flag overrides
    pub fn suite_config(&self) -> CliResult<SuiteConfig> {
        self.suite_config_with(|key| std::env::var(key).ok())
    }

    /// Layer defaults, config file and `lookup`, then the command-line flags
    pub fn suite_config_with<F>(&self, lookup: F) -> CliResult<SuiteConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = SuiteConfig::from_lookup(lookup, self.config.as_deref())?;

        if let Some(env) = &self.env {
            config = config.with_environment(Environment::parse_lenient(env));
        }
        if let Some(browser) = &self.browser {
            config = config.with_browser(browser.parse::<BrowserKind>()?);
        }
        if let Some(device) = &self.device {
            config = config.with_device(device.trim());
        }
        if self.headless {
            config = config.with_headless(true);
        } else if self.headed {
            config = config.with_headless(false);
        }
        if let Some(level) = self.cli_config().verbosity.log_level_override() {
            config.log_level = level.to_string();
        }

        config.validate()?;
        Ok(config)
    }
}
