//! Orderprobe CLI: runs the order page scenarios against a real browser
//!
//! ## Usage
//!
//! ```bash
//! orderprobe run --headless                              # All scenarios
//! orderprobe run --tags @successful_order_page_load      # One tag
//! orderprobe run --device iphone17 --env prod            # Mobile, production
//! orderprobe config --format json                        # Resolved settings
//! orderprobe devices                                     # Device profiles
//! ```

use clap::Parser;
use orderprobe::{init_logging, DeviceProfile, PageProvider, SuiteConfig};
use orderprobe_cli::output::{render_config, render_devices, render_run_summary};
use orderprobe_cli::{Cli, CliConfig, CliError, CliResult, Commands, ConfigArgs, RunArgs};
use std::process::ExitCode;
use std::sync::Arc;

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let cli_config = cli.cli_config();
    cli_config.color.apply();

    let config = cli.suite_config()?;
    init_logging(&config);
    tracing::debug!(?config, "resolved configuration");

    match cli.command {
        Commands::Run(args) => run_scenarios(config, cli_config, &args),
        Commands::Config(args) => run_config(&config, &args),
        Commands::Devices => {
            print!("{}", render_devices(&DeviceProfile::all()));
            Ok(())
        }
    }
}

fn run_scenarios(config: SuiteConfig, cli_config: CliConfig, args: &RunArgs) -> CliResult<()> {
    if !args.features.exists() {
        return Err(CliError::config(format!(
            "feature path not found: {}",
            args.features.display()
        )));
    }
    let provider = page_provider()?;

    if cli_config.verbosity.is_verbose() {
        println!(
            "Running {} on {} ({}, {})",
            args.features.display(),
            config.order_page_url(),
            config.browser,
            config.device
        );
    }

    tracing::info!(features = %args.features.display(), tags = ?args.tags, "starting run");
    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| CliError::test_execution(format!("failed to start async runtime: {e}")))?;
    let summary = rt.block_on(orderprobe::run_features(
        &args.features,
        Arc::new(config),
        provider,
        args.tags.clone(),
    ))?;

    if !cli_config.verbosity.is_quiet() {
        println!("{}", render_run_summary(&summary));
    }
    if summary.is_success() {
        Ok(())
    } else {
        Err(CliError::test_execution(format!(
            "{} of {} scenarios failed, {} skipped over unbound steps",
            summary.failed,
            summary.total(),
            summary.skipped
        )))
    }
}

#[cfg(feature = "browser")]
fn page_provider() -> CliResult<Arc<dyn PageProvider>> {
    Ok(Arc::new(orderprobe::BrowserPageProvider))
}

#[cfg(not(feature = "browser"))]
fn page_provider() -> CliResult<Arc<dyn PageProvider>> {
    Err(CliError::invalid_argument(
        "browser support not enabled. Rebuild with --features browser",
    ))
}

fn run_config(config: &SuiteConfig, args: &ConfigArgs) -> CliResult<()> {
    let rendered = render_config(&config.summary(), args.format)?;
    println!("{}", rendered.trim_end());
    Ok(())
}
