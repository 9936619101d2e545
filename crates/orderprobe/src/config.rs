//! Suite configuration
//!
//! [`SuiteConfig`] is built once per run by layering defaults, an optional
//! YAML file, and environment variables, then shared read-only as
//! `Arc<SuiteConfig>`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use crate::device::DeviceProfile;
use crate::result::{ProbeError, ProbeResult};
use crate::wait::WaitOptions;

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Path to an optional YAML config file
pub const ENV_CONFIG_FILE: &str = "ORDERPROBE_CONFIG";
/// Browser kind
pub const ENV_BROWSER: &str = "BROWSER";
/// Headless flag
pub const ENV_HEADLESS: &str = "HEADLESS";
/// Default timeout in whole seconds
pub const ENV_DEFAULT_TIMEOUT: &str = "DEFAULT_TIMEOUT";
/// Poll interval in seconds
pub const ENV_POLL_FREQUENCY: &str = "POLL_FREQUENCY";
/// Retry count
pub const ENV_RETRY_TIMES: &str = "RETRY_TIMES";
/// Retry delay in whole seconds
pub const ENV_RETRY_DELAY: &str = "RETRY_DELAY";
/// Deployment environment
pub const ENV_ENV: &str = "ENV";
/// Device profile name
pub const ENV_DEVICE: &str = "DEVICE";
/// Log level
pub const ENV_LOG_LEVEL: &str = "LOG_LEVEL";
/// Screenshot directory
pub const ENV_SCREENSHOT_PATH: &str = "SCREENSHOT_PATH";
/// Order page URL override
pub const ENV_ORDER_PAGE_URL: &str = "ORDER_PAGE_URL";

// =============================================================================
// BROWSER KIND
// =============================================================================

/// Browser requested for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowserKind {
    /// Chromium
    #[default]
    Chromium,
    /// Google Chrome, driven as chromium
    Chrome,
    /// Firefox
    Firefox,
    /// WebKit
    Webkit,
    /// Safari, driven as webkit
    Safari,
}

impl BrowserKind {
    /// Engine actually launched for this kind
    #[must_use]
    pub const fn engine(self) -> Self {
        match self {
            Self::Chrome => Self::Chromium,
            Self::Safari => Self::Webkit,
            other => other,
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chromium => "chromium",
            Self::Chrome => "chrome",
            Self::Firefox => "firefox",
            Self::Webkit => "webkit",
            Self::Safari => "safari",
        }
    }
}

impl fmt::Display for BrowserKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for BrowserKind {
    type Err = ProbeError;

    fn from_str(s: &str) -> ProbeResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" => Ok(Self::Chromium),
            "chrome" => Ok(Self::Chrome),
            "firefox" => Ok(Self::Firefox),
            "webkit" => Ok(Self::Webkit),
            "safari" => Ok(Self::Safari),
            _ => Err(ProbeError::UnsupportedBrowser {
                browser: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// ENVIRONMENT
// =============================================================================

/// Deployment environment under test
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development
    Dev,
    /// Staging
    #[default]
    Staging,
    /// Production
    Prod,
}

impl Environment {
    /// Parse a name, falling back to staging for anything unknown
    #[must_use]
    pub fn parse_lenient(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "dev" => Self::Dev,
            "prod" => Self::Prod,
            _ => Self::Staging,
        }
    }

    /// Host serving this environment
    #[must_use]
    pub const fn domain(self) -> &'static str {
        match self {
            Self::Dev | Self::Staging | Self::Prod => "www.transglobalus.com",
        }
    }

    /// Lowercase name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Staging => "staging",
            Self::Prod => "prod",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// CONFIG FILE
// =============================================================================

/// YAML overlay; every key is optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Browser kind
    pub browser: Option<String>,
    /// Headless flag
    pub headless: Option<bool>,
    /// Default timeout in seconds
    pub default_timeout: Option<u64>,
    /// Poll interval in seconds
    pub poll_frequency: Option<f64>,
    /// Retry count
    pub retry_times: Option<u32>,
    /// Retry delay in seconds
    pub retry_delay: Option<u64>,
    /// Deployment environment
    pub env: Option<String>,
    /// Device profile name
    pub device: Option<String>,
    /// Log level
    pub log_level: Option<String>,
    /// Screenshot directory
    pub screenshot_path: Option<PathBuf>,
    /// Order page URL
    pub order_page_url: Option<String>,
}

impl ConfigFile {
    /// Read and parse a YAML file
    ///
    /// # Errors
    ///
    /// Returns `Io` or `Yaml` when the file cannot be read or parsed.
    pub fn load(path: &Path) -> ProbeResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_yaml_ng::from_str(&text)?)
    }
}

// =============================================================================
// SUITE CONFIG
// =============================================================================

/// Read-only configuration for one run
#[derive(Debug, Clone, PartialEq)]
pub struct SuiteConfig {
    /// Browser kind
    pub browser: BrowserKind,
    /// Run without a visible window
    pub headless: bool,
    /// Timeout applied when an operation is given none
    pub default_timeout: Duration,
    /// Interval between polls in bounded waits
    pub poll_frequency: Duration,
    /// Retry count, carried for callers that retry whole flows
    pub retry_times: u32,
    /// Delay between whole-flow retries
    pub retry_delay: Duration,
    /// Deployment environment
    pub environment: Environment,
    /// Device profile name
    pub device: String,
    /// Log level name
    pub log_level: String,
    /// Directory for screenshots
    pub screenshot_dir: PathBuf,
    /// Explicit order page URL
    pub order_page_url: Option<String>,
}

impl Default for SuiteConfig {
    fn default() -> Self {
        Self {
            browser: BrowserKind::Chromium,
            headless: false,
            default_timeout: Duration::from_secs(20),
            poll_frequency: Duration::from_millis(500),
            retry_times: 3,
            retry_delay: Duration::from_secs(2),
            environment: Environment::Staging,
            device: String::from("desktop"),
            log_level: String::from("INFO"),
            screenshot_dir: PathBuf::from("screenshots"),
            order_page_url: None,
        }
    }
}

impl SuiteConfig {
    /// Create config with defaults
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from the process environment, honoring `ORDERPROBE_CONFIG`
    ///
    /// # Errors
    ///
    /// Returns `Config`, `Io` or `Yaml` for unreadable or invalid settings.
    pub fn from_env() -> ProbeResult<Self> {
        Self::load(None)
    }

    /// Load with an explicit config file, falling back to `ORDERPROBE_CONFIG`
    ///
    /// # Errors
    ///
    /// Returns `Config`, `Io` or `Yaml` for unreadable or invalid settings.
    pub fn load(config_file: Option<&Path>) -> ProbeResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), config_file)
    }

    /// Layer defaults, the config file, then variables from `lookup`
    ///
    /// # Errors
    ///
    /// Returns `Config`, `Io` or `Yaml` for unreadable or invalid settings.
    pub fn from_lookup<F>(lookup: F, config_file: Option<&Path>) -> ProbeResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let file_path = config_file
            .map(Path::to_path_buf)
            .or_else(|| lookup(ENV_CONFIG_FILE).map(PathBuf::from));
        if let Some(path) = file_path {
            let file = ConfigFile::load(&path)?;
            config.apply_file(&file)?;
            tracing::debug!(path = %path.display(), "applied config file");
        }

        config.apply_env(&lookup)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply every key present in a config file
    ///
    /// # Errors
    ///
    /// Returns `Config` or `UnsupportedBrowser` for invalid values.
    pub fn apply_file(&mut self, file: &ConfigFile) -> ProbeResult<()> {
        if let Some(browser) = &file.browser {
            self.browser = browser.parse()?;
        }
        if let Some(headless) = file.headless {
            self.headless = headless;
        }
        if let Some(secs) = file.default_timeout {
            self.default_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = file.poll_frequency {
            self.poll_frequency = seconds(secs, "poll_frequency")?;
        }
        if let Some(n) = file.retry_times {
            self.retry_times = n;
        }
        if let Some(secs) = file.retry_delay {
            self.retry_delay = Duration::from_secs(secs);
        }
        if let Some(env) = &file.env {
            self.environment = Environment::parse_lenient(env);
        }
        if let Some(device) = &file.device {
            self.device.clone_from(device);
        }
        if let Some(level) = &file.log_level {
            self.log_level.clone_from(level);
        }
        if let Some(dir) = &file.screenshot_path {
            self.screenshot_dir.clone_from(dir);
        }
        if let Some(url) = &file.order_page_url {
            self.order_page_url = Some(url.clone());
        }
        Ok(())
    }

    /// Apply every variable `lookup` knows about
    ///
    /// # Errors
    ///
    /// Returns `Config` or `UnsupportedBrowser` for unparsable values.
    pub fn apply_env<F>(&mut self, lookup: &F) -> ProbeResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup(ENV_BROWSER) {
            self.browser = v.parse()?;
        }
        if let Some(v) = lookup(ENV_HEADLESS) {
            self.headless = v.trim().eq_ignore_ascii_case("true");
        }
        if let Some(v) = lookup(ENV_DEFAULT_TIMEOUT) {
            self.default_timeout = Duration::from_secs(parse_number(ENV_DEFAULT_TIMEOUT, &v)?);
        }
        if let Some(v) = lookup(ENV_POLL_FREQUENCY) {
            self.poll_frequency = seconds(parse_number(ENV_POLL_FREQUENCY, &v)?, ENV_POLL_FREQUENCY)?;
        }
        if let Some(v) = lookup(ENV_RETRY_TIMES) {
            self.retry_times = parse_number(ENV_RETRY_TIMES, &v)?;
        }
        if let Some(v) = lookup(ENV_RETRY_DELAY) {
            self.retry_delay = Duration::from_secs(parse_number(ENV_RETRY_DELAY, &v)?);
        }
        if let Some(v) = lookup(ENV_ENV) {
            self.environment = Environment::parse_lenient(&v);
        }
        if let Some(v) = lookup(ENV_DEVICE) {
            self.device = v;
        }
        if let Some(v) = lookup(ENV_LOG_LEVEL) {
            self.log_level = v;
        }
        if let Some(v) = lookup(ENV_SCREENSHOT_PATH) {
            self.screenshot_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup(ENV_ORDER_PAGE_URL) {
            let v = v.trim();
            self.order_page_url = (!v.is_empty()).then(|| v.to_string());
        }
        Ok(())
    }

    /// Check cross-field constraints
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedDevice` or `Config`.
    pub fn validate(&self) -> ProbeResult<()> {
        DeviceProfile::by_name(&self.device)?;
        if self.poll_frequency.is_zero() {
            return Err(ProbeError::config("poll frequency must be positive"));
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Builders
    // -------------------------------------------------------------------------

    /// Set browser kind
    #[must_use]
    pub const fn with_browser(mut self, browser: BrowserKind) -> Self {
        self.browser = browser;
        self
    }

    /// Set headless mode
    #[must_use]
    pub const fn with_headless(mut self, headless: bool) -> Self {
        self.headless = headless;
        self
    }

    /// Set default timeout
    #[must_use]
    pub const fn with_default_timeout(mut self, timeout: Duration) -> Self {
        self.default_timeout = timeout;
        self
    }

    /// Set poll frequency
    #[must_use]
    pub const fn with_poll_frequency(mut self, interval: Duration) -> Self {
        self.poll_frequency = interval;
        self
    }

    /// Set environment
    #[must_use]
    pub const fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Set device profile name
    #[must_use]
    pub fn with_device(mut self, device: impl Into<String>) -> Self {
        self.device = device.into();
        self
    }

    /// Set order page URL
    #[must_use]
    pub fn with_order_page_url(mut self, url: impl Into<String>) -> Self {
        self.order_page_url = Some(url.into());
        self
    }

    // -------------------------------------------------------------------------
    // Derived values
    // -------------------------------------------------------------------------

    /// Host for the configured environment
    #[must_use]
    pub const fn domain(&self) -> &'static str {
        self.environment.domain()
    }

    /// `https://<domain>`
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("https://{}", self.domain())
    }

    /// Join `path` onto the base URL with exactly one `/`
    #[must_use]
    pub fn page_url(&self, path: &str) -> String {
        if path.is_empty() {
            self.base_url()
        } else {
            format!("{}/{}", self.base_url(), path.trim_start_matches('/'))
        }
    }

    /// Order page URL, the base URL when not configured
    #[must_use]
    pub fn order_page_url(&self) -> String {
        self.order_page_url.clone().unwrap_or_else(|| self.base_url())
    }

    /// Resolved device profile
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedDevice` for an unknown name.
    pub fn device_profile(&self) -> ProbeResult<DeviceProfile> {
        DeviceProfile::by_name(&self.device)
    }

    /// Wait options for `timeout`, or the default timeout
    #[must_use]
    pub fn wait_options(&self, timeout: Option<Duration>) -> WaitOptions {
        WaitOptions::from_durations(timeout.unwrap_or(self.default_timeout), self.poll_frequency)
    }

    /// Serializable snapshot for display
    #[must_use]
    pub fn summary(&self) -> ConfigSummary {
        ConfigSummary {
            browser: self.browser,
            headless: self.headless,
            timeout: self.default_timeout.as_secs(),
            poll_frequency: self.poll_frequency.as_secs_f64(),
            retry_times: self.retry_times,
            retry_delay: self.retry_delay.as_secs(),
            env: self.environment,
            base_url: self.base_url(),
            domain: self.domain().to_string(),
            order_page_url: self.order_page_url(),
            device: self.device.clone(),
            log_level: self.log_level.clone(),
            screenshot_path: self.screenshot_dir.clone(),
        }
    }
}

/// Snapshot printed by `orderprobe config`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigSummary {
    /// Browser kind
    pub browser: BrowserKind,
    /// Headless flag
    pub headless: bool,
    /// Default timeout in seconds
    pub timeout: u64,
    /// Poll interval in seconds
    pub poll_frequency: f64,
    /// Retry count
    pub retry_times: u32,
    /// Retry delay in seconds
    pub retry_delay: u64,
    /// Deployment environment
    pub env: Environment,
    /// Base URL
    pub base_url: String,
    /// Host
    pub domain: String,
    /// Order page URL
    pub order_page_url: String,
    /// Device profile name
    pub device: String,
    /// Log level
    pub log_level: String,
    /// Screenshot directory
    pub screenshot_path: PathBuf,
}

fn parse_number<T: FromStr>(key: &str, raw: &str) -> ProbeResult<T> {
    raw.trim()
        .parse()
        .map_err(|_| ProbeError::config(format!("{key} is not a valid number: {raw:?}")))
}

fn seconds(secs: f64, key: &str) -> ProbeResult<Duration> {
    Duration::try_from_secs_f64(secs)
        .ok()
        .filter(|d| !d.is_zero())
        .ok_or_else(|| ProbeError::config(format!("{key} must be a positive number of seconds")))
}
