//! Output formatting for run summaries, configuration and device listings

use console::style;
use std::fmt::Write;

use orderprobe::{ConfigSummary, DeviceProfile, RunSummary};

use crate::commands::ConfigFormat;
use crate::error::CliResult;

/// Render the resolved configuration
pub fn render_config(summary: &ConfigSummary, format: ConfigFormat) -> CliResult<String> {
    Ok(match format {
        ConfigFormat::Json => serde_json::to_string_pretty(summary)?,
        ConfigFormat::Yaml => serde_yaml_ng::to_string(summary)?,
    })
}

/// Render the device table
#[must_use]
pub fn render_devices(devices: &[DeviceProfile]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<16} {:>11} {:>6}  {}",
        style("NAME").bold(),
        style("VIEWPORT").bold(),
        style("SCALE").bold(),
        style("CLASS").bold()
    );
    for device in devices {
        let class = if device.is_tablet {
            "tablet"
        } else if device.is_mobile {
            "mobile"
        } else {
            "desktop"
        };
        let viewport = format!("{}x{}", device.viewport.width, device.viewport.height);
        let _ = writeln!(
            out,
            "{:<16} {:>11} {:>6.1}  {}",
            device.name, viewport, device.device_scale_factor, class
        );
    }
    out
}

/// One-line verdict for a finished run
#[must_use]
pub fn render_run_summary(summary: &RunSummary) -> String {
    let verdict = if summary.is_success() {
        style("PASSED").green().bold()
    } else {
        style("FAILED").red().bold()
    };
    let mut line = format!(
        "{verdict}: {} scenarios, {} passed, {} failed, {} skipped",
        summary.total(),
        summary.passed,
        summary.failed,
        summary.skipped
    );
    if summary.parsing_errors > 0 {
        let _ = write!(line, ", {} parsing errors", summary.parsing_errors);
    }
    if summary.hook_errors > 0 {
        let _ = write!(line, ", {} hook errors", summary.hook_errors);
    }
    line
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use orderprobe::SuiteConfig;

    fn plain() {
        console::set_colors_enabled(false);
    }

    #[test]
    fn test_render_config_json() {
        let summary = SuiteConfig::default().summary();
        let json = render_config(&summary, ConfigFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["env"], "staging");
        assert_eq!(value["browser"], "chromium");
        assert_eq!(value["base_url"], "https://www.transglobalus.com");
    }

    #[test]
    fn test_render_config_yaml() {
        let summary = SuiteConfig::default().summary();
        let yaml = render_config(&summary, ConfigFormat::Yaml).unwrap();
        let back: ConfigSummary = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back, summary);
    }

    #[test]
    fn test_render_devices_lists_every_profile() {
        plain();
        let table = render_devices(&DeviceProfile::all());
        assert_eq!(table.lines().count(), DeviceProfile::all().len() + 1);
        assert!(table.contains("desktop"));
        assert!(table.contains("1920x1080"));
        assert!(table.contains("ipadpro"));
        assert!(table.contains("tablet"));
    }

    #[test]
    fn test_render_run_summary() {
        plain();
        let ok = RunSummary {
            passed: 3,
            ..RunSummary::default()
        };
        assert!(render_run_summary(&ok).starts_with("PASSED: 3 scenarios"));

        let bad = RunSummary {
            passed: 2,
            failed: 1,
            hook_errors: 1,
            ..RunSummary::default()
        };
        let line = render_run_summary(&bad);
        assert!(line.starts_with("FAILED"));
        assert!(line.contains("1 failed"));
        assert!(line.contains("1 hook errors"));
    }
}
