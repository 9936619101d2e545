//! Result and error types for Orderprobe.

use std::fmt;
use thiserror::Error;

/// Result type for Orderprobe operations
pub type ProbeResult<T> = Result<T, ProbeError>;

/// Which side of a text condition timed out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextExpectation {
    /// Text was expected to appear
    Contains,
    /// Text was expected to go away
    NotContains,
}

impl fmt::Display for TextExpectation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains => write!(f, "does not contain the expected text"),
            Self::NotContains => write!(f, "still contains the unexpected text"),
        }
    }
}

/// Errors that can occur in Orderprobe
#[derive(Debug, Error)]
pub enum ProbeError {
    /// Locator input did not match any supported shape
    #[error("Unsupported locator kind: {description}")]
    UnsupportedLocatorKind {
        /// What was supplied
        description: String,
    },

    /// Element never attached to the DOM
    #[error("Element not found: {locator}")]
    ElementNotFound {
        /// Locator description
        locator: String,
    },

    /// Element never became visible
    #[error("Element not found or not visible within {timeout_ms}ms: {locator}")]
    ElementNotVisible {
        /// Locator description
        locator: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Element never became actionable (attached, visible, stable, unobscured, enabled)
    #[error("Element not actionable: {locator}: {message}")]
    ElementNotActionable {
        /// Locator description
        locator: String,
        /// Which actionability check failed
        message: String,
    },

    /// Element stayed visible past the timeout
    #[error("Element does not disappear in {timeout_ms}ms: {locator}")]
    ElementStillVisible {
        /// Locator description
        locator: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Element never became clickable
    #[error("Element is not clickable in {timeout_ms}ms: {locator}")]
    NotClickable {
        /// Locator description
        locator: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Element stayed clickable past the timeout
    #[error("Element is still clickable in {timeout_ms}ms: {locator}")]
    StillClickable {
        /// Locator description
        locator: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Element is enabled and passes the clickable snapshot
    #[error("Element exists but should not be clickable: {locator}")]
    UnexpectedlyClickable {
        /// Locator description
        locator: String,
    },

    /// Text substring condition did not hold in time
    #[error("Element text {expectation}: {text:?} in {timeout_ms}ms. Locator: {locator}")]
    TextConditionTimeout {
        /// Locator description
        locator: String,
        /// Expected or unexpected text
        text: String,
        /// Which condition was awaited
        expectation: TextExpectation,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Input never received a non-blank value
    #[error("Element in {timeout_ms}ms did not get a value: {locator}")]
    ValueTimeout {
        /// Locator description
        locator: String,
        /// Timeout in milliseconds
        timeout_ms: u64,
    },

    /// Service type is neither delivery nor takeout
    #[error("Unsupported service type: {option}")]
    UnsupportedServiceType {
        /// Option as supplied
        option: String,
    },

    /// Raw binding-level timeout
    #[error("Operation timed out after {ms}ms")]
    Timeout {
        /// Timeout in milliseconds
        ms: u64,
    },

    /// Navigation error
    #[error("Navigation to {url} failed: {message}")]
    Navigation {
        /// URL that failed
        url: String,
        /// Error message
        message: String,
    },

    /// Browser binding error
    #[error("Driver error: {message}")]
    Driver {
        /// Error message
        message: String,
    },

    /// Browser launch error
    #[error("Failed to launch browser: {message}")]
    BrowserLaunch {
        /// Error message
        message: String,
    },

    /// Browser kind cannot be driven by this build
    #[error("Unsupported browser type: {browser}")]
    UnsupportedBrowser {
        /// Browser name
        browser: String,
    },

    /// Unknown device profile
    #[error("Unsupported device type: {device}")]
    UnsupportedDevice {
        /// Device name
        device: String,
    },

    /// Configuration error
    #[error("Configuration error: {message}")]
    Config {
        /// Error message
        message: String,
    },

    /// Scenario assertion failed
    #[error("Assertion failed: {message}")]
    AssertionFailed {
        /// Error message
        message: String,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml_ng::Error),
}

impl ProbeError {
    /// Create a driver error
    #[must_use]
    pub fn driver(message: impl Into<String>) -> Self {
        Self::Driver {
            message: message.into(),
        }
    }

    /// Create a configuration error
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create an assertion failure
    #[must_use]
    pub fn assertion(message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            message: message.into(),
        }
    }

    /// Whether this is a raw timeout from a wait
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

/// Assert a condition inside a step, failing with the given message
///
/// # Errors
///
/// Returns `AssertionFailed` when `condition` is false.
pub fn ensure(condition: bool, message: impl Into<String>) -> ProbeResult<()> {
    if condition {
        Ok(())
    } else {
        Err(ProbeError::assertion(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_timeout_message_names_locator_and_text() {
        let err = ProbeError::TextConditionTimeout {
            locator: "css=#prompt".to_string(),
            text: "Please enter".to_string(),
            expectation: TextExpectation::Contains,
            timeout_ms: 5000,
        };
        let msg = err.to_string();
        assert!(msg.contains("css=#prompt"));
        assert!(msg.contains("\"Please enter\""));
        assert!(msg.contains("does not contain"));
    }

    #[test]
    fn test_not_contains_wording() {
        let err = ProbeError::TextConditionTimeout {
            locator: "x".to_string(),
            text: "y".to_string(),
            expectation: TextExpectation::NotContains,
            timeout_ms: 1,
        };
        assert!(err.to_string().contains("still contains"));
    }

    #[test]
    fn test_ensure() {
        assert!(ensure(true, "never").is_ok());
        let err = ensure(false, "heading is empty").unwrap_err();
        assert!(matches!(err, ProbeError::AssertionFailed { ref message } if message == "heading is empty"));
    }

    #[test]
    fn test_is_timeout() {
        assert!(ProbeError::Timeout { ms: 10 }.is_timeout());
        assert!(!ProbeError::driver("boom").is_timeout());
    }
}
