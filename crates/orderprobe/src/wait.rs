//! Wait mechanisms
//!
//! Every bounded wait in the crate goes through [`poll_until`]: check a
//! predicate, sleep one poll interval, repeat until it holds or the timeout
//! elapses. Time comes from `tokio::time`, so tests can drive it with a paused
//! clock.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::result::{ProbeError, ProbeResult};

// =============================================================================
// LOAD STATE
// =============================================================================

/// Page load signals
///
/// There is no network-idle state: pages with long-lived background requests
/// never reach it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum LoadState {
    /// `DOMContentLoaded` has fired
    DomContentLoaded,
    /// The `load` event has fired
    #[default]
    Load,
}

impl LoadState {
    /// `document.readyState` values that satisfy this state
    #[must_use]
    pub const fn ready_states(&self) -> &'static [&'static str] {
        match self {
            Self::DomContentLoaded => &["interactive", "complete"],
            Self::Load => &["complete"],
        }
    }

    /// Whether reaching `other` implies this state has been reached
    #[must_use]
    pub const fn is_satisfied_by(&self, other: Self) -> bool {
        matches!(
            (self, other),
            (Self::DomContentLoaded, _) | (Self::Load, Self::Load)
        )
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::DomContentLoaded => "DOMContentLoaded",
            Self::Load => "load",
        })
    }
}

// =============================================================================
// ELEMENT STATE
// =============================================================================

/// Element states a driver can wait for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementState {
    /// Present in the DOM
    Attached,
    /// Absent from the DOM
    Detached,
    /// Attached with a non-empty box and not `visibility: hidden`
    Visible,
    /// Detached or not visible
    Hidden,
}

impl std::fmt::Display for ElementState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Attached => "attached",
            Self::Detached => "detached",
            Self::Visible => "visible",
            Self::Hidden => "hidden",
        };
        write!(f, "{name}")
    }
}

// =============================================================================
// WAIT CONDITION
// =============================================================================

/// Conditions the element interactor can wait on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WaitCondition {
    /// Element is attached
    Attached,
    /// Element is visible
    Visible,
    /// Element is hidden or detached
    Hidden,
    /// Input value is non-blank
    HasValue,
    /// Rendered text contains the substring
    TextContains(String),
    /// Rendered text does not contain the substring
    TextNotContains(String),
}

impl WaitCondition {
    /// Human-readable description for logs and results
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::Attached => String::from("attached"),
            Self::Visible => String::from("visible"),
            Self::Hidden => String::from("hidden"),
            Self::HasValue => String::from("has value"),
            Self::TextContains(s) => format!("text contains {s:?}"),
            Self::TextNotContains(s) => format!("text does not contain {s:?}"),
        }
    }
}

impl std::fmt::Display for WaitCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

// =============================================================================
// WAIT OPTIONS
// =============================================================================

/// Options for wait operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    /// Timeout in milliseconds
    pub timeout_ms: u64,
    /// Polling interval in milliseconds
    pub poll_interval_ms: u64,
}

impl WaitOptions {
    /// Build from durations
    #[must_use]
    pub fn from_durations(timeout: Duration, poll_interval: Duration) -> Self {
        Self {
            timeout_ms: timeout.as_millis() as u64,
            poll_interval_ms: poll_interval.as_millis().max(1) as u64,
        }
    }

    /// Get timeout as Duration
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Get poll interval as Duration
    #[must_use]
    pub const fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Options for whatever is left of this timeout after `elapsed`
    #[must_use]
    pub fn remaining_after(&self, elapsed: Duration) -> Self {
        let remaining = self.timeout().saturating_sub(elapsed);
        Self {
            timeout_ms: remaining.as_millis() as u64,
            poll_interval_ms: self.poll_interval_ms,
        }
    }
}

// =============================================================================
// WAIT RESULT
// =============================================================================

/// Result of a successful wait
#[derive(Debug, Clone)]
pub struct WaitResult {
    /// Whether the wait was successful
    pub success: bool,
    /// Time spent waiting
    pub elapsed: Duration,
    /// Description of what was waited for
    pub waited_for: String,
}

impl WaitResult {
    /// Create a successful wait result
    #[must_use]
    pub fn success(elapsed: Duration, waited_for: impl Into<String>) -> Self {
        Self {
            success: true,
            elapsed,
            waited_for: waited_for.into(),
        }
    }

    /// Relabel the result
    #[must_use]
    pub fn waited_for(mut self, waited_for: impl Into<String>) -> Self {
        self.waited_for = waited_for.into();
        self
    }
}

// =============================================================================
// POLLING
// =============================================================================

/// Poll `probe` until it returns true or the timeout elapses
///
/// The probe is checked once immediately and once more at the deadline, so a
/// zero timeout still gets one look.
///
/// # Errors
///
/// Returns [`ProbeError::Timeout`] when the probe never held.
pub async fn poll_until<F, Fut>(mut probe: F, options: &WaitOptions) -> ProbeResult<WaitResult>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let start = Instant::now();
    let timeout = options.timeout();
    let interval = options.poll_interval().max(Duration::from_millis(1));

    loop {
        if probe().await {
            return Ok(WaitResult::success(start.elapsed(), "condition"));
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Err(ProbeError::Timeout {
                ms: options.timeout_ms,
            });
        }
        tokio::time::sleep(interval.min(timeout - elapsed)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    fn opts(timeout_ms: u64, poll_interval_ms: u64) -> WaitOptions {
        WaitOptions::from_durations(
            Duration::from_millis(timeout_ms),
            Duration::from_millis(poll_interval_ms),
        )
    }

    mod load_state_tests {
        use super::*;

        #[test]
        fn test_display() {
            assert_eq!(LoadState::Load.to_string(), "load");
            assert_eq!(LoadState::DomContentLoaded.to_string(), "DOMContentLoaded");
        }

        #[test]
        fn test_satisfaction() {
            assert!(LoadState::DomContentLoaded.is_satisfied_by(LoadState::Load));
            assert!(LoadState::DomContentLoaded.is_satisfied_by(LoadState::DomContentLoaded));
            assert!(!LoadState::Load.is_satisfied_by(LoadState::DomContentLoaded));
            assert_eq!(LoadState::Load.ready_states(), &["complete"]);
        }
    }

    mod options_tests {
        use super::*;

        #[test]
        fn test_remaining_after_saturates() {
            let options = opts(1000, 500);
            assert_eq!(options.remaining_after(Duration::from_millis(400)).timeout_ms, 600);
            assert_eq!(options.remaining_after(Duration::from_secs(5)).timeout_ms, 0);
        }

        #[test]
        fn test_from_durations() {
            let options = WaitOptions::from_durations(Duration::from_secs(3), Duration::from_millis(100));
            assert_eq!(options.timeout_ms, 3000);
            assert_eq!(options.poll_interval_ms, 100);
        }
    }

    mod poll_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_immediate_success() {
            let result = poll_until(|| async { true }, &opts(20_000, 500)).await.unwrap();
            assert!(result.success);
            assert_eq!(result.elapsed, Duration::ZERO);
        }

        #[tokio::test(start_paused = true)]
        async fn test_succeeds_on_later_poll() {
            let calls = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&calls);
            let options = opts(5000, 100);
            let result = poll_until(
                move || {
                    let counter = Arc::clone(&counter);
                    async move { counter.fetch_add(1, Ordering::SeqCst) >= 3 }
                },
                &options,
            )
            .await
            .unwrap();
            assert_eq!(calls.load(Ordering::SeqCst), 4);
            assert_eq!(result.elapsed, Duration::from_millis(300));
        }

        #[tokio::test(start_paused = true)]
        async fn test_times_out_at_deadline() {
            let start = Instant::now();
            let options = opts(1200, 500);
            let err = poll_until(|| async { false }, &options).await.unwrap_err();
            assert!(matches!(err, ProbeError::Timeout { ms: 1200 }));
            assert_eq!(start.elapsed(), Duration::from_millis(1200));
        }

        #[tokio::test(start_paused = true)]
        async fn test_zero_timeout_checks_once() {
            let calls = Arc::new(AtomicU32::new(0));
            let counter = Arc::clone(&calls);
            let options = opts(0, 500);
            let result = poll_until(
                move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async { false }
                },
                &options,
            )
            .await;
            assert!(result.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    mod condition_tests {
        use super::*;

        #[test]
        fn test_descriptions() {
            assert_eq!(WaitCondition::Visible.to_string(), "visible");
            assert_eq!(
                WaitCondition::TextContains("M5V".into()).to_string(),
                "text contains \"M5V\""
            );
            assert_eq!(ElementState::Detached.to_string(), "detached");
        }
    }
}
