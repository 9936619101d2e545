//! Element interactor
//!
//! Wait, click, type and read operations with bounded polling, layered over a
//! [`PageDriver`]. Each operation resolves its locator fresh, so nothing is
//! cached between calls.
//!
//! Two flavors exist for most conditions:
//!
//! - **Probes** (`is_*`, `wait_clickable`, `wait_not_clickable`) degrade every
//!   failure to `false`
//! - **Assertions** (`wait_*`, `verify_*`, `assert_*`) raise a typed
//!   [`ProbeError`]
//!
//! Timeouts default to [`SuiteConfig::default_timeout`]; polling runs at
//! [`SuiteConfig::poll_frequency`]. Nothing here retries above a single poll
//! loop.

use std::fmt::Display;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::locator::{resolve, ElementHandle, LocatorDescription};
use crate::result::{ProbeError, ProbeResult, TextExpectation};
use crate::wait::{poll_until, ElementState, LoadState, WaitCondition, WaitResult};

/// Clear attempts after the first clear before `set_text` gives up
pub const MAX_CLEAR_ATTEMPTS: u32 = 5;

/// Wait/click/type/read operations bound to one page
#[derive(Debug)]
pub struct ElementInteractor<P: PageDriver + ?Sized = dyn PageDriver> {
    page: Arc<P>,
    config: Arc<SuiteConfig>,
}

impl<P: PageDriver + ?Sized> Clone for ElementInteractor<P> {
    fn clone(&self) -> Self {
        Self {
            page: Arc::clone(&self.page),
            config: Arc::clone(&self.config),
        }
    }
}

fn millis(duration: Duration) -> u64 {
    duration.as_millis() as u64
}

/// Time left before `deadline`, zero once it has passed
fn remaining(deadline: Instant) -> Duration {
    deadline.saturating_duration_since(Instant::now())
}

impl<P: PageDriver + ?Sized> ElementInteractor<P> {
    /// Create an interactor for a page
    #[must_use]
    pub fn new(page: Arc<P>, config: Arc<SuiteConfig>) -> Self {
        Self { page, config }
    }

    /// Underlying page driver
    #[must_use]
    pub const fn page(&self) -> &Arc<P> {
        &self.page
    }

    /// Suite configuration
    #[must_use]
    pub fn config(&self) -> &SuiteConfig {
        &self.config
    }

    fn timeout(&self, timeout: Option<Duration>) -> Duration {
        timeout.unwrap_or(self.config.default_timeout)
    }

    async fn wait_state(
        &self,
        handle: &ElementHandle,
        state: ElementState,
        timeout: Duration,
    ) -> ProbeResult<WaitResult> {
        let start = Instant::now();
        self.page.wait_for(handle, state, timeout).await?;
        Ok(WaitResult::success(start.elapsed(), state.to_string()))
    }

    // =========================================================================
    // NAVIGATION
    // =========================================================================

    /// Navigate to `url`, waiting for `DOMContentLoaded` and then `load`
    pub async fn navigate(&self, url: &str) -> ProbeResult<()> {
        info!(url, "navigate");
        let timeout = self.config.default_timeout;
        let navigation_error = |e: ProbeError| ProbeError::Navigation {
            url: url.to_string(),
            message: e.to_string(),
        };
        self.page
            .goto(url, LoadState::DomContentLoaded, timeout)
            .await
            .map_err(navigation_error)?;
        self.page
            .wait_for_load_state(LoadState::Load, timeout)
            .await
            .map_err(navigation_error)
    }

    /// Navigate to `path` joined onto the base URL
    pub async fn open_url(&self, path: &str) -> ProbeResult<()> {
        let url = self.config.page_url(path);
        self.navigate(&url).await
    }

    /// Reload, waiting for `DOMContentLoaded` and then `load`
    pub async fn reload(&self) -> ProbeResult<()> {
        info!("reload");
        let timeout = self.config.default_timeout;
        self.page.reload(LoadState::DomContentLoaded, timeout).await?;
        self.page.wait_for_load_state(LoadState::Load, timeout).await
    }

    /// Wait for `DOMContentLoaded`, then `load`
    pub async fn wait_for_page_loaded(&self) -> ProbeResult<()> {
        let timeout = self.config.default_timeout;
        self.page
            .wait_for_load_state(LoadState::DomContentLoaded, timeout)
            .await?;
        self.page.wait_for_load_state(LoadState::Load, timeout).await
    }

    /// Go back in history
    pub async fn go_back(&self) -> ProbeResult<()> {
        info!("go back");
        self.page
            .go_back(LoadState::DomContentLoaded, self.config.default_timeout)
            .await
    }

    /// Go forward in history
    pub async fn go_forward(&self) -> ProbeResult<()> {
        info!("go forward");
        self.page
            .go_forward(LoadState::DomContentLoaded, self.config.default_timeout)
            .await
    }

    /// Reload, then wait for the element to be visible
    pub async fn refresh_and_wait_for(
        &self,
        locator: impl Into<LocatorDescription>,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        let handle = resolve(locator);
        self.reload().await?;
        self.wait_visible(&handle, timeout).await
    }

    // =========================================================================
    // PRESENCE AND VISIBILITY
    // =========================================================================

    /// Wait for the element to attach with the default timeout
    pub async fn find_element(
        &self,
        locator: impl Into<LocatorDescription>,
    ) -> ProbeResult<ElementHandle> {
        self.wait_present(locator, None).await
    }

    /// Wait for the element to attach
    pub async fn wait_present(
        &self,
        locator: impl Into<LocatorDescription>,
        timeout: Option<Duration>,
    ) -> ProbeResult<ElementHandle> {
        let handle = resolve(locator);
        debug!(locator = %handle, "wait present");
        match self
            .wait_state(&handle, ElementState::Attached, self.timeout(timeout))
            .await
        {
            Ok(_) => Ok(handle),
            Err(e) if e.is_timeout() => Err(ProbeError::ElementNotFound {
                locator: handle.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    /// Whether the element becomes visible within the timeout; never errors
    pub async fn is_visible(
        &self,
        locator: impl Into<LocatorDescription>,
        timeout: Option<Duration>,
    ) -> bool {
        let handle = resolve(locator);
        let visible = self
            .wait_state(&handle, ElementState::Visible, self.timeout(timeout))
            .await
            .is_ok();
        debug!(locator = %handle, visible, "is visible");
        visible
    }

    /// [`Self::is_visible`] with the default timeout
    pub async fn verify_visible(&self, locator: impl Into<LocatorDescription>) -> bool {
        self.is_visible(locator, None).await
    }

    /// Wait for the element to be visible
    ///
    /// Fails exactly when [`Self::is_visible`] with the same timeout is `false`.
    pub async fn wait_visible(
        &self,
        locator: impl Into<LocatorDescription>,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        let handle = resolve(locator);
        let timeout = self.timeout(timeout);
        debug!(locator = %handle, "wait visible");
        self.wait_state(&handle, ElementState::Visible, timeout)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::ElementNotVisible {
                        locator: handle.to_string(),
                        timeout_ms: millis(timeout),
                    }
                } else {
                    e
                }
            })
    }

    /// Wait for the element to become hidden or detach
    pub async fn wait_disappears(
        &self,
        locator: impl Into<LocatorDescription>,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        let handle = resolve(locator);
        let timeout = self.timeout(timeout);
        debug!(locator = %handle, "wait disappears");
        self.wait_state(&handle, ElementState::Hidden, timeout)
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProbeError::ElementStillVisible {
                        locator: handle.to_string(),
                        timeout_ms: millis(timeout),
                    }
                } else {
                    e
                }
            })
    }

    /// Wait for the element to attach, then scroll it into view
    pub async fn scroll_into_view(
        &self,
        locator: impl Into<LocatorDescription>,
    ) -> ProbeResult<ElementHandle> {
        let handle = resolve(locator);
        debug!(locator = %handle, "scroll into view");
        match self
            .page
            .scroll_into_view(&handle, self.config.default_timeout)
            .await
        {
            Ok(()) => Ok(handle),
            Err(e) if e.is_timeout() => Err(ProbeError::ElementNotFound {
                locator: handle.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    // =========================================================================
    // CLICKING
    // =========================================================================

    /// Click once the element is actionable
    pub async fn click(
        &self,
        locator: impl Into<LocatorDescription>,
        timeout: Option<Duration>,
    ) -> ProbeResult<()> {
        let handle = resolve(locator);
        debug!(locator = %handle, "click");
        match self.page.click(&handle, self.timeout(timeout)).await {
            Err(e) if e.is_timeout() => Err(ProbeError::ElementNotActionable {
                locator: handle.to_string(),
                message: e.to_string(),
            }),
            other => other,
        }
    }

    /// Click if the element becomes visible; returns whether it clicked
    pub async fn click_if_visible(
        &self,
        locator: impl Into<LocatorDescription>,
        timeout: Option<Duration>,
    ) -> ProbeResult<bool> {
        let handle = resolve(locator);
        if self.is_visible(&handle, timeout).await {
            self.click(&handle, timeout).await?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Visible and without a `disabled` attribute within the timeout
    pub async fn wait_clickable(
        &self,
        locator: impl Into<LocatorDescription>,
        timeout: Option<Duration>,
    ) -> bool {
        let handle = resolve(locator);
        let timeout = self.timeout(timeout);
        if self
            .wait_state(&handle, ElementState::Visible, timeout)
            .await
            .is_err()
        {
            return false;
        }
        matches!(
            self.page.get_attribute(&handle, "disabled", timeout).await,
            Ok(None)
        )
    }

    /// Hidden within the timeout, or found disabled once the hidden-wait expires
    pub async fn wait_not_clickable(
        &self,
        locator: impl Into<LocatorDescription>,
        timeout: Option<Duration>,
    ) -> bool {
        let handle = resolve(locator);
        let deadline = Instant::now() + self.timeout(timeout);
        if self
            .wait_state(&handle, ElementState::Hidden, remaining(deadline))
            .await
            .is_ok()
        {
            return true;
        }
        matches!(
            self.page
                .get_attribute(&handle, "disabled", remaining(deadline))
                .await,
            Ok(Some(_))
        )
    }

    /// Immediate visibility plus disabled check; any error counts as `false`
    pub async fn is_clickable_now(&self, locator: impl Into<LocatorDescription>) -> bool {
        let handle = resolve(locator);
        match self.page.is_visible(&handle).await {
            Ok(true) => matches!(
                self.page
                    .get_attribute(&handle, "disabled", Duration::ZERO)
                    .await,
                Ok(None)
            ),
            _ => false,
        }
    }

    /// Fail unless the element becomes clickable within the timeout
    pub async fn verify_clickable(
        &self,
        locator: impl Into<LocatorDescription>,
        timeout: Option<Duration>,
    ) -> ProbeResult<()> {
        let handle = resolve(locator);
        let timeout = self.timeout(timeout);
        if self.wait_clickable(&handle, Some(timeout)).await {
            Ok(())
        } else {
            Err(ProbeError::NotClickable {
                locator: handle.to_string(),
                timeout_ms: millis(timeout),
            })
        }
    }

    /// Fail unless the element exists and stops being clickable
    ///
    /// An enabled element that passed the hidden check is re-checked with
    /// [`Self::is_clickable_now`]. Errors during that re-check count as not
    /// clickable.
    pub async fn assert_not_clickable(
        &self,
        locator: impl Into<LocatorDescription>,
        timeout: Option<Duration>,
    ) -> ProbeResult<()> {
        let handle = resolve(locator);
        let timeout = self.timeout(timeout);
        let deadline = Instant::now() + timeout;
        match self
            .wait_state(&handle, ElementState::Attached, timeout)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_timeout() => {
                return Err(ProbeError::ElementNotFound {
                    locator: handle.to_string(),
                })
            }
            Err(e) => return Err(e),
        }

        if !self
            .wait_not_clickable(&handle, Some(remaining(deadline)))
            .await
        {
            return Err(ProbeError::StillClickable {
                locator: handle.to_string(),
                timeout_ms: millis(timeout),
            });
        }

        let disabled = self
            .page
            .get_attribute(&handle, "disabled", remaining(deadline))
            .await;
        if matches!(disabled, Ok(None)) && self.is_clickable_now(&handle).await {
            return Err(ProbeError::UnexpectedlyClickable {
                locator: handle.to_string(),
            });
        }
        Ok(())
    }

    // =========================================================================
    // TEXT AND VALUES
    // =========================================================================

    /// Replace the field's value with `text`
    ///
    /// A non-empty field is cleared first and re-cleared up to
    /// [`MAX_CLEAR_ATTEMPTS`] times. A field that still holds a value after
    /// that is logged and filled anyway.
    pub async fn set_text(
        &self,
        locator: impl Into<LocatorDescription>,
        text: impl Display,
    ) -> ProbeResult<()> {
        let handle = resolve(locator);
        let text = text.to_string();
        let timeout = self.config.default_timeout;
        debug!(locator = %handle, "set text");

        let current = self.page.input_value(&handle, timeout).await?;
        if !current.is_empty() {
            self.page.clear(&handle, timeout).await?;
            let mut attempts = 0;
            while attempts < MAX_CLEAR_ATTEMPTS {
                let value = self.page.input_value(&handle, timeout).await?;
                if value.trim().is_empty() {
                    break;
                }
                self.page.clear(&handle, timeout).await?;
                attempts += 1;
            }
            if attempts == MAX_CLEAR_ATTEMPTS {
                let value = self.page.input_value(&handle, timeout).await?;
                warn!(locator = %handle, value = %value, "unable to clear field");
            }
        }

        self.page.fill(&handle, &text, timeout).await
    }

    /// Rendered text once the element is attached and visible
    pub async fn get_text(&self, locator: impl Into<LocatorDescription>) -> ProbeResult<String> {
        let handle = resolve(locator);
        let timeout = self.config.default_timeout;
        let deadline = Instant::now() + timeout;
        debug!(locator = %handle, "get text");
        match self
            .wait_state(&handle, ElementState::Attached, timeout)
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_timeout() => {
                return Err(ProbeError::ElementNotFound {
                    locator: handle.to_string(),
                })
            }
            Err(e) => return Err(e),
        }
        self.wait_visible(&handle, Some(remaining(deadline))).await?;
        self.page.inner_text(&handle, remaining(deadline)).await
    }

    /// Whether the rendered text equals `expected` exactly
    pub async fn verify_text(
        &self,
        locator: impl Into<LocatorDescription>,
        expected: &str,
    ) -> ProbeResult<bool> {
        Ok(self.get_text(locator).await? == expected)
    }

    /// Wait until the rendered text contains `text`
    ///
    /// The visible-wait and the text poll share one deadline.
    pub async fn wait_text_contains(
        &self,
        locator: impl Into<LocatorDescription>,
        text: &str,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        self.wait_text(resolve(locator), text, TextExpectation::Contains, timeout)
            .await
    }

    /// Wait until the rendered text no longer contains `text`
    ///
    /// The visible-wait and the text poll share one deadline.
    pub async fn wait_text_not_contains(
        &self,
        locator: impl Into<LocatorDescription>,
        text: &str,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        self.wait_text(resolve(locator), text, TextExpectation::NotContains, timeout)
            .await
    }

    async fn wait_text(
        &self,
        handle: ElementHandle,
        text: &str,
        expectation: TextExpectation,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        let start = Instant::now();
        let options = self.config.wait_options(timeout);
        let condition = match expectation {
            TextExpectation::Contains => WaitCondition::TextContains(text.to_string()),
            TextExpectation::NotContains => WaitCondition::TextNotContains(text.to_string()),
        };
        debug!(locator = %handle, condition = %condition, "wait text");

        let timed_out = || ProbeError::TextConditionTimeout {
            locator: handle.to_string(),
            text: text.to_string(),
            expectation,
            timeout_ms: options.timeout_ms,
        };

        match self
            .wait_state(&handle, ElementState::Visible, options.timeout())
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_timeout() => return Err(timed_out()),
            Err(e) => return Err(e),
        }

        let read_timeout = options.poll_interval();
        let poll = options.remaining_after(start.elapsed());
        poll_until(
            || async {
                match self.page.inner_text(&handle, read_timeout).await {
                    Ok(actual) => match expectation {
                        TextExpectation::Contains => actual.contains(text),
                        TextExpectation::NotContains => !actual.contains(text),
                    },
                    Err(_) => false,
                }
            },
            &poll,
        )
        .await
        .map(|_| WaitResult::success(start.elapsed(), condition.description()))
        .map_err(|_| timed_out())
    }

    /// Wait until the input holds a non-blank value
    ///
    /// The visible-wait and the value poll share one deadline.
    pub async fn wait_has_value(
        &self,
        locator: impl Into<LocatorDescription>,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        let handle = resolve(locator);
        let start = Instant::now();
        let options = self.config.wait_options(timeout);
        debug!(locator = %handle, "wait has value");

        self.wait_visible(&handle, Some(options.timeout())).await?;

        let read_timeout = options.poll_interval();
        let poll = options.remaining_after(start.elapsed());
        poll_until(
            || async {
                self.page
                    .input_value(&handle, read_timeout)
                    .await
                    .is_ok_and(|v| !v.trim().is_empty())
            },
            &poll,
        )
        .await
        .map(|_| WaitResult::success(start.elapsed(), WaitCondition::HasValue.description()))
        .map_err(|_| ProbeError::ValueTimeout {
            locator: handle.to_string(),
            timeout_ms: options.timeout_ms,
        })
    }

    /// Wait for any [`WaitCondition`] through its dedicated operation
    pub async fn wait_for_condition(
        &self,
        locator: impl Into<LocatorDescription>,
        condition: &WaitCondition,
        timeout: Option<Duration>,
    ) -> ProbeResult<WaitResult> {
        let handle = resolve(locator);
        let start = Instant::now();
        let result = match condition {
            WaitCondition::Attached => {
                self.wait_present(&handle, timeout).await?;
                WaitResult::success(start.elapsed(), String::new())
            }
            WaitCondition::Visible => self.wait_visible(&handle, timeout).await?,
            WaitCondition::Hidden => self.wait_disappears(&handle, timeout).await?,
            WaitCondition::HasValue => self.wait_has_value(&handle, timeout).await?,
            WaitCondition::TextContains(s) => self.wait_text_contains(&handle, s, timeout).await?,
            WaitCondition::TextNotContains(s) => {
                self.wait_text_not_contains(&handle, s, timeout).await?
            }
        };
        Ok(result.waited_for(condition.description()))
    }

    // =========================================================================
    // LISTS, ATTRIBUTES, CAPTURE
    // =========================================================================

    /// Number of matching elements right now
    pub async fn count(&self, locator: impl Into<LocatorDescription>) -> ProbeResult<usize> {
        let handle = resolve(locator);
        self.page.count(&handle).await
    }

    /// Text of the first match; `ElementNotFound` when nothing matches
    pub async fn first_text(&self, locator: impl Into<LocatorDescription>) -> ProbeResult<String> {
        let handle = resolve(locator).first();
        if self.page.count(&handle).await? == 0 {
            return Err(ProbeError::ElementNotFound {
                locator: handle.to_string(),
            });
        }
        self.get_text(&handle).await
    }

    /// Attribute value once the element is attached
    pub async fn attribute(
        &self,
        locator: impl Into<LocatorDescription>,
        name: &str,
    ) -> ProbeResult<Option<String>> {
        let handle = resolve(locator);
        match self
            .page
            .get_attribute(&handle, name, self.config.default_timeout)
            .await
        {
            Err(e) if e.is_timeout() => Err(ProbeError::ElementNotFound {
                locator: handle.to_string(),
            }),
            other => other,
        }
    }

    /// Capture the viewport as PNG bytes
    pub async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        self.page.screenshot().await
    }

    /// Capture the viewport into the configured screenshot directory
    pub async fn save_screenshot(&self, file_name: &str) -> ProbeResult<PathBuf> {
        let png = self.page.screenshot().await?;
        std::fs::create_dir_all(&self.config.screenshot_dir)?;
        let path = self.config.screenshot_dir.join(file_name);
        std::fs::write(&path, png)?;
        info!(path = %path.display(), "saved screenshot");
        Ok(path)
    }
}
