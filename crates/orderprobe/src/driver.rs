//! PageDriver - abstract page automation trait
//!
//! The element interactor never talks to a browser directly. Everything it
//! needs from the automation binding goes through [`PageDriver`]:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  ElementInteractor                                        │
//! │      │                                                    │
//! │      ▼                                                    │
//! │  PageDriver (trait)                                       │
//! │      ├── CdpPage   (chromiumoxide, feature "browser")     │
//! │      └── MockPage  (scripted in-memory page, tests)       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Element arguments are [`ElementHandle`]s. Implementations re-query the page
//! on every call and act on the first match.

use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SuiteConfig;
use crate::locator::ElementHandle;
use crate::result::ProbeResult;
use crate::wait::{ElementState, LoadState};

/// PNG file signature, used to sanity-check screenshot payloads
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Abstract driver trait for one browser page
///
/// Methods taking a `timeout` auto-wait up to that long for the element to
/// be attached (reads) or actionable (click, fill, clear) and fail with
/// [`ProbeError::Timeout`](crate::ProbeError::Timeout) or
/// [`ProbeError::ElementNotActionable`](crate::ProbeError::ElementNotActionable).
///
/// # Implementations
///
/// - `CdpPage` - chromiumoxide page (feature `browser`)
/// - [`MockPage`](crate::mock::MockPage) - scripted page for tests
#[async_trait]
pub trait PageDriver: Send + Sync + Debug {
    /// Navigate to URL and wait for the load state
    async fn goto(&self, url: &str, wait_until: LoadState, timeout: Duration) -> ProbeResult<()>;

    /// Reload the current page
    async fn reload(&self, wait_until: LoadState, timeout: Duration) -> ProbeResult<()>;

    /// Go back in history
    async fn go_back(&self, wait_until: LoadState, timeout: Duration) -> ProbeResult<()>;

    /// Go forward in history
    async fn go_forward(&self, wait_until: LoadState, timeout: Duration) -> ProbeResult<()>;

    /// Wait until the current document reaches `state`
    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> ProbeResult<()>;

    /// Current URL
    async fn current_url(&self) -> ProbeResult<String>;

    /// Wait for an element to reach a state
    async fn wait_for(
        &self,
        element: &ElementHandle,
        state: ElementState,
        timeout: Duration,
    ) -> ProbeResult<()>;

    /// Immediate visibility check, no waiting
    async fn is_visible(&self, element: &ElementHandle) -> ProbeResult<bool>;

    /// Number of matching elements
    async fn count(&self, element: &ElementHandle) -> ProbeResult<usize>;

    /// Click once the element is attached, visible, stable, unobscured and enabled
    async fn click(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<()>;

    /// Replace the input value
    async fn fill(&self, element: &ElementHandle, value: &str, timeout: Duration) -> ProbeResult<()>;

    /// Clear the input value
    async fn clear(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<()>;

    /// Current input value
    async fn input_value(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<String>;

    /// Rendered text
    async fn inner_text(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<String>;

    /// Attribute value, `None` when absent
    async fn get_attribute(
        &self,
        element: &ElementHandle,
        name: &str,
        timeout: Duration,
    ) -> ProbeResult<Option<String>>;

    /// Scroll the element into the viewport
    async fn scroll_into_view(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<()>;

    /// Capture the viewport as PNG bytes
    async fn screenshot(&self) -> ProbeResult<Vec<u8>>;

    /// Close the page and release its browser resources
    async fn close(&self) -> ProbeResult<()>;
}

/// Source of fresh pages, one per scenario
///
/// The scenario runner acquires a page before each scenario and closes it
/// afterwards through [`PageDriver::close`].
#[async_trait]
pub trait PageProvider: Send + Sync + Debug {
    /// Open a new page configured for `config`
    async fn acquire(&self, config: &SuiteConfig) -> ProbeResult<Arc<dyn PageDriver>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockPage;

    #[derive(Debug)]
    struct MockProvider;

    #[async_trait]
    impl PageProvider for MockProvider {
        async fn acquire(&self, _config: &SuiteConfig) -> ProbeResult<Arc<dyn PageDriver>> {
            Ok(Arc::new(MockPage::new()))
        }
    }

    #[tokio::test]
    async fn test_provider_hands_out_independent_pages() {
        let provider = MockProvider;
        let config = SuiteConfig::default();
        let first = provider.acquire(&config).await.unwrap();
        let second = provider.acquire(&config).await.unwrap();
        first.close().await.unwrap();
        assert!(first.current_url().await.is_err());
        assert!(second.current_url().await.is_ok());
    }

    #[tokio::test]
    async fn test_mock_screenshot_is_png() {
        let page = MockPage::new();
        let png = page.screenshot().await.unwrap();
        assert!(png.starts_with(&PNG_SIGNATURE));
    }
}
