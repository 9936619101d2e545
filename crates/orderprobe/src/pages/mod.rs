//! Page objects
//!
//! Each page pairs an [`ElementInteractor`] with a named locator set and
//! exposes the page's operations in domain terms.

mod home;
mod locators;
mod order;

pub use home::HomePage;
pub use locators::{HomePageLocators, OrderPageLocators};
pub use order::{OrderPage, ServiceType, DELIVERY_PROMPT_MESSAGE, PROMPT_MESSAGE_TIMEOUT};

use async_trait::async_trait;

use crate::driver::PageDriver;
use crate::interactor::ElementInteractor;
use crate::result::ProbeResult;

/// Trait for page objects representing one page of the site
///
/// `open` navigates to [`PageObject::path`] under the base URL and then
/// runs [`PageObject::wait_for_page_loaded`]. Pages with stronger readiness
/// signals override either step.
#[async_trait]
pub trait PageObject: Send + Sync {
    /// Driver behind this page's interactor
    type Driver: PageDriver + ?Sized;

    /// Path under the base URL
    fn path(&self) -> &str;

    /// Get the page name for logging
    fn page_name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Interactor bound to the page
    fn interactor(&self) -> &ElementInteractor<Self::Driver>;

    /// Wait until the page is ready for interaction
    async fn wait_for_page_loaded(&self) -> ProbeResult<()> {
        self.interactor().wait_for_page_loaded().await
    }

    /// Navigate to the page and wait for it to load
    async fn open(&self) -> ProbeResult<()> {
        tracing::info!(page = self.page_name(), "open page");
        self.interactor().open_url(self.path()).await?;
        self.wait_for_page_loaded().await
    }
}
