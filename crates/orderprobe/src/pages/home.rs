//! Landing page

use std::sync::Arc;

use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::interactor::ElementInteractor;
use crate::pages::{HomePageLocators, PageObject};
use crate::result::ProbeResult;

/// Landing page at the base URL
#[derive(Debug)]
pub struct HomePage<P: PageDriver + ?Sized = dyn PageDriver> {
    ui: ElementInteractor<P>,
    locators: HomePageLocators,
}

impl<P: PageDriver + ?Sized> HomePage<P> {
    /// Create the page object
    #[must_use]
    pub fn new(page: Arc<P>, config: Arc<SuiteConfig>) -> Self {
        Self {
            ui: ElementInteractor::new(page, config),
            locators: HomePageLocators::default(),
        }
    }

    /// Locator set
    #[must_use]
    pub const fn locators(&self) -> &HomePageLocators {
        &self.locators
    }

    /// Whether the header logo shows up
    pub async fn is_header_logo_visible(&self) -> bool {
        self.ui.is_visible(&self.locators.header_logo, None).await
    }

    /// Follow the "SERVICES" link
    pub async fn click_services_link(&self) -> ProbeResult<()> {
        self.ui.click(&self.locators.services_link, None).await
    }
}

impl<P: PageDriver + ?Sized> PageObject for HomePage<P> {
    type Driver = P;

    fn path(&self) -> &str {
        ""
    }

    fn page_name(&self) -> &str {
        "home"
    }

    fn interactor(&self) -> &ElementInteractor<P> {
        &self.ui
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::Selector;
    use crate::mock::{MockElement, MockPage};

    #[tokio::test(start_paused = true)]
    async fn test_open_goes_to_base_url() {
        let page = Arc::new(MockPage::new());
        page.update(|site| {
            site.on_navigate(|site, _| {
                site.insert(Selector::css("[data-testid=\"header-logo\"]"), MockElement::new());
                site.insert(
                    Selector::role("link", Some("SERVICES")),
                    MockElement::new().with_text("SERVICES"),
                );
            });
        });
        let home = HomePage::new(Arc::clone(&page), Arc::new(SuiteConfig::default()));
        home.open().await.unwrap();
        assert!(page.was_called("goto:https://www.transglobalus.com"));
        assert!(home.is_header_logo_visible().await);
        home.click_services_link().await.unwrap();
        assert!(page.was_called("click:role=link"));
    }
}
