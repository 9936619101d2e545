//! Online order page
//!
//! Covers the restaurant header, the delivery/takeout switcher, and the
//! address picker. The picker moves through these states, one operation per
//! transition:
//!
//! ```text
//! Closed ─open_address_picker─▶ Open ─input_postal_code─▶ Searching
//!   ▲                                                        │
//!   │                                      wait_for_postal_code_results
//!   │                                                        ▼
//!   └──confirm_selected_address◀─select_first_address_suggestion─ ResultsShown
//! ```

use async_trait::async_trait;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::config::SuiteConfig;
use crate::driver::PageDriver;
use crate::interactor::ElementInteractor;
use crate::pages::{OrderPageLocators, PageObject};
use crate::result::{ProbeError, ProbeResult};

/// Prompt shown while delivery is selected and no address is set
pub const DELIVERY_PROMPT_MESSAGE: &str = "Please enter your delivery address.";

/// Timeout for the prompt-message probes
pub const PROMPT_MESSAGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Classes marking the selected switcher option
const SELECTED_OPTION_CLASSES: [&str; 2] = ["border-orange", "shadow-xl"];

/// How the order is fulfilled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceType {
    /// Courier delivery to an address
    Delivery,
    /// Customer pickup
    Takeout,
}

impl fmt::Display for ServiceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Delivery => write!(f, "delivery"),
            Self::Takeout => write!(f, "takeout"),
        }
    }
}

impl FromStr for ServiceType {
    type Err = ProbeError;

    fn from_str(s: &str) -> ProbeResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "delivery" => Ok(Self::Delivery),
            "takeout" => Ok(Self::Takeout),
            _ => Err(ProbeError::UnsupportedServiceType {
                option: s.to_string(),
            }),
        }
    }
}

/// The online order page
#[derive(Debug)]
pub struct OrderPage<P: PageDriver + ?Sized = dyn PageDriver> {
    ui: ElementInteractor<P>,
    locators: OrderPageLocators,
}

impl<P: PageDriver + ?Sized> OrderPage<P> {
    /// Create the page object
    #[must_use]
    pub fn new(page: Arc<P>, config: Arc<SuiteConfig>) -> Self {
        Self {
            ui: ElementInteractor::new(page, config),
            locators: OrderPageLocators::default(),
        }
    }

    /// Locator set
    #[must_use]
    pub const fn locators(&self) -> &OrderPageLocators {
        &self.locators
    }

    // =========================================================================
    // HEADER
    // =========================================================================

    /// Restaurant branch name
    pub async fn restaurant_name(&self) -> ProbeResult<String> {
        self.ui.get_text(&self.locators.restaurant_heading).await
    }

    /// Branch street address
    pub async fn branch_address_text(&self) -> ProbeResult<String> {
        self.ui.get_text(&self.locators.branch_address).await
    }

    /// Text of the delivery indicator
    pub async fn delivery_prompt_text(&self) -> ProbeResult<String> {
        self.ui.get_text(&self.locators.delivery_prompt).await
    }

    /// Whether the delivery indicator shows up
    pub async fn is_delivery_prompt_visible(&self) -> bool {
        self.ui.is_visible(&self.locators.delivery_prompt, None).await
    }

    /// Whether the menu category bar shows up
    pub async fn is_menu_navigation_visible(&self) -> bool {
        self.ui.is_visible(&self.locators.menu_navigation, None).await
    }

    /// Whether the indicator shows [`DELIVERY_PROMPT_MESSAGE`] within 5 s
    pub async fn is_delivery_prompt_message_visible(&self) -> bool {
        self.ui
            .wait_text_contains(
                &self.locators.delivery_prompt,
                DELIVERY_PROMPT_MESSAGE,
                Some(PROMPT_MESSAGE_TIMEOUT),
            )
            .await
            .is_ok()
    }

    /// Whether the indicator drops [`DELIVERY_PROMPT_MESSAGE`] within 5 s
    pub async fn is_delivery_prompt_message_hidden(&self) -> bool {
        self.ui
            .wait_text_not_contains(
                &self.locators.delivery_prompt,
                DELIVERY_PROMPT_MESSAGE,
                Some(PROMPT_MESSAGE_TIMEOUT),
            )
            .await
            .is_ok()
    }

    // =========================================================================
    // SERVICE SWITCHER
    // =========================================================================

    /// Whether the delivery/takeout switcher shows up
    pub async fn is_switcher_button_visible(&self) -> bool {
        self.ui.is_visible(&self.locators.service_switcher, None).await
    }

    /// Whether both switcher options show up
    pub async fn are_switcher_options_visible(&self) -> bool {
        self.ui.is_visible(&self.locators.delivery_button, None).await
            && self.ui.is_visible(&self.locators.takeout_button, None).await
    }

    /// Switch service type and wait for the prompt to confirm it
    ///
    /// Delivery waits for [`DELIVERY_PROMPT_MESSAGE`] to appear; takeout
    /// waits for it to go away. An unknown option fails before any click.
    pub async fn select_service_type(&self, option: &str) -> ProbeResult<ServiceType> {
        let service: ServiceType = option.parse()?;
        tracing::info!(%service, "select service type");
        match service {
            ServiceType::Delivery => {
                self.ui.click(&self.locators.delivery_button, None).await?;
                self.ui
                    .wait_text_contains(&self.locators.delivery_prompt, DELIVERY_PROMPT_MESSAGE, None)
                    .await?;
            }
            ServiceType::Takeout => {
                self.ui.click(&self.locators.takeout_button, None).await?;
                self.ui
                    .wait_text_not_contains(
                        &self.locators.delivery_prompt,
                        DELIVERY_PROMPT_MESSAGE,
                        None,
                    )
                    .await?;
            }
        }
        Ok(service)
    }

    /// Whether the delivery option carries a selected-style class
    pub async fn is_delivery_option_selected(&self) -> bool {
        match self.ui.attribute(&self.locators.delivery_button, "class").await {
            Ok(Some(classes)) => SELECTED_OPTION_CLASSES.iter().any(|c| classes.contains(c)),
            _ => false,
        }
    }

    // =========================================================================
    // ADDRESS PICKER
    // =========================================================================

    /// Closed → Open
    pub async fn open_address_picker(&self) -> ProbeResult<()> {
        if !self.ui.wait_clickable(&self.locators.address_picker_trigger, None).await {
            tracing::debug!(locator = %self.locators.address_picker_trigger, "not clickable yet, clicking anyway");
        }
        self.ui.click(&self.locators.address_picker_trigger, None).await?;
        self.ui
            .wait_visible(&self.locators.address_picker_modal, None)
            .await?;
        Ok(())
    }

    /// Open → Searching
    pub async fn input_postal_code(&self, postal_code: &str) -> ProbeResult<()> {
        self.ui
            .wait_visible(&self.locators.address_search_input, None)
            .await?;
        self.ui
            .set_text(&self.locators.address_search_input, postal_code)
            .await
    }

    /// Searching → ResultsShown
    pub async fn wait_for_postal_code_results(&self) -> ProbeResult<()> {
        self.ui
            .wait_visible(&self.locators.address_suggestions, None)
            .await?;
        Ok(())
    }

    /// Trimmed text of the first suggestion
    pub async fn first_address_suggestion_text(&self) -> ProbeResult<String> {
        let text = self.ui.first_text(&self.locators.address_suggestions).await?;
        Ok(text.trim().to_string())
    }

    /// Click the first suggestion
    pub async fn select_first_address_suggestion(&self) -> ProbeResult<()> {
        let first = self.locators.address_suggestions.clone().first();
        if self.ui.count(&first).await? == 0 {
            return Err(ProbeError::ElementNotFound {
                locator: first.to_string(),
            });
        }
        self.ui.click(&first, None).await
    }

    /// ResultsShown → Closed-with-address; done once the modal disappears
    pub async fn confirm_selected_address(&self) -> ProbeResult<()> {
        if !self.ui.wait_clickable(&self.locators.address_confirm_button, None).await {
            tracing::debug!(locator = %self.locators.address_confirm_button, "not clickable yet, clicking anyway");
        }
        self.ui.click(&self.locators.address_confirm_button, None).await?;
        self.ui
            .wait_disappears(&self.locators.address_picker_modal, None)
            .await?;
        Ok(())
    }

    /// Clear the address search field with its clear button
    pub async fn clear_address_search(&self) -> ProbeResult<()> {
        self.ui.click(&self.locators.address_clear_button, None).await?;
        self.ui
            .wait_visible(&self.locators.address_search_input, None)
            .await?;
        Ok(())
    }

    /// Confirmed delivery address
    pub async fn current_delivery_address(&self) -> ProbeResult<String> {
        self.ui.get_text(&self.locators.delivery_address_text).await
    }

    /// Whether the "Edit" affordance shows up
    pub async fn is_address_edit_option_visible(&self) -> bool {
        self.ui.is_visible(&self.locators.address_edit_text, None).await
    }
}

#[async_trait]
impl<P: PageDriver + ?Sized> PageObject for OrderPage<P> {
    type Driver = P;

    fn path(&self) -> &str {
        ""
    }

    fn page_name(&self) -> &str {
        "order"
    }

    fn interactor(&self) -> &ElementInteractor<P> {
        &self.ui
    }

    /// Heading, delivery indicator and menu bar are all visible
    async fn wait_for_page_loaded(&self) -> ProbeResult<()> {
        self.ui
            .wait_visible(&self.locators.restaurant_heading, None)
            .await?;
        self.ui
            .wait_visible(&self.locators.delivery_prompt, None)
            .await?;
        self.ui
            .wait_visible(&self.locators.menu_navigation, None)
            .await?;
        Ok(())
    }

    /// Navigate to the configured order page URL
    async fn open(&self) -> ProbeResult<()> {
        let url = self.ui.config().order_page_url();
        tracing::info!(page = self.page_name(), %url, "open page");
        self.ui.navigate(&url).await?;
        self.wait_for_page_loaded().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::locator::ElementHandle;
    use crate::mock::{MockElement, MockPage};

    fn order_page(page: &Arc<MockPage>) -> OrderPage<MockPage> {
        let config = SuiteConfig::default()
            .with_default_timeout(Duration::from_secs(3))
            .with_order_page_url("https://order.test/golden-dragon");
        OrderPage::new(Arc::clone(page), Arc::new(config))
    }

    fn insert(page: &MockPage, handle: &ElementHandle, element: MockElement) {
        page.insert(handle.selector().clone(), element);
    }

    mod service_type_tests {
        use super::*;

        #[test]
        fn test_parse_trims_and_ignores_case() {
            assert_eq!(" Delivery ".parse::<ServiceType>().unwrap(), ServiceType::Delivery);
            assert_eq!("TAKEOUT".parse::<ServiceType>().unwrap(), ServiceType::Takeout);
            assert!(matches!(
                "dine-in".parse::<ServiceType>(),
                Err(ProbeError::UnsupportedServiceType { ref option }) if option == "dine-in"
            ));
        }

        #[tokio::test(start_paused = true)]
        async fn test_invalid_option_clicks_nothing() {
            let page = Arc::new(MockPage::new());
            let order = order_page(&page);
            let err = order.select_service_type("invalid").await.unwrap_err();
            assert!(matches!(err, ProbeError::UnsupportedServiceType { .. }));
            assert!(!page.was_called("click:"));
        }

        #[tokio::test(start_paused = true)]
        async fn test_delivery_then_takeout_postconditions() {
            let page = Arc::new(MockPage::new());
            let order = order_page(&page);
            let l = order.locators().clone();
            insert(&page, &l.delivery_prompt, MockElement::new().with_text("Pickup"));
            insert(&page, &l.delivery_button, MockElement::new());
            insert(&page, &l.takeout_button, MockElement::new());
            let prompt = l.delivery_prompt.selector().clone();
            let delivery_prompt = prompt.clone();
            page.update(|site| {
                site.on_click(l.delivery_button.selector().clone(), move |site| {
                    let prompt = delivery_prompt.clone();
                    site.after(Duration::from_millis(700), move |site| {
                        site.set_text(&prompt, DELIVERY_PROMPT_MESSAGE);
                    });
                });
                site.on_click(l.takeout_button.selector().clone(), move |site| {
                    site.set_text(&prompt, "Pickup at 12:30");
                });
            });

            assert_eq!(order.select_service_type("delivery").await.unwrap(), ServiceType::Delivery);
            assert!(order.delivery_prompt_text().await.unwrap().contains(DELIVERY_PROMPT_MESSAGE));
            assert!(order.is_delivery_prompt_message_visible().await);

            assert_eq!(order.select_service_type("takeout").await.unwrap(), ServiceType::Takeout);
            assert!(!order.delivery_prompt_text().await.unwrap().contains(DELIVERY_PROMPT_MESSAGE));
            assert!(order.is_delivery_prompt_message_hidden().await);
        }

        #[tokio::test(start_paused = true)]
        async fn test_delivery_option_selected_by_class() {
            let page = Arc::new(MockPage::new());
            let order = order_page(&page);
            assert!(!order.is_delivery_option_selected().await);
            insert(
                &page,
                &order.locators().delivery_button,
                MockElement::new().with_attribute("class", "rounded shadow-xl"),
            );
            assert!(order.is_delivery_option_selected().await);
        }
    }

    mod load_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_open_uses_order_page_url_and_waits_for_header() {
            let page = Arc::new(MockPage::new());
            let order = order_page(&page);
            let l = order.locators().clone();
            page.update(|site| {
                site.on_navigate(move |site, _| {
                    site.insert(l.restaurant_heading.selector().clone(), MockElement::new().with_text("Golden Dragon"));
                    site.insert(l.delivery_prompt.selector().clone(), MockElement::new());
                    let nav = l.menu_navigation.selector().clone();
                    site.after(Duration::from_secs(1), move |site| site.insert(nav, MockElement::new()));
                });
            });
            order.open().await.unwrap();
            assert!(page.was_called("goto:https://order.test/golden-dragon"));
            assert!(order.is_menu_navigation_visible().await);
            assert_eq!(order.restaurant_name().await.unwrap(), "Golden Dragon");
        }

        #[tokio::test(start_paused = true)]
        async fn test_open_fails_without_menu() {
            let page = Arc::new(MockPage::new());
            let order = order_page(&page);
            let err = order.open().await.unwrap_err();
            assert!(matches!(err, ProbeError::ElementNotVisible { .. }));
        }
    }

    mod picker_tests {
        use super::*;

        #[tokio::test(start_paused = true)]
        async fn test_suggestion_errors_on_empty_list() {
            let page = Arc::new(MockPage::new());
            let order = order_page(&page);
            assert!(matches!(
                order.first_address_suggestion_text().await,
                Err(ProbeError::ElementNotFound { .. })
            ));
            assert!(matches!(
                order.select_first_address_suggestion().await,
                Err(ProbeError::ElementNotFound { .. })
            ));
        }

        #[tokio::test(start_paused = true)]
        async fn test_suggestion_text_is_trimmed() {
            let page = Arc::new(MockPage::new());
            let order = order_page(&page);
            let items = order.locators().address_suggestions.selector().clone();
            page.update(|site| {
                site.push(items.clone(), MockElement::new().with_text("  1 King St W, Toronto, ON M5V 2T6 \n"));
                site.push(items, MockElement::new().with_text("2 King St W"));
            });
            assert_eq!(
                order.first_address_suggestion_text().await.unwrap(),
                "1 King St W, Toronto, ON M5V 2T6"
            );
        }

        #[tokio::test(start_paused = true)]
        async fn test_clear_address_search() {
            let page = Arc::new(MockPage::new());
            let order = order_page(&page);
            let l = order.locators().clone();
            insert(&page, &l.address_search_input, MockElement::new().with_value("M5V"));
            insert(&page, &l.address_clear_button, MockElement::new());
            let input = l.address_search_input.selector().clone();
            page.update(|site| {
                site.on_click(l.address_clear_button.selector().clone(), move |site| {
                    if let Some(el) = site.element_mut(&input) {
                        el.value.clear();
                    }
                });
            });
            order.clear_address_search().await.unwrap();
            assert_eq!(page.element(l.address_search_input.selector()).unwrap().value, "");
        }
    }
}
