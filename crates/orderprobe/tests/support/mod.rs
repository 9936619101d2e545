//! Scripted order site shared by the integration tests
//!
//! Renders the order page on navigation and reacts to the switcher, the
//! address picker and the postal code search with short delays, the way the
//! live front end does.

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use orderprobe::pages::{OrderPageLocators, DELIVERY_PROMPT_MESSAGE};
use orderprobe::{MockElement, MockPage, MockSite, PageDriver, PageProvider, ProbeResult, SuiteConfig};

pub const ORDER_URL: &str = "https://order.test/golden-dragon";
pub const RESTAURANT: &str = "Golden Dragon";
pub const BRANCH_ADDRESS: &str = "88 Spadina Ave, Toronto, ON M5T 2C2";
pub const POSTAL_CODE: &str = "M5V 2T6";
pub const FIRST_ADDRESS: &str = "1 King St W, Toronto, ON M5V 2T6";
pub const SECOND_ADDRESS: &str = "2 King St W, Toronto, ON M5V 2T6";

const SELECTED_CLASS: &str = "rounded border-orange shadow-xl";
const IDLE_CLASS: &str = "rounded border-gray";
const REACTION: Duration = Duration::from_millis(300);

/// Short timeouts so failures surface quickly
pub fn config() -> SuiteConfig {
    SuiteConfig::default()
        .with_default_timeout(Duration::from_secs(3))
        .with_poll_frequency(Duration::from_millis(50))
        .with_order_page_url(ORDER_URL)
}

/// Site rendering the order page on every navigation
pub fn order_site() -> MockSite {
    let mut site = MockSite::new();
    site.on_navigate(|site, _url| render(site));
    site
}

/// Page wired to [`order_site`]
pub fn order_page() -> Arc<MockPage> {
    Arc::new(MockPage::with_site(order_site()))
}

fn render(site: &mut MockSite) {
    let l = OrderPageLocators::default();
    site.clear_elements();
    site.insert(l.restaurant_heading.selector().clone(), MockElement::new().with_text(RESTAURANT));
    site.insert(l.branch_address.selector().clone(), MockElement::new().with_text(BRANCH_ADDRESS));
    site.insert(
        l.delivery_prompt.selector().clone(),
        MockElement::new().with_text(DELIVERY_PROMPT_MESSAGE),
    );
    site.insert(l.service_switcher.selector().clone(), MockElement::new());
    site.insert(
        l.delivery_button.selector().clone(),
        MockElement::new().with_text("Delivery").with_attribute("class", SELECTED_CLASS),
    );
    site.insert(
        l.takeout_button.selector().clone(),
        MockElement::new().with_text("Takeout").with_attribute("class", IDLE_CLASS),
    );
    site.insert(l.address_picker_trigger.selector().clone(), MockElement::new().with_text("Edit"));

    // Menu bar renders after the header
    let menu = l.menu_navigation.selector().clone();
    site.after(Duration::from_millis(400), move |site| {
        site.insert(menu, MockElement::new().with_text("Appetizers Mains Desserts"));
    });

    wire_switcher(site, &l);
    wire_picker(site, &l);
}

fn wire_switcher(site: &mut MockSite, l: &OrderPageLocators) {
    let prompt = l.delivery_prompt.selector().clone();
    let delivery = l.delivery_button.selector().clone();
    let takeout = l.takeout_button.selector().clone();

    let (p, d, t) = (prompt.clone(), delivery.clone(), takeout.clone());
    site.on_click(delivery.clone(), move |site| {
        site.set_attribute(&d, "class", Some(SELECTED_CLASS));
        site.set_attribute(&t, "class", Some(IDLE_CLASS));
        let p = p.clone();
        site.after(REACTION, move |site| site.set_text(&p, DELIVERY_PROMPT_MESSAGE));
    });

    site.on_click(takeout.clone(), move |site| {
        site.set_attribute(&delivery, "class", Some(IDLE_CLASS));
        site.set_attribute(&takeout, "class", Some(SELECTED_CLASS));
        let prompt = prompt.clone();
        site.after(REACTION, move |site| {
            site.set_text(&prompt, format!("Pickup at {BRANCH_ADDRESS}"));
        });
    });
}

fn wire_picker(site: &mut MockSite, l: &OrderPageLocators) {
    let l = l.clone();

    let picker = l.clone();
    site.on_click(l.address_picker_trigger.selector().clone(), move |site| {
        let l = picker.clone();
        site.after(Duration::from_millis(200), move |site| {
            site.insert(l.address_picker_modal.selector().clone(), MockElement::new());
            site.insert(l.address_search_input.selector().clone(), MockElement::new());
            site.insert(l.address_clear_button.selector().clone(), MockElement::new());
            site.insert(
                l.address_confirm_button.selector().clone(),
                MockElement::new().with_text("Confirm").disabled(),
            );
        });
    });

    let search = l.clone();
    site.on_fill(l.address_search_input.selector().clone(), move |site, value| {
        let suggestions = search.address_suggestions.selector().clone();
        site.remove(&suggestions);
        if value.trim().is_empty() {
            return;
        }
        let matches: Vec<&str> = [FIRST_ADDRESS, SECOND_ADDRESS]
            .into_iter()
            .filter(|a| a.contains(value.trim()))
            .collect();
        let texts: Vec<String> = matches.iter().map(|a| format!("  {a}\n")).collect();
        site.after(Duration::from_millis(500), move |site| {
            for text in texts {
                site.push(suggestions.clone(), MockElement::new().with_text(text));
            }
        });
    });

    let select = l.clone();
    site.on_click(l.address_suggestions.selector().clone(), move |site| {
        let chosen = site
            .element(select.address_suggestions.selector())
            .map(|e| e.text.trim().to_string())
            .unwrap_or_default();
        let confirm = select.address_confirm_button.selector();
        site.set_attribute(confirm, "disabled", None);
        site.set_attribute(confirm, "data-address", Some(&chosen));
    });

    let confirm = l.clone();
    site.on_click(l.address_confirm_button.selector().clone(), move |site| {
        let address = site
            .element(confirm.address_confirm_button.selector())
            .and_then(|e| e.attributes.get("data-address").cloned())
            .unwrap_or_default();
        let l = confirm.clone();
        site.after(REACTION, move |site| {
            for gone in [
                &l.address_picker_modal,
                &l.address_search_input,
                &l.address_clear_button,
                &l.address_suggestions,
                &l.address_confirm_button,
            ] {
                site.remove(gone.selector());
            }
            site.set_text(l.delivery_prompt.selector(), address.clone());
            site.insert(l.delivery_address_text.selector().clone(), MockElement::new().with_text(address));
            site.insert(l.address_edit_text.selector().clone(), MockElement::new().with_text("Edit"));
        });
    });

    let clear = l;
    site.on_click(clear.address_clear_button.selector().clone(), move |site| {
        if let Some(input) = site.element_mut(clear.address_search_input.selector()) {
            input.value.clear();
        }
        site.remove(clear.address_suggestions.selector());
    });
}

/// Hands out scripted pages and remembers them
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    pages: Mutex<Vec<Arc<MockPage>>>,
}

impl ScriptedProvider {
    /// Pages handed out so far
    pub fn pages(&self) -> Vec<Arc<MockPage>> {
        self.pages.lock().unwrap().clone()
    }
}

#[async_trait]
impl PageProvider for ScriptedProvider {
    async fn acquire(&self, _config: &SuiteConfig) -> ProbeResult<Arc<dyn PageDriver>> {
        let page = order_page();
        self.pages.lock().unwrap().push(Arc::clone(&page));
        Ok(page)
    }
}
