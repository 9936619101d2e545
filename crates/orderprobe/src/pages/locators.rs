//! Named locator sets

use crate::locator::{ElementHandle, Selector};

fn css(selector: &str) -> ElementHandle {
    ElementHandle::new(Selector::css(selector))
}

/// Elements of the landing page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomePageLocators {
    /// "SERVICES" navigation link
    pub services_link: ElementHandle,
    /// Logo in the page header
    pub header_logo: ElementHandle,
}

impl Default for HomePageLocators {
    fn default() -> Self {
        Self {
            services_link: ElementHandle::new(Selector::role("link", Some("SERVICES"))),
            header_logo: css("[data-testid=\"header-logo\"]"),
        }
    }
}

/// Elements of the online order page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderPageLocators {
    /// Restaurant branch name
    pub restaurant_heading: ElementHandle,
    /// Indicator showing the delivery prompt or the chosen address
    pub delivery_prompt: ElementHandle,
    /// Branch street address
    pub branch_address: ElementHandle,
    /// Menu category bar
    pub menu_navigation: ElementHandle,
    /// Delivery/takeout switcher
    pub service_switcher: ElementHandle,
    /// Delivery option in the switcher
    pub delivery_button: ElementHandle,
    /// Takeout option in the switcher
    pub takeout_button: ElementHandle,
    /// Opens the address and time picker
    pub address_picker_trigger: ElementHandle,
    /// Address and time picker dialog
    pub address_picker_modal: ElementHandle,
    /// Clears the address search
    pub address_clear_button: ElementHandle,
    /// Street address search field
    pub address_search_input: ElementHandle,
    /// Address search suggestions
    pub address_suggestions: ElementHandle,
    /// Confirms the picked address and time
    pub address_confirm_button: ElementHandle,
    /// Confirmed delivery address
    pub delivery_address_text: ElementHandle,
    /// "Edit" affordance inside the indicator
    pub address_edit_text: ElementHandle,
}

impl Default for OrderPageLocators {
    fn default() -> Self {
        Self {
            restaurant_heading: css("[data-cy=\"branch-name-order-page\"]"),
            delivery_prompt: css("[data-testid=\"GeneralIndicator\"]"),
            branch_address: css("[data-cy=\"branch-address-order-page\"]"),
            menu_navigation: css("#category-navbar"),
            service_switcher: css("[data-cy=\"online-order-switch\"]"),
            delivery_button: css("[data-cy=\"bt-delivery\"]"),
            takeout_button: css("[data-cy=\"bt-takeout\"]"),
            address_picker_trigger: css("[data-cy=\"go-to-address-and-date-picker\"]"),
            address_picker_modal: css("[class*=\"AddressTimePicker__Picker\"]"),
            address_clear_button: css("[data-cy=\"address-clear-button\"]"),
            address_search_input: css(
                "input[placeholder=\"Please ONLY enter the street address.\"]",
            ),
            address_suggestions: css(
                "[class*=\"AddressTimePicker__AddressPickerBlock\"] li.cursor-pointer",
            ),
            address_confirm_button: css("[data-cy=\"bt-confirm-date-address\"]"),
            delivery_address_text: css("[data-cy=\"delivery-address-order-page\"]"),
            address_edit_text: css(
                "[data-testid=\"GeneralIndicator\"] span[data-i18n-key=\"takeoutOrderPage.edit\"]",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_services_link_is_role_lookup() {
        let locators = HomePageLocators::default();
        assert_eq!(
            locators.services_link.selector(),
            &Selector::role("link", Some("SERVICES"))
        );
    }

    #[test]
    fn test_order_locators_are_distinct() {
        let l = OrderPageLocators::default();
        let all = [
            &l.restaurant_heading,
            &l.delivery_prompt,
            &l.branch_address,
            &l.menu_navigation,
            &l.service_switcher,
            &l.delivery_button,
            &l.takeout_button,
            &l.address_picker_trigger,
            &l.address_picker_modal,
            &l.address_clear_button,
            &l.address_search_input,
            &l.address_suggestions,
            &l.address_confirm_button,
            &l.delivery_address_text,
            &l.address_edit_text,
        ];
        let unique: std::collections::HashSet<_> = all.iter().collect();
        assert_eq!(unique.len(), all.len());
    }
}
