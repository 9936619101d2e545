//! Cucumber step bindings for the order page
//!
//! [`OrderWorld`] carries one scenario's page and [`ScenarioContext`]. Pages
//! come from a [`PageProvider`] in the before-hook and are closed in the
//! after-hook; [`run_features`] wires both hooks and runs scenarios one at a
//! time.

use cucumber::{given, then, when, writer, StatsWriter as _, World, WriterExt};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::SuiteConfig;
use crate::context::{keys, ScenarioContext};
use crate::driver::{PageDriver, PageProvider};
use crate::pages::{OrderPage, PageObject, DELIVERY_PROMPT_MESSAGE};
use crate::result::{ensure, ProbeError, ProbeResult};

// =============================================================================
// WORLD
// =============================================================================

/// Per-scenario state
#[derive(Debug, Default, World)]
pub struct OrderWorld {
    page: Option<Arc<dyn PageDriver>>,
    order: Option<OrderPage>,
    context: ScenarioContext,
    setup_error: Option<String>,
}

impl OrderWorld {
    /// Acquire a page for the scenario
    ///
    /// A provider failure is kept and reported by the first step that needs
    /// the page.
    pub async fn start(&mut self, config: Arc<SuiteConfig>, provider: Arc<dyn PageProvider>) {
        match provider.acquire(&config).await {
            Ok(page) => {
                self.order = Some(OrderPage::new(Arc::clone(&page), config));
                self.page = Some(page);
            }
            Err(e) => {
                warn!(error = %e, "page setup failed");
                self.setup_error = Some(e.to_string());
            }
        }
    }

    /// Close the scenario's page
    pub async fn finish(&mut self) {
        self.order = None;
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                warn!(error = %e, "page close failed");
            }
        }
    }

    /// Order page bound to the scenario's page
    ///
    /// # Errors
    ///
    /// Returns `Driver` when no page was acquired.
    pub fn order(&self) -> ProbeResult<&OrderPage> {
        self.order.as_ref().ok_or_else(|| {
            ProbeError::driver(
                self.setup_error
                    .clone()
                    .unwrap_or_else(|| String::from("no page for this scenario")),
            )
        })
    }

    /// Values captured by earlier steps
    #[must_use]
    pub const fn context(&self) -> &ScenarioContext {
        &self.context
    }
}

// =============================================================================
// SCENARIO: open the order page
// =============================================================================

#[given("I open the Food Ordering company page")]
async fn open_order_page(world: &mut OrderWorld) -> ProbeResult<()> {
    world.order()?.open().await
}

#[then("the page should load successfully")]
async fn page_loaded(world: &mut OrderWorld) -> ProbeResult<()> {
    world.order()?.wait_for_page_loaded().await
}

#[then("the page should display the company's food ordering options and relevant information")]
async fn page_shows_restaurant_info(world: &mut OrderWorld) -> ProbeResult<()> {
    let order = world.order()?;
    ensure(
        !order.restaurant_name().await?.trim().is_empty(),
        "restaurant name heading is empty",
    )?;
    ensure(
        order.is_delivery_prompt_visible().await,
        "delivery prompt card is not visible",
    )?;
    ensure(
        order.is_menu_navigation_visible().await,
        "menu navigation is not visible",
    )?;
    ensure(
        !order.branch_address_text().await?.trim().is_empty(),
        "branch address text is empty",
    )
}

// =============================================================================
// SCENARIO: delivery/takeout switcher
// =============================================================================

#[given("I have opened the Food Ordering page")]
async fn have_opened_order_page(world: &mut OrderWorld) -> ProbeResult<()> {
    world.order()?.open().await
}

#[then("the Delivery/Takeout switcher should be visible")]
async fn switcher_visible(world: &mut OrderWorld) -> ProbeResult<()> {
    ensure(
        world.order()?.is_switcher_button_visible().await,
        "delivery/takeout switcher is not visible",
    )
}

#[then("the switcher should allow me to select my desired service type")]
async fn switcher_options_visible(world: &mut OrderWorld) -> ProbeResult<()> {
    ensure(
        world.order()?.are_switcher_options_visible().await,
        "switcher options are not visible",
    )
}

#[when(regex = r#"^I select "([^"]*)"$"#)]
async fn select_service(world: &mut OrderWorld, option: String) -> ProbeResult<()> {
    world.order()?.select_service_type(&option).await?;
    Ok(())
}

#[then("the delivery prompt message should be visible")]
async fn prompt_message_visible(world: &mut OrderWorld) -> ProbeResult<()> {
    ensure(
        world.order()?.is_delivery_prompt_message_visible().await,
        "delivery prompt message is not visible after selecting delivery",
    )
}

#[then("the delivery prompt message should not be visible")]
async fn prompt_message_hidden(world: &mut OrderWorld) -> ProbeResult<()> {
    ensure(
        world.order()?.is_delivery_prompt_message_hidden().await,
        "delivery prompt message is still visible after selecting takeout",
    )
}

// =============================================================================
// SCENARIO: postal code lookup and address confirmation
// =============================================================================

#[given(regex = r#"^I have selected "([^"]*)" option$"#)]
async fn have_selected_service(world: &mut OrderWorld, option: String) -> ProbeResult<()> {
    let order = world.order()?;
    order.open().await?;
    order.select_service_type(&option).await?;
    Ok(())
}

#[when("I click edit button at address picker")]
async fn open_picker(world: &mut OrderWorld) -> ProbeResult<()> {
    world.order()?.open_address_picker().await
}

#[when(regex = r#"^I input postal code "([^"]*)" at address picker$"#)]
async fn input_postal_code(world: &mut OrderWorld, postal_code: String) -> ProbeResult<()> {
    let order = world.order()?;
    order.input_postal_code(&postal_code).await?;
    order.wait_for_postal_code_results().await?;
    let suggestion = order.first_address_suggestion_text().await?;
    world.context.insert(keys::POSTAL_CODE, postal_code);
    world.context.insert(keys::SUGGESTION_TEXT, suggestion);
    Ok(())
}

#[then("the system should use the postal code to locate the place")]
async fn postal_code_located(world: &mut OrderWorld) -> ProbeResult<()> {
    let postal_code = world.context.require(keys::POSTAL_CODE)?;
    let suggestion = world.context.get_or_empty(keys::SUGGESTION_TEXT);
    ensure(
        suggestion.contains(postal_code),
        format!("postal code {postal_code:?} returned no matching suggestion (got {suggestion:?})"),
    )
}

#[when("I select the searched address and confirm address")]
async fn select_and_confirm(world: &mut OrderWorld) -> ProbeResult<()> {
    let order = world.order()?;
    let selected = order.first_address_suggestion_text().await?;
    order.select_first_address_suggestion().await?;
    order.confirm_selected_address().await?;
    world.context.insert(keys::SELECTED_ADDRESS_TEXT, selected);
    Ok(())
}

#[then("I should be able to successfully select and confirm the address")]
async fn address_confirmed(world: &mut OrderWorld) -> ProbeResult<()> {
    let current = world.order()?.current_delivery_address().await?;
    let selected = world.context.require(keys::SELECTED_ADDRESS_TEXT)?;
    let postal_code = world.context.get_or_empty(keys::POSTAL_CODE);
    let matches = current.contains(selected) || (!postal_code.is_empty() && current.contains(postal_code));
    ensure(
        matches,
        format!("confirmed address {current:?} does not match the selected suggestion {selected:?}"),
    )?;
    world.context.insert(keys::CONFIRMED_ADDRESS, current);
    Ok(())
}

#[then("the interface should reflect the chosen delivery address")]
async fn interface_reflects_address(world: &mut OrderWorld) -> ProbeResult<()> {
    let current = world.context.get_or_empty(keys::CONFIRMED_ADDRESS);
    ensure(
        !current.is_empty() && !current.contains(DELIVERY_PROMPT_MESSAGE),
        "the interface did not update with the confirmed delivery address",
    )
}

#[then(r#"an "Edit" option should be provided after confirming the address"#)]
async fn edit_option_visible(world: &mut OrderWorld) -> ProbeResult<()> {
    ensure(
        world.order()?.is_address_edit_option_visible().await,
        "edit option is not visible on the delivery address card",
    )
}

// =============================================================================
// RUNNER
// =============================================================================

/// Outcome of a feature run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Scenarios that passed
    pub passed: usize,
    /// Scenarios that failed
    pub failed: usize,
    /// Scenarios stopped at an unbound step
    pub skipped: usize,
    /// Feature files that failed to parse
    pub parsing_errors: usize,
    /// Before/after hooks that panicked
    pub hook_errors: usize,
}

impl RunSummary {
    /// Total scenarios executed
    #[must_use]
    pub const fn total(&self) -> usize {
        self.passed + self.failed + self.skipped
    }

    /// Whether every scenario passed
    ///
    /// A scenario skipped over an unbound step counts against the run.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.failed == 0 && self.skipped == 0 && self.parsing_errors == 0 && self.hook_errors == 0
    }
}

/// Whether a scenario carries `tag`, directly or through its feature
fn has_tag(feature: &cucumber::gherkin::Feature, scenario: &cucumber::gherkin::Scenario, tag: &str) -> bool {
    let tag = tag.trim_start_matches('@');
    feature.tags.iter().chain(scenario.tags.iter()).any(|t| t == tag)
}

/// Run the feature files under `features`, one scenario at a time
///
/// Each scenario gets a fresh page from `provider`. With `tag` set, only
/// scenarios carrying it (with or without the leading `@`) run.
///
/// # Errors
///
/// Returns `Config` when `features` does not exist. Scenario failures are
/// reported through the summary, not as an error.
pub async fn run_features(
    features: impl AsRef<Path>,
    config: Arc<SuiteConfig>,
    provider: Arc<dyn PageProvider>,
    tag: Option<String>,
) -> ProbeResult<RunSummary> {
    let features = features.as_ref();
    if !features.exists() {
        return Err(ProbeError::config(format!(
            "feature path {} does not exist",
            features.display()
        )));
    }
    info!(path = %features.display(), tag = ?tag, "running features");

    let writer = OrderWorld::cucumber()
        .max_concurrent_scenarios(1)
        .before(move |_feature, _rule, scenario, world| {
            let config = Arc::clone(&config);
            let provider = Arc::clone(&provider);
            Box::pin(async move {
                info!(scenario = %scenario.name, "scenario started");
                world.start(config, provider).await;
            })
        })
        .after(|_feature, _rule, scenario, _event, world| {
            Box::pin(async move {
                info!(scenario = %scenario.name, "scenario finished");
                if let Some(world) = world {
                    world.finish().await;
                }
            })
        })
        .with_writer(writer::Basic::stdout().summarized())
        .with_default_cli()
        .filter_run(features.to_path_buf(), move |feature, _rule, scenario| {
            tag.as_deref().map_or(true, |tag| has_tag(feature, scenario, tag))
        })
        .await;

    let scenarios = writer.scenarios_stats();
    let summary = RunSummary {
        passed: scenarios.passed,
        failed: scenarios.failed,
        skipped: scenarios.skipped,
        parsing_errors: writer.parsing_errors(),
        hook_errors: writer.hook_errors(),
    };
    info!(?summary, "feature run finished");
    Ok(summary)
}
