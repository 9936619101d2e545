//! Order page scenarios through the cucumber runner
//!
//! Run with: cargo test --test order_page_bdd
//!
//! Drives `features/order_page.feature` against the scripted order site, one
//! fresh page per scenario.

mod support;

use std::sync::Arc;

use orderprobe::{init_logging, run_features, PageDriver};
use support::ScriptedProvider;

const FEATURES: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/features");

#[tokio::main]
async fn main() {
    let config = Arc::new(support::config());
    init_logging(&config);

    let provider = Arc::new(ScriptedProvider::default());
    let summary = run_features(FEATURES, Arc::clone(&config), provider.clone(), None)
        .await
        .expect("feature directory should exist");

    assert!(summary.is_success(), "scenarios failed: {summary:?}");
    assert_eq!(summary.passed, 3, "unexpected summary: {summary:?}");
    assert_eq!(summary.skipped, 0, "unbound or skipped steps: {summary:?}");

    let pages = provider.pages();
    assert_eq!(pages.len(), 3, "one page per scenario");
    for page in pages {
        assert!(page.is_closed(), "page left open after its scenario");
        assert!(page.current_url().await.is_err());
    }

    // Tag filter: only the page-load scenario
    let provider = Arc::new(ScriptedProvider::default());
    let summary = run_features(
        FEATURES,
        config,
        provider.clone(),
        Some(String::from("@successful_order_page_load")),
    )
    .await
    .expect("feature directory should exist");
    assert_eq!(summary.passed, 1, "tag filter ran: {summary:?}");
    assert_eq!(provider.pages().len(), 1);
}
