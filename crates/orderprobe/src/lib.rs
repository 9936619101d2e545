//! Orderprobe: page-object end-to-end suite for the food ordering front end
//!
//! Scenarios drive page objects, page objects drive an [`ElementInteractor`],
//! and the interactor resolves locators and talks to a [`PageDriver`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    ORDERPROBE Architecture                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │   ┌────────────┐    ┌────────────┐    ┌────────────┐            │
//! │   │ Feature    │    │ Page       │    │ Element    │            │
//! │   │ steps      │───►│ objects    │───►│ interactor │            │
//! │   │ (cucumber) │    │            │    │ + locators │            │
//! │   └────────────┘    └────────────┘    └─────┬──────┘            │
//! │                                             ▼                   │
//! │                          ┌──────────────────────────────┐       │
//! │                          │ PageDriver: CdpPage/MockPage │       │
//! │                          └──────────────────────────────┘       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use orderprobe::{MockPage, OrderPage, PageObject, SuiteConfig};
//!
//! # async fn run() -> orderprobe::ProbeResult<()> {
//! let config = Arc::new(SuiteConfig::from_env()?);
//! let order = OrderPage::new(Arc::new(MockPage::new()), config);
//! order.open().await?;
//! order.select_service_type("delivery").await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
// Lints are configured in workspace Cargo.toml [workspace.lints.clippy]

mod result;

/// Locator descriptions and their resolution into element handles
#[allow(clippy::must_use_candidate)]
pub mod locator;

/// Load states, element states and the polling loop
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation
)]
pub mod wait;

/// The page driver seam
#[allow(clippy::missing_errors_doc)]
pub mod driver;

/// Scripted in-memory page
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::type_complexity
)]
pub mod mock;

/// Device emulation profiles
pub mod device;

/// Layered suite configuration
#[allow(clippy::missing_errors_doc, clippy::doc_markdown)]
pub mod config;

/// Tracing subscriber setup
pub mod logging;

/// Bounded wait/click/type/read operations
#[allow(
    clippy::missing_errors_doc,
    clippy::must_use_candidate,
    clippy::cast_possible_truncation
)]
pub mod interactor;

/// Page objects for the site
#[allow(clippy::missing_errors_doc, clippy::must_use_candidate)]
pub mod pages;

/// Values passed between steps of one scenario
pub mod context;

/// Cucumber world, steps and feature runner
#[cfg(feature = "bdd")]
#[allow(clippy::missing_errors_doc, clippy::needless_pass_by_value)]
pub mod steps;

/// Chromium driver over CDP
#[cfg(feature = "browser")]
pub mod browser;

pub use config::{BrowserKind, ConfigFile, ConfigSummary, Environment, SuiteConfig};
pub use context::ScenarioContext;
pub use device::{DeviceProfile, Viewport, DEVICE_NAMES};
pub use driver::{PageDriver, PageProvider, PNG_SIGNATURE};
pub use interactor::ElementInteractor;
pub use locator::{resolve, ElementHandle, LocatorDescription, Selector};
pub use logging::{init_logging, init_logging_with, LogFormat};
pub use mock::{MockElement, MockPage, MockSite};
pub use pages::{HomePage, OrderPage, PageObject, ServiceType};
pub use result::{ensure, ProbeError, ProbeResult, TextExpectation};
pub use wait::{poll_until, ElementState, LoadState, WaitCondition, WaitOptions, WaitResult};

#[cfg(feature = "bdd")]
pub use steps::{run_features, OrderWorld, RunSummary};

#[cfg(feature = "browser")]
pub use browser::{Browser, BrowserPageProvider, CdpPage};
