//! Chromium page driver over CDP
//!
//! [`CdpPage`] implements [`PageDriver`] by evaluating each selector's DOM
//! query in the page. Element waits poll through [`poll_until`]; clicks wait
//! for the element to be attached, visible, enabled, stable across two polls
//! and hit at its centre before the mouse is pressed there.
//!
//! Only chromium is driven. `chrome` maps onto it; firefox, webkit and safari
//! are rejected at launch.

#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::significant_drop_tightening,
    clippy::missing_errors_doc
)]

use async_trait::async_trait;
use chromiumoxide::browser::{Browser as CdpBrowser, BrowserConfig as CdpConfig};
use chromiumoxide::cdp::browser_protocol::emulation::{
    SetDeviceMetricsOverrideParams, SetTouchEmulationEnabledParams,
};
use chromiumoxide::cdp::browser_protocol::network::SetUserAgentOverrideParams;
use chromiumoxide::cdp::browser_protocol::page::{CaptureScreenshotFormat, CaptureScreenshotParams};
use chromiumoxide::layout::Point;
use chromiumoxide::page::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

use crate::config::{BrowserKind, SuiteConfig};
use crate::device::DeviceProfile;
use crate::driver::{PageDriver, PageProvider};
use crate::locator::{ElementHandle, Selector};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{poll_until, ElementState, LoadState, WaitOptions};

/// Poll interval for element and load-state waits inside the browser
pub const CDP_POLL_INTERVAL_MS: u64 = 100;

fn driver_error(e: impl std::fmt::Display) -> ProbeError {
    ProbeError::driver(e.to_string())
}

fn launch_error(e: impl std::fmt::Display) -> ProbeError {
    ProbeError::BrowserLaunch {
        message: e.to_string(),
    }
}

// =============================================================================
// BROWSER
// =============================================================================

/// A launched chromium process and its CDP event loop
#[derive(Debug)]
pub struct Browser {
    inner: CdpBrowser,
    handle: tokio::task::JoinHandle<()>,
}

impl Browser {
    /// Launch chromium for the configured browser kind and device
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedBrowser` for non-chromium engines and
    /// `BrowserLaunch` when the process fails to start.
    pub async fn launch(config: &SuiteConfig, device: &DeviceProfile) -> ProbeResult<Self> {
        if config.browser.engine() != BrowserKind::Chromium {
            return Err(ProbeError::UnsupportedBrowser {
                browser: config.browser.to_string(),
            });
        }

        let mut builder = CdpConfig::builder()
            .window_size(device.viewport.width, device.viewport.height)
            .request_timeout(config.default_timeout);
        if !config.headless {
            builder = builder.with_head();
        }
        let cdp_config = builder.build().map_err(launch_error)?;

        let (inner, mut handler) = CdpBrowser::launch(cdp_config).await.map_err(launch_error)?;
        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });
        tracing::info!(
            browser = %config.browser,
            headless = config.headless,
            device = %device.name,
            "browser launched"
        );
        Ok(Self { inner, handle })
    }

    /// Open a blank page emulating `device`; the page owns the browser
    ///
    /// # Errors
    ///
    /// Returns `Driver` when the page cannot be created or emulation fails.
    pub async fn open_page(self, device: &DeviceProfile) -> ProbeResult<CdpPage> {
        let page = self.inner.new_page("about:blank").await.map_err(driver_error)?;
        emulate(&page, device).await?;
        Ok(CdpPage {
            page,
            browser: tokio::sync::Mutex::new(Some(self)),
            closed: AtomicBool::new(false),
        })
    }

    /// Close the browser process
    pub async fn close(mut self) -> ProbeResult<()> {
        let closed = self.inner.close().await.map(|_| ()).map_err(driver_error);
        self.handle.abort();
        closed
    }
}

async fn emulate(page: &Page, device: &DeviceProfile) -> ProbeResult<()> {
    let metrics = SetDeviceMetricsOverrideParams::builder()
        .width(i64::from(device.viewport.width))
        .height(i64::from(device.viewport.height))
        .device_scale_factor(device.device_scale_factor)
        .mobile(device.is_mobile)
        .build()
        .map_err(driver_error)?;
    page.execute(metrics).await.map_err(driver_error)?;
    page.execute(SetTouchEmulationEnabledParams::new(device.has_touch()))
        .await
        .map_err(driver_error)?;
    if !device.user_agent.is_empty() {
        page.execute(SetUserAgentOverrideParams::new(device.user_agent.clone()))
            .await
            .map_err(driver_error)?;
    }
    Ok(())
}

// =============================================================================
// SCRIPTS
// =============================================================================

/// Script returning `"detached"`, `"hidden"` or `"visible"`
fn presence_script(selector: &Selector) -> String {
    format!(
        "(() => {{ const el = {}; \
         if (!el || !el.isConnected) return 'detached'; \
         const s = window.getComputedStyle(el); const r = el.getBoundingClientRect(); \
         return (r.width > 0 && r.height > 0 && s.visibility !== 'hidden' && s.display !== 'none') \
         ? 'visible' : 'hidden'; }})()",
        selector.to_query()
    )
}

/// Whether an observed presence satisfies `state`
fn presence_satisfies(observed: &str, state: ElementState) -> bool {
    match state {
        ElementState::Attached => observed != "detached",
        ElementState::Detached => observed == "detached",
        ElementState::Visible => observed == "visible",
        ElementState::Hidden => observed != "visible",
    }
}

/// Script reporting the first failing actionability check and the box
fn actionability_script(selector: &Selector) -> String {
    format!(
        "(() => {{ const el = {}; \
         if (!el || !el.isConnected) return {{ problem: 'element is not attached' }}; \
         el.scrollIntoView({{ block: 'center', inline: 'center' }}); \
         const s = window.getComputedStyle(el); const r = el.getBoundingClientRect(); \
         if (r.width === 0 || r.height === 0 || s.visibility === 'hidden' || s.display === 'none') \
           return {{ problem: 'element is not visible' }}; \
         if (el.disabled || el.hasAttribute('disabled') || el.getAttribute('aria-disabled') === 'true') \
           return {{ problem: 'element is disabled' }}; \
         const x = r.left + r.width / 2; const y = r.top + r.height / 2; \
         const hit = document.elementFromPoint(x, y); \
         const box = {{ x, y, width: r.width, height: r.height }}; \
         if (!hit || !(hit === el || el.contains(hit))) \
           return {{ problem: 'element is obscured by another element', ...box }}; \
         return {{ problem: null, ...box }}; }})()",
        selector.to_query()
    )
}

/// Script setting the value through the native setter and firing events
fn fill_script(selector: &Selector, value: &str) -> ProbeResult<String> {
    let value = serde_json::to_string(value)?;
    Ok(format!(
        "(() => {{ const el = {}; if (!el) return false; el.focus(); \
         const proto = el instanceof HTMLTextAreaElement ? HTMLTextAreaElement.prototype \
           : HTMLInputElement.prototype; \
         Object.getOwnPropertyDescriptor(proto, 'value').set.call(el, {value}); \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return true; }})()",
        selector.to_query()
    ))
}

/// Script evaluating `read` on the element, or `null` when it is absent
fn read_script(selector: &Selector, read: &str) -> String {
    format!(
        "(() => {{ const el = {}; return el ? {read} : null; }})()",
        selector.to_query()
    )
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Default)]
struct ElementBox {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Actionability {
    problem: Option<String>,
    #[serde(flatten)]
    bounds: Option<ElementBox>,
}

// =============================================================================
// PAGE
// =============================================================================

/// One chromium page, closed together with its browser
#[derive(Debug)]
pub struct CdpPage {
    page: Page,
    browser: tokio::sync::Mutex<Option<Browser>>,
    closed: AtomicBool,
}

impl CdpPage {
    fn options(timeout: Duration) -> WaitOptions {
        WaitOptions::from_durations(timeout, Duration::from_millis(CDP_POLL_INTERVAL_MS))
    }

    fn ensure_open(&self) -> ProbeResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(ProbeError::driver("page is closed"))
        } else {
            Ok(())
        }
    }

    async fn eval<T: DeserializeOwned>(&self, script: String) -> ProbeResult<T> {
        self.ensure_open()?;
        self.page
            .evaluate(script)
            .await
            .map_err(driver_error)?
            .into_value()
            .map_err(driver_error)
    }

    async fn await_state(&self, element: &ElementHandle, state: ElementState, timeout: Duration) -> ProbeResult<()> {
        let script = &presence_script(element.selector());
        poll_until(
            move || async move {
                self.eval::<String>(script.clone())
                    .await
                    .is_ok_and(|observed| presence_satisfies(&observed, state))
            },
            &Self::options(timeout),
        )
        .await
        .map(|_| ())
    }

    /// Wait for actionability and return the element centre
    async fn await_actionable(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<Point> {
        let script = &actionability_script(element.selector());
        let last: Mutex<(Option<Actionability>, Option<ElementBox>)> = Mutex::new((None, None));
        let last_ref = &last;
        let waited = poll_until(
            move || async move {
                let Ok(report) = self.eval::<Actionability>(script.clone()).await else {
                    return false;
                };
                let mut last = last_ref.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
                let previous = last.1.take();
                let ready = report.problem.is_none()
                    && report.bounds.is_some()
                    && previous == report.bounds;
                last.1 = report.bounds;
                last.0 = Some(report);
                ready
            },
            &Self::options(timeout),
        )
        .await;

        let (report, _) = last.into_inner().unwrap_or_else(std::sync::PoisonError::into_inner);
        match (waited, report) {
            (Ok(_), Some(Actionability { bounds: Some(b), .. })) => Ok(Point {
                x: b.x,
                y: b.y,
            }),
            (_, report) => Err(ProbeError::ElementNotActionable {
                locator: element.to_string(),
                message: report
                    .and_then(|r| r.problem)
                    .unwrap_or_else(|| String::from("element is not stable")),
            }),
        }
    }

    async fn read<T: DeserializeOwned>(
        &self,
        element: &ElementHandle,
        read: &str,
        timeout: Duration,
    ) -> ProbeResult<Option<T>> {
        self.await_state(element, ElementState::Attached, timeout).await?;
        self.eval(read_script(element.selector(), read)).await
    }

    async fn read_required<T: DeserializeOwned>(
        &self,
        element: &ElementHandle,
        read: &str,
        timeout: Duration,
    ) -> ProbeResult<T> {
        self.read(element, read, timeout)
            .await?
            .ok_or_else(|| ProbeError::ElementNotFound {
                locator: element.to_string(),
            })
    }

    async fn history(&self, script: &str, wait_until: LoadState, timeout: Duration) -> ProbeResult<()> {
        let start = Instant::now();
        self.eval::<bool>(format!("({script}, true)")).await?;
        self.wait_for_load_state(wait_until, timeout.saturating_sub(start.elapsed()))
            .await
    }
}

#[async_trait]
impl PageDriver for CdpPage {
    async fn goto(&self, url: &str, wait_until: LoadState, timeout: Duration) -> ProbeResult<()> {
        self.ensure_open()?;
        let start = Instant::now();
        match tokio::time::timeout(timeout, self.page.goto(url)).await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => {
                return Err(ProbeError::Navigation {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(ProbeError::Timeout {
                    ms: timeout.as_millis() as u64,
                })
            }
        }
        self.wait_for_load_state(wait_until, timeout.saturating_sub(start.elapsed()))
            .await
    }

    async fn reload(&self, wait_until: LoadState, timeout: Duration) -> ProbeResult<()> {
        self.ensure_open()?;
        let start = Instant::now();
        tokio::time::timeout(timeout, self.page.reload())
            .await
            .map_err(|_| ProbeError::Timeout {
                ms: timeout.as_millis() as u64,
            })?
            .map_err(driver_error)?;
        self.wait_for_load_state(wait_until, timeout.saturating_sub(start.elapsed()))
            .await
    }

    async fn go_back(&self, wait_until: LoadState, timeout: Duration) -> ProbeResult<()> {
        self.history("history.back()", wait_until, timeout).await
    }

    async fn go_forward(&self, wait_until: LoadState, timeout: Duration) -> ProbeResult<()> {
        self.history("history.forward()", wait_until, timeout).await
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> ProbeResult<()> {
        self.ensure_open()?;
        poll_until(
            move || async move {
                self.eval::<String>(String::from("document.readyState"))
                    .await
                    .is_ok_and(|ready| state.ready_states().contains(&ready.as_str()))
            },
            &Self::options(timeout),
        )
        .await
        .map(|_| ())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        self.ensure_open()?;
        Ok(self
            .page
            .url()
            .await
            .map_err(driver_error)?
            .unwrap_or_default())
    }

    async fn wait_for(&self, element: &ElementHandle, state: ElementState, timeout: Duration) -> ProbeResult<()> {
        self.ensure_open()?;
        self.await_state(element, state, timeout).await
    }

    async fn is_visible(&self, element: &ElementHandle) -> ProbeResult<bool> {
        let observed: String = self.eval(presence_script(element.selector())).await?;
        Ok(presence_satisfies(&observed, ElementState::Visible))
    }

    async fn count(&self, element: &ElementHandle) -> ProbeResult<usize> {
        self.eval(element.selector().to_count_query()).await
    }

    async fn click(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<()> {
        let centre = self.await_actionable(element, timeout).await?;
        tracing::debug!(locator = %element, x = centre.x, y = centre.y, "cdp click");
        self.page.click(centre).await.map_err(driver_error)?;
        Ok(())
    }

    async fn fill(&self, element: &ElementHandle, value: &str, timeout: Duration) -> ProbeResult<()> {
        self.await_actionable(element, timeout).await?;
        let filled: bool = self.eval(fill_script(element.selector(), value)?).await?;
        if filled {
            Ok(())
        } else {
            Err(ProbeError::ElementNotFound {
                locator: element.to_string(),
            })
        }
    }

    async fn clear(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<()> {
        self.fill(element, "", timeout).await
    }

    async fn input_value(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<String> {
        self.read_required(element, "(el.value ?? '')", timeout).await
    }

    async fn inner_text(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<String> {
        self.read_required(element, "(el.innerText ?? '')", timeout).await
    }

    async fn get_attribute(
        &self,
        element: &ElementHandle,
        name: &str,
        timeout: Duration,
    ) -> ProbeResult<Option<String>> {
        let name = serde_json::to_string(name)?;
        self.read(element, &format!("el.getAttribute({name})"), timeout).await
    }

    async fn scroll_into_view(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<()> {
        let scrolled: Option<bool> = self
            .read(element, "(el.scrollIntoView({ block: 'center' }), true)", timeout)
            .await?;
        scrolled.map(|_| ()).ok_or_else(|| ProbeError::ElementNotFound {
            locator: element.to_string(),
        })
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        use base64::Engine;

        self.ensure_open()?;
        let params = CaptureScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .build();
        let shot = self.page.execute(params).await.map_err(driver_error)?;
        base64::engine::general_purpose::STANDARD
            .decode(&shot.data)
            .map_err(driver_error)
    }

    async fn close(&self) -> ProbeResult<()> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        if let Err(e) = self.page.clone().close().await {
            tracing::debug!(error = %e, "page close failed");
        }
        let browser = self.browser.lock().await.take();
        match browser {
            Some(browser) => browser.close().await,
            None => Ok(()),
        }
    }
}

// =============================================================================
// PROVIDER
// =============================================================================

/// Launches one chromium per acquired page
#[derive(Debug, Clone, Copy, Default)]
pub struct BrowserPageProvider;

#[async_trait]
impl PageProvider for BrowserPageProvider {
    async fn acquire(&self, config: &SuiteConfig) -> ProbeResult<Arc<dyn PageDriver>> {
        let device = config.device_profile()?;
        let browser = Browser::launch(config, &device).await?;
        let page = browser.open_page(&device).await?;
        Ok(Arc::new(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_mapping() {
        assert!(presence_satisfies("hidden", ElementState::Attached));
        assert!(!presence_satisfies("detached", ElementState::Attached));
        assert!(presence_satisfies("detached", ElementState::Hidden));
        assert!(presence_satisfies("hidden", ElementState::Hidden));
        assert!(!presence_satisfies("visible", ElementState::Hidden));
        assert!(presence_satisfies("visible", ElementState::Visible));
        assert!(presence_satisfies("detached", ElementState::Detached));
    }

    #[test]
    fn test_scripts_embed_query() {
        let selector = Selector::css("#postal-code");
        assert!(presence_script(&selector).contains(&selector.to_query()));
        assert!(actionability_script(&selector).contains("elementFromPoint"));
        let fill = fill_script(&selector, "M5V \"2T6\"").unwrap();
        assert!(fill.contains(r#""M5V \"2T6\"""#));
        assert!(fill.contains("'input'") && fill.contains("'change'"));
    }

    #[test]
    fn test_actionability_report_parses() {
        let ok: Actionability =
            serde_json::from_str(r#"{"problem":null,"x":10.0,"y":20.0,"width":4.0,"height":2.0}"#).unwrap();
        assert!(ok.problem.is_none());
        assert_eq!(ok.bounds.map(|b| b.x), Some(10.0));
        let missing: Actionability = serde_json::from_str(r#"{"problem":"element is not attached"}"#).unwrap();
        assert!(missing.bounds.is_none());
    }

    #[tokio::test]
    async fn test_non_chromium_is_rejected_before_launch() {
        for kind in [BrowserKind::Firefox, BrowserKind::Webkit, BrowserKind::Safari] {
            let config = SuiteConfig::default().with_browser(kind);
            let err = Browser::launch(&config, &DeviceProfile::desktop()).await.unwrap_err();
            assert!(matches!(err, ProbeError::UnsupportedBrowser { .. }));
        }
    }
}
