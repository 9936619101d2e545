//! Scripted in-memory page
//!
//! [`MockPage`] implements [`PageDriver`] over a [`MockSite`]: a map from
//! selector to elements plus a queue of timed mutations and click/fill/navigate
//! hooks. Tests script a site, hand the page to an interactor, and assert on
//! both the outcome and the call history.
//!
//! Timed mutations use `tokio::time`, so a paused test clock controls when
//! they land.

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

use crate::driver::{PageDriver, PNG_SIGNATURE};
use crate::locator::{ElementHandle, Selector};
use crate::result::{ProbeError, ProbeResult};
use crate::wait::{poll_until, ElementState, LoadState, WaitOptions};

/// Poll interval for the mock's own element waits (10ms)
pub const MOCK_POLL_INTERVAL_MS: u64 = 10;

type Mutation = Box<dyn FnOnce(&mut MockSite) + Send>;
type ClickHook = Arc<dyn Fn(&mut MockSite) + Send + Sync>;
type InputHook = Arc<dyn Fn(&mut MockSite, &str) + Send + Sync>;

// =============================================================================
// MOCK ELEMENT
// =============================================================================

/// One scripted element
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MockElement {
    /// Rendered text
    pub text: String,
    /// Input value
    pub value: String,
    /// Whether the element renders a box
    pub visible: bool,
    /// Attributes, including `disabled` and `class`
    pub attributes: HashMap<String, String>,
    /// Number of clear calls that leave the value in place
    pub clear_resistance: u32,
    /// Another element covers this one's centre
    pub obscured: bool,
    /// `scroll_into_view` has been called on it
    pub scrolled: bool,
}

impl MockElement {
    /// Visible element with no text
    #[must_use]
    pub fn new() -> Self {
        Self {
            visible: true,
            ..Self::default()
        }
    }

    /// Set rendered text
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Set input value
    #[must_use]
    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    /// Set an attribute
    #[must_use]
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    /// Mark as not rendered
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Add the `disabled` attribute
    #[must_use]
    pub fn disabled(self) -> Self {
        self.with_attribute("disabled", "")
    }

    /// Mark as covered by another element
    #[must_use]
    pub const fn obscured(mut self) -> Self {
        self.obscured = true;
        self
    }

    /// Ignore the first `attempts` clear calls
    #[must_use]
    pub const fn with_clear_resistance(mut self, attempts: u32) -> Self {
        self.clear_resistance = attempts;
        self
    }

    /// Whether the `disabled` attribute is present
    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.attributes.contains_key("disabled")
    }

    /// First failing actionability check, if any
    fn actionability_problem(&self) -> Option<&'static str> {
        if !self.visible {
            Some("element is not visible")
        } else if self.is_disabled() {
            Some("element is disabled")
        } else if self.obscured {
            Some("element is obscured by another element")
        } else {
            None
        }
    }
}

// =============================================================================
// MOCK SITE
// =============================================================================

struct Pending {
    at: Instant,
    seq: u64,
    apply: Mutation,
}

/// Scripted DOM state for a [`MockPage`]
#[derive(Default)]
pub struct MockSite {
    elements: HashMap<Selector, Vec<MockElement>>,
    url: String,
    history: Vec<String>,
    history_index: usize,
    load_delay: Duration,
    navigated_at: Option<Instant>,
    pending: Vec<Pending>,
    next_seq: u64,
    click_hooks: HashMap<Selector, ClickHook>,
    fill_hooks: HashMap<Selector, InputHook>,
    navigate_hooks: Vec<InputHook>,
    call_hooks: Vec<(String, ClickHook)>,
}

impl fmt::Debug for MockSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockSite")
            .field("url", &self.url)
            .field("elements", &self.elements.len())
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl MockSite {
    /// Create an empty site
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all elements for a selector with one element
    pub fn insert(&mut self, selector: impl Into<Selector>, element: MockElement) {
        self.elements.insert(selector.into(), vec![element]);
    }

    /// Append another match for a selector
    pub fn push(&mut self, selector: impl Into<Selector>, element: MockElement) {
        self.elements.entry(selector.into()).or_default().push(element);
    }

    /// Detach every match for a selector
    pub fn remove(&mut self, selector: &Selector) {
        self.elements.remove(selector);
    }

    /// Detach every element
    pub fn clear_elements(&mut self) {
        self.elements.clear();
    }

    /// First match for a selector
    #[must_use]
    pub fn element(&self, selector: &Selector) -> Option<&MockElement> {
        self.elements.get(selector).and_then(|list| list.first())
    }

    /// First match for a selector, mutably
    pub fn element_mut(&mut self, selector: &Selector) -> Option<&mut MockElement> {
        self.elements.get_mut(selector).and_then(|list| list.first_mut())
    }

    /// Number of matches for a selector
    #[must_use]
    pub fn count(&self, selector: &Selector) -> usize {
        self.elements.get(selector).map_or(0, Vec::len)
    }

    /// Set the text of the first match, if attached
    pub fn set_text(&mut self, selector: &Selector, text: impl Into<String>) {
        if let Some(el) = self.element_mut(selector) {
            el.text = text.into();
        }
    }

    /// Show or hide the first match, if attached
    pub fn set_visible(&mut self, selector: &Selector, visible: bool) {
        if let Some(el) = self.element_mut(selector) {
            el.visible = visible;
        }
    }

    /// Set or remove an attribute on the first match
    pub fn set_attribute(&mut self, selector: &Selector, name: &str, value: Option<&str>) {
        if let Some(el) = self.element_mut(selector) {
            match value {
                Some(v) => {
                    el.attributes.insert(name.to_string(), v.to_string());
                }
                None => {
                    el.attributes.remove(name);
                }
            }
        }
    }

    /// Current URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Time between a navigation and its `load` event
    pub fn set_load_delay(&mut self, delay: Duration) {
        self.load_delay = delay;
    }

    /// Apply `mutation` once `delay` has elapsed
    pub fn after(&mut self, delay: Duration, mutation: impl FnOnce(&mut Self) + Send + 'static) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Pending {
            at: Instant::now() + delay,
            seq,
            apply: Box::new(mutation),
        });
    }

    /// Run `hook` after every successful click on `selector`
    pub fn on_click(
        &mut self,
        selector: impl Into<Selector>,
        hook: impl Fn(&mut Self) + Send + Sync + 'static,
    ) {
        self.click_hooks.insert(selector.into(), Arc::new(hook));
    }

    /// Run `hook` with the new value after every fill of `selector`
    pub fn on_fill(
        &mut self,
        selector: impl Into<Selector>,
        hook: impl Fn(&mut Self, &str) + Send + Sync + 'static,
    ) {
        self.fill_hooks.insert(selector.into(), Arc::new(hook));
    }

    /// Run `hook` with the URL after every navigation, reload included
    pub fn on_navigate(&mut self, hook: impl Fn(&mut Self, &str) + Send + Sync + 'static) {
        self.navigate_hooks.push(Arc::new(hook));
    }

    /// Run `hook` whenever a recorded driver call starts with `prefix`
    ///
    /// Fires before the call reads any state, so the call observes the change.
    pub fn on_call(
        &mut self,
        prefix: impl Into<String>,
        hook: impl Fn(&mut Self) + Send + Sync + 'static,
    ) {
        self.call_hooks.push((prefix.into(), Arc::new(hook)));
    }

    fn fire_call_hooks(&mut self, call: &str) {
        let hooks: Vec<ClickHook> = self
            .call_hooks
            .iter()
            .filter(|(prefix, _)| call.starts_with(prefix.as_str()))
            .map(|(_, hook)| Arc::clone(hook))
            .collect();
        for hook in hooks {
            hook(self);
        }
    }

    fn apply_due(&mut self) {
        let now = Instant::now();
        loop {
            let due = self
                .pending
                .iter()
                .enumerate()
                .filter(|(_, p)| p.at <= now)
                .min_by_key(|(_, p)| (p.at, p.seq))
                .map(|(i, _)| i);
            match due {
                Some(i) => {
                    let pending = self.pending.remove(i);
                    (pending.apply)(self);
                }
                None => break,
            }
        }
    }

    fn load_state(&self) -> Option<LoadState> {
        let at = self.navigated_at?;
        if Instant::now() >= at + self.load_delay {
            Some(LoadState::Load)
        } else {
            Some(LoadState::DomContentLoaded)
        }
    }

    fn load(&mut self, url: &str) {
        self.url = url.to_string();
        self.navigated_at = Some(Instant::now());
        self.pending.clear();
        for hook in self.navigate_hooks.clone() {
            hook(self, url);
        }
    }

    fn state_holds(&self, selector: &Selector, state: ElementState) -> bool {
        let el = self.element(selector);
        match state {
            ElementState::Attached => el.is_some(),
            ElementState::Detached => el.is_none(),
            ElementState::Visible => el.is_some_and(|e| e.visible),
            ElementState::Hidden => !el.is_some_and(|e| e.visible),
        }
    }
}

// =============================================================================
// MOCK PAGE
// =============================================================================

struct MockState {
    site: MockSite,
    calls: Vec<String>,
    closed: bool,
}

/// Scripted page implementing [`PageDriver`]
pub struct MockPage {
    state: Mutex<MockState>,
}

impl fmt::Debug for MockPage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("MockPage")
            .field("site", &state.site)
            .field("calls", &state.calls.len())
            .field("closed", &state.closed)
            .finish()
    }
}

impl Default for MockPage {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPage {
    /// Create a page with an empty site
    #[must_use]
    pub fn new() -> Self {
        Self::with_site(MockSite::new())
    }

    /// Create a page over a prepared site
    #[must_use]
    pub fn with_site(site: MockSite) -> Self {
        Self {
            state: Mutex::new(MockState {
                site,
                calls: Vec::new(),
                closed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `f` against the site after applying due mutations
    pub fn update<R>(&self, f: impl FnOnce(&mut MockSite) -> R) -> R {
        let mut state = self.lock();
        state.site.apply_due();
        f(&mut state.site)
    }

    /// Insert one element for a selector
    pub fn insert(&self, selector: impl Into<Selector>, element: MockElement) {
        self.update(|site| site.insert(selector, element));
    }

    /// Apply `mutation` once `delay` has elapsed
    pub fn after(&self, delay: Duration, mutation: impl FnOnce(&mut MockSite) + Send + 'static) {
        self.update(|site| site.after(delay, mutation));
    }

    /// Snapshot of the first match for a selector
    #[must_use]
    pub fn element(&self, selector: &Selector) -> Option<MockElement> {
        self.update(|site| site.element(selector).cloned())
    }

    /// Call history for verification
    #[must_use]
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// Check if a method was called
    #[must_use]
    pub fn was_called(&self, method: &str) -> bool {
        self.lock().calls.iter().any(|c| c.starts_with(method))
    }

    /// Number of calls starting with `prefix`
    #[must_use]
    pub fn call_count(&self, prefix: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Whether `close` has been called
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Record a call and hand back the guard with due mutations applied
    fn enter(&self, call: String) -> ProbeResult<MutexGuard<'_, MockState>> {
        let mut state = self.lock();
        if state.closed {
            return Err(ProbeError::driver("page is closed"));
        }
        state.site.apply_due();
        state.site.fire_call_hooks(&call);
        state.calls.push(call);
        Ok(state)
    }

    fn options(timeout: Duration) -> WaitOptions {
        WaitOptions::from_durations(timeout, Duration::from_millis(MOCK_POLL_INTERVAL_MS))
    }

    async fn await_state(
        &self,
        selector: &Selector,
        state: ElementState,
        timeout: Duration,
    ) -> ProbeResult<()> {
        poll_until(
            || {
                let mut guard = self.lock();
                guard.site.apply_due();
                std::future::ready(guard.site.state_holds(selector, state))
            },
            &Self::options(timeout),
        )
        .await
        .map(|_| ())
    }

    /// Wait until the element is actionable, then run `act` on the locked site
    async fn act_when_actionable<R>(
        &self,
        element: &ElementHandle,
        timeout: Duration,
        act: impl FnOnce(&mut MockSite) -> R,
    ) -> ProbeResult<R> {
        let selector = element.selector();
        let waited = poll_until(
            || {
                let mut guard = self.lock();
                guard.site.apply_due();
                let ready = guard
                    .site
                    .element(selector)
                    .is_some_and(|e| e.actionability_problem().is_none());
                std::future::ready(ready)
            },
            &Self::options(timeout),
        )
        .await;

        let mut guard = self.lock();
        guard.site.apply_due();
        if waited.is_err() {
            let message = guard.site.element(selector).map_or("element is not attached", |e| {
                e.actionability_problem().unwrap_or("element is not stable")
            });
            return Err(ProbeError::ElementNotActionable {
                locator: element.to_string(),
                message: message.to_string(),
            });
        }
        Ok(act(&mut guard.site))
    }

    async fn read<R>(
        &self,
        element: &ElementHandle,
        timeout: Duration,
        read: impl FnOnce(&MockElement) -> R,
    ) -> ProbeResult<R> {
        self.await_state(element.selector(), ElementState::Attached, timeout)
            .await?;
        let mut guard = self.lock();
        guard.site.apply_due();
        guard
            .site
            .element(element.selector())
            .map(read)
            .ok_or_else(|| ProbeError::ElementNotFound {
                locator: element.to_string(),
            })
    }

    async fn navigate_history(
        &self,
        step: isize,
        wait_until: LoadState,
        timeout: Duration,
    ) -> ProbeResult<()> {
        {
            let mut state = self.enter(format!("history:{step}"))?;
            let site = &mut state.site;
            let target = site.history_index as isize + step;
            if target >= 0 && (target as usize) < site.history.len() {
                site.history_index = target as usize;
                let url = site.history[site.history_index].clone();
                site.load(&url);
            }
        }
        self.wait_for_load_state(wait_until, timeout).await
    }
}

#[async_trait]
impl PageDriver for MockPage {
    async fn goto(&self, url: &str, wait_until: LoadState, timeout: Duration) -> ProbeResult<()> {
        {
            let mut state = self.enter(format!("goto:{url}"))?;
            let site = &mut state.site;
            if !site.history.is_empty() {
                site.history.truncate(site.history_index + 1);
            }
            site.history.push(url.to_string());
            site.history_index = site.history.len() - 1;
            site.load(url);
        }
        self.wait_for_load_state(wait_until, timeout).await
    }

    async fn reload(&self, wait_until: LoadState, timeout: Duration) -> ProbeResult<()> {
        {
            let mut state = self.enter(String::from("reload"))?;
            let url = state.site.url.clone();
            state.site.load(&url);
        }
        self.wait_for_load_state(wait_until, timeout).await
    }

    async fn go_back(&self, wait_until: LoadState, timeout: Duration) -> ProbeResult<()> {
        self.navigate_history(-1, wait_until, timeout).await
    }

    async fn go_forward(&self, wait_until: LoadState, timeout: Duration) -> ProbeResult<()> {
        self.navigate_history(1, wait_until, timeout).await
    }

    async fn wait_for_load_state(&self, state: LoadState, timeout: Duration) -> ProbeResult<()> {
        drop(self.enter(format!("wait_for_load_state:{state}"))?);
        poll_until(
            || {
                let mut guard = self.lock();
                guard.site.apply_due();
                let reached = guard
                    .site
                    .load_state()
                    .is_some_and(|current| state.is_satisfied_by(current));
                std::future::ready(reached)
            },
            &Self::options(timeout),
        )
        .await
        .map(|_| ())
    }

    async fn current_url(&self) -> ProbeResult<String> {
        let state = self.enter(String::from("current_url"))?;
        Ok(state.site.url.clone())
    }

    async fn wait_for(
        &self,
        element: &ElementHandle,
        state: ElementState,
        timeout: Duration,
    ) -> ProbeResult<()> {
        drop(self.enter(format!("wait_for:{element}:{state}"))?);
        self.await_state(element.selector(), state, timeout).await
    }

    async fn is_visible(&self, element: &ElementHandle) -> ProbeResult<bool> {
        let state = self.enter(format!("is_visible:{element}"))?;
        Ok(state
            .site
            .state_holds(element.selector(), ElementState::Visible))
    }

    async fn count(&self, element: &ElementHandle) -> ProbeResult<usize> {
        let state = self.enter(format!("count:{element}"))?;
        Ok(state.site.count(element.selector()))
    }

    async fn click(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<()> {
        drop(self.enter(format!("click:{element}"))?);
        let selector = element.selector().clone();
        self.act_when_actionable(element, timeout, move |site| {
            if let Some(hook) = site.click_hooks.get(&selector).cloned() {
                hook(site);
            }
        })
        .await
    }

    async fn fill(&self, element: &ElementHandle, value: &str, timeout: Duration) -> ProbeResult<()> {
        drop(self.enter(format!("fill:{element}:{value}"))?);
        let selector = element.selector().clone();
        let value = value.to_string();
        self.act_when_actionable(element, timeout, move |site| {
            if let Some(el) = site.element_mut(&selector) {
                el.value.clone_from(&value);
            }
            if let Some(hook) = site.fill_hooks.get(&selector).cloned() {
                hook(site, &value);
            }
        })
        .await
    }

    async fn clear(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<()> {
        drop(self.enter(format!("clear:{element}"))?);
        let selector = element.selector().clone();
        self.act_when_actionable(element, timeout, move |site| {
            if let Some(el) = site.element_mut(&selector) {
                if el.clear_resistance > 0 {
                    el.clear_resistance -= 1;
                } else {
                    el.value.clear();
                }
            }
        })
        .await
    }

    async fn input_value(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<String> {
        drop(self.enter(format!("input_value:{element}"))?);
        self.read(element, timeout, |el| el.value.clone()).await
    }

    async fn inner_text(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<String> {
        drop(self.enter(format!("inner_text:{element}"))?);
        self.read(element, timeout, |el| el.text.clone()).await
    }

    async fn get_attribute(
        &self,
        element: &ElementHandle,
        name: &str,
        timeout: Duration,
    ) -> ProbeResult<Option<String>> {
        drop(self.enter(format!("get_attribute:{element}:{name}"))?);
        self.read(element, timeout, |el| el.attributes.get(name).cloned())
            .await
    }

    async fn scroll_into_view(&self, element: &ElementHandle, timeout: Duration) -> ProbeResult<()> {
        drop(self.enter(format!("scroll_into_view:{element}"))?);
        self.await_state(element.selector(), ElementState::Attached, timeout)
            .await?;
        self.update(|site| {
            if let Some(el) = site.element_mut(element.selector()) {
                el.scrolled = true;
            }
        });
        Ok(())
    }

    async fn screenshot(&self) -> ProbeResult<Vec<u8>> {
        drop(self.enter(String::from("screenshot"))?);
        Ok(PNG_SIGNATURE.to_vec())
    }

    async fn close(&self) -> ProbeResult<()> {
        let mut state = self.lock();
        state.calls.push(String::from("close"));
        state.closed = true;
        Ok(())
    }
}
