//! Locator resolution for element selection.
//!
//! Callers describe elements in one of three shapes:
//!
//! - **Handle**: an [`ElementHandle`] built by a page's locator set (preferred)
//! - **Prefixed string**: `test_id:<v>`, `css:<v>`, `xpath:<v>`, or a bare CSS selector
//! - **Legacy pair**: `(kind, value)` as used by older page objects
//!
//! [`resolve`] maps each shape onto one canonical [`ElementHandle`]. Resolution is
//! pure; the handle is queried lazily against the live page on every interaction.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::result::{ProbeError, ProbeResult};

/// Attribute used by test-id lookups
pub const TEST_ID_ATTRIBUTE: &str = "data-testid";

// =============================================================================
// SELECTOR
// =============================================================================

/// Canonical query form for locating elements
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Selector {
    /// CSS selector (e.g., `button.primary`)
    Css(String),
    /// XPath selector
    XPath(String),
    /// Test ID selector (`data-testid` attribute)
    TestId(String),
    /// Element whose trimmed text equals the value
    TextExact(String),
    /// Element whose text contains the value
    TextContains(String),
    /// ARIA role with an optional accessible name
    Role {
        /// Role name (e.g., `link`, `button`)
        role: String,
        /// Accessible name, matched case-insensitively as a substring
        name: Option<String>,
    },
}

impl Selector {
    /// Create a CSS selector
    #[must_use]
    pub fn css(selector: impl Into<String>) -> Self {
        Self::Css(selector.into())
    }

    /// Create an XPath selector
    #[must_use]
    pub fn xpath(expression: impl Into<String>) -> Self {
        Self::XPath(expression.into())
    }

    /// Create a test ID selector
    #[must_use]
    pub fn test_id(id: impl Into<String>) -> Self {
        Self::TestId(id.into())
    }

    /// Create an exact text selector
    #[must_use]
    pub fn text_exact(text: impl Into<String>) -> Self {
        Self::TextExact(text.into())
    }

    /// Create a substring text selector
    #[must_use]
    pub fn text_contains(text: impl Into<String>) -> Self {
        Self::TextContains(text.into())
    }

    /// Create a role selector
    #[must_use]
    pub fn role(role: impl Into<String>, name: Option<&str>) -> Self {
        Self::Role {
            role: role.into(),
            name: name.map(str::to_string),
        }
    }

    /// JavaScript expression evaluating to an array of every matching element
    #[must_use]
    pub fn to_all_query(&self) -> String {
        match self {
            Self::Css(s) => format!("Array.from(document.querySelectorAll({}))", js_string(s)),
            Self::XPath(s) => format!(
                "(() => {{ const r = document.evaluate({}, document, null, \
                 XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null); const out = []; \
                 for (let i = 0; i < r.snapshotLength; i++) out.push(r.snapshotItem(i)); \
                 return out; }})()",
                js_string(s)
            ),
            Self::TestId(id) => format!(
                "Array.from(document.querySelectorAll('[{TEST_ID_ATTRIBUTE}]'))\
                 .filter(el => el.getAttribute('{TEST_ID_ATTRIBUTE}') === {})",
                js_string(id)
            ),
            Self::TextExact(t) => text_query(&format!("el.textContent.trim() === {}", js_string(t))),
            Self::TextContains(t) => text_query(&format!("el.textContent.includes({})", js_string(t))),
            Self::Role { role, name } => {
                let candidates = role_candidates(role);
                match name {
                    Some(n) => format!(
                        "Array.from(document.querySelectorAll({})).filter(el => \
                         ((el.getAttribute('aria-label') || el.textContent || '').trim().toLowerCase())\
                         .includes({}.toLowerCase()))",
                        js_string(&candidates),
                        js_string(n)
                    ),
                    None => format!(
                        "Array.from(document.querySelectorAll({}))",
                        js_string(&candidates)
                    ),
                }
            }
        }
    }

    /// JavaScript expression evaluating to the first match or `null`
    #[must_use]
    pub fn to_query(&self) -> String {
        format!("(({})[0] ?? null)", self.to_all_query())
    }

    /// JavaScript expression evaluating to the match count
    #[must_use]
    pub fn to_count_query(&self) -> String {
        format!("({}).length", self.to_all_query())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Css(s) => write!(f, "css={s}"),
            Self::XPath(s) => write!(f, "xpath={s}"),
            Self::TestId(id) => write!(f, "test_id={id}"),
            Self::TextExact(t) => write!(f, "text={t:?}"),
            Self::TextContains(t) => write!(f, "text*={t:?}"),
            Self::Role { role, name: Some(n) } => write!(f, "role={role}[name={n:?}]"),
            Self::Role { role, name: None } => write!(f, "role={role}"),
        }
    }
}

fn js_string(value: &str) -> String {
    // serde_json string escaping is valid JavaScript string literal syntax
    serde_json::to_string(value).unwrap_or_else(|_| String::from("\"\""))
}

fn text_query(predicate: &str) -> String {
    // Innermost elements only, so a match never resolves to <body>
    format!(
        "Array.from(document.querySelectorAll('body *')).filter(el => {{ \
         const hit = e => {{ const el = e; return {predicate}; }}; \
         return hit(el) && !Array.from(el.children).some(c => hit(c)); }})"
    )
}

fn role_candidates(role: &str) -> String {
    match role.to_ascii_lowercase().as_str() {
        "link" => String::from("a[href], [role=\"link\"]"),
        "button" => String::from(
            "button, input[type=\"button\"], input[type=\"submit\"], [role=\"button\"]",
        ),
        "textbox" => String::from("input:not([type]), input[type=\"text\"], textarea, [role=\"textbox\"]"),
        "heading" => String::from("h1, h2, h3, h4, h5, h6, [role=\"heading\"]"),
        other => format!("[role=\"{other}\"]"),
    }
}

// =============================================================================
// ELEMENT HANDLE
// =============================================================================

/// A lazily queried reference to zero-or-one live element
///
/// Handles carry no DOM state. Every driver call re-queries the page, so a
/// handle stays valid across re-renders. When several elements match, the
/// first in document order is used.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ElementHandle {
    selector: Selector,
    first: bool,
}

impl ElementHandle {
    /// Create a handle for a selector
    #[must_use]
    pub const fn new(selector: Selector) -> Self {
        Self {
            selector,
            first: false,
        }
    }

    /// Narrow to the first match explicitly
    #[must_use]
    pub fn first(mut self) -> Self {
        self.first = true;
        self
    }

    /// The selector this handle queries
    #[must_use]
    pub const fn selector(&self) -> &Selector {
        &self.selector
    }

    /// Whether the handle was narrowed with [`ElementHandle::first`]
    #[must_use]
    pub const fn is_first(&self) -> bool {
        self.first
    }
}

impl From<Selector> for ElementHandle {
    fn from(selector: Selector) -> Self {
        Self::new(selector)
    }
}

impl fmt::Display for ElementHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.first {
            write!(f, "{} >> first", self.selector)
        } else {
            write!(f, "{}", self.selector)
        }
    }
}

// =============================================================================
// LOCATOR DESCRIPTION
// =============================================================================

/// Any supported description of how to find one element
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorDescription {
    /// Already-resolved handle
    Handle(ElementHandle),
    /// String parsed by its `test_id:`, `css:` or `xpath:` prefix; bare strings are CSS
    Prefixed(String),
    /// Legacy `(kind, value)` pair
    Pair {
        /// Locator kind such as `id` or `class_name`
        kind: String,
        /// Value interpreted according to `kind`
        value: String,
    },
}

impl LocatorDescription {
    /// Build a legacy pair description
    #[must_use]
    pub fn pair(kind: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Pair {
            kind: kind.into(),
            value: value.into(),
        }
    }

    /// Resolve to a canonical handle
    #[must_use]
    pub fn resolve(&self) -> ElementHandle {
        match self {
            Self::Handle(handle) => handle.clone(),
            Self::Prefixed(s) => ElementHandle::new(parse_prefixed(s)),
            Self::Pair { kind, value } => ElementHandle::new(pair_selector(kind, value)),
        }
    }
}

/// Resolve any locator description to a canonical handle
#[must_use]
pub fn resolve(description: impl Into<LocatorDescription>) -> ElementHandle {
    description.into().resolve()
}

fn parse_prefixed(s: &str) -> Selector {
    if let Some(v) = s.strip_prefix("test_id:") {
        Selector::TestId(v.to_string())
    } else if let Some(v) = s.strip_prefix("css:") {
        Selector::Css(v.to_string())
    } else if let Some(v) = s.strip_prefix("xpath:") {
        Selector::XPath(v.to_string())
    } else {
        Selector::Css(s.to_string())
    }
}

fn pair_selector(kind: &str, value: &str) -> Selector {
    match kind.to_ascii_lowercase().as_str() {
        "id" => Selector::Css(format!("#{value}")),
        "xpath" => Selector::XPath(value.to_string()),
        "name" => Selector::Css(format!("[name=\"{value}\"]")),
        "class_name" | "class" => Selector::Css(format!(".{value}")),
        "link_text" => Selector::TextExact(value.to_string()),
        "partial_link_text" => Selector::TextContains(value.to_string()),
        "data_testid" | "test_id" => Selector::TestId(value.to_string()),
        // css_selector, css, tag_name, tag, and unknown kinds all treat the value as raw CSS
        _ => Selector::Css(value.to_string()),
    }
}

impl From<ElementHandle> for LocatorDescription {
    fn from(handle: ElementHandle) -> Self {
        Self::Handle(handle)
    }
}

impl From<&ElementHandle> for LocatorDescription {
    fn from(handle: &ElementHandle) -> Self {
        Self::Handle(handle.clone())
    }
}

impl From<Selector> for LocatorDescription {
    fn from(selector: Selector) -> Self {
        Self::Handle(ElementHandle::new(selector))
    }
}

impl From<&str> for LocatorDescription {
    fn from(s: &str) -> Self {
        Self::Prefixed(s.to_string())
    }
}

impl From<String> for LocatorDescription {
    fn from(s: String) -> Self {
        Self::Prefixed(s)
    }
}

impl From<(&str, &str)> for LocatorDescription {
    fn from((kind, value): (&str, &str)) -> Self {
        Self::pair(kind, value)
    }
}

impl TryFrom<&[&str]> for LocatorDescription {
    type Error = ProbeError;

    fn try_from(parts: &[&str]) -> ProbeResult<Self> {
        match parts {
            [kind, value] => Ok(Self::pair(*kind, *value)),
            _ => Err(ProbeError::UnsupportedLocatorKind {
                description: format!("sequence of {} elements", parts.len()),
            }),
        }
    }
}

impl TryFrom<&serde_json::Value> for LocatorDescription {
    type Error = ProbeError;

    fn try_from(value: &serde_json::Value) -> ProbeResult<Self> {
        use serde_json::Value;

        match value {
            Value::String(s) => Ok(Self::Prefixed(s.clone())),
            Value::Array(items) => match items.as_slice() {
                [Value::String(kind), Value::String(v)] => Ok(Self::pair(kind.as_str(), v.as_str())),
                _ => Err(ProbeError::UnsupportedLocatorKind {
                    description: value.to_string(),
                }),
            },
            other => Err(ProbeError::UnsupportedLocatorKind {
                description: other.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod prefixed_tests {
        use super::*;

        #[test]
        fn test_test_id_prefix() {
            assert_eq!(resolve("test_id:foo").selector(), &Selector::test_id("foo"));
        }

        #[test]
        fn test_css_prefix() {
            assert_eq!(
                resolve("css:#category-navbar").selector(),
                &Selector::css("#category-navbar")
            );
        }

        #[test]
        fn test_xpath_prefix() {
            assert_eq!(
                resolve("xpath://div[@id='x']").selector(),
                &Selector::xpath("//div[@id='x']")
            );
        }

        #[test]
        fn test_bare_string_is_css() {
            let handle = resolve(String::from("[data-cy=\"bt-delivery\"]"));
            assert_eq!(handle.selector(), &Selector::css("[data-cy=\"bt-delivery\"]"));
            assert!(!handle.is_first());
        }
    }

    mod pair_tests {
        use super::*;

        #[test]
        fn test_pair_table() {
            let cases = [
                (("id", "main"), Selector::css("#main")),
                (("xpath", "//a"), Selector::xpath("//a")),
                (("css_selector", "div > a"), Selector::css("div > a")),
                (("css", "li"), Selector::css("li")),
                (("name", "q"), Selector::css("[name=\"q\"]")),
                (("class_name", "card"), Selector::css(".card")),
                (("class", "card"), Selector::css(".card")),
                (("tag_name", "nav"), Selector::css("nav")),
                (("tag", "nav"), Selector::css("nav")),
                (("link_text", "Menu"), Selector::text_exact("Menu")),
                (("partial_link_text", "Men"), Selector::text_contains("Men")),
                (("data_testid", "logo"), Selector::test_id("logo")),
                (("test_id", "logo"), Selector::test_id("logo")),
            ];
            for (pair, expected) in cases {
                assert_eq!(resolve(pair).selector(), &expected, "pair {pair:?}");
            }
        }

        #[test]
        fn test_kind_is_case_insensitive() {
            assert_eq!(resolve(("ID", "main")).selector(), &Selector::css("#main"));
        }

        #[test]
        fn test_unknown_kind_falls_back_to_css() {
            assert_eq!(
                resolve(("accessibility_id", ".weird")).selector(),
                &Selector::css(".weird")
            );
        }
    }

    mod handle_tests {
        use super::*;

        #[test]
        fn test_handle_passes_through() {
            let handle = ElementHandle::new(Selector::css("li.cursor-pointer")).first();
            assert_eq!(resolve(&handle), handle);
            assert_eq!(resolve(handle.clone()), handle);
        }

        #[test]
        fn test_display() {
            let handle = ElementHandle::new(Selector::role("link", Some("SERVICES")));
            assert_eq!(handle.to_string(), "role=link[name=\"SERVICES\"]");
            assert_eq!(
                ElementHandle::new(Selector::css("li")).first().to_string(),
                "css=li >> first"
            );
        }
    }

    mod try_from_tests {
        use super::*;
        use serde_json::json;

        #[test]
        fn test_json_string_and_pair() {
            let s = LocatorDescription::try_from(&json!("test_id:foo")).unwrap();
            assert_eq!(s.resolve().selector(), &Selector::test_id("foo"));
            let p = LocatorDescription::try_from(&json!(["id", "main"])).unwrap();
            assert_eq!(p.resolve().selector(), &Selector::css("#main"));
        }

        #[test]
        fn test_json_other_shapes_rejected() {
            for value in [json!(42), json!(["id"]), json!(["a", "b", "c"]), json!({"id": "x"}), json!([1, 2])] {
                let err = LocatorDescription::try_from(&value).unwrap_err();
                assert!(matches!(err, ProbeError::UnsupportedLocatorKind { .. }), "{value}");
            }
        }

        #[test]
        fn test_slice_must_have_two_elements() {
            let ok: &[&str] = &["class", "card"];
            assert!(LocatorDescription::try_from(ok).is_ok());
            let bad: &[&str] = &["class"];
            assert!(matches!(
                LocatorDescription::try_from(bad),
                Err(ProbeError::UnsupportedLocatorKind { .. })
            ));
        }
    }

    mod query_tests {
        use super::*;

        #[test]
        fn test_css_query_escapes_quotes() {
            let q = Selector::css("input[placeholder=\"Please ONLY enter the street address.\"]").to_query();
            assert!(q.contains("querySelectorAll(\"input[placeholder=\\\"Please ONLY"));
            assert!(q.ends_with("[0] ?? null)"));
        }

        #[test]
        fn test_test_id_query_uses_attribute() {
            let q = Selector::test_id("header-logo").to_all_query();
            assert!(q.contains("data-testid"));
            assert!(q.contains("\"header-logo\""));
        }

        #[test]
        fn test_role_query_for_link() {
            let q = Selector::role("link", Some("SERVICES")).to_count_query();
            assert!(q.contains("a[href]"));
            assert!(q.ends_with(".length"));
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prefixed_and_pair_resolve_alike(value in "[a-zA-Z0-9_-]{1,24}") {
                prop_assert_eq!(resolve(format!("test_id:{value}")), resolve(("test_id", value.as_str())));
                prop_assert_eq!(resolve(format!("test_id:{value}")), resolve(("data_testid", value.as_str())));
                prop_assert_eq!(resolve(format!("css:{value}")), resolve(("css", value.as_str())));
                prop_assert_eq!(resolve(format!("xpath:{value}")), resolve(("xpath", value.as_str())));
                prop_assert_eq!(resolve(value.as_str()), resolve(("css_selector", value.as_str())));
            }

            #[test]
            fn unknown_kind_never_errors(kind in "[a-z]{3,12}", value in "[a-z.#]{1,12}") {
                let known = ["id", "xpath", "name", "class_name", "class", "link_text",
                             "partial_link_text", "data_testid", "test_id"];
                prop_assume!(!known.contains(&kind.as_str()));
                let handle = resolve((kind.as_str(), value.as_str()));
                prop_assert_eq!(handle.selector(), &Selector::css(value.clone()));
            }
        }
    }
}
