//! Scenario context
//!
//! Values captured by one step and checked by a later step of the same
//! scenario. A fresh context is created per scenario and nothing outlives it.

use std::collections::HashMap;

use crate::result::{ProbeError, ProbeResult};

/// Keys shared by the order page steps
pub mod keys {
    /// Postal code typed into the address search
    pub const POSTAL_CODE: &str = "postal_code";
    /// First suggestion shown for the postal code
    pub const SUGGESTION_TEXT: &str = "suggestion_text";
    /// Suggestion clicked before confirming
    pub const SELECTED_ADDRESS_TEXT: &str = "selected_address_text";
    /// Delivery address displayed after confirming
    pub const CONFIRMED_ADDRESS: &str = "confirmed_address";
}

/// Named string values for one scenario
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScenarioContext {
    values: HashMap<String, String>,
}

impl ScenarioContext {
    /// Create an empty context
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, replacing any previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Get a value by key
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Get a value, or the empty string when absent
    #[must_use]
    pub fn get_or_empty(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }

    /// Get a value that an earlier step must have stored
    ///
    /// # Errors
    ///
    /// Returns `AssertionFailed` naming the missing key.
    pub fn require(&self, key: &str) -> ProbeResult<&str> {
        self.get(key)
            .ok_or_else(|| ProbeError::assertion(format!("scenario context has no `{key}`")))
    }

    /// Number of stored values
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether nothing is stored
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drop every value
    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces() {
        let mut ctx = ScenarioContext::new();
        ctx.insert(keys::POSTAL_CODE, "M5V 2T6");
        ctx.insert(keys::POSTAL_CODE, "M4W 1A8");
        assert_eq!(ctx.get(keys::POSTAL_CODE), Some("M4W 1A8"));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let ctx = ScenarioContext::new();
        assert!(ctx.is_empty());
        assert_eq!(ctx.get_or_empty(keys::CONFIRMED_ADDRESS), "");
        let err = ctx.require(keys::SUGGESTION_TEXT).unwrap_err();
        assert!(matches!(err, ProbeError::AssertionFailed { ref message } if message.contains("suggestion_text")));
    }

    #[test]
    fn test_clear() {
        let mut ctx = ScenarioContext::new();
        ctx.insert(keys::SELECTED_ADDRESS_TEXT, "1 King St W");
        ctx.clear();
        assert!(ctx.is_empty());
    }
}
