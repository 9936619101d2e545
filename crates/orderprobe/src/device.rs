//! Device profiles
//!
//! Viewport, user agent, and touch capability applied to each page the suite
//! opens. Profiles are looked up by the short names accepted in `DEVICE`.

use serde::{Deserialize, Serialize};

use crate::result::{ProbeError, ProbeResult};

/// Names accepted by [`DeviceProfile::by_name`]
pub const DEVICE_NAMES: [&str; 5] = ["desktop", "iphone17promax", "iphone17", "ipadpro", "pixel9pro"];

/// Viewport dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in CSS pixels
    pub width: u32,
    /// Height in CSS pixels
    pub height: u32,
}

impl Viewport {
    /// Create a new viewport
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}

/// Emulation parameters for one device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    /// Short name (e.g., `iphone17`)
    pub name: String,
    /// Viewport dimensions
    pub viewport: Viewport,
    /// Device pixel ratio
    pub device_scale_factor: f64,
    /// User agent string
    pub user_agent: String,
    /// Phone-class device
    pub is_mobile: bool,
    /// Tablet-class device
    pub is_tablet: bool,
}

impl DeviceProfile {
    /// Create a desktop-like profile
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            viewport: Viewport::default(),
            device_scale_factor: 1.0,
            user_agent: String::new(),
            is_mobile: false,
            is_tablet: false,
        }
    }

    /// Set viewport dimensions
    #[must_use]
    pub const fn with_viewport_size(mut self, width: u32, height: u32) -> Self {
        self.viewport = Viewport::new(width, height);
        self
    }

    /// Set device pixel ratio
    #[must_use]
    pub const fn with_scale_factor(mut self, factor: f64) -> Self {
        self.device_scale_factor = factor;
        self
    }

    /// Set user agent
    #[must_use]
    pub fn with_user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = ua.into();
        self
    }

    /// Mark as a phone
    #[must_use]
    pub const fn mobile(mut self) -> Self {
        self.is_mobile = true;
        self
    }

    /// Mark as a tablet
    #[must_use]
    pub const fn tablet(mut self) -> Self {
        self.is_tablet = true;
        self
    }

    /// Touch events are emulated for phones and tablets
    #[must_use]
    pub const fn has_touch(&self) -> bool {
        self.is_mobile || self.is_tablet
    }

    /// Desktop 1080p
    #[must_use]
    pub fn desktop() -> Self {
        Self::new("desktop").with_user_agent(
            "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
             (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
        )
    }

    /// iPhone 17 Pro Max
    #[must_use]
    pub fn iphone_17_pro_max() -> Self {
        Self::new("iphone17promax")
            .with_viewport_size(440, 956)
            .with_scale_factor(3.0)
            .with_user_agent(
                "Mozilla/5.0 (iPhone; CPU iPhone OS 26_0 like Mac OS X) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Version/26.0 Mobile/15E148 Safari/604.1",
            )
            .mobile()
    }

    /// iPhone 17
    #[must_use]
    pub fn iphone_17() -> Self {
        Self::new("iphone17")
            .with_viewport_size(402, 874)
            .with_scale_factor(3.0)
            .with_user_agent(
                "Mozilla/5.0 (iPhone; CPU iPhone OS 26_0 like Mac OS X) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Version/26.0 Mobile/15E148 Safari/604.1",
            )
            .mobile()
    }

    /// iPad Pro 13"
    #[must_use]
    pub fn ipad_pro() -> Self {
        Self::new("ipadpro")
            .with_viewport_size(1032, 1376)
            .with_scale_factor(2.0)
            .with_user_agent(
                "Mozilla/5.0 (iPad; CPU OS 26_0 like Mac OS X) AppleWebKit/605.1.15 \
                 (KHTML, like Gecko) Version/26.0 Mobile/15E148 Safari/604.1",
            )
            .tablet()
    }

    /// Pixel 9 Pro
    #[must_use]
    pub fn pixel_9_pro() -> Self {
        Self::new("pixel9pro")
            .with_viewport_size(410, 914)
            .with_scale_factor(3.0)
            .with_user_agent(
                "Mozilla/5.0 (Linux; Android 15; Pixel 9 Pro) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/131.0.0.0 Mobile Safari/537.36",
            )
            .mobile()
    }

    /// Look up a built-in profile, ignoring case
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedDevice` for names outside [`DEVICE_NAMES`].
    pub fn by_name(name: &str) -> ProbeResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::desktop()),
            "iphone17promax" => Ok(Self::iphone_17_pro_max()),
            "iphone17" => Ok(Self::iphone_17()),
            "ipadpro" => Ok(Self::ipad_pro()),
            "pixel9pro" => Ok(Self::pixel_9_pro()),
            _ => Err(ProbeError::UnsupportedDevice {
                device: name.to_string(),
            }),
        }
    }

    /// Every built-in profile
    #[must_use]
    pub fn all() -> Vec<Self> {
        vec![
            Self::desktop(),
            Self::iphone_17_pro_max(),
            Self::iphone_17(),
            Self::ipad_pro(),
            Self::pixel_9_pro(),
        ]
    }
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self::desktop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_is_case_insensitive() {
        assert_eq!(DeviceProfile::by_name("iPhone17").unwrap().name, "iphone17");
        assert_eq!(DeviceProfile::by_name(" PIXEL9PRO ").unwrap().name, "pixel9pro");
    }

    #[test]
    fn test_unknown_device() {
        let err = DeviceProfile::by_name("nokia3310").unwrap_err();
        assert!(matches!(err, ProbeError::UnsupportedDevice { ref device } if device == "nokia3310"));
    }

    #[test]
    fn test_touch_follows_form_factor() {
        assert!(!DeviceProfile::desktop().has_touch());
        assert!(DeviceProfile::iphone_17().has_touch());
        let ipad = DeviceProfile::ipad_pro();
        assert!(ipad.has_touch());
        assert!(!ipad.is_mobile);
    }

    #[test]
    fn test_all_matches_names() {
        let names: Vec<String> = DeviceProfile::all().into_iter().map(|d| d.name).collect();
        assert_eq!(names, DEVICE_NAMES);
    }

    #[test]
    fn test_desktop_viewport() {
        assert_eq!(DeviceProfile::desktop().viewport, Viewport::new(1920, 1080));
    }
}
