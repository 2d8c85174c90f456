use std::time::Duration;

/// Environment variable that overrides the API base URL on native builds.
pub const API_URL_ENV: &str = "SHOWROOM_API_URL";

/// Tuning knobs for the showroom. Everything has a sensible default; only the
/// API base URL is normally overridden.
#[derive(Clone, Debug, PartialEq)]
pub struct ShowroomConfig {
    /// Prefix for every API path. Empty means "same origin" on the web.
    pub api_base_url: String,
    /// Fraction of the room image width the overlay occupies by default.
    pub overlay_fraction: f32,
    /// Overlay fraction used below `mobile_breakpoint`.
    pub mobile_overlay_fraction: f32,
    pub min_overlay_size: f32,
    /// Viewport widths at or below this get the mobile layout.
    pub mobile_breakpoint: f32,
    pub resolve_batch_size: usize,
    pub resolve_batch_delay: Duration,
    /// Seconds of quiet before a viewport resize is applied.
    pub resize_debounce: f64,
    /// Seconds a status message stays on screen.
    pub status_ttl: f64,
}

impl Default for ShowroomConfig {
    fn default() -> Self {
        Self {
            api_base_url: default_base_url(),
            overlay_fraction: 0.4,
            mobile_overlay_fraction: 0.5,
            min_overlay_size: 50.0,
            mobile_breakpoint: 768.0,
            resolve_batch_size: 3,
            resolve_batch_delay: Duration::from_millis(200),
            resize_debounce: 0.25,
            status_ttl: 4.0,
        }
    }
}

impl ShowroomConfig {
    /// Reads overrides from the process environment (native only).
    pub fn from_env() -> Self {
        #[allow(unused_mut)]
        let mut config = Self::default();
        #[cfg(not(target_arch = "wasm32"))]
        if let Ok(url) = std::env::var(API_URL_ENV) {
            config.api_base_url = normalize_base_url(&url);
        }
        log::info!("Using API base URL {:?}", config.api_base_url);
        config
    }

    pub fn is_mobile(&self, viewport_width: f32) -> bool {
        viewport_width <= self.mobile_breakpoint
    }

    pub fn overlay_fraction_for(&self, viewport_width: f32) -> f32 {
        if self.is_mobile(viewport_width) {
            self.mobile_overlay_fraction
        } else {
            self.overlay_fraction
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_owned()
}

// Same origin as the page serving the wasm bundle.
#[cfg(target_arch = "wasm32")]
fn default_base_url() -> String {
    String::new()
}

pub fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_owned()
}
