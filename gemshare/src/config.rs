//! Runtime configuration for shared-handle imports.
//!
//! All values have sensible defaults. Override via environment variables
//! (prefixed `GEMSHARE_`) or by constructing a custom `ShareConfig`.

use std::path::PathBuf;

/// Default DRM render node used by kernel transports that open a device.
pub const DEFAULT_DRM_DEVICE: &str = "/dev/dri/renderD128";

/// Settings for the buffer-object registry and its transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareConfig {
    /// Whether importing external handles is allowed at all. When false every
    /// acquire fails with `ShareError::Unsupported`.
    pub shared_import_enabled: bool,

    /// Ask the transport for the buffer size when an acquire passes a zero
    /// size hint.
    pub query_size_on_import: bool,

    /// Device node opened by DRM-backed transports.
    pub drm_device_path: PathBuf,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            shared_import_enabled: true,
            query_size_on_import: true,
            drm_device_path: PathBuf::from(DEFAULT_DRM_DEVICE),
        }
    }
}

impl ShareConfig {
    /// Load config from environment variables, falling back to defaults.
    ///
    /// Recognized variables:
    /// - `GEMSHARE_SHARED_IMPORT` (`1`/`0`, `true`/`false`, `on`/`off`)
    /// - `GEMSHARE_QUERY_SIZE` (same forms)
    /// - `GEMSHARE_DRM_DEVICE`
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(b) = lookup("GEMSHARE_SHARED_IMPORT").and_then(|v| parse_bool(&v)) {
            cfg.shared_import_enabled = b;
        }
        if let Some(b) = lookup("GEMSHARE_QUERY_SIZE").and_then(|v| parse_bool(&v)) {
            cfg.query_size_on_import = b;
        }
        if let Some(path) = lookup("GEMSHARE_DRM_DEVICE") {
            if !path.trim().is_empty() {
                cfg.drm_device_path = PathBuf::from(path.trim());
            }
        }

        cfg
    }
}

fn parse_bool(v: &str) -> Option<bool> {
    match v.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
