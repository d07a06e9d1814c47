//! Optional RON settings file, overridden by command-line flags.

use std::fs;
use std::path::Path;
use std::time::Duration;

use engine_logging::{engine_info, engine_warn};
use relay_core::TimeRangePolicy;
use relay_engine::BackendSettings;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: Option<String>,
    pub connect_timeout_secs: Option<u64>,
    pub request_timeout_secs: Option<u64>,
    pub require_time_range: Option<bool>,
}

impl AppConfig {
    pub fn backend_settings(&self, base_url_override: Option<&str>) -> BackendSettings {
        let defaults = BackendSettings::default();
        BackendSettings {
            base_url: base_url_override
                .map(ToOwned::to_owned)
                .or_else(|| self.base_url.clone())
                .unwrap_or(defaults.base_url),
            connect_timeout: self
                .connect_timeout_secs
                .map_or(defaults.connect_timeout, Duration::from_secs),
            request_timeout: self
                .request_timeout_secs
                .map_or(defaults.request_timeout, Duration::from_secs),
        }
    }

    pub fn time_range_policy(&self, require_override: bool) -> TimeRangePolicy {
        if require_override || self.require_time_range.unwrap_or(true) {
            TimeRangePolicy::Required
        } else {
            TimeRangePolicy::Optional
        }
    }
}

/// Reads the settings file. A missing file yields defaults; an unreadable or
/// malformed one is logged and also yields defaults.
pub fn load_config(path: &Path) -> AppConfig {
    let content = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return AppConfig::default();
        }
        Err(err) => {
            engine_warn!("Failed to read config from {:?}: {}", path, err);
            return AppConfig::default();
        }
    };

    match ron::from_str(&content) {
        Ok(config) => {
            engine_info!("Loaded config from {:?}", path);
            config
        }
        Err(err) => {
            engine_warn!("Failed to parse config from {:?}: {}", path, err);
            AppConfig::default()
        }
    }
}
