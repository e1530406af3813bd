//! Configuration loading.
//!
//! [`GridConfig`] bundles the store, drag and resize configuration so an
//! application can keep them in one TOML or JSON document. Every section and
//! every field is optional; missing values keep their defaults.
//!
//! ```ignore
//! use horizon_grid::config::GridConfig;
//!
//! let config = GridConfig::from_toml_str(r#"
//! [store]
//! use_group_footers = true
//!
//! [drag]
//! threshold = 8.0
//! touch_start_delay = 250
//!
//! [resize]
//! direction = "vertical"
//! max_height = 400.0
//! "#)?;
//! ```

use horizon_grid_core::logging::targets;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::gesture::{DragConfig, ResizeConfig};
use crate::model::StoreConfig;

/// Store, drag and resize configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub store: StoreConfig,
    pub drag: DragConfig,
    pub resize: ResizeConfig,
}

impl GridConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config = toml::from_str(source)?;
        tracing::debug!(target: targets::CORE, "grid configuration loaded from TOML");
        Ok(config)
    }

    /// Parse a JSON document.
    pub fn from_json_str(source: &str) -> Result<Self> {
        let config = serde_json::from_str(source)?;
        tracing::debug!(target: targets::CORE, "grid configuration loaded from JSON");
        Ok(config)
    }

    /// Serialize to pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// (De)serializes a [`Duration`](std::time::Duration) as whole milliseconds.
pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).unwrap_or(u64::MAX);
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
