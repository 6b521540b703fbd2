//! Engine configuration.
//!
//! Hosts configure the engine once at startup. Everything has a sensible
//! default, so `EngineConfig::default()` is enough for an in-memory engine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PersistError, PersistResult};

/// Namespace used for zones created through this engine.
pub const DEFAULT_NAMESPACE: &str = "zones";

/// Engine configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Root directory for all persisted data.
    pub data_dir: PathBuf,

    /// Sub-directory of `data_dir` holding zone records, one folder per
    /// namespace.
    pub zones_dir: String,

    /// Record name (without extension) of the defaults document, stored
    /// directly under `data_dir`.
    pub defaults_record: String,

    /// Namespace newly registered zones are saved under.
    pub namespace: String,

    /// How long a bounds preview stays visible before it is reverted.
    #[serde(with = "duration_secs")]
    pub bounds_preview: Duration,

    /// Most blocks a single bounds preview highlights.
    pub preview_block_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("config/zone"),
            zones_dir: "zones".to_string(),
            defaults_record: "defaults".to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            bounds_preview: Duration::from_secs(10),
            preview_block_limit: 4096,
        }
    }
}

impl EngineConfig {
    /// Read a configuration document. Missing fields take their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> PersistResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PersistError::Io {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| PersistError::Encoding {
            path: path.display().to_string(),
            source,
        })
    }

    /// Set the data directory.
    #[must_use]
    pub fn with_data_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.data_dir = dir.into();
        self
    }

    /// Set the namespace for newly registered zones.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Set the bounds preview duration.
    #[must_use]
    pub fn with_bounds_preview(mut self, duration: Duration) -> Self {
        self.bounds_preview = duration;
        self
    }

    /// Set the block cap of a bounds preview.
    #[must_use]
    pub fn with_preview_block_limit(mut self, limit: usize) -> Self {
        self.preview_block_limit = limit;
        self
    }

    /// Directory holding zone record namespaces.
    #[must_use]
    pub fn zones_path(&self) -> PathBuf {
        self.data_dir.join(&self.zones_dir)
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(duration.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        if !secs.is_finite() || secs < 0.0 {
            return Err(serde::de::Error::custom("duration must be a non-negative number of seconds"));
        }
        Ok(Duration::from_secs_f64(secs))
    }
}
