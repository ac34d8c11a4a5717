//! Tracker configuration, passed in as JSON by the host application.
//!
//! ```rust
//! use workout_tracker_core::config::TrackerConfig;
//!
//! let config = TrackerConfig::from_json(r#"{"dbPath": "/data/user/0/app/workouts"}"#)?;
//! assert_eq!(config.namespace, "workout-tracker");
//! # Ok::<(), serde_json::Error>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::local_db_state::DEFAULT_MAP_SIZE;

pub const DEFAULT_NAMESPACE: &str = "workout-tracker";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// Database location; the environment lives in `<db_path>.lmdb`.
    pub db_path: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    #[serde(default = "default_map_size")]
    pub map_size: usize,
}

impl TrackerConfig {
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            namespace: default_namespace(),
            map_size: DEFAULT_MAP_SIZE,
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_map_size() -> usize {
    DEFAULT_MAP_SIZE
}
