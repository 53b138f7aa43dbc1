//! Runtime configuration for [`DataManager`](crate::DataManager).

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::point::DEFAULT_POINT_ANGLE;

/// Top-level settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataManagerConfig {
    /// Neighborhood size used by normal estimation when none is given
    #[serde(default = "defaults::normal_neighbors")]
    pub normal_neighbors: usize,

    /// Normal angle of points created without orientation (radians)
    #[serde(default = "defaults::point_angle")]
    pub default_point_angle: f32,

    /// Initial parameters of the fitting passes
    #[serde(default)]
    pub passes: PassDefaults,
}

impl Default for DataManagerConfig {
    fn default() -> Self {
        Self {
            normal_neighbors: defaults::normal_neighbors(),
            default_point_angle: defaults::point_angle(),
            passes: PassDefaults::default(),
        }
    }
}

impl DataManagerConfig {
    /// Parses a JSON document; missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and parses a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Renders the settings as pretty-printed JSON.
    pub fn to_json_string(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the settings to `path`, readable by [`from_json_file`](Self::from_json_file).
    pub fn to_json_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_json_string()?)?;
        Ok(())
    }
}

/// Parameters every pass starts with.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PassDefaults {
    /// Neighborhood radius of the local fits
    #[serde(default = "defaults::scale")]
    pub scale: f32,

    /// Re-centring steps of the MLS passes
    #[serde(default = "defaults::mls_iterations")]
    pub mls_iterations: usize,

    /// Point used by the single-neighborhood passes
    #[serde(default)]
    pub source_index: usize,
}

impl Default for PassDefaults {
    fn default() -> Self {
        Self {
            scale: defaults::scale(),
            mls_iterations: defaults::mls_iterations(),
            source_index: 0,
        }
    }
}

mod defaults {
    pub fn normal_neighbors() -> usize {
        3
    }

    pub fn point_angle() -> f32 {
        super::DEFAULT_POINT_ANGLE
    }

    pub fn scale() -> f32 {
        0.25
    }

    pub fn mls_iterations() -> usize {
        3
    }
}
