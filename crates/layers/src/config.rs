use serde::{Deserialize, Serialize};

/// Tuning for [`crate::entity_cluster::EntityCluster`].
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Screen-pixel slack added around each label's footprint before merging.
    pub pixel_range: f64,
    /// Camera-change notifications with a smaller normalized magnitude are ignored.
    pub min_change: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            pixel_range: 5.0,
            min_change: 0.05,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvalidPixelRange(f64),
    InvalidMinChange(f64),
    Parse(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::InvalidPixelRange(v) => {
                write!(f, "pixel_range must be finite and non-negative, got {v}")
            }
            ConfigError::InvalidMinChange(v) => {
                write!(f, "min_change must be finite and non-negative, got {v}")
            }
            ConfigError::Parse(msg) => write!(f, "invalid cluster config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ClusterConfig {
    pub fn with_pixel_range(pixel_range: f64) -> Self {
        Self {
            pixel_range,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.pixel_range.is_finite() || self.pixel_range < 0.0 {
            return Err(ConfigError::InvalidPixelRange(self.pixel_range));
        }
        if !self.min_change.is_finite() || self.min_change < 0.0 {
            return Err(ConfigError::InvalidMinChange(self.min_change));
        }
        Ok(())
    }

    /// Parses a JSON object; missing fields take their defaults.
    pub fn from_json_str(raw: &str) -> Result<Self, ConfigError> {
        let config: ClusterConfig =
            serde_json::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}
