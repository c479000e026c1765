//! Engine configuration

use crate::error::{PatchError, Result};
use crate::logging::LogConfig;
use serde::{Deserialize, Serialize};

/// Highest universe ceiling accepted (Art-Net port-address range).
pub const MAX_UNIVERSE_CEILING: u16 = 32768;

/// Process-wide settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatchConfig {
    /// Number of universes available to the patch
    pub max_universes: u16,
    /// Location label used when none is given
    pub default_location: String,
    /// Logging configuration
    pub log: LogConfig,
}

impl Default for PatchConfig {
    fn default() -> Self {
        Self {
            max_universes: 24,
            default_location: "Stage".to_string(),
            log: LogConfig::default(),
        }
    }
}

impl PatchConfig {
    /// Check the settings are usable
    pub fn validate(&self) -> Result<()> {
        if self.max_universes == 0 || self.max_universes > MAX_UNIVERSE_CEILING {
            return Err(PatchError::InvalidParameter(format!(
                "max_universes must be between 1 and {MAX_UNIVERSE_CEILING}, got {}",
                self.max_universes
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PatchConfig::default();
        assert_eq!(config.max_universes, 24);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_ceiling() {
        let mut config = PatchConfig {
            max_universes: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
        config.max_universes = MAX_UNIVERSE_CEILING + 1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PatchConfig = serde_json::from_str(r#"{"max_universes": 4}"#).unwrap();
        assert_eq!(config.max_universes, 4);
        assert_eq!(config.default_location, "Stage");
    }
}
