//! Plugin configuration, stored as `plugins/NoWeaponFlight/config.json`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("sweep_interval_ticks must be at least 1")]
    ZeroSweepInterval,
    #[error("{0} must not be empty")]
    EmptyPermission(&'static str),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FlightConfig {
    /// Ticks between two sweeps over the online players.
    pub sweep_interval_ticks: u64,
    pub bypass_permission: String,
    pub admin_permission: String,
    /// Action-bar text shown when flight gets suspended.
    pub warning_message: String,
    /// Action-bar text shown when an attack is vetoed mid-fall.
    pub attack_blocked_message: String,
    /// Play the sound and particle effects on suspension.
    pub effects: bool,
}

impl Default for FlightConfig {
    fn default() -> Self {
        Self {
            sweep_interval_ticks: 5,
            bypass_permission: "noweaponflight.bypass".into(),
            admin_permission: "noweaponflight.admin".into(),
            warning_message: "§cYou cannot fly while holding a mace or spear!".into(),
            attack_blocked_message: "§cYou cannot attack while falling!".into(),
            effects: true,
        }
    }
}

impl FlightConfig {
    /// Parse and validate a config value. Missing keys take their defaults.
    pub fn from_value(value: serde_json::Value) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_value(value)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sweep_interval_ticks == 0 {
            return Err(ConfigError::ZeroSweepInterval);
        }
        if self.bypass_permission.trim().is_empty() {
            return Err(ConfigError::EmptyPermission("bypass_permission"));
        }
        if self.admin_permission.trim().is_empty() {
            return Err(ConfigError::EmptyPermission("admin_permission"));
        }
        Ok(())
    }
}
