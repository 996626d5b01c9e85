use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Stores planner preferences. Missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    /// Optional custom directory for owner documents. Defaults to `<data dir>/CashFlow`.
    pub data_root: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_owner: Option<String>,
    #[serde(default)]
    pub recurrence: RecurrenceSettings,
}

impl Config {
    pub fn resolve_data_root(&self) -> PathBuf {
        if let Some(path) = &self.data_root {
            return path.clone();
        }

        let base = dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."));

        base.join("CashFlow")
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.recurrence.validate()
    }
}

/// Month counts controlling how far recurring masters are materialized.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecurrenceSettings {
    #[serde(default = "RecurrenceSettings::default_initial_months")]
    pub initial_months: u32,
    #[serde(default = "RecurrenceSettings::default_threshold_months")]
    pub threshold_months: u32,
    #[serde(default = "RecurrenceSettings::default_extension_months")]
    pub extension_months: u32,
}

impl RecurrenceSettings {
    pub fn default_initial_months() -> u32 {
        12
    }

    pub fn default_threshold_months() -> u32 {
        6
    }

    pub fn default_extension_months() -> u32 {
        12
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.initial_months == 0 || self.extension_months == 0 {
            return Err(ConfigError::Invalid(
                "initial_months and extension_months must be at least 1".into(),
            ));
        }
        if self.threshold_months > self.extension_months {
            return Err(ConfigError::Invalid(format!(
                "threshold_months ({}) cannot exceed extension_months ({})",
                self.threshold_months, self.extension_months
            )));
        }
        Ok(())
    }
}

impl Default for RecurrenceSettings {
    fn default() -> Self {
        Self {
            initial_months: Self::default_initial_months(),
            threshold_months: Self::default_threshold_months(),
            extension_months: Self::default_extension_months(),
        }
    }
}
