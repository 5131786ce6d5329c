use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// metalpriceapi.com issues 32-character hexadecimal keys.
pub const API_KEY_LEN: usize = 32;

/// Process-wide settings, persisted as their own JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// metalpriceapi.com API key (32 characters)
    pub api_key: String,

    /// Display currency for every monetary field (e.g. "GBP", "USD")
    pub currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            currency: "GBP".to_string(),
        }
    }
}

impl Config {
    /// Whether a plausibly valid API key is configured.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.len() == API_KEY_LEN
    }

    /// Validate and normalize a currency code: exactly 3 ASCII letters,
    /// stored uppercased.
    pub fn normalize_currency(code: &str) -> Result<String, CoreError> {
        let trimmed = code.trim().to_uppercase();
        if trimmed.len() != 3 || !trimmed.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(CoreError::ValidationError(format!(
                "Invalid currency code '{code}': must be exactly 3 ASCII letters (e.g. GBP, USD, EUR)"
            )));
        }
        Ok(trimmed)
    }

    /// Validate an API key before storing it.
    pub fn validate_api_key(key: &str) -> Result<(), CoreError> {
        if key.len() != API_KEY_LEN {
            return Err(CoreError::ValidationError(format!(
                "Invalid API key: expected {API_KEY_LEN} characters, got {}",
                key.len()
            )));
        }
        Ok(())
    }
}
