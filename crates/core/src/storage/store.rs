use std::path::Path;

use log::debug;
use serde::Serialize;

use crate::errors::CoreError;
use crate::models::config::Config;
use crate::models::inventory::Inventory;

use super::migration;

/// High-level storage operations: whole-document JSON read/overwrite for the
/// inventory and config files.
///
/// Absent or undecodable documents load as defaults — that is a recoverable
/// absence, not a fault. Saves are atomic (temp file + rename) so a crash
/// mid-write never leaves a truncated document behind.
pub struct StorageManager;

impl StorageManager {
    /// Load the inventory, migrating legacy documents on the fly.
    /// `currency` stamps the snapshot when migrating a legacy document,
    /// which predates per-document currency.
    pub fn load_inventory(path: &Path, currency: &str) -> Inventory {
        let Ok(text) = std::fs::read_to_string(path) else {
            debug!("No inventory document at {}, starting empty", path.display());
            return Inventory::default();
        };

        let Ok(value) = serde_json::from_str::<serde_json::Value>(&text) else {
            debug!("Undecodable inventory document, starting empty");
            return Inventory::default();
        };

        migration::decode_document(value, currency).unwrap_or_default()
    }

    /// Save the inventory as a versioned pretty-printed JSON document.
    pub fn save_inventory(path: &Path, inventory: &Inventory) -> Result<(), CoreError> {
        #[derive(Serialize)]
        struct VersionedDocument<'a> {
            version: u16,
            #[serde(flatten)]
            inventory: &'a Inventory,
        }

        let doc = VersionedDocument {
            version: migration::CURRENT_VERSION,
            inventory,
        };
        Self::write_atomic(path, &doc)
    }

    /// Load the config; defaults on absence or corruption.
    pub fn load_config(path: &Path) -> Config {
        std::fs::read_to_string(path)
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    /// Save the config as pretty-printed JSON.
    pub fn save_config(path: &Path, config: &Config) -> Result<(), CoreError> {
        Self::write_atomic(path, config)
    }

    /// Serialize pretty-printed, write next to the target, then rename over
    /// it. Rename is atomic on the same filesystem.
    fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|e| CoreError::Serialization(e.to_string()))?;

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}
