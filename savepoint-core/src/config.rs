//! Configuration for the save engine: codec toggles, slot count,
//! autosave cadence and backup retention.

use crate::{Result, SaveError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Highest addressable slot count.
pub const MAX_SLOT_LIMIT: usize = 20;
/// Highest allowed backup retention per slot.
pub const MAX_BACKUP_LIMIT: usize = 10;
/// Shortest allowed autosave interval, in seconds.
pub const MIN_AUTOSAVE_INTERVAL_SECS: u64 = 10;

/// Engine configuration.
///
/// The codec flags are a contract between write and read time: an artifact
/// written with compression and encryption enabled can only be decoded with
/// the same flags active. Unknown fields in a config file are ignored and
/// missing fields fall back to defaults, so older files keep loading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SaveConfig {
    /// Encrypt artifacts with AES-256-GCM
    pub use_encryption: bool,
    /// Gzip artifacts before (optional) encryption
    pub compress_data: bool,
    /// Number of addressable save slots (1..=20)
    pub max_save_slots: usize,
    /// Drive the autosave scheduler from `SaveManager::tick`
    pub enable_auto_save: bool,
    /// Interval between timed autosaves, in seconds (>= 10)
    pub auto_save_interval_secs: u64,
    /// Rotate the previous primary into the backup set on every save
    pub create_backups: bool,
    /// Backups retained per slot (1..=10); oldest pruned first
    pub max_backups: usize,
    /// Passphrase stretched to the cipher key; must be non-empty when
    /// `use_encryption` is set
    pub passphrase: String,
}

impl Default for SaveConfig {
    fn default() -> Self {
        Self {
            use_encryption: true,
            compress_data: true,
            max_save_slots: 5,
            enable_auto_save: true,
            auto_save_interval_secs: 300,
            create_backups: true,
            max_backups: 3,
            passphrase: "savepoint-dev-passphrase".to_string(),
        }
    }
}

impl SaveConfig {
    /// Validate the configuration against the supported ranges.
    pub fn validate(&self) -> Result<()> {
        if self.max_save_slots == 0 || self.max_save_slots > MAX_SLOT_LIMIT {
            return Err(SaveError::config(format!(
                "max_save_slots must be in 1..={MAX_SLOT_LIMIT}, got {}",
                self.max_save_slots
            )));
        }
        if self.max_backups == 0 || self.max_backups > MAX_BACKUP_LIMIT {
            return Err(SaveError::config(format!(
                "max_backups must be in 1..={MAX_BACKUP_LIMIT}, got {}",
                self.max_backups
            )));
        }
        if self.auto_save_interval_secs < MIN_AUTOSAVE_INTERVAL_SECS {
            return Err(SaveError::config(format!(
                "auto_save_interval_secs must be >= {MIN_AUTOSAVE_INTERVAL_SECS}, got {}",
                self.auto_save_interval_secs
            )));
        }
        if self.use_encryption && self.passphrase.is_empty() {
            return Err(SaveError::config(
                "passphrase must not be empty when encryption is enabled",
            ));
        }
        Ok(())
    }

    /// Load a configuration from a JSON file and validate it.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config: SaveConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Write the configuration to a JSON file.
    pub fn store<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }
}
