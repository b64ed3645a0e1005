/*!
Backup rotation: bounded-retention history of prior primary artifacts.

Each backup is a byte-for-byte copy of the primary at rotation time, named
`backup_slot<N>_<millis>.json` under the `backups/` directory. Retention is
capped per slot; the oldest entries are pruned first.
*/

use crate::{
    codec::{Codec, CodecOptions, Compressor},
    store::SaveLayout,
    Result,
};
use chrono::{DateTime, TimeZone, Utc};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, warn};

/// One entry in a slot's backup sequence.
#[derive(Debug, Clone, PartialEq)]
pub struct BackupEntry {
    pub path: PathBuf,
    pub created_at: DateTime<Utc>,
}

/// Rotates and restores per-slot backups under the save directory.
#[derive(Debug, Clone)]
pub struct BackupManager {
    layout: SaveLayout,
    max_backups: usize,
}

impl BackupManager {
    /// Create the manager, making the backups directory if needed.
    pub fn new(layout: SaveLayout, max_backups: usize) -> Result<Self> {
        fs::create_dir_all(layout.backups_dir())?;
        Ok(Self {
            layout,
            max_backups,
        })
    }

    pub fn max_backups(&self) -> usize {
        self.max_backups
    }

    /// Duplicate the slot's current primary into the backup sequence, then
    /// prune entries beyond the retention cap (oldest first).
    ///
    /// Returns `Ok(None)` when the slot has no primary artifact yet.
    pub fn create_backup(&self, slot: usize) -> Result<Option<PathBuf>> {
        let primary = self.layout.slot_path(slot);
        if !primary.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&primary)?;

        // Millisecond stamps can collide under rapid rotation; bump until
        // the filename is free so ordering stays total.
        let mut stamp = Utc::now().timestamp_millis();
        let mut path = self.layout.backup_path(slot, stamp);
        while path.exists() {
            stamp += 1;
            path = self.layout.backup_path(slot, stamp);
        }

        fs::write(&path, &bytes)?;
        debug!(slot, path = %path.display(), "rotated primary into backups");

        self.prune(slot)?;
        Ok(Some(path))
    }

    /// All backups for a slot, newest first.
    pub fn list_backups(&self, slot: usize) -> Result<Vec<BackupEntry>> {
        let dir = self.layout.backups_dir();
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let prefix = self.layout.backup_prefix(slot);

        let mut entries = Vec::new();
        for entry in fs::read_dir(&dir)? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(stamp) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".json"))
                .and_then(|stamp| stamp.parse::<i64>().ok())
            else {
                continue;
            };
            let Some(created_at) = Utc.timestamp_millis_opt(stamp).single() else {
                continue;
            };
            entries.push(BackupEntry { path, created_at });
        }

        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }

    /// Return the bytes of the newest backup that still decodes.
    ///
    /// Entries that fail to decode are skipped with a warning but left on
    /// disk for manual inspection. Returns `None` when no backup decodes.
    pub fn restore_from_backup<C: Compressor>(
        &self,
        codec: &Codec<C>,
        options: &CodecOptions,
        slot: usize,
    ) -> Result<Option<Vec<u8>>> {
        for entry in self.list_backups(slot)? {
            let bytes = match fs::read(&entry.path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    warn!(path = %entry.path.display(), error = %e, "backup unreadable, skipping");
                    continue;
                }
            };
            match codec.decode(&bytes, options) {
                Ok(_) => {
                    debug!(slot, path = %entry.path.display(), "recovered from backup");
                    return Ok(Some(bytes));
                }
                Err(e) => {
                    warn!(path = %entry.path.display(), error = %e, "backup fails decode, skipping");
                }
            }
        }
        Ok(None)
    }

    /// Remove every backup for the slot.
    pub fn purge(&self, slot: usize) -> Result<()> {
        for entry in self.list_backups(slot)? {
            fs::remove_file(&entry.path)?;
        }
        Ok(())
    }

    fn prune(&self, slot: usize) -> Result<()> {
        let entries = self.list_backups(slot)?;
        for entry in entries.iter().skip(self.max_backups) {
            debug!(path = %entry.path.display(), "pruning backup beyond retention cap");
            fs::remove_file(&entry.path)?;
        }
        Ok(())
    }
}
