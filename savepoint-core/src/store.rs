/*!
Slot store: maps slot indices to files under the save directory and owns the
metadata sidecars, screenshots and the quicksave artifact.

Layout, relative to the root:

```text
save_slot_<N>.json
metadata_<N>.json
save_screenshot_<N>.png
quicksave.json
backups/backup_slot<N>_<millis>.json
```
*/

use crate::{
    record::{SaveRecord, SlotMetadata},
    Result, SaveError,
};
use chrono::{DateTime, Utc};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Path construction for everything under one save directory.
#[derive(Debug, Clone)]
pub struct SaveLayout {
    root: PathBuf,
}

impl SaveLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn slot_path(&self, slot: usize) -> PathBuf {
        self.root.join(format!("save_slot_{slot}.json"))
    }

    pub fn metadata_path(&self, slot: usize) -> PathBuf {
        self.root.join(format!("metadata_{slot}.json"))
    }

    pub fn screenshot_path(&self, slot: usize) -> PathBuf {
        self.root.join(format!("save_screenshot_{slot}.png"))
    }

    pub fn quicksave_path(&self) -> PathBuf {
        self.root.join("quicksave.json")
    }

    pub fn backups_dir(&self) -> PathBuf {
        self.root.join("backups")
    }

    pub fn backup_path(&self, slot: usize, stamp_millis: i64) -> PathBuf {
        self.backups_dir()
            .join(format!("backup_slot{slot}_{stamp_millis}.json"))
    }

    /// Filename prefix shared by every backup of the given slot.
    pub fn backup_prefix(&self, slot: usize) -> String {
        format!("backup_slot{slot}_")
    }
}

/// File-backed store for slot primaries, metadata sidecars, screenshots and
/// the quicksave artifact.
///
/// Every operation is slot-range-checked and uses one-shot `std::fs` calls,
/// so file handles are released on every exit path.
#[derive(Debug, Clone)]
pub struct SlotStore {
    layout: SaveLayout,
    max_slots: usize,
}

impl SlotStore {
    /// Create the store, making the save directory if needed.
    pub fn new(layout: SaveLayout, max_slots: usize) -> Result<Self> {
        fs::create_dir_all(layout.root())?;
        Ok(Self { layout, max_slots })
    }

    pub fn layout(&self) -> &SaveLayout {
        &self.layout
    }

    pub fn max_slots(&self) -> usize {
        self.max_slots
    }

    /// Fail with `InvalidSlot` when the index is out of range.
    pub fn check_slot(&self, slot: usize) -> Result<()> {
        if slot >= self.max_slots {
            return Err(SaveError::InvalidSlot {
                slot,
                max_slots: self.max_slots,
            });
        }
        Ok(())
    }

    /// Write the primary artifact for a slot.
    pub fn write(&self, slot: usize, bytes: &[u8]) -> Result<()> {
        self.check_slot(slot)?;
        fs::write(self.layout.slot_path(slot), bytes)?;
        debug!(slot, size = bytes.len(), "wrote primary artifact");
        Ok(())
    }

    /// Read the primary artifact for a slot.
    pub fn read(&self, slot: usize) -> Result<Vec<u8>> {
        self.check_slot(slot)?;
        Ok(fs::read(self.layout.slot_path(slot))?)
    }

    /// True when a primary artifact exists for the slot.
    pub fn exists(&self, slot: usize) -> bool {
        slot < self.max_slots && self.layout.slot_path(slot).exists()
    }

    /// Delete the slot's primary artifact, metadata sidecar and screenshot.
    ///
    /// Backups are owned by the backup manager; the save orchestrator purges
    /// them in the same delete operation.
    pub fn delete(&self, slot: usize) -> Result<()> {
        self.check_slot(slot)?;
        remove_if_present(&self.layout.slot_path(slot))?;
        remove_if_present(&self.layout.metadata_path(slot))?;
        remove_if_present(&self.layout.screenshot_path(slot))?;
        debug!(slot, "deleted slot artifacts");
        Ok(())
    }

    /// Write the metadata sidecar for a slot.
    pub fn write_metadata(&self, slot: usize, metadata: &SlotMetadata) -> Result<()> {
        self.check_slot(slot)?;
        let text = serde_json::to_string_pretty(metadata)?;
        fs::write(self.layout.metadata_path(slot), text)?;
        Ok(())
    }

    /// Read the metadata sidecar for a slot.
    ///
    /// Returns `None` when the slot is empty. When the sidecar is missing or
    /// unreadable but the primary artifact exists, a minimal low-confidence
    /// summary is synthesized from file attributes.
    pub fn read_metadata(&self, slot: usize) -> Result<Option<SlotMetadata>> {
        self.check_slot(slot)?;
        let path = self.layout.metadata_path(slot);
        if path.exists() {
            match fs::read_to_string(&path)
                .map_err(SaveError::from)
                .and_then(|text| Ok(serde_json::from_str::<SlotMetadata>(&text)?))
            {
                Ok(metadata) => return Ok(Some(metadata)),
                Err(e) => {
                    warn!(slot, error = %e, "metadata sidecar unreadable, synthesizing");
                }
            }
        }
        self.synthesize_metadata(slot)
    }

    fn synthesize_metadata(&self, slot: usize) -> Result<Option<SlotMetadata>> {
        let primary = self.layout.slot_path(slot);
        if !primary.exists() {
            return Ok(None);
        }
        let attrs = fs::metadata(&primary)?;
        let modified: DateTime<Utc> = attrs
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        Ok(Some(SlotMetadata::synthesized(slot, attrs.len(), modified)))
    }

    /// Write the companion screenshot for a slot.
    pub fn write_screenshot(&self, slot: usize, png: &[u8]) -> Result<()> {
        self.check_slot(slot)?;
        fs::write(self.layout.screenshot_path(slot), png)?;
        Ok(())
    }

    /// Read the companion screenshot for a slot, if present.
    pub fn read_screenshot(&self, slot: usize) -> Result<Option<Vec<u8>>> {
        self.check_slot(slot)?;
        let path = self.layout.screenshot_path(slot);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(path)?))
    }

    /// Write the quicksave artifact.
    pub fn write_quicksave(&self, bytes: &[u8]) -> Result<()> {
        fs::write(self.layout.quicksave_path(), bytes)?;
        Ok(())
    }

    /// Read the quicksave artifact.
    pub fn read_quicksave(&self) -> Result<Vec<u8>> {
        Ok(fs::read(self.layout.quicksave_path())?)
    }

    /// True when a quicksave artifact exists.
    pub fn quicksave_exists(&self) -> bool {
        self.layout.quicksave_path().exists()
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)?;
    }
    Ok(())
}

/// Regenerate a slot's metadata sidecar from a decoded record and the
/// encoded artifact it came from.
pub fn refresh_metadata(
    store: &SlotStore,
    slot: usize,
    record: &SaveRecord,
    encoded: &[u8],
) -> Result<()> {
    store.write_metadata(slot, &SlotMetadata::from_record(slot, record, encoded))
}
