/*!
Save/load orchestration.

`SaveManager` wires the snapshot registry, codec pipeline, slot store,
backup rotation and autosave scheduler into the save and load state
machines. It is constructed explicitly at startup and handed to whatever
drives it; nothing here is a process-wide singleton.
*/

use crate::{
    autosave::{AutosaveScheduler, AutosaveTrigger},
    backup::{BackupEntry, BackupManager},
    codec::{Codec, CodecOptions, Compressor, GzipCompressor},
    config::SaveConfig,
    events::{EventBus, SaveEvent},
    integrity,
    record::{SaveRecord, SlotMetadata},
    snapshot::SnapshotRegistry,
    store::{SaveLayout, SlotStore},
    Result, SaveError,
};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// Slot reserved for scheduler-driven autosaves.
pub const AUTOSAVE_SLOT: usize = 0;

/// Where the save/load state machine currently is.
///
/// Success paths end back at `Idle`; any stage failure parks the machine in
/// `Failed` until the next operation starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SavePhase {
    Idle,
    Collecting,
    Encoding,
    Writing,
    Reading,
    Decoding,
    Applying,
    Repairing,
    Failed,
}

/// Listing entry for one slot; `metadata` is `None` for empty slots.
#[derive(Debug, Clone)]
pub struct SlotSummary {
    pub slot: usize,
    pub metadata: Option<SlotMetadata>,
    pub backup_count: usize,
}

/// Orchestrates saving and loading across the whole engine.
///
/// The encode buffer is fully built in memory before any file write begins,
/// so a mid-pipeline failure never corrupts the previous on-disk primary.
/// A save or load entered while another is in flight fails with
/// `SaveError::OperationInFlight` rather than interleaving file writes.
pub struct SaveManager<C: Compressor = GzipCompressor> {
    config: SaveConfig,
    options: CodecOptions,
    registry: SnapshotRegistry,
    store: SlotStore,
    codec: Codec<C>,
    backups: BackupManager,
    scheduler: AutosaveScheduler,
    events: EventBus,
    phase: SavePhase,
    in_flight: bool,
    play_time_seconds: f64,
}

impl SaveManager<GzipCompressor> {
    /// Gzip-backed manager rooted at the given save directory.
    pub fn new<P: AsRef<Path>>(root: P, config: SaveConfig) -> Result<Self> {
        Self::with_compressor(root, config, GzipCompressor::new())
    }
}

impl<C: Compressor> SaveManager<C> {
    /// Manager with an explicit compression stage.
    pub fn with_compressor<P: AsRef<Path>>(
        root: P,
        config: SaveConfig,
        compressor: C,
    ) -> Result<Self> {
        config.validate()?;

        let layout = SaveLayout::new(root);
        let store = SlotStore::new(layout.clone(), config.max_save_slots)?;
        let backups = BackupManager::new(layout, config.max_backups)?;

        // An empty passphrase only passes validation when encryption is off;
        // the cipher still needs a key even though it never touches data then.
        let passphrase = if config.passphrase.is_empty() {
            SaveConfig::default().passphrase
        } else {
            config.passphrase.clone()
        };
        let codec = Codec::with_compressor(&passphrase, compressor)?;

        let options = CodecOptions::from(&config);
        let mut scheduler =
            AutosaveScheduler::new(Duration::from_secs(config.auto_save_interval_secs));
        scheduler.set_enabled(config.enable_auto_save);

        Ok(Self {
            config,
            options,
            registry: SnapshotRegistry::new(),
            store,
            codec,
            backups,
            scheduler,
            events: EventBus::new(),
            phase: SavePhase::Idle,
            in_flight: false,
            play_time_seconds: 0.0,
        })
    }

    pub fn config(&self) -> &SaveConfig {
        &self.config
    }

    pub fn layout(&self) -> &SaveLayout {
        self.store.layout()
    }

    pub fn phase(&self) -> SavePhase {
        self.phase
    }

    pub fn play_time_seconds(&self) -> f64 {
        self.play_time_seconds
    }

    /// The bus on which save/load outcomes are published.
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn registry(&self) -> &SnapshotRegistry {
        &self.registry
    }

    /// Mutable access to the registry, for wiring collaborators at startup.
    pub fn registry_mut(&mut self) -> &mut SnapshotRegistry {
        &mut self.registry
    }

    fn begin(&mut self) -> Result<()> {
        if self.in_flight {
            return Err(SaveError::OperationInFlight);
        }
        self.in_flight = true;
        Ok(())
    }

    /// Collect, encode and write the full snapshot into a slot.
    ///
    /// When backups are enabled the previous primary is rotated into the
    /// backup set before being overwritten; metadata is written together
    /// with the primary. On failure the previous on-disk primary is left
    /// untouched and a `SaveFailed` event carries the reason.
    pub fn save(&mut self, slot: usize) -> Result<()> {
        self.store.check_slot(slot)?;
        self.begin()?;
        self.events.emit(&SaveEvent::SaveStarted { slot });

        let result = self.save_inner(slot);
        self.in_flight = false;
        match &result {
            Ok(()) => {
                self.phase = SavePhase::Idle;
                self.events.emit(&SaveEvent::SaveCompleted { slot });
                info!(slot, "save completed");
            }
            Err(e) => {
                self.phase = SavePhase::Failed;
                self.events.emit(&SaveEvent::SaveFailed {
                    slot,
                    reason: e.to_string(),
                });
                warn!(slot, error = %e, "save failed");
            }
        }
        result
    }

    fn save_inner(&mut self, slot: usize) -> Result<()> {
        self.phase = SavePhase::Collecting;
        let record = self.registry.collect(self.play_time_seconds);

        self.phase = SavePhase::Encoding;
        let encoded = self.codec.encode(&record, &self.options)?;

        self.phase = SavePhase::Writing;
        if self.config.create_backups {
            self.backups.create_backup(slot)?;
        }
        self.store.write(slot, &encoded)?;
        self.store
            .write_metadata(slot, &SlotMetadata::from_record(slot, &record, &encoded))
    }

    /// Read, decode and apply the snapshot stored in a slot.
    ///
    /// A read or decode failure triggers one repair cycle through the most
    /// recent valid backup before the failure is surfaced. A record written
    /// by a different build logs a warning and loads best-effort.
    pub fn load(&mut self, slot: usize) -> Result<()> {
        self.store.check_slot(slot)?;
        self.begin()?;

        let result = self.load_inner(slot);
        self.in_flight = false;
        match &result {
            Ok(()) => {
                self.phase = SavePhase::Idle;
                self.events.emit(&SaveEvent::LoadCompleted { slot });
                info!(slot, "load completed");
            }
            Err(e) => {
                self.phase = SavePhase::Failed;
                self.events.emit(&SaveEvent::LoadFailed {
                    slot,
                    reason: e.to_string(),
                });
                warn!(slot, error = %e, "load failed");
            }
        }
        result
    }

    fn load_inner(&mut self, slot: usize) -> Result<()> {
        let record = match self.read_and_decode(slot) {
            Ok(record) => record,
            Err(e) => {
                warn!(slot, error = %e, "primary artifact unreadable, trying backups");
                self.phase = SavePhase::Repairing;
                if !integrity::repair(&self.store, &self.codec, &self.options, &self.backups, slot)?
                {
                    return Err(e);
                }
                self.events.emit(&SaveEvent::SlotRepaired { slot });
                self.read_and_decode(slot)?
            }
        };

        if !record.is_current_version() {
            warn!(
                stored = %record.format_version,
                current = %crate::record::SAVE_FORMAT_VERSION,
                "save was written by a different build, loading best-effort"
            );
        }

        self.phase = SavePhase::Applying;
        self.registry.apply(&record)?;
        self.play_time_seconds = record.play_time_seconds;
        Ok(())
    }

    fn read_and_decode(&mut self, slot: usize) -> Result<SaveRecord> {
        self.phase = SavePhase::Reading;
        let bytes = self.store.read(slot)?;
        self.phase = SavePhase::Decoding;
        self.codec.decode(&bytes, &self.options)
    }

    /// Decode a slot's record without applying it to any collaborator.
    pub fn read_record(&self, slot: usize) -> Result<SaveRecord> {
        let bytes = self.store.read(slot)?;
        self.codec.decode(&bytes, &self.options)
    }

    /// Write the reduced essential-section snapshot to the quicksave file.
    ///
    /// Quicksaves bypass backup rotation and the metadata sidecar.
    pub fn quick_save(&mut self) -> Result<()> {
        self.begin()?;
        let result = self.quick_save_inner();
        self.in_flight = false;
        self.phase = match result {
            Ok(()) => SavePhase::Idle,
            Err(_) => SavePhase::Failed,
        };
        result
    }

    fn quick_save_inner(&mut self) -> Result<()> {
        self.phase = SavePhase::Collecting;
        let record = self.registry.collect_minimal(self.play_time_seconds);
        self.phase = SavePhase::Encoding;
        let encoded = self.codec.encode(&record, &self.options)?;
        self.phase = SavePhase::Writing;
        self.store.write_quicksave(&encoded)
    }

    /// Read and apply the quicksave artifact.
    pub fn quick_load(&mut self) -> Result<()> {
        self.begin()?;
        let result = self.quick_load_inner();
        self.in_flight = false;
        self.phase = match result {
            Ok(()) => SavePhase::Idle,
            Err(_) => SavePhase::Failed,
        };
        result
    }

    fn quick_load_inner(&mut self) -> Result<()> {
        self.phase = SavePhase::Reading;
        let bytes = self.store.read_quicksave()?;
        self.phase = SavePhase::Decoding;
        let record = self.codec.decode(&bytes, &self.options)?;
        self.phase = SavePhase::Applying;
        self.registry.apply(&record)?;
        self.play_time_seconds = record.play_time_seconds;
        Ok(())
    }

    /// Remove a slot's primary, metadata, screenshot and every backup.
    pub fn delete_slot(&mut self, slot: usize) -> Result<()> {
        self.store.delete(slot)?;
        self.backups.purge(slot)?;
        self.events.emit(&SaveEvent::SlotDeleted { slot });
        info!(slot, "deleted slot");
        Ok(())
    }

    /// True when a primary artifact exists for the slot.
    pub fn slot_exists(&self, slot: usize) -> bool {
        self.store.exists(slot)
    }

    /// The denormalized summary for a slot, if any.
    pub fn metadata(&self, slot: usize) -> Result<Option<SlotMetadata>> {
        self.store.read_metadata(slot)
    }

    /// Metadata-only listing of every slot; no artifact is decoded.
    pub fn list_slots(&self) -> Result<Vec<SlotSummary>> {
        let mut slots = Vec::with_capacity(self.store.max_slots());
        for slot in 0..self.store.max_slots() {
            slots.push(SlotSummary {
                slot,
                metadata: self.store.read_metadata(slot)?,
                backup_count: self.backups.list_backups(slot)?.len(),
            });
        }
        Ok(slots)
    }

    /// Check that a slot's primary artifact decodes cleanly.
    pub fn validate_slot(&self, slot: usize) -> bool {
        integrity::validate(&self.store, &self.codec, &self.options, slot)
    }

    /// Restore a corrupt slot from its newest decodable backup.
    pub fn repair_slot(&mut self, slot: usize) -> Result<bool> {
        let repaired =
            integrity::repair(&self.store, &self.codec, &self.options, &self.backups, slot)?;
        if repaired {
            self.events.emit(&SaveEvent::SlotRepaired { slot });
        }
        Ok(repaired)
    }

    /// The retained backups for a slot, newest first.
    pub fn backups(&self, slot: usize) -> Result<Vec<BackupEntry>> {
        self.backups.list_backups(slot)
    }

    /// Store the companion screenshot captured for a slot.
    ///
    /// Capture timing (after the frame that produced the save finishes
    /// rendering) is the renderer's concern; the image arrives here as bytes.
    pub fn attach_screenshot(&self, slot: usize, png: &[u8]) -> Result<()> {
        self.store.write_screenshot(slot, png)
    }

    /// The companion screenshot for a slot, if one was captured.
    pub fn screenshot(&self, slot: usize) -> Result<Option<Vec<u8>>> {
        self.store.read_screenshot(slot)
    }

    /// Record a discrete game event that should request an autosave.
    pub fn notify(&mut self, trigger: AutosaveTrigger) {
        self.scheduler.notify(trigger);
    }

    /// Enable or disable autosaving; a save already in flight is unaffected.
    pub fn set_autosave_enabled(&mut self, enabled: bool) {
        self.scheduler.set_enabled(enabled);
        info!(enabled, "autosave toggled");
    }

    /// Advance play time and the autosave scheduler by `dt`.
    ///
    /// Returns `Ok(true)` when an autosave fired into the reserved slot.
    pub fn tick(&mut self, dt: Duration) -> Result<bool> {
        self.play_time_seconds += dt.as_secs_f64();
        if self.scheduler.tick(dt) {
            info!(slot = AUTOSAVE_SLOT, "autosave due");
            self.save(AUTOSAVE_SLOT)?;
            return Ok(true);
        }
        Ok(false)
    }
}
