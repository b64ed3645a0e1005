/*!
# Savepoint Core

Durable save-slot persistence engine for local game state.

This crate provides the full save/load path for a single-writer game
process:

- Snapshot aggregation over explicitly registered subsystems
- A reversible serialize -> compress -> encrypt codec pipeline
- A fixed on-disk slot layout with denormalized metadata sidecars
- Bounded backup rotation with restore-on-failure repair
- A cooperative, tick-driven autosave scheduler
- Scoped publish/subscribe events for save/load outcomes

## Architecture

Components are constructed explicitly and wired together at startup;
there are no process-wide singletons. `SaveManager` owns the state
machines; collaborators implement `Snapshotter` and are addressed by
stable section name, their contents opaque to the engine.

## Usage

```no_run
use savepoint_core::{Result, SaveConfig, SaveManager, Snapshotter};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};

struct Player {
    level: u64,
}

impl Snapshotter for Player {
    fn capture(&self) -> Option<Value> {
        Some(json!({ "level": self.level }))
    }

    fn restore(&mut self, section: &Value) -> Result<()> {
        self.level = section["level"].as_u64().unwrap_or(1);
        Ok(())
    }
}

fn main() -> Result<()> {
    let mut manager = SaveManager::new("saves", SaveConfig::default())?;

    let player = Arc::new(Mutex::new(Player { level: 3 }));
    manager.registry_mut().register("player", true, player);

    manager.save(0)?;
    manager.load(0)?;
    Ok(())
}
```
*/

pub mod autosave;
pub mod backup;
pub mod codec;
pub mod config;
pub mod error;
pub mod events;
pub mod integrity;
pub mod manager;
pub mod record;
pub mod snapshot;
pub mod store;

pub use autosave::{AutosaveScheduler, AutosaveTrigger};
pub use backup::{BackupEntry, BackupManager};
pub use codec::{Codec, CodecOptions, Compressor, Cryptor, GzipCompressor, NoCompression};
pub use config::SaveConfig;
pub use error::{Result, SaveError};
pub use events::{EventBus, SaveEvent, Subscription};
pub use manager::{SaveManager, SavePhase, SlotSummary, AUTOSAVE_SLOT};
pub use record::{SaveRecord, SlotMetadata, SAVE_FORMAT_VERSION};
pub use snapshot::{SnapshotHandle, SnapshotRegistry, Snapshotter};
pub use store::{SaveLayout, SlotStore};
