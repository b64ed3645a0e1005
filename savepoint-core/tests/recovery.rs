//! End-to-end recovery scenario: rotate backups across repeated saves,
//! corrupt the primary artifact, and recover through the load path.

use savepoint_core::{Result, SaveConfig, SaveManager, Snapshotter};
use serde_json::{json, Value};
use std::fs;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

struct Section {
    value: Value,
    restored: Option<Value>,
}

impl Section {
    fn shared(value: Value) -> Arc<Mutex<Section>> {
        Arc::new(Mutex::new(Section {
            value,
            restored: None,
        }))
    }
}

impl Snapshotter for Section {
    fn capture(&self) -> Option<Value> {
        Some(self.value.clone())
    }

    fn restore(&mut self, section: &Value) -> Result<()> {
        self.restored = Some(section.clone());
        Ok(())
    }
}

#[test]
fn four_saves_keep_two_newest_backups_and_recover_from_truncation() {
    let dir = TempDir::new().unwrap();
    let config = SaveConfig {
        max_backups: 2,
        ..SaveConfig::default()
    };
    let mut manager = SaveManager::new(dir.path(), config).unwrap();

    let player = Section::shared(json!({"save": 0, "scene": "village"}));
    let quests = Section::shared(json!(["intro"]));
    manager
        .registry_mut()
        .register("player", true, Arc::clone(&player) as _);
    manager
        .registry_mut()
        .register("quests", false, Arc::clone(&quests) as _);

    manager.save(0).unwrap();
    let first_saved_at = manager.read_record(0).unwrap().created_at;

    for save in 1..=3 {
        player.lock().unwrap().value = json!({"save": save, "scene": "village"});
        manager.save(0).unwrap();
    }

    // Three rotations happened but only the two newest survive the cap,
    // and both postdate the very first save.
    let backups = manager.backups(0).unwrap();
    assert_eq!(backups.len(), 2);
    assert!(backups.iter().all(|b| b.created_at >= first_saved_at));

    // Truncate the primary; it must no longer decode.
    let primary = manager.layout().slot_path(0);
    let bytes = fs::read(&primary).unwrap();
    fs::write(&primary, &bytes[..bytes.len() / 3]).unwrap();
    assert!(!manager.validate_slot(0));

    // Load recovers from the newest valid backup: the state of the third
    // save, since the fourth one is the truncated primary.
    manager.load(0).unwrap();
    assert!(manager.validate_slot(0));
    assert_eq!(
        player.lock().unwrap().restored,
        Some(json!({"save": 2, "scene": "village"}))
    );
}

#[test]
fn saves_survive_reopening_the_directory() {
    let dir = TempDir::new().unwrap();
    let config = SaveConfig::default();

    {
        let mut manager = SaveManager::new(dir.path(), config.clone()).unwrap();
        let player = Section::shared(json!({"level": 30}));
        manager.registry_mut().register("player", true, player);
        manager.save(1).unwrap();
    }

    // A fresh manager over the same directory and configuration reads the
    // same slot back.
    let mut manager = SaveManager::new(dir.path(), config).unwrap();
    let player = Section::shared(json!(null));
    manager
        .registry_mut()
        .register("player", true, Arc::clone(&player) as _);

    let summaries = manager.list_slots().unwrap();
    assert!(summaries[1].metadata.is_some());

    manager.load(1).unwrap();
    assert_eq!(player.lock().unwrap().restored, Some(json!({"level": 30})));
}

#[test]
fn mismatched_codec_options_fail_instead_of_returning_garbage() {
    let dir = TempDir::new().unwrap();

    {
        let mut manager = SaveManager::new(dir.path(), SaveConfig::default()).unwrap();
        let player = Section::shared(json!({"level": 5}));
        manager.registry_mut().register("player", true, player);
        manager.save(0).unwrap();
    }

    // Same directory, but reading with encryption and compression off.
    let plain = SaveConfig {
        use_encryption: false,
        compress_data: false,
        create_backups: false,
        ..SaveConfig::default()
    };
    let mut manager = SaveManager::new(dir.path(), plain).unwrap();
    assert!(manager.load(0).is_err());
    assert!(!manager.validate_slot(0));
}
