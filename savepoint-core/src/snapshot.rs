/*!
Snapshot aggregation: collecting per-subsystem sections into one root record
and dispatching them back out on load.

Collaborating subsystems (player, inventory, quests, ...) are registered
explicitly at startup and addressed by stable section name. The aggregator
never inspects a section's contents; it only forwards opaque values through
the codec.
*/

use crate::{record::SaveRecord, Result};
use serde_json::Value;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Snapshot contract implemented by every persisted subsystem.
///
/// `capture` returning `None` models a subsystem with nothing to persist
/// right now (e.g. no active player); the section is simply omitted from the
/// record. `restore` receives exactly the value a previous `capture`
/// produced.
pub trait Snapshotter: Send {
    fn capture(&self) -> Option<Value>;
    fn restore(&mut self, section: &Value) -> Result<()>;
}

/// Shared handle to a registered collaborator.
pub type SnapshotHandle = Arc<Mutex<dyn Snapshotter + Send>>;

struct Registration {
    name: String,
    essential: bool,
    handle: SnapshotHandle,
}

/// Registry of persisted subsystems, wired together at startup.
#[derive(Default)]
pub struct SnapshotRegistry {
    entries: Vec<Registration>,
}

impl SnapshotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a collaborator under a stable section name.
    ///
    /// Essential sections (player identity, position, vital stats, current
    /// scene) are the ones included in the reduced quick-save record.
    /// Re-registering a name replaces the previous handle.
    pub fn register<S: Into<String>>(&mut self, name: S, essential: bool, handle: SnapshotHandle) {
        let name = name.into();
        if let Some(existing) = self.entries.iter_mut().find(|r| r.name == name) {
            warn!(section = %name, "replacing previously registered snapshot section");
            existing.essential = essential;
            existing.handle = handle;
            return;
        }
        self.entries.push(Registration {
            name,
            essential,
            handle,
        });
    }

    /// Remove a collaborator; unknown names are a no-op.
    pub fn unregister(&mut self, name: &str) {
        self.entries.retain(|r| r.name != name);
    }

    /// Names of all registered sections, in registration order.
    pub fn section_names(&self) -> Vec<&str> {
        self.entries.iter().map(|r| r.name.as_str()).collect()
    }

    /// Query every collaborator and assemble the full root record.
    ///
    /// Collaborators with nothing to persist are omitted, never an error.
    pub fn collect(&self, play_time_seconds: f64) -> SaveRecord {
        self.collect_filtered(play_time_seconds, false)
    }

    /// Assemble the reduced record holding only essential sections.
    pub fn collect_minimal(&self, play_time_seconds: f64) -> SaveRecord {
        self.collect_filtered(play_time_seconds, true)
    }

    fn collect_filtered(&self, play_time_seconds: f64, essential_only: bool) -> SaveRecord {
        let mut record = SaveRecord::new(play_time_seconds);
        for entry in &self.entries {
            if essential_only && !entry.essential {
                continue;
            }
            let guard = entry.handle.lock().expect("snapshot handle poisoned");
            match guard.capture() {
                Some(section) => {
                    record.sections.insert(entry.name.clone(), section);
                }
                None => debug!(section = %entry.name, "section absent, omitting"),
            }
        }
        record
    }

    /// Dispatch each present section to its collaborator's restore entry
    /// point.
    ///
    /// Unknown section names are ignored for forward compatibility; absent
    /// sections leave the corresponding collaborator untouched.
    pub fn apply(&self, record: &SaveRecord) -> Result<()> {
        for (name, section) in &record.sections {
            match self.entries.iter().find(|r| &r.name == name) {
                Some(entry) => {
                    let mut guard = entry.handle.lock().expect("snapshot handle poisoned");
                    guard.restore(section)?;
                }
                None => debug!(section = %name, "no collaborator for section, ignoring"),
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Minimal collaborator holding one value.
    struct Stub {
        value: Option<Value>,
        restored: Option<Value>,
    }

    impl Stub {
        fn shared(value: Option<Value>) -> Arc<Mutex<Stub>> {
            Arc::new(Mutex::new(Stub {
                value,
                restored: None,
            }))
        }
    }

    impl Snapshotter for Stub {
        fn capture(&self) -> Option<Value> {
            self.value.clone()
        }

        fn restore(&mut self, section: &Value) -> Result<()> {
            self.restored = Some(section.clone());
            Ok(())
        }
    }

    #[test]
    fn test_collect_gathers_all_present_sections() {
        let player = Stub::shared(Some(json!({"level": 3})));
        let quests = Stub::shared(Some(json!(["intro"])));
        let audio = Stub::shared(None);

        let mut registry = SnapshotRegistry::new();
        registry.register("player", true, player);
        registry.register("quests", false, quests);
        registry.register("audio", false, audio);

        let record = registry.collect(1.0);
        assert_eq!(record.sections.len(), 2);
        assert!(record.section("player").is_some());
        assert!(record.section("quests").is_some());
        assert!(record.section("audio").is_none());
    }

    #[test]
    fn test_collect_minimal_is_strict_subset() {
        let player = Stub::shared(Some(json!({"hp": 10, "scene": "cave"})));
        let inventory = Stub::shared(Some(json!({"slots": []})));

        let mut registry = SnapshotRegistry::new();
        registry.register("player", true, player);
        registry.register("inventory", false, inventory);

        let full = registry.collect(0.0);
        let minimal = registry.collect_minimal(0.0);

        assert!(minimal.sections.len() < full.sections.len());
        for name in minimal.sections.keys() {
            assert!(full.sections.contains_key(name));
        }
        assert!(minimal.section("player").is_some());
    }

    #[test]
    fn test_apply_dispatches_and_ignores_unknown() {
        let player = Stub::shared(Some(json!(null)));
        let mut registry = SnapshotRegistry::new();
        registry.register("player", true, Arc::clone(&player) as SnapshotHandle);

        let mut record = SaveRecord::new(0.0);
        record.sections.insert("player".into(), json!({"hp": 42}));
        record
            .sections
            .insert("modded_subsystem".into(), json!({"x": 1}));

        registry.apply(&record).unwrap();
        assert_eq!(player.lock().unwrap().restored, Some(json!({"hp": 42})));
    }

    #[test]
    fn test_apply_leaves_absent_sections_untouched() {
        let quests = Stub::shared(Some(json!([])));
        let mut registry = SnapshotRegistry::new();
        registry.register("quests", false, Arc::clone(&quests) as SnapshotHandle);

        let record = SaveRecord::new(0.0);
        registry.apply(&record).unwrap();
        assert!(quests.lock().unwrap().restored.is_none());
    }

    #[test]
    fn test_reregistering_replaces_handle() {
        let first = Stub::shared(Some(json!(1)));
        let second = Stub::shared(Some(json!(2)));

        let mut registry = SnapshotRegistry::new();
        registry.register("player", true, first);
        registry.register("player", true, second);

        let record = registry.collect(0.0);
        assert_eq!(record.section("player"), Some(&json!(2)));
        assert_eq!(registry.section_names().len(), 1);
    }
}
