/*!
Save record and slot metadata schemas.

The root record is the aggregate snapshot of every subsystem section for one
save operation; slot metadata is the denormalized summary kept in a sidecar
file so listings never need a full decode.
*/

use crate::{Result, SaveError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Format version stamped into every record, taken from the producing build.
pub const SAVE_FORMAT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// The aggregate snapshot of all subsystem sections for one save operation.
///
/// Sections are opaque to the engine: each value is owned by its producing
/// subsystem and forwarded through the codec untouched. Unknown fields in a
/// stored record are ignored on decode, so newer builds' records still load.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SaveRecord {
    /// Version of the build that produced this record
    pub format_version: String,

    /// Unique identifier for this specific save
    pub save_id: String,

    /// When the snapshot was collected
    pub created_at: DateTime<Utc>,

    /// Accumulated play time, in seconds
    pub play_time_seconds: f64,

    /// Subsystem name -> opaque sub-record
    #[serde(default)]
    pub sections: BTreeMap<String, Value>,
}

impl SaveRecord {
    /// Create an empty record stamped with the current build version.
    pub fn new(play_time_seconds: f64) -> Self {
        Self {
            format_version: SAVE_FORMAT_VERSION.to_string(),
            save_id: Uuid::new_v4().to_string(),
            created_at: Utc::now(),
            play_time_seconds,
            sections: BTreeMap::new(),
        }
    }

    /// Look up a section by subsystem name.
    pub fn section(&self, name: &str) -> Option<&Value> {
        self.sections.get(name)
    }

    /// True when the record was written by the running build.
    pub fn is_current_version(&self) -> bool {
        self.format_version == SAVE_FORMAT_VERSION
    }

    /// Validate the required fields.
    pub fn validate(&self) -> Result<()> {
        if self.format_version.is_empty() {
            return Err(SaveError::config("format_version cannot be empty"));
        }
        if self.save_id.is_empty() {
            return Err(SaveError::config("save_id cannot be empty"));
        }
        if self.play_time_seconds < 0.0 {
            return Err(SaveError::config("play_time_seconds cannot be negative"));
        }
        Ok(())
    }
}

/// Denormalized per-slot summary kept next to the primary artifact.
///
/// The primary artifact is the source of truth; this sidecar exists so slot
/// listings stay cheap. When the sidecar is lost it is synthesized from file
/// attributes alone and marked not-fully-valid.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SlotMetadata {
    pub slot: usize,
    pub saved_at: DateTime<Utc>,
    pub play_time_seconds: f64,
    /// Best-effort peek at the player section; `None` when absent
    pub player_level: Option<u64>,
    /// Best-effort peek at the active scene; `None` when absent
    pub scene: Option<String>,
    /// Size of the encoded primary artifact in bytes
    pub file_size: u64,
    /// SHA-256 of the encoded primary artifact
    pub content_hash: Option<String>,
    /// False for summaries synthesized from file attributes alone
    pub valid: bool,
}

impl SlotMetadata {
    /// Build a full-confidence summary from a record and its encoded bytes.
    pub fn from_record(slot: usize, record: &SaveRecord, encoded: &[u8]) -> Self {
        let player_level = record
            .section("player")
            .and_then(|p| p.get("level"))
            .and_then(Value::as_u64);
        let scene = record
            .section("player")
            .and_then(|p| p.get("scene"))
            .or_else(|| record.section("world").and_then(|w| w.get("scene")))
            .and_then(Value::as_str)
            .map(str::to_string);

        Self {
            slot,
            saved_at: record.created_at,
            play_time_seconds: record.play_time_seconds,
            player_level,
            scene,
            file_size: encoded.len() as u64,
            content_hash: Some(Self::compute_hash(encoded)),
            valid: true,
        }
    }

    /// Build a low-confidence summary from file attributes alone.
    pub fn synthesized(slot: usize, file_size: u64, modified: DateTime<Utc>) -> Self {
        Self {
            slot,
            saved_at: modified,
            play_time_seconds: 0.0,
            player_level: None,
            scene: None,
            file_size,
            content_hash: None,
            valid: false,
        }
    }

    /// SHA-256 of the given bytes as a hex string.
    pub fn compute_hash(data: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data);
        format!("{:x}", hasher.finalize())
    }

    /// Check the stored content hash against the given artifact bytes.
    ///
    /// Returns true when no hash is stored (synthesized summaries make no
    /// claim about content).
    pub fn matches_content(&self, encoded: &[u8]) -> bool {
        match &self.content_hash {
            Some(hash) => *hash == Self::compute_hash(encoded),
            None => true,
        }
    }
}
