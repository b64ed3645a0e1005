/*!
Corruption detection and repair orchestration.

`validate` exercises the full read path without mutating anything; `repair`
pulls the newest decodable backup over a corrupt primary and re-validates
before claiming success.
*/

use crate::{
    backup::BackupManager,
    codec::{Codec, CodecOptions, Compressor},
    record::SaveRecord,
    store::{refresh_metadata, SlotStore},
    Result,
};
use tracing::{info, warn};

/// Read and decode a slot's primary artifact.
pub(crate) fn read_and_decode<C: Compressor>(
    store: &SlotStore,
    codec: &Codec<C>,
    options: &CodecOptions,
    slot: usize,
) -> Result<SaveRecord> {
    let bytes = store.read(slot)?;
    codec.decode(&bytes, options)
}

/// Attempt the full read path for a slot and report success or failure.
///
/// Never mutates state; an out-of-range or empty slot simply reports false.
pub fn validate<C: Compressor>(
    store: &SlotStore,
    codec: &Codec<C>,
    options: &CodecOptions,
    slot: usize,
) -> bool {
    read_and_decode(store, codec, options, slot).is_ok()
}

/// Restore a slot's primary from its newest decodable backup.
///
/// On a successful restore the primary is overwritten with the recovered
/// bytes, the metadata sidecar is regenerated from the recovered record, and
/// the slot is re-validated before reporting success; a repair can never
/// succeed while leaving a still-corrupt primary. Returns false when no
/// backup decodes.
pub fn repair<C: Compressor>(
    store: &SlotStore,
    codec: &Codec<C>,
    options: &CodecOptions,
    backups: &BackupManager,
    slot: usize,
) -> Result<bool> {
    store.check_slot(slot)?;

    let Some(bytes) = backups.restore_from_backup(codec, options, slot)? else {
        warn!(slot, "no decodable backup available for repair");
        return Ok(false);
    };

    store.write(slot, &bytes)?;
    let record = codec.decode(&bytes, options)?;
    refresh_metadata(store, slot, &record, &bytes)?;

    let healthy = validate(store, codec, options, slot);
    if healthy {
        info!(slot, "repaired slot from backup");
    } else {
        warn!(slot, "primary still invalid after backup restore");
    }
    Ok(healthy)
}
