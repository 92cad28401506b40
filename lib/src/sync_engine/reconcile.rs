//! Pure reconciliation logic: no filesystem, no network, so every rule in
//! the sync cycle can be exercised directly.

use std::collections::HashMap;

use crate::model::{FileMetaData, TOMBSTONE_HASH};

/// Split `data` into chunks of exactly `block_size` bytes, the last one
/// possibly shorter. Empty input yields zero blocks, not one empty block.
pub fn chunk_bytes(data: &[u8], block_size: usize) -> Vec<Vec<u8>> {
  if data.is_empty() {
    return Vec::new();
  }
  data.chunks(block_size).map(|chunk| chunk.to_vec()).collect()
}

/// Mutates `local_index` in place to reflect what was just scanned off disk:
/// new files are inserted at version 1, changed files get a new hash list
/// and a version bump, vanished files become tombstones (once).
pub fn detect_local_changes(local_index: &mut HashMap<String, FileMetaData>, scanned: &HashMap<String, Vec<String>>) {
  for (filename, hashes) in scanned {
    match local_index.get(filename) {
      None => {
        local_index.insert(filename.clone(), FileMetaData::new(filename.clone(), 1, hashes.clone()));
      }
      Some(existing) if &existing.block_hash_list != hashes => {
        let version = existing.version + 1;
        local_index.insert(filename.clone(), FileMetaData::new(filename.clone(), version, hashes.clone()));
      }
      Some(_) => {}
    }
  }

  for (filename, existing) in local_index.iter_mut() {
    if !scanned.contains_key(filename) && !existing.is_tombstone() {
      existing.version += 1;
      existing.block_hash_list = vec![TOMBSTONE_HASH.to_string()];
    }
  }
}

/// Phase 5: a local record is pushed when remote doesn't know the file yet,
/// or local is strictly ahead.
pub fn needs_upload(local: &FileMetaData, remote: Option<&FileMetaData>) -> bool {
  match remote {
    None => true,
    Some(remote) => local.version > remote.version,
  }
}

/// Phase 6: a remote record is pulled when local is missing it, behind, or
/// tied on version but diverged in content.
pub fn needs_download(remote: &FileMetaData, local: Option<&FileMetaData>) -> bool {
  match local {
    None => true,
    Some(local) => {
      local.version < remote.version || (local.version == remote.version && local.block_hash_list != remote.block_hash_list)
    }
  }
}
