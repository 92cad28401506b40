//! MetaStore: authoritative per-file version + block-hash lists, owner of
//! the consistent-hash ring, answers shard queries.
//!
//! Built around an `RwLock<HashMap<...>>`, in the style of
//! [`crate::block_store::MemoryBlockStore`], since `get_file_info_map` and
//! `get_block_store_map` are pure readers that should not block each other.

use std::collections::HashMap;
use std::sync::RwLock;

use thiserror::Error;

use crate::model::{FileMetaData, VERSION_CONFLICT};
use crate::ring::{ConsistentHashRing, RingError};

#[derive(Debug, Error)]
pub enum MetaError {
  #[error(transparent)]
  Ring(#[from] RingError),
  #[error("internal locking problem: {0}")]
  Lock(String),
}

pub type MetaResult<T> = Result<T, MetaError>;

impl<T> From<std::sync::PoisonError<T>> for MetaError {
  fn from(error: std::sync::PoisonError<T>) -> Self {
    MetaError::Lock(format!("{}", error))
  }
}

pub struct MetaStore {
  file_meta_map: RwLock<HashMap<String, FileMetaData>>,
  block_store_addrs: Vec<String>,
  ring: ConsistentHashRing,
}

impl MetaStore {
  pub fn new(block_store_addrs: Vec<String>) -> MetaStore {
    let ring = ConsistentHashRing::new(&block_store_addrs);
    MetaStore {
      file_meta_map: RwLock::new(HashMap::new()),
      block_store_addrs,
      ring,
    }
  }

  /// Snapshot of all known file metadata.
  pub fn get_file_info_map(&self) -> MetaResult<HashMap<String, FileMetaData>> {
    Ok(self.file_meta_map.read()?.clone())
  }

  /// Compare-and-set update: accepted iff `proposed.version ==
  /// stored.version + 1`, or the file did not previously exist. Returns the
  /// accepted version, or `VERSION_CONFLICT` (-1) with the stored record
  /// left unchanged.
  pub fn update_file(&self, meta: FileMetaData) -> MetaResult<i32> {
    let mut file_meta_map = self.file_meta_map.write()?;

    match file_meta_map.get(&meta.filename) {
      Some(stored) if meta.version != stored.version + 1 => Ok(VERSION_CONFLICT),
      _ => {
        let version = meta.version;
        file_meta_map.insert(meta.filename.clone(), meta);
        Ok(version)
      }
    }
  }

  /// Group `hashes` by the BlockStore address responsible for each, per the
  /// consistent-hash ring.
  pub fn get_block_store_map(&self, hashes: &[String]) -> MetaResult<HashMap<String, Vec<String>>> {
    let mut block_store_map: HashMap<String, Vec<String>> = HashMap::new();

    for hash in hashes {
      let addr = self.ring.responsible_server(hash)?;
      block_store_map.entry(addr.to_string()).or_default().push(hash.clone());
    }

    Ok(block_store_map)
  }

  /// The configured BlockStore addresses, verbatim.
  pub fn get_block_store_addrs(&self) -> Vec<String> {
    self.block_store_addrs.clone()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn store() -> MetaStore {
    MetaStore::new(vec!["s1:8080".to_string(), "s2:8080".to_string(), "s3:8080".to_string()])
  }

  #[test]
  fn first_creation_accepts_any_version_and_is_not_required_to_be_1() {
    let store = store();
    let meta = FileMetaData::new("a.txt", 1, vec!["h1".to_string()]);

    assert_eq!(store.update_file(meta).unwrap(), 1);
    assert_eq!(store.get_file_info_map().unwrap()["a.txt"].version, 1);
  }

  #[test]
  fn accepts_stored_plus_one() {
    let store = store();
    store.update_file(FileMetaData::new("a.txt", 1, vec!["h1".to_string()])).unwrap();

    let accepted = store
      .update_file(FileMetaData::new("a.txt", 2, vec!["h2".to_string()]))
      .unwrap();

    assert_eq!(accepted, 2);
    assert_eq!(store.get_file_info_map().unwrap()["a.txt"].block_hash_list, vec!["h2"]);
  }

  #[test]
  fn rejects_non_monotone_version() {
    let store = store();
    store.update_file(FileMetaData::new("a.txt", 1, vec!["h1".to_string()])).unwrap();

    // Skipping a version, or repeating the same one, is rejected.
    let rejected = store
      .update_file(FileMetaData::new("a.txt", 3, vec!["h3".to_string()]))
      .unwrap();
    assert_eq!(rejected, VERSION_CONFLICT);

    // Stored record is unchanged.
    assert_eq!(store.get_file_info_map().unwrap()["a.txt"].version, 1);
  }

  #[test]
  fn block_store_map_groups_by_ring_ownership() {
    let store = store();
    let hashes = vec!["aa".to_string(), "bb".to_string(), "cc".to_string()];

    let map = store.get_block_store_map(&hashes).unwrap();
    let total: usize = map.values().map(|v| v.len()).sum();

    assert_eq!(total, hashes.len());
    for addr in map.keys() {
      assert!(store.get_block_store_addrs().contains(addr));
    }
  }

  #[test]
  fn empty_ring_surfaces_as_no_servers() {
    let store = MetaStore::new(vec![]);
    assert!(matches!(
      store.get_block_store_map(&["aa".to_string()]),
      Err(MetaError::Ring(RingError::NoServers))
    ));
  }
}
