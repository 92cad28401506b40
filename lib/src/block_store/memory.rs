use std::collections::HashMap;
use std::sync::RwLock;

use super::{BlockError, BlockResult, BlockStore};
use crate::hash::sha256_hex;

/// In-memory mapping `hash -> bytes`, protected by an `RwLock` so readers
/// don't block each other. No persistence: restart means empty,
/// intentionally, since durability is layered above at the MetaStore/
/// LocalIndex level.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
  blocks: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryBlockStore {
  pub fn new() -> MemoryBlockStore {
    MemoryBlockStore::default()
  }
}

impl BlockStore for MemoryBlockStore {
  fn put_block(&self, data: &[u8]) -> BlockResult<String> {
    let hash = sha256_hex(data);
    let mut blocks = self.blocks.write()?;

    blocks.entry(hash.clone()).or_insert_with(|| data.to_vec());
    Ok(hash)
  }

  fn get_block(&self, hash: &str) -> BlockResult<Vec<u8>> {
    let blocks = self.blocks.read()?;

    blocks.get(hash).cloned().ok_or_else(|| BlockError::NotFound(hash.to_string()))
  }

  fn has_blocks(&self, hashes: &[String]) -> BlockResult<Vec<String>> {
    let blocks = self.blocks.read()?;

    Ok(hashes.iter().filter(|hash| blocks.contains_key(hash.as_str())).cloned().collect())
  }

  fn get_block_hashes(&self) -> BlockResult<Vec<String>> {
    let blocks = self.blocks.read()?;

    Ok(blocks.keys().cloned().collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn put_then_get_round_trips() {
    let store = MemoryBlockStore::new();
    let hash = store.put_block(b"hello world").unwrap();

    assert_eq!(store.get_block(&hash).unwrap(), b"hello world");
  }

  #[test]
  fn put_is_idempotent() {
    let store = MemoryBlockStore::new();
    let hash1 = store.put_block(b"same bytes").unwrap();
    let hash2 = store.put_block(b"same bytes").unwrap();

    assert_eq!(hash1, hash2);
    assert_eq!(store.get_block_hashes().unwrap().len(), 1);
  }

  #[test]
  fn missing_block_is_an_error() {
    let store = MemoryBlockStore::new();
    assert_eq!(
      store.get_block("does-not-exist"),
      Err(BlockError::NotFound("does-not-exist".to_string()))
    );
  }

  #[test]
  fn has_blocks_is_a_real_filter() {
    let store = MemoryBlockStore::new();
    let present = store.put_block(b"present").unwrap();
    let absent = sha256_hex(b"absent, never stored");

    let found = store.has_blocks(&[present.clone(), absent.clone()]).unwrap();

    assert_eq!(found, vec![present]);
  }
}
