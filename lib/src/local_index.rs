//! LocalIndex: a durable, on-disk mirror of the client's last-known per-file
//! metadata, stored under `<base_dir>/index.db`.
//!
//! Backed by `sled`, following `block_store::sled::SledBlockStore`'s
//! `sled::Db` + `sled::Tree` + `rmp_serde` encoding pattern. The ordered
//! `block_hash_list` is stored as a single encoded value per filename,
//! never round-tripped through a `" "`-joined string.

use std::collections::HashMap;
use std::path::Path;

use thiserror::Error;

use crate::model::FileMetaData;

#[derive(Debug, Error)]
pub enum LocalIndexError {
  #[error("local index storage error: {0}")]
  Storage(#[from] sled::Error),
  #[error("local index encoding error: {0}")]
  Encode(#[from] rmp_serde::encode::Error),
  #[error("local index decoding error: {0}")]
  Decode(#[from] rmp_serde::decode::Error),
}

pub type LocalIndexResult<T> = Result<T, LocalIndexError>;

/// Durable mapping `filename -> FileMetaData`, rewritten wholesale at the
/// end of each sync cycle.
pub struct LocalIndex {
  tree: sled::Tree,
}

impl LocalIndex {
  pub fn open(base_dir: impl AsRef<Path>) -> LocalIndexResult<LocalIndex> {
    let db = sled::open(base_dir.as_ref().join("index.db"))?;
    let tree = db.open_tree("files")?;

    Ok(LocalIndex { tree })
  }

  /// Load-all: an absent or empty index is simply an empty map.
  pub fn load(&self) -> LocalIndexResult<HashMap<String, FileMetaData>> {
    self
      .tree
      .iter()
      .values()
      .map(|raw| {
        let meta: FileMetaData = rmp_serde::from_slice(raw?.as_ref())?;
        Ok((meta.filename.clone(), meta))
      })
      .collect()
  }

  /// Rewrite-all, destructively: the prior index is cleared before the new
  /// entries are written.
  pub fn persist(&self, index: &HashMap<String, FileMetaData>) -> LocalIndexResult<()> {
    self.tree.clear()?;

    for (filename, meta) in index {
      let raw = rmp_serde::to_vec(meta)?;
      self.tree.insert(filename.as_str(), raw)?;
    }
    self.tree.flush()?;
    Ok(())
  }
}
