//! Core data types shared by every component: blocks, per-file metadata and
//! the tombstone sentinel, kept as plain `serde`-derived structs.

use serde::{Deserialize, Serialize};

/// The literal block-hash-list value that marks a file as deleted.
///
/// A protocol wart inherited on purpose: `"0"` is a syntactically valid
/// hex-hash prefix, so a real one-byte block that happened to hash to
/// exactly `"0"` would collide with a tombstone. We do not "fix" this by
/// introducing a wire-incompatible `deleted: bool` field; doing so is left
/// to a future non-wire-compatible v2.
pub const TOMBSTONE_HASH: &str = "0";

/// An immutable chunk of file bytes, identified by `hash = sha256(bytes)`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Block {
  pub hash: String,
  pub data: Vec<u8>,
}

impl Block {
  pub fn new(data: Vec<u8>) -> Block {
    let hash = crate::hash::sha256_hex(&data);
    Block { hash, data }
  }
}

/// Per-file metadata as tracked by the MetaStore: a filename, a monotone
/// version counter and the ordered list of block hashes that reconstruct
/// the file.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileMetaData {
  pub filename: String,
  pub version: i32,
  pub block_hash_list: Vec<String>,
}

impl FileMetaData {
  pub fn new(filename: impl Into<String>, version: i32, block_hash_list: Vec<String>) -> FileMetaData {
    FileMetaData {
      filename: filename.into(),
      version,
      block_hash_list,
    }
  }

  /// A tombstone is the sentinel single-element list `["0"]`.
  pub fn is_tombstone(&self) -> bool {
    self.block_hash_list.len() == 1 && self.block_hash_list[0] == TOMBSTONE_HASH
  }

  pub fn tombstone(filename: impl Into<String>, version: i32) -> FileMetaData {
    FileMetaData {
      filename: filename.into(),
      version,
      block_hash_list: vec![TOMBSTONE_HASH.to_string()],
    }
  }
}

/// Sentinel returned by `MetaStore::update_file` on a version conflict.
pub const VERSION_CONFLICT: i32 = -1;
