//! Content-addressed byte store.
//!
//! Shape follows `block_store::BlockStore`'s trait-object style, trimmed down
//! to what a content-addressed byte store actually needs once the
//! ring/index/change-log concepts (which belong to a different kind of
//! multi-writer secret store) are dropped.

mod error;
mod memory;

pub use self::error::{BlockError, BlockResult};
pub use self::memory::MemoryBlockStore;

/// All implementations must be thread-safe: the server fields one request
/// per accepted connection on its own task.
pub trait BlockStore: std::fmt::Debug + Send + Sync {
  /// Store `data`, keyed by its own `sha256_hex`. Idempotent: storing
  /// identical bytes twice is a no-op, since the resulting key is identical.
  fn put_block(&self, data: &[u8]) -> BlockResult<String>;

  /// Fetch a block by hash. An unknown hash is a real `BlockError::NotFound`,
  /// not a silently empty block with no error.
  fn get_block(&self, hash: &str) -> BlockResult<Vec<u8>>;

  /// Subset of `hashes` actually present in this store: a genuine filter,
  /// never an echo of the input.
  fn has_blocks(&self, hashes: &[String]) -> BlockResult<Vec<String>>;

  /// All hashes currently held, in unspecified order.
  fn get_block_hashes(&self) -> BlockResult<Vec<String>>;
}
