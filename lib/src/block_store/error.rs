use thiserror::Error;

/// Mirrors `block_store::error::StoreError`'s shape, trimmed to the cases a
/// content-addressed byte store can actually raise.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BlockError {
  #[error("block not found: {0}")]
  NotFound(String),
  #[error("internal locking problem: {0}")]
  Lock(String),
}

pub type BlockResult<T> = Result<T, BlockError>;

impl<T> From<std::sync::PoisonError<T>> for BlockError {
  fn from(error: std::sync::PoisonError<T>) -> Self {
    BlockError::Lock(format!("{}", error))
  }
}
