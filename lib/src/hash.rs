//! SHA-256 hashing, rendered as lowercase hex.
//!
//! Every component that needs to compute a block or ring hash goes through
//! this module so that the encoding (lowercase hex, no prefix) stays
//! consistent across the block store, the ring and the sync engine.

use data_encoding::HEXLOWER;
use sha2::{Digest, Sha256};

/// Digest `data` with SHA-256 and render it as 64 lowercase hex characters.
pub fn sha256_hex(data: &[u8]) -> String {
  let mut hasher = Sha256::new();
  hasher.update(data);
  HEXLOWER.encode(&hasher.finalize())
}
