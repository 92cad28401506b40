//! Consistent-hash ring mapping a block hash to the BlockStore address that
//! owns it.
//!
//! `responsible_server` walks the ring hashes in sorted order: both the
//! server addresses and the incoming block hash are compared as plain hex
//! strings, and the scan is over a `Vec` sorted once at construction time.

use thiserror::Error;

use crate::hash::sha256_hex;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RingError {
  #[error("no block store servers configured")]
  NoServers,
}

/// An unordered collection of `(ring_hash, server_address)` pairs, queried by
/// lexicographic order of `ring_hash`.
///
/// No virtual nodes.
#[derive(Debug, Clone)]
pub struct ConsistentHashRing {
  // Sorted ascending by ring hash so `responsible_server` can binary-search.
  entries: Vec<(String, String)>,
}

impl ConsistentHashRing {
  /// Build a ring from a list of server addresses. `ring_hash = sha256(addr)`.
  pub fn new(server_addrs: &[impl AsRef<str>]) -> ConsistentHashRing {
    let mut entries: Vec<(String, String)> = server_addrs
      .iter()
      .map(|addr| (sha256_hex(addr.as_ref().as_bytes()), addr.as_ref().to_string()))
      .collect();
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    ConsistentHashRing { entries }
  }

  /// The server whose ring hash is the smallest one strictly greater than
  /// `block_hash`, wrapping to the smallest ring hash overall if none is.
  pub fn responsible_server(&self, block_hash: &str) -> Result<&str, RingError> {
    if self.entries.is_empty() {
      return Err(RingError::NoServers);
    }

    match self.entries.partition_point(|(ring_hash, _)| ring_hash.as_str() <= block_hash) {
      idx if idx < self.entries.len() => Ok(&self.entries[idx].1),
      _ => Ok(&self.entries[0].1),
    }
  }
}
