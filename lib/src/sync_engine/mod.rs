//! The client-side reconciliation loop: load index, scan disk, reconcile
//! against MetaStore, push ahead-of-remote files, pull behind-or-diverged
//! files, persist the new index.
//!
//! The per-phase pure logic lives in [`reconcile`] so it can be tested
//! without a filesystem or a socket.

mod reconcile;

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use log::{info, warn};
use thiserror::Error;

use crate::hash::sha256_hex;
use crate::local_index::{LocalIndex, LocalIndexError};
use crate::model::{FileMetaData, VERSION_CONFLICT};
use crate::rpc_client::{RpcClient, RpcError};

const INDEX_FILE_NAME: &str = "index.db";

#[derive(Debug, Error)]
pub enum SyncEngineError {
  #[error("local index error: {0}")]
  LocalIndex(#[from] LocalIndexError),
  #[error("rpc error: {0}")]
  Rpc(#[from] RpcError),
  #[error("filesystem error: {0}")]
  Io(#[from] std::io::Error),
  #[error("no block store owns hash {0}")]
  MissingShard(String),
}

pub type SyncEngineResult<T> = Result<T, SyncEngineError>;

/// The upload/download decisions a real cycle would make, without having
/// made them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncPlan {
  pub uploads: Vec<String>,
  pub downloads: Vec<String>,
}

/// Drives one or more sync cycles for a single base directory against one
/// MetaStore. Carries `MetaStoreAddr`, `BaseDir` and `BlockSize` as its only
/// configuration, matching the external-interface surface of `RpcClient`.
pub struct SyncEngine {
  client: RpcClient,
  index: LocalIndex,
  base_dir: PathBuf,
  block_size: usize,
}

impl SyncEngine {
  pub fn new(meta_store_addr: impl Into<String>, base_dir: impl AsRef<Path>, block_size: usize) -> SyncEngineResult<SyncEngine> {
    let base_dir = base_dir.as_ref().to_path_buf();
    let index = LocalIndex::open(&base_dir)?;

    Ok(SyncEngine {
      client: RpcClient::new(meta_store_addr),
      index,
      base_dir,
      block_size,
    })
  }

  /// Phases 1-4 plus the reconciliation decisions of Phases 5/6, without
  /// performing any of their side effects (no block pushes, no downloads,
  /// no index rewrite). Useful for operators who want to see what a real
  /// cycle would do first.
  pub async fn plan_once(&self) -> SyncEngineResult<SyncPlan> {
    let mut local_index = self.index.load()?;
    let scanned = self.scan_directory()?;
    reconcile::detect_local_changes(&mut local_index, &scanned);
    let remote_index = self.client.get_file_info_map().await?;

    let uploads = local_index
      .iter()
      .filter(|(filename, local)| reconcile::needs_upload(local, remote_index.get(*filename)))
      .map(|(filename, _)| filename.clone())
      .collect();
    let downloads = remote_index
      .iter()
      .filter(|(filename, remote)| reconcile::needs_download(remote, local_index.get(*filename)))
      .map(|(filename, _)| filename.clone())
      .collect();

    Ok(SyncPlan { uploads, downloads })
  }

  /// Run exactly one sync cycle, in the seven phases described above.
  pub async fn run_once(&self) -> SyncEngineResult<()> {
    info!("sync cycle starting for {}", self.base_dir.display());

    // Phase 1
    let mut local_index = self.index.load()?;
    // Phase 2
    let scanned = self.scan_directory()?;
    // Phase 3
    reconcile::detect_local_changes(&mut local_index, &scanned);
    // Phase 4
    let remote_index = self.client.get_file_info_map().await?;

    // Phase 5 — push
    let to_upload: Vec<String> = local_index
      .iter()
      .filter(|(filename, local)| reconcile::needs_upload(local, remote_index.get(*filename)))
      .map(|(filename, _)| filename.clone())
      .collect();

    for filename in to_upload {
      let local = local_index[&filename].clone();
      let accepted = self.upload(&local).await?;
      if accepted == VERSION_CONFLICT {
        warn!("version conflict pushing {}, deferring to a later cycle", filename);
      }
      if let Some(entry) = local_index.get_mut(&filename) {
        entry.version = accepted;
      }
    }

    // Phase 6 — pull, against the index fetched in Phase 4 (uploads just
    // performed do not retroactively widen what needs pulling).
    let to_download: Vec<String> = remote_index
      .iter()
      .filter(|(filename, remote)| reconcile::needs_download(remote, local_index.get(*filename)))
      .map(|(filename, _)| filename.clone())
      .collect();

    for filename in to_download {
      let remote = remote_index[&filename].clone();
      self.download(&remote).await?;
      local_index.insert(filename, remote);
    }

    // Phase 7
    self.index.persist(&local_index)?;
    info!("sync cycle complete for {}", self.base_dir.display());
    Ok(())
  }

  fn scan_directory(&self) -> SyncEngineResult<HashMap<String, Vec<String>>> {
    let mut scanned = HashMap::new();

    for entry in std::fs::read_dir(&self.base_dir)? {
      let entry = entry?;
      let path = entry.path();
      if !path.is_file() {
        continue;
      }
      let filename = entry.file_name().to_string_lossy().into_owned();
      if filename == INDEX_FILE_NAME {
        continue;
      }

      let data = std::fs::read(&path)?;
      let hashes = reconcile::chunk_bytes(&data, self.block_size)
        .iter()
        .map(|block| sha256_hex(block))
        .collect();
      scanned.insert(filename, hashes);
    }

    Ok(scanned)
  }

  async fn upload(&self, local: &FileMetaData) -> SyncEngineResult<i32> {
    if !local.is_tombstone() {
      let data = std::fs::read(self.base_dir.join(&local.filename))?;
      let blocks = reconcile::chunk_bytes(&data, self.block_size);
      let addr_by_hash = self.shard_map(&local.block_hash_list).await?;

      for block in &blocks {
        let hash = sha256_hex(block);
        if let Some(addr) = addr_by_hash.get(&hash) {
          self.client.put_block(addr, block.clone()).await?;
        }
      }
    }

    Ok(self.client.update_file(local.clone()).await?)
  }

  async fn download(&self, remote: &FileMetaData) -> SyncEngineResult<()> {
    let path = self.base_dir.join(&remote.filename);

    if remote.is_tombstone() {
      if path.exists() {
        std::fs::remove_file(&path)?;
      }
      return Ok(());
    }

    let addr_by_hash = self.shard_map(&remote.block_hash_list).await?;
    let mut data = Vec::new();
    for hash in &remote.block_hash_list {
      let addr = addr_by_hash
        .get(hash)
        .ok_or_else(|| SyncEngineError::MissingShard(hash.clone()))?;
      data.extend(self.client.get_block(addr, hash.clone()).await?);
    }

    std::fs::write(&path, data)?;
    Ok(())
  }

  /// Invert `getBlockStoreMap`'s `address -> [hash]` grouping into a
  /// per-hash lookup, so upload/download can address each block directly.
  async fn shard_map(&self, hashes: &[String]) -> SyncEngineResult<HashMap<String, String>> {
    let block_store_map = self.client.get_block_store_map(hashes.to_vec()).await?;

    let mut addr_by_hash = HashMap::new();
    for (addr, owned_hashes) in block_store_map {
      for hash in owned_hashes {
        addr_by_hash.insert(hash, addr.clone());
      }
    }
    Ok(addr_by_hash)
  }
}

#[cfg(test)]
mod tests {
  use std::sync::Arc;

  use tokio::net::TcpListener;

  use super::*;
  use crate::block_store::{BlockStore, MemoryBlockStore};
  use crate::meta_store::MetaStore;

  /// Boots a MetaStore and one BlockStore, each on its own loopback port,
  /// returning the addresses a `SyncEngine` would be configured with.
  async fn spawn_cluster() -> (String, String) {
    let block_store: Arc<dyn BlockStore> = Arc::new(MemoryBlockStore::new());
    let block_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let block_addr = block_listener.local_addr().unwrap().to_string();
    tokio::spawn(crate::server::serve_block_store(block_listener, block_store));

    let meta_store = Arc::new(MetaStore::new(vec![block_addr.clone()]));
    let meta_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let meta_addr = meta_listener.local_addr().unwrap().to_string();
    tokio::spawn(crate::server::serve_meta_store(meta_listener, meta_store));

    (meta_addr, block_addr)
  }

  #[tokio::test]
  async fn first_upload_creates_remote_metadata_and_stores_the_block() {
    let (meta_addr, _block_addr) = spawn_cluster().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), b"hello world").unwrap();

    let engine = SyncEngine::new(meta_addr.clone(), dir.path(), 4096).unwrap();
    engine.run_once().await.unwrap();

    let client = RpcClient::new(meta_addr);
    let remote = client.get_file_info_map().await.unwrap();
    let meta = &remote["hello.txt"];

    assert_eq!(meta.version, 1);
    assert_eq!(meta.block_hash_list, vec![sha256_hex(b"hello world")]);
  }

  #[tokio::test]
  async fn deletion_bumps_version_exactly_once() {
    let (meta_addr, _block_addr) = spawn_cluster().await;
    let dir = tempfile::tempdir().unwrap();
    let file_path = dir.path().join("hello.txt");
    std::fs::write(&file_path, b"hello world").unwrap();

    let engine = SyncEngine::new(meta_addr.clone(), dir.path(), 4096).unwrap();
    engine.run_once().await.unwrap();

    std::fs::remove_file(&file_path).unwrap();
    engine.run_once().await.unwrap();
    engine.run_once().await.unwrap();

    let client = RpcClient::new(meta_addr);
    let remote = client.get_file_info_map().await.unwrap();
    let meta = &remote["hello.txt"];

    assert!(meta.is_tombstone());
    assert_eq!(meta.version, 2);
  }

  #[tokio::test]
  async fn round_trip_reconstructs_a_multi_block_file_exactly() {
    let (meta_addr, _block_addr) = spawn_cluster().await;
    let original: Vec<u8> = (0..10 * 1024).map(|i| (i % 251) as u8).collect();

    let uploader_dir = tempfile::tempdir().unwrap();
    std::fs::write(uploader_dir.path().join("big.bin"), &original).unwrap();
    SyncEngine::new(meta_addr.clone(), uploader_dir.path(), 4096)
      .unwrap()
      .run_once()
      .await
      .unwrap();

    let downloader_dir = tempfile::tempdir().unwrap();
    let downloader = SyncEngine::new(meta_addr, downloader_dir.path(), 4096).unwrap();
    downloader.run_once().await.unwrap();

    let downloaded = std::fs::read(downloader_dir.path().join("big.bin")).unwrap();
    assert_eq!(downloaded, original);
  }

  #[tokio::test]
  async fn a_second_sync_with_no_changes_is_a_no_op() {
    let (meta_addr, _block_addr) = spawn_cluster().await;
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), b"hello world").unwrap();

    let engine = SyncEngine::new(meta_addr.clone(), dir.path(), 4096).unwrap();
    engine.run_once().await.unwrap();

    let client = RpcClient::new(meta_addr);
    let after_first = client.get_file_info_map().await.unwrap();

    engine.run_once().await.unwrap();
    let after_second = client.get_file_info_map().await.unwrap();

    assert_eq!(after_first, after_second);
  }

  #[tokio::test]
  async fn a_losing_writer_is_overwritten_on_its_next_cycle() {
    let (meta_addr, _block_addr) = spawn_cluster().await;

    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();
    std::fs::write(dir_a.path().join("hello.txt"), b"hello world").unwrap();
    std::fs::write(dir_b.path().join("hello.txt"), b"hello world").unwrap();

    let engine_a = SyncEngine::new(meta_addr.clone(), dir_a.path(), 4096).unwrap();
    let engine_b = SyncEngine::new(meta_addr.clone(), dir_b.path(), 4096).unwrap();

    // Both start from the same v1 content.
    engine_a.run_once().await.unwrap();
    engine_b.run_once().await.unwrap();

    // A edits and wins the race to v2.
    std::fs::write(dir_a.path().join("hello.txt"), b"hello world from a").unwrap();
    engine_a.run_once().await.unwrap();

    // B edits independently, unaware of A's change; its proposed v2 loses.
    std::fs::write(dir_b.path().join("hello.txt"), b"hello world from b").unwrap();
    engine_b.run_once().await.unwrap();

    // On B's next cycle it must pull A's winning content.
    engine_b.run_once().await.unwrap();

    let reconciled = std::fs::read(dir_b.path().join("hello.txt")).unwrap();
    assert_eq!(reconciled, b"hello world from a");
  }
}
