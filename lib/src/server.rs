//! Accept loops and per-connection dispatch for the MetaStore and BlockStore
//! services: bind once, `tokio::spawn` a task per accepted connection, serve
//! frames on that task until the peer closes.
//!
//! Each connection reads one frame, dispatches it, writes one frame back,
//! and repeats until the peer disconnects.

use std::sync::Arc;

use log::{debug, info, warn};
use tokio::net::{TcpListener, TcpStream};

use crate::block_store::BlockStore;
use crate::meta_store::MetaStore;
use crate::wire::{read_frame, write_frame, BlockRequest, BlockResponse, MetaRequest, MetaResponse};

/// Accept connections on `listener` forever, dispatching each to `meta_store`
/// on its own task. Returns only on a listener error.
pub async fn serve_meta_store(listener: TcpListener, meta_store: Arc<MetaStore>) -> std::io::Result<()> {
  loop {
    let (stream, peer) = listener.accept().await?;
    let meta_store = Arc::clone(&meta_store);

    tokio::spawn(async move {
      debug!("meta store connection opened from {}", peer);
      if let Err(err) = handle_meta_connection(stream, &meta_store).await {
        warn!("meta store connection from {} ended with error: {}", peer, err);
      }
    });
  }
}

/// Accept connections on `listener` forever, dispatching each to
/// `block_store` on its own task.
pub async fn serve_block_store(listener: TcpListener, block_store: Arc<dyn BlockStore>) -> std::io::Result<()> {
  loop {
    let (stream, peer) = listener.accept().await?;
    let block_store = Arc::clone(&block_store);

    tokio::spawn(async move {
      debug!("block store connection opened from {}", peer);
      if let Err(err) = handle_block_connection(stream, block_store.as_ref()).await {
        warn!("block store connection from {} ended with error: {}", peer, err);
      }
    });
  }
}

async fn handle_meta_connection(mut stream: TcpStream, meta_store: &MetaStore) -> crate::wire::WireResult<()> {
  while let Some(request) = read_frame::<MetaRequest, _>(&mut stream).await? {
    let response = dispatch_meta(meta_store, request);
    write_frame(&mut stream, &response).await?;
  }
  Ok(())
}

async fn handle_block_connection(mut stream: TcpStream, block_store: &dyn BlockStore) -> crate::wire::WireResult<()> {
  while let Some(request) = read_frame::<BlockRequest, _>(&mut stream).await? {
    let response = dispatch_block(block_store, request);
    write_frame(&mut stream, &response).await?;
  }
  Ok(())
}

fn dispatch_meta(meta_store: &MetaStore, request: MetaRequest) -> MetaResponse {
  match request {
    MetaRequest::GetFileInfoMap => match meta_store.get_file_info_map() {
      Ok(file_info_map) => MetaResponse::FileInfoMap { file_info_map },
      Err(err) => MetaResponse::Error { message: err.to_string() },
    },
    MetaRequest::UpdateFile { meta } => {
      info!("update_file {} v{}", meta.filename, meta.version);
      match meta_store.update_file(meta) {
        Ok(version) => MetaResponse::Version { version },
        Err(err) => MetaResponse::Error { message: err.to_string() },
      }
    }
    MetaRequest::GetBlockStoreMap { hashes } => match meta_store.get_block_store_map(&hashes) {
      Ok(block_store_map) => MetaResponse::BlockStoreMap { block_store_map },
      Err(err) => MetaResponse::Error { message: err.to_string() },
    },
    MetaRequest::GetBlockStoreAddrs => MetaResponse::BlockStoreAddrs {
      block_store_addrs: meta_store.get_block_store_addrs(),
    },
  }
}

fn dispatch_block(block_store: &dyn BlockStore, request: BlockRequest) -> BlockResponse {
  match request {
    BlockRequest::PutBlock { data } => match block_store.put_block(&data) {
      Ok(_) => BlockResponse::Success { flag: true },
      Err(err) => BlockResponse::Error { message: err.to_string() },
    },
    BlockRequest::GetBlock { hash } => match block_store.get_block(&hash) {
      Ok(block_data) => {
        let block_size = block_data.len() as i32;
        BlockResponse::Block { block_data, block_size }
      }
      Err(err) => BlockResponse::Error { message: err.to_string() },
    },
    BlockRequest::HasBlocks { hashes } => match block_store.has_blocks(&hashes) {
      Ok(hashes) => BlockResponse::BlockHashes { hashes },
      Err(err) => BlockResponse::Error { message: err.to_string() },
    },
    BlockRequest::GetBlockHashes => match block_store.get_block_hashes() {
      Ok(hashes) => BlockResponse::BlockHashes { hashes },
      Err(err) => BlockResponse::Error { message: err.to_string() },
    },
  }
}
