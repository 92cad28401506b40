//! Client-side stub for talking to a MetaStore or BlockStore server:
//! connect, send one framed request, read one framed response, disconnect.
//!
//! The one-second call timeout keeps a stalled server from blocking a whole
//! sync cycle; each call gets a fresh connection rather than a pooled one.

use std::collections::HashMap;
use std::time::Duration;

use thiserror::Error;
use tokio::net::TcpStream;

use crate::model::FileMetaData;
use crate::wire::{read_frame, write_frame, BlockRequest, BlockResponse, MetaRequest, MetaResponse, WireError};

const CALL_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum RpcError {
  #[error("could not reach {addr}: {source}")]
  Connect { addr: String, source: std::io::Error },
  #[error("call to {addr} timed out after {CALL_TIMEOUT:?}")]
  Timeout { addr: String },
  #[error("wire error talking to {addr}: {source}")]
  Wire { addr: String, source: WireError },
  #[error("{addr} closed the connection without responding")]
  NoResponse { addr: String },
  #[error("{addr} reported an error: {message}")]
  Server { addr: String, message: String },
  #[error("{addr} sent a response of the wrong shape")]
  UnexpectedResponse { addr: String },
}

pub type RpcResult<T> = Result<T, RpcError>;

/// Connects to `addr`, writes one `Req`, reads back one `Resp`, all within
/// [`CALL_TIMEOUT`]. Every public method below is built on top of this.
async fn call<Req, Resp>(addr: &str, request: &Req) -> RpcResult<Resp>
where
  Req: serde::Serialize,
  Resp: for<'de> serde::Deserialize<'de>,
{
  tokio::time::timeout(CALL_TIMEOUT, async {
    let mut stream = TcpStream::connect(addr).await.map_err(|source| RpcError::Connect {
      addr: addr.to_string(),
      source,
    })?;

    write_frame(&mut stream, request).await.map_err(|source| RpcError::Wire {
      addr: addr.to_string(),
      source,
    })?;

    read_frame(&mut stream)
      .await
      .map_err(|source| RpcError::Wire {
        addr: addr.to_string(),
        source,
      })?
      .ok_or_else(|| RpcError::NoResponse { addr: addr.to_string() })
  })
  .await
  .map_err(|_| RpcError::Timeout { addr: addr.to_string() })?
}

/// A thin, stateless handle: holds no connection, just addresses. A new TCP
/// connection is dialed per call, matching the short-lived-connection style
/// of the reference gRPC clients this replaces.
#[derive(Debug, Clone)]
pub struct RpcClient {
  meta_store_addr: String,
}

impl RpcClient {
  pub fn new(meta_store_addr: impl Into<String>) -> RpcClient {
    RpcClient {
      meta_store_addr: meta_store_addr.into(),
    }
  }

  pub async fn get_file_info_map(&self) -> RpcResult<HashMap<String, FileMetaData>> {
    match call(&self.meta_store_addr, &MetaRequest::GetFileInfoMap).await? {
      MetaResponse::FileInfoMap { file_info_map } => Ok(file_info_map),
      MetaResponse::Error { message } => Err(server_error(&self.meta_store_addr, message)),
      _ => Err(RpcError::UnexpectedResponse {
        addr: self.meta_store_addr.clone(),
      }),
    }
  }

  pub async fn update_file(&self, meta: FileMetaData) -> RpcResult<i32> {
    match call(&self.meta_store_addr, &MetaRequest::UpdateFile { meta }).await? {
      MetaResponse::Version { version } => Ok(version),
      MetaResponse::Error { message } => Err(server_error(&self.meta_store_addr, message)),
      _ => Err(RpcError::UnexpectedResponse {
        addr: self.meta_store_addr.clone(),
      }),
    }
  }

  pub async fn get_block_store_map(&self, hashes: Vec<String>) -> RpcResult<HashMap<String, Vec<String>>> {
    match call(&self.meta_store_addr, &MetaRequest::GetBlockStoreMap { hashes }).await? {
      MetaResponse::BlockStoreMap { block_store_map } => Ok(block_store_map),
      MetaResponse::Error { message } => Err(server_error(&self.meta_store_addr, message)),
      _ => Err(RpcError::UnexpectedResponse {
        addr: self.meta_store_addr.clone(),
      }),
    }
  }

  pub async fn get_block_store_addrs(&self) -> RpcResult<Vec<String>> {
    match call(&self.meta_store_addr, &MetaRequest::GetBlockStoreAddrs).await? {
      MetaResponse::BlockStoreAddrs { block_store_addrs } => Ok(block_store_addrs),
      MetaResponse::Error { message } => Err(server_error(&self.meta_store_addr, message)),
      _ => Err(RpcError::UnexpectedResponse {
        addr: self.meta_store_addr.clone(),
      }),
    }
  }

  pub async fn put_block(&self, block_store_addr: &str, data: Vec<u8>) -> RpcResult<()> {
    match call(block_store_addr, &BlockRequest::PutBlock { data }).await? {
      BlockResponse::Success { flag: true } => Ok(()),
      BlockResponse::Success { flag: false } => Err(RpcError::UnexpectedResponse {
        addr: block_store_addr.to_string(),
      }),
      BlockResponse::Error { message } => Err(server_error(block_store_addr, message)),
      _ => Err(RpcError::UnexpectedResponse {
        addr: block_store_addr.to_string(),
      }),
    }
  }

  pub async fn get_block(&self, block_store_addr: &str, hash: String) -> RpcResult<Vec<u8>> {
    match call(block_store_addr, &BlockRequest::GetBlock { hash }).await? {
      BlockResponse::Block { block_data, .. } => Ok(block_data),
      BlockResponse::Error { message } => Err(server_error(block_store_addr, message)),
      _ => Err(RpcError::UnexpectedResponse {
        addr: block_store_addr.to_string(),
      }),
    }
  }

  pub async fn has_blocks(&self, block_store_addr: &str, hashes: Vec<String>) -> RpcResult<Vec<String>> {
    match call(block_store_addr, &BlockRequest::HasBlocks { hashes }).await? {
      BlockResponse::BlockHashes { hashes } => Ok(hashes),
      BlockResponse::Error { message } => Err(server_error(block_store_addr, message)),
      _ => Err(RpcError::UnexpectedResponse {
        addr: block_store_addr.to_string(),
      }),
    }
  }

  pub async fn get_block_hashes(&self, block_store_addr: &str) -> RpcResult<Vec<String>> {
    match call(block_store_addr, &BlockRequest::GetBlockHashes).await? {
      BlockResponse::BlockHashes { hashes } => Ok(hashes),
      BlockResponse::Error { message } => Err(server_error(block_store_addr, message)),
      _ => Err(RpcError::UnexpectedResponse {
        addr: block_store_addr.to_string(),
      }),
    }
  }
}

fn server_error(addr: &str, message: String) -> RpcError {
  RpcError::Server {
    addr: addr.to_string(),
    message,
  }
}
