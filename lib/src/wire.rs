//! Wire protocol: the message shapes exchanged between `RpcClient` and the
//! MetaStore/BlockStore servers, and the framing used to put them on the
//! network.
//!
//! Any framed unary RPC substrate satisfying these message shapes is
//! acceptable; we use a length-prefixed `rmp-serde` frame over a plain
//! `tokio` TCP stream: a little-endian `u32` length prefix followed by
//! exactly that many encoded bytes.

use std::collections::HashMap;
use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::model::FileMetaData;

#[derive(Debug, Error)]
pub enum WireError {
  #[error("transport IO error: {0}")]
  Io(#[from] io::Error),
  #[error("frame encode error: {0}")]
  Encode(#[from] rmp_serde::encode::Error),
  #[error("frame decode error: {0}")]
  Decode(#[from] rmp_serde::decode::Error),
  #[error("connection closed by peer")]
  Closed,
}

pub type WireResult<T> = Result<T, WireError>;

/// One request to a BlockStore server.
#[derive(Debug, Serialize, Deserialize)]
pub enum BlockRequest {
  PutBlock { data: Vec<u8> },
  GetBlock { hash: String },
  HasBlocks { hashes: Vec<String> },
  GetBlockHashes,
}

/// One response from a BlockStore server.
#[derive(Debug, Serialize, Deserialize)]
pub enum BlockResponse {
  Success { flag: bool },
  Block { block_data: Vec<u8>, block_size: i32 },
  BlockHashes { hashes: Vec<String> },
  Error { message: String },
}

/// One request to the MetaStore server.
#[derive(Debug, Serialize, Deserialize)]
pub enum MetaRequest {
  GetFileInfoMap,
  UpdateFile { meta: FileMetaData },
  GetBlockStoreMap { hashes: Vec<String> },
  GetBlockStoreAddrs,
}

/// One response from the MetaStore server.
#[derive(Debug, Serialize, Deserialize)]
pub enum MetaResponse {
  FileInfoMap { file_info_map: HashMap<String, FileMetaData> },
  Version { version: i32 },
  BlockStoreMap { block_store_map: HashMap<String, Vec<String>> },
  BlockStoreAddrs { block_store_addrs: Vec<String> },
  Error { message: String },
}

/// Read one length-prefixed, `rmp-serde`-encoded frame. Returns `Ok(None)`
/// on a clean EOF between frames (the peer closed the connection).
pub async fn read_frame<T, R>(reader: &mut R) -> WireResult<Option<T>>
where
  T: for<'de> Deserialize<'de>,
  R: AsyncRead + Unpin,
{
  let len = match reader.read_u32_le().await {
    Ok(len) => len as usize,
    Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
    Err(err) => return Err(err.into()),
  };
  let mut buf = vec![0u8; len];
  reader.read_exact(&mut buf).await?;

  Ok(Some(rmp_serde::from_slice(&buf)?))
}

/// Write one length-prefixed, `rmp-serde`-encoded frame.
pub async fn write_frame<T, W>(writer: &mut W, value: &T) -> WireResult<()>
where
  T: Serialize,
  W: AsyncWrite + Unpin,
{
  let buf = rmp_serde::to_vec(value)?;

  writer.write_u32_le(buf.len() as u32).await?;
  writer.write_all(&buf).await?;
  writer.flush().await?;
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[tokio::test]
  async fn frame_round_trips_over_an_in_memory_pipe() {
    let (mut client, mut server) = tokio::io::duplex(4096);

    let request = BlockRequest::PutBlock {
      data: b"hello world".to_vec(),
    };
    write_frame(&mut client, &request).await.unwrap();

    let received: BlockRequest = read_frame(&mut server).await.unwrap().unwrap();
    match received {
      BlockRequest::PutBlock { data } => assert_eq!(data, b"hello world"),
      other => panic!("unexpected request: {:?}", other),
    }
  }

  #[tokio::test]
  async fn clean_close_yields_none() {
    let (client, mut server) = tokio::io::duplex(4096);
    drop(client);

    let received: WireResult<Option<BlockRequest>> = read_frame(&mut server).await;
    assert!(matches!(received, Ok(None)));
  }
}
