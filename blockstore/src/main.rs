mod cli;
mod error;

use std::sync::Arc;

use clap::Parser;
use fss_lib::block_store::{BlockStore, MemoryBlockStore};
use fss_lib::server::serve_block_store;
use log::info;
use tokio::net::TcpListener;

use crate::error::ExtResult;

#[tokio::main]
async fn main() {
  let args = cli::Args::parse();

  let mut log_builder = env_logger::Builder::from_default_env();
  if args.debug {
    log_builder.filter(None, log::LevelFilter::Debug);
  } else {
    log_builder.filter(None, log::LevelFilter::Info);
  }
  log_builder.target(env_logger::Target::Stderr);
  log_builder.init();

  let block_store: Arc<dyn BlockStore> = Arc::new(MemoryBlockStore::new());
  let listener = TcpListener::bind(&args.listen_addr)
    .await
    .ok_or_exit(format!("Bind {}", args.listen_addr));

  info!("BlockStore listening on {}", args.listen_addr);

  serve_block_store(listener, block_store)
    .await
    .ok_or_exit("Serve BlockStore connections");
}
