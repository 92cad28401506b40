mod cli;
mod error;

use std::sync::Arc;

use clap::Parser;
use fss_lib::meta_store::MetaStore;
use fss_lib::server::serve_meta_store;
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

  let meta_store = Arc::new(MetaStore::new(args.block_store_addrs.clone()));
  let listener = TcpListener::bind(&args.listen_addr)
    .await
    .ok_or_exit(format!("Bind {}", args.listen_addr));

  info!(
    "MetaStore listening on {}, sharding across {} BlockStore(s)",
    args.listen_addr,
    args.block_store_addrs.len()
  );

  serve_meta_store(listener, meta_store)
    .await
    .ok_or_exit("Serve MetaStore connections");
}
