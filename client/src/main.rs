mod cli;
mod error;

use clap::Parser;
use fss_lib::sync_engine::SyncEngine;
use log::{info, warn};

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

  let engine = SyncEngine::new(args.meta_store_addr.clone(), &args.base_dir, args.block_size)
    .ok_or_exit(format!("Open local index under {}", args.base_dir.display()));

  if args.dry_run {
    let plan = engine.plan_once().await.ok_or_exit("Plan sync cycle");
    info!("would upload: {:?}", plan.uploads);
    info!("would download: {:?}", plan.downloads);
    return;
  }

  if args.once {
    engine.run_once().await.ok_or_exit("Run sync cycle");
    return;
  }

  let interval = std::time::Duration::from_secs(args.interval_secs);
  let mut ticker = tokio::time::interval(interval);

  loop {
    tokio::select! {
      _ = ticker.tick() => {
        if let Err(error) = engine.run_once().await {
          warn!("sync cycle failed, will retry next tick: {}", error);
        }
      }
      _ = tokio::signal::ctrl_c() => {
        info!("shutting down");
        break;
      }
    }
  }
}
