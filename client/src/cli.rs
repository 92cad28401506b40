use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[clap(name = "fss-client", about = "Synchronizes a local directory against a MetaStore", version = clap::crate_version!())]
pub struct Args {
  #[clap(short, long, help = "Enable debug logs")]
  pub debug: bool,

  #[clap(long, help = "MetaStore address, e.g. 127.0.0.1:8170")]
  pub meta_store_addr: String,

  #[clap(long, help = "Directory to keep synchronized")]
  pub base_dir: PathBuf,

  #[clap(long, default_value_t = 4096, help = "Block size in bytes")]
  pub block_size: usize,

  #[clap(long, help = "Run a single sync cycle and exit, instead of looping")]
  pub once: bool,

  #[clap(long, default_value_t = 30, help = "Seconds between sync cycles when looping")]
  pub interval_secs: u64,

  #[clap(long, help = "Report what a cycle would upload/download without doing it")]
  pub dry_run: bool,
}
