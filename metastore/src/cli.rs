use clap::Parser;

#[derive(Parser, Debug)]
#[clap(name = "fss-metastore", about = "Serves per-file versions and block-hash lists", version = clap::crate_version!())]
pub struct Args {
  #[clap(short, long, help = "Enable debug logs")]
  pub debug: bool,

  #[clap(long, default_value = "127.0.0.1:8170", help = "Address to listen on")]
  pub listen_addr: String,

  #[clap(long = "block-store-addr", required = true, help = "Address of a BlockStore server; repeat for each shard")]
  pub block_store_addrs: Vec<String>,
}
