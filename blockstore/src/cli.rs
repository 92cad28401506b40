use clap::Parser;

#[derive(Parser, Debug)]
#[clap(name = "fss-blockstore", about = "Serves a shard of content-addressed blocks", version = clap::crate_version!())]
pub struct Args {
  #[clap(short, long, help = "Enable debug logs")]
  pub debug: bool,

  #[clap(long, default_value = "127.0.0.1:8180", help = "Address to listen on")]
  pub listen_addr: String,
}
