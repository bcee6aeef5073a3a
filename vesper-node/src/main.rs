use std::path::PathBuf;

use vesper_node::{run_node, NodeConfig};

#[tokio::main]
async fn main() {
    let path = std::env::var("VESPER_CONFIG").ok().map(PathBuf::from);
    let cfg = match NodeConfig::load(path.as_deref()) {
        Ok(cfg) => cfg,
        Err(err) => {
            eprintln!("failed to load config: {err:?}");
            std::process::exit(1);
        }
    };
    if let Err(err) = run_node(cfg).await {
        eprintln!("node failed: {err:?}");
        std::process::exit(1);
    }
}
