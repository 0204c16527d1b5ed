use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tokio::net::TcpListener;
use tracing::info;

use treekeeper_server::store::MemoryStore;

#[derive(Parser)]
#[command(name = "treekeeper-server")]
struct Cli {
    /// Address to bind
    #[arg(long, env = "TREEKEEPER_BIND", default_value = "0.0.0.0")]
    bind: String,

    /// Port to listen on
    #[arg(long, env = "TREEKEEPER_PORT", default_value_t = 4710)]
    port: u16,

    /// Insert a demo tree record on startup
    #[arg(long)]
    seed: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let store = Arc::new(MemoryStore::new());

    if cli.seed {
        let tree = store.seed_demo();
        info!("seeded demo tree {}", tree.id_tree);
    }

    let addr = SocketAddr::new(cli.bind.parse()?, cli.port);
    let listener = TcpListener::bind(addr).await?;
    info!("treekeeper-server listening on http://{addr}");

    treekeeper_server::serve(listener, store).await
}
