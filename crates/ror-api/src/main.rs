//! Binary entrypoint for the RealOrRender API server.
use clap::Parser;
use tracing_subscriber::EnvFilter;

use ror_api::{run, Args};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if args.cors_origins.is_empty() {
        tracing::info!("no CORS origins configured, allowing all origins");
    }

    run(&args.addr, args.server_config()).await?;
    Ok(())
}
