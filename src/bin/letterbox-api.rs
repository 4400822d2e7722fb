#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

//! HTTP service returning the latest mail for a recipient
//!
//! Polls a maildrop directory and serves `GET /receive_email`.

use clap::Parser;
use letterbox::{Config, EnvSecretStore, FsObjectStore, Letterbox};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "letterbox-api")]
#[command(about = "HTTP API that waits for mail addressed to a recipient")]
struct Args {
    /// Override the listen host from the environment
    #[arg(long)]
    host: Option<String>,

    /// Override the listen port from the environment
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let letterbox = Letterbox::new(
        Arc::new(FsObjectStore::new(config.mail_dir.clone())),
        Arc::new(EnvSecretStore),
        config.secret_name.clone(),
        config.poll(),
    );

    letterbox::server::serve(&config, Arc::new(letterbox)).await?;
    Ok(())
}
