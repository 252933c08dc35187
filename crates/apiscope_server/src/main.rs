//! `apiscope`: serve the OpenAPI tools on stdin/stdout.
//!
//! # Usage
//!
//! ```bash
//! apiscope --document ./petstore.yaml --log-level debug
//! ```

use anyhow::Context;
use apiscope_server::{Args, ServerConfig, build_server, serve_stdio};
use clap::Parser;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let config = ServerConfig::from(Args::parse());
    config.tracing.init();

    let server = build_server(&config)
        .await
        .context("failed to start apiscope")?;
    tracing::info!(tools = ?server.registry().names(), "serving on stdio");

    serve_stdio(Arc::new(server))
        .await
        .context("stdio transport failed")?;

    tracing::info!("input closed, shutting down");
    Ok(())
}
