//! REST API server example
//!
//! Runs media-relay with the REST API enabled. yt-dlp is looked up in PATH
//! unless `MEDIA_RELAY_YT_DLP` points at a binary.
//!
//! After starting, you can:
//! - View Swagger UI at http://localhost:6790/swagger-ui
//! - Download directly via GET http://localhost:6790/api/v1/download?url=...
//! - Watch progress via GET http://localhost:6790/api/v1/download?url=...&progress=true
//!
//! Set `RUST_LOG=media_relay=debug` for per-job logging.

use media_relay::api::start_api_server;
use media_relay::{Config, RetrievalOrchestrator, run_with_shutdown};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("media_relay=info,tower_http=info")),
        )
        .init();

    let mut config = Config::default();
    if let Some(binary) = std::env::var_os("MEDIA_RELAY_YT_DLP") {
        config.extractor.binary_path = Some(binary.into());
    }

    let orchestrator = RetrievalOrchestrator::new(config.clone())?;
    let config = Arc::new(config);
    let address = config.server.api.bind_address;

    println!("Starting media-relay REST API server");
    println!("Swagger UI: http://{}/swagger-ui", address);
    println!("API Base:   http://{}/api/v1", address);
    println!();
    println!("Example commands:");
    println!("  # Fetch a file directly");
    println!(
        "  curl -OJ 'http://{}/api/v1/download?url=https%3A%2F%2Fyoutu.be%2FdQw4w9WgXcQ&quality=480'",
        address
    );
    println!();
    println!("  # Stream progress (Server-Sent Events)");
    println!(
        "  curl -N 'http://{}/api/v1/download?url=https%3A%2F%2Fyoutu.be%2FdQw4w9WgXcQ&progress=true'",
        address
    );

    let server = tokio::spawn(start_api_server(Arc::new(orchestrator.clone()), config));

    // Stop accepting jobs and kill running ones on SIGTERM/SIGINT
    run_with_shutdown(orchestrator).await;
    server.abort();

    Ok(())
}
