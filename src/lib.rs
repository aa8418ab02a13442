//! # media-relay
//!
//! Media retrieval service that drives an external extraction tool (yt-dlp)
//! and relays its progress to callers.
//!
//! ## Design Philosophy
//!
//! media-relay is designed to be:
//! - **Library-first** - The HTTP surface is a thin layer over [`RetrievalOrchestrator`]
//! - **Job-scoped** - Every retrieval owns its process and temp files, and releases both
//! - **Event-driven** - Progressive callers receive an ordered stream of [`ProgressEvent`]s
//!
//! ## Quick Start
//!
//! ```no_run
//! use futures::StreamExt;
//! use media_relay::{Config, Quality, RetrievalOrchestrator, RetrievalRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = RetrievalOrchestrator::new(Config::default())?;
//!
//!     let request = RetrievalRequest::new(
//!         "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
//!         Quality::Height(720),
//!         false,
//!     )?;
//!
//!     let mut events = orchestrator.fetch_progressive(request)?;
//!     while let Some(event) = events.next().await {
//!         println!("{}", event.message());
//!     }
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// REST API module
pub mod api;
/// Temporary artifact storage
pub mod artifact;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// External extraction tool integration
pub mod extractor;
pub(crate) mod job;
/// Retrieval coordination (direct and progressive modes)
pub mod orchestrator;
/// Progress line parsing and event ordering
pub mod progress;
/// Per-job event delivery
pub mod relay;
/// Human-readable size parsing
pub mod size;
/// Core types
pub mod types;

// Re-export commonly used types
pub use artifact::{ArtifactPath, ArtifactStore};
pub use config::{ApiConfig, Config, ExtractorConfig, JobConfig, StorageConfig};
pub use error::{ApiError, Error, Result, ToHttpStatus};
pub use extractor::{CliExtractor, Extractor, UnavailableExtractor};
pub use orchestrator::RetrievalOrchestrator;
pub use progress::ProgressLineParser;
pub use relay::{ProgressRelay, RelayStream};
pub use size::parse_size;
pub use types::{
    ArtifactDownload, Capabilities, DirectOutcome, EventKind, EventPayload, MediaKind,
    ProgressEvent, Quality, RetrievalHandle, RetrievalRequest, UrlListResponse,
};

/// Helper function to run the orchestrator with graceful signal handling.
///
/// Waits for a termination signal and then calls the orchestrator's `shutdown()` method,
/// which cancels every running job and waits for their temp files to be released.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
///
/// # Example
///
/// ```no_run
/// use media_relay::{Config, RetrievalOrchestrator, run_with_shutdown};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let orchestrator = RetrievalOrchestrator::new(Config::default())?;
///
///     // Run with automatic signal handling
///     run_with_shutdown(orchestrator).await;
///
///     Ok(())
/// }
/// ```
pub async fn run_with_shutdown(orchestrator: RetrievalOrchestrator) {
    wait_for_signal().await;
    orchestrator.shutdown().await;
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration may fail in restricted environments (containers, tests)
    let sigterm_result = signal(SignalKind::terminate());
    let sigint_result = signal(SignalKind::interrupt());

    match (sigterm_result, sigint_result) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM signal");
                }
                _ = sigint.recv() => {
                    tracing::info!("Received SIGINT signal (Ctrl+C)");
                }
            }
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "Could not register SIGTERM handler, waiting for SIGINT only");
            sigint.recv().await;
            tracing::info!("Received SIGINT signal (Ctrl+C)");
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "Could not register SIGINT handler, waiting for SIGTERM only");
            sigterm.recv().await;
            tracing::info!("Received SIGTERM signal");
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "Could not register any signal handlers, using ctrl_c fallback");
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
        }
    }
}
