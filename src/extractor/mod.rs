//! External extraction tool integration
//!
//! The orchestrator never talks to a process directly; it goes through the
//! [`Extractor`] trait, which hands back a [`JobHandle`] delivering the job's
//! output lines followed by exactly one exit signal.
//!
//! - [`CliExtractor`]: runs `yt-dlp` (or a configured compatible binary)
//! - [`UnavailableExtractor`]: stand-in when no binary can be found
//!
//! ```no_run
//! use media_relay::extractor::{CliExtractor, Extractor, JobSignal, RunMode};
//! use media_relay::{Quality, RetrievalRequest};
//! use std::path::Path;
//! use std::time::Duration;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let extractor = CliExtractor::from_path().expect("yt-dlp not found in PATH");
//! let request = RetrievalRequest::new("https://youtu.be/dQw4w9WgXcQ", Quality::Height(360), true)?;
//!
//! let mut job = extractor
//!     .start(&request, Path::new("/tmp/job.%(ext)s"), RunMode::Progressive, Duration::from_secs(300))
//!     .await?;
//! while let Some(signal) = job.next().await {
//!     if let JobSignal::Exit(exit) = signal {
//!         println!("job ended: {exit:?}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

mod cli;
mod command;
mod handle;
mod noop;
mod traits;

pub use cli::CliExtractor;
pub(crate) use cli::diagnostic_summary;
pub use command::{download_args, resolve_args};
pub use handle::{JobExit, JobHandle, JobSignal};
pub use noop::UnavailableExtractor;
pub use traits::{Extractor, RunMode};

use crate::config::ExtractorConfig;
use std::sync::Arc;

/// Pick the extractor implementation a configuration asks for
///
/// An explicit binary path always wins. Otherwise `PATH` is searched when
/// allowed, and [`UnavailableExtractor`] is used when nothing turns up.
pub fn from_config(config: &ExtractorConfig) -> Arc<dyn Extractor> {
    if let Some(ref binary_path) = config.binary_path {
        Arc::new(CliExtractor::new(binary_path.clone()).with_config(config))
    } else if config.search_path {
        CliExtractor::from_path()
            .map(|extractor| Arc::new(extractor.with_config(config)) as Arc<dyn Extractor>)
            .unwrap_or_else(|| {
                tracing::warn!("yt-dlp not found in PATH, retrieval requests will fail");
                Arc::new(UnavailableExtractor)
            })
    } else {
        Arc::new(UnavailableExtractor)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn explicit_binary_path_is_used_verbatim() {
        let config = ExtractorConfig {
            binary_path: Some(PathBuf::from("/opt/tools/yt-dlp")),
            ..Default::default()
        };
        let extractor = from_config(&config);
        assert_eq!(extractor.name(), "cli-yt-dlp");
        assert_eq!(
            extractor.binary(),
            Some(std::path::Path::new("/opt/tools/yt-dlp"))
        );
    }

    #[test]
    fn disabled_path_search_without_binary_is_unavailable() {
        let config = ExtractorConfig {
            binary_path: None,
            search_path: false,
            ..Default::default()
        };
        let extractor = from_config(&config);
        assert_eq!(extractor.name(), "unavailable");
        assert!(extractor.binary().is_none());
    }

    #[test]
    fn path_search_agrees_with_which() {
        let config = ExtractorConfig::default();
        let extractor = from_config(&config);
        assert_eq!(which::which("yt-dlp").is_ok(), extractor.binary().is_some());
    }
}
