//! Extractor used when no tool is available

use super::handle::JobHandle;
use super::traits::{Extractor, RunMode};
use crate::error::{Error, Result};
use crate::types::RetrievalRequest;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

const UNAVAILABLE: &str = "no extraction tool available. \
     Configure extractor.binary_path or ensure yt-dlp is in PATH.";

/// Extractor that fails every request with [`Error::ExternalTool`]
///
/// Lets the service start and report its state when the tool is missing.
pub struct UnavailableExtractor;

#[async_trait]
impl Extractor for UnavailableExtractor {
    async fn start(
        &self,
        _request: &RetrievalRequest,
        _output_template: &Path,
        _mode: RunMode,
        _timeout: Duration,
    ) -> Result<JobHandle> {
        Err(Error::ExternalTool(UNAVAILABLE.into()))
    }

    async fn resolve_urls(
        &self,
        _request: &RetrievalRequest,
        _timeout: Duration,
    ) -> Result<Vec<String>> {
        Err(Error::ExternalTool(UNAVAILABLE.into()))
    }

    fn name(&self) -> &'static str {
        "unavailable"
    }

    fn binary(&self) -> Option<&Path> {
        None
    }
}
