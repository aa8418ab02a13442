//! Extractor seam

use super::handle::JobHandle;
use crate::error::Result;
use crate::types::RetrievalRequest;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// How a job's output will be consumed
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Caller waits for the artifact; progress output is not needed
    Direct,
    /// Caller watches progress; the tool is asked for one progress line per update
    Progressive,
}

/// Something that can turn a [`RetrievalRequest`] into a media file
///
/// Implementations must deliver every output line of a job before its exit
/// signal, and must release the process when the returned handle is dropped.
#[async_trait]
pub trait Extractor: Send + Sync {
    /// Launch a job writing to `output_template`
    ///
    /// `output_template` contains the `%(ext)s` placeholder. The job is
    /// killed once `timeout` elapses.
    async fn start(
        &self,
        request: &RetrievalRequest,
        output_template: &Path,
        mode: RunMode,
        timeout: Duration,
    ) -> Result<JobHandle>;

    /// Resolve the upstream media URLs for a request without downloading
    async fn resolve_urls(
        &self,
        request: &RetrievalRequest,
        timeout: Duration,
    ) -> Result<Vec<String>>;

    /// Name of this implementation
    fn name(&self) -> &'static str;

    /// Binary this implementation runs, if any
    fn binary(&self) -> Option<&Path>;
}
