//! Route handlers for the REST API
//!
//! Handlers are organized by domain:
//! - [`download`] - Direct and progressive retrieval
//! - [`system`] - Health, capabilities, OpenAPI

use crate::error::{Error, Result};
use crate::types::{Quality, RetrievalRequest};
use serde::{Deserialize, Serialize};

mod download;
mod system;

// Re-export all handlers so `routes::function_name` continues to work
pub use download::*;
pub use system::*;

// ============================================================================
// Query/Request Types (shared across handlers)
// ============================================================================

/// Query parameters for GET /download
///
/// Every field is optional at the extractor level so that a missing `url`
/// surfaces as a JSON 400 instead of axum's plain-text rejection.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
pub struct DownloadQuery {
    /// Source page URL (required)
    pub url: Option<String>,
    /// Height cap such as "720", or "best" (default: "720")
    pub quality: Option<String>,
    /// "true" to fetch the audio track only
    #[serde(rename = "audioOnly")]
    pub audio_only: Option<String>,
    /// "true" to stream progress events instead of returning the file
    pub progress: Option<String>,
}

impl DownloadQuery {
    /// Whether progressive mode was asked for
    pub fn is_progressive(&self) -> bool {
        self.progress.as_deref() == Some("true")
    }

    /// Validate into a retrieval request
    pub fn to_request(&self) -> Result<RetrievalRequest> {
        let url = self
            .url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| Error::InvalidRequest("URL is required".to_string()))?;

        let quality = match self.quality.as_deref() {
            Some(q) if !q.trim().is_empty() => q.parse::<Quality>()?,
            _ => Quality::default(),
        };

        let audio_only = self.audio_only.as_deref() == Some("true");

        RetrievalRequest::new(url, quality, audio_only)
    }
}
