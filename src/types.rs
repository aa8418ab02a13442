//! Core types for media-relay

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use utoipa::ToSchema;

use crate::error::{Error, Result};

/// Path of the direct-fetch endpoint, used to build follow-up fetch URLs
pub const DOWNLOAD_ROUTE: &str = "/api/v1/download";

/// Lowest accepted height cap
pub const MIN_HEIGHT: u32 = 144;

/// Highest accepted height cap
pub const MAX_HEIGHT: u32 = 4320;

/// Target quality selector
///
/// Either a height cap in pixels or "whatever is best".
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Quality {
    /// Best video at or below this height
    Height(u32),
    /// Best available, no height filter
    Best,
}

impl Default for Quality {
    fn default() -> Self {
        Quality::Height(720)
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quality::Height(height) => write!(f, "{}", height),
            Quality::Best => write!(f, "best"),
        }
    }
}

impl std::str::FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("best") {
            return Ok(Quality::Best);
        }

        let digits = trimmed.strip_suffix(['p', 'P']).unwrap_or(trimmed);
        let height: u32 = digits
            .parse()
            .map_err(|_| Error::InvalidRequest(format!("invalid quality: {}", s)))?;

        if !(MIN_HEIGHT..=MAX_HEIGHT).contains(&height) {
            return Err(Error::InvalidRequest(format!(
                "quality must be between {} and {} or \"best\", got {}",
                MIN_HEIGHT, MAX_HEIGHT, height
            )));
        }

        Ok(Quality::Height(height))
    }
}

/// Kind of artifact a request produces
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    /// mp4 container with merged video and audio
    Video,
    /// mp3 audio track
    Audio,
}

impl MediaKind {
    /// File extension of the final artifact
    pub fn extension(self) -> &'static str {
        match self {
            MediaKind::Video => "mp4",
            MediaKind::Audio => "mp3",
        }
    }

    /// Content type served for the artifact
    pub fn content_type(self) -> &'static str {
        match self {
            MediaKind::Video => "video/mp4",
            MediaKind::Audio => "audio/mpeg",
        }
    }
}

/// One caller's retrieval request
///
/// Validated on construction and immutable afterwards.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetrievalRequest {
    url: url::Url,
    quality: Quality,
    audio_only: bool,
}

impl RetrievalRequest {
    /// Validate and build a request
    ///
    /// The URL must be absolute and use `http` or `https`.
    pub fn new(url: &str, quality: Quality, audio_only: bool) -> Result<Self> {
        let url = url.trim();
        if url.is_empty() {
            return Err(Error::InvalidRequest("URL is required".to_string()));
        }

        let parsed = url::Url::parse(url)
            .map_err(|e| Error::InvalidRequest(format!("invalid URL {:?}: {}", url, e)))?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(Error::InvalidRequest(format!(
                "unsupported URL scheme: {}",
                parsed.scheme()
            )));
        }

        if parsed.host_str().is_none() {
            return Err(Error::InvalidRequest(format!("URL has no host: {}", url)));
        }

        Ok(Self {
            url: parsed,
            quality,
            audio_only,
        })
    }

    /// Source URL
    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Quality selector
    pub fn quality(&self) -> Quality {
        self.quality
    }

    /// Whether only the audio track is wanted
    pub fn audio_only(&self) -> bool {
        self.audio_only
    }

    /// Kind of artifact this request produces
    pub fn kind(&self) -> MediaKind {
        if self.audio_only {
            MediaKind::Audio
        } else {
            MediaKind::Video
        }
    }

    /// Suggested attachment filename, encoding quality and mode
    ///
    /// `download_720p.mp4`, `download_720p_audio.mp3`, `download_best.mp4`
    pub fn suggested_filename(&self) -> String {
        let label = match self.quality {
            Quality::Height(height) => format!("{}p", height),
            Quality::Best => "best".to_string(),
        };
        let suffix = if self.audio_only { "_audio" } else { "" };
        format!("download_{}{}.{}", label, suffix, self.kind().extension())
    }

    /// Handle a caller can use to fetch the bytes for the same parameters
    pub fn handle(&self) -> RetrievalHandle {
        RetrievalHandle {
            download_url: format!(
                "{}?url={}&quality={}&audioOnly={}",
                DOWNLOAD_ROUTE,
                urlencoding::encode(self.url()),
                self.quality,
                self.audio_only
            ),
            url: self.url().to_string(),
            quality: self.quality.to_string(),
            audio_only: self.audio_only,
        }
    }
}

/// Everything a caller needs to issue the follow-up direct fetch
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RetrievalHandle {
    /// Relative URL of the direct fetch for these parameters
    pub download_url: String,
    /// Source URL
    pub url: String,
    /// Quality selector as given
    pub quality: String,
    /// Audio-only flag
    pub audio_only: bool,
}

/// Normalized progress event of one job
///
/// A job's stream starts with `Start`, ends with exactly one of `Complete`
/// or `Error`, and carries nothing after that.
#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    /// Job accepted, 0% progress
    Start,
    /// Download progress sample
    Progress {
        /// Percentage (0.0 to 100.0)
        percent: f64,
        /// Bytes downloaded so far (0 if unknown)
        downloaded_bytes: u64,
        /// Total bytes expected (0 if unknown)
        total_bytes: u64,
    },
    /// Post-download phase (merge, remux, audio extraction)
    Processing {
        /// Percentage, conventionally 95
        percent: f64,
    },
    /// Job finished and the artifact exists
    Complete {
        /// Size of the produced artifact
        file_size_bytes: u64,
        /// How to fetch it
        handle: RetrievalHandle,
    },
    /// Job failed
    Error {
        /// What went wrong
        message: String,
    },
}

impl ProgressEvent {
    /// Whether this event ends the job's stream
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProgressEvent::Complete { .. } | ProgressEvent::Error { .. }
        )
    }

    /// Wire name of the event type
    pub fn kind(&self) -> EventKind {
        match self {
            ProgressEvent::Start => EventKind::Start,
            ProgressEvent::Progress { .. } => EventKind::Progress,
            ProgressEvent::Processing { .. } => EventKind::Processing,
            ProgressEvent::Complete { .. } => EventKind::Complete,
            ProgressEvent::Error { .. } => EventKind::Error,
        }
    }

    /// Human-readable status line
    pub fn message(&self) -> String {
        match self {
            ProgressEvent::Start => "Starting download...".to_string(),
            ProgressEvent::Progress { percent, .. } => format!("Downloading... {:.1}%", percent),
            ProgressEvent::Processing { .. } => "Processing video...".to_string(),
            ProgressEvent::Complete { .. } => "Download completed!".to_string(),
            ProgressEvent::Error { message } => message.clone(),
        }
    }
}

/// Event type tag on the wire
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Job accepted
    Start,
    /// Download progress
    Progress,
    /// Post-processing
    Processing,
    /// Terminal success
    Complete,
    /// Terminal failure
    Error,
}

impl EventKind {
    /// Name used for the SSE `event:` field
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Start => "start",
            EventKind::Progress => "progress",
            EventKind::Processing => "processing",
            EventKind::Complete => "complete",
            EventKind::Error => "error",
        }
    }
}

/// JSON form of a [`ProgressEvent`] as sent to subscribers
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventPayload {
    /// Event type
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Overall progress percentage
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,

    /// Bytes downloaded so far
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloaded_size: Option<u64>,

    /// Total bytes expected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_size: Option<u64>,

    /// Size of the finished artifact
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,

    /// Relative URL of the follow-up direct fetch
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    /// Source URL of the finished job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    /// Quality selector of the finished job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality: Option<String>,

    /// Audio-only flag of the finished job
    #[serde(skip_serializing_if = "Option::is_none")]
    pub audio_only: Option<bool>,

    /// Human-readable status line
    pub message: String,
}

impl From<&ProgressEvent> for EventPayload {
    fn from(event: &ProgressEvent) -> Self {
        let mut payload = EventPayload {
            kind: event.kind(),
            progress: None,
            downloaded_size: None,
            total_size: None,
            file_size: None,
            download_url: None,
            url: None,
            quality: None,
            audio_only: None,
            message: event.message(),
        };

        match event {
            ProgressEvent::Start => payload.progress = Some(0.0),
            ProgressEvent::Progress {
                percent,
                downloaded_bytes,
                total_bytes,
            } => {
                payload.progress = Some(*percent);
                payload.downloaded_size = Some(*downloaded_bytes);
                payload.total_size = Some(*total_bytes);
            }
            ProgressEvent::Processing { percent } => payload.progress = Some(*percent),
            ProgressEvent::Complete {
                file_size_bytes,
                handle,
            } => {
                payload.progress = Some(100.0);
                payload.file_size = Some(*file_size_bytes);
                payload.download_url = Some(handle.download_url.clone());
                payload.url = Some(handle.url.clone());
                payload.quality = Some(handle.quality.clone());
                payload.audio_only = Some(handle.audio_only);
            }
            ProgressEvent::Error { .. } => {}
        }

        payload
    }
}

/// Bytes of a finished artifact, ready to serve
#[derive(Clone, Debug)]
pub struct ArtifactDownload {
    /// File content
    pub bytes: Vec<u8>,
    /// `video/mp4` or `audio/mpeg`
    pub content_type: &'static str,
    /// Suggested attachment filename
    pub filename: String,
}

/// Upstream URLs returned when the artifact could not be produced locally
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UrlListResponse {
    /// Always true: the request was served, just not with bytes
    pub success: bool,
    /// Always false: the caller has to fetch the URLs itself
    pub direct_download: bool,
    /// Resolved upstream URLs
    pub urls: Vec<String>,
    /// Human-readable explanation
    pub message: String,
    /// What the URLs are
    pub instruction: String,
}

impl UrlListResponse {
    /// Build the fallback payload for a request
    pub fn new(urls: Vec<String>, audio_only: bool) -> Self {
        Self {
            success: true,
            direct_download: false,
            urls,
            message: "Direct download not available, use these URLs".to_string(),
            instruction: if audio_only {
                "Audio URL".to_string()
            } else {
                "Video URLs (may need merging)".to_string()
            },
        }
    }
}

/// Result of a direct-mode fetch
#[derive(Clone, Debug)]
pub enum DirectOutcome {
    /// The artifact itself
    Artifact(ArtifactDownload),
    /// Extraction failed but the upstream URLs could be resolved
    Urls(UrlListResponse),
}

/// System capabilities exposed through the API
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct Capabilities {
    /// Resolved extraction tool binary, if any
    pub extractor_binary: Option<PathBuf>,
    /// Name of the extractor implementation
    pub extractor_name: String,
    /// Maximum concurrently running jobs
    pub max_concurrent_jobs: usize,
    /// Jobs currently holding an admission permit
    pub active_jobs: usize,
    /// Whether progressive jobs are killed when their subscriber leaves
    pub cancel_on_disconnect: bool,
}
