//! Configuration types for media-relay

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{net::SocketAddr, path::PathBuf, time::Duration};
use utoipa::ToSchema;

/// External extraction tool settings
///
/// Groups settings for the binary that performs the actual retrieval.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ExtractorConfig {
    /// Path to the extraction tool (auto-detected if None)
    #[serde(default)]
    pub binary_path: Option<PathBuf>,

    /// Whether to search PATH for the tool if no explicit path is set (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,

    /// Arguments passed before every mode-specific argument
    #[serde(default = "default_base_args")]
    pub base_args: Vec<String>,

    /// Wall-clock bound for direct-mode jobs (default: 120 seconds)
    #[serde(default = "default_direct_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub direct_timeout: Duration,

    /// Wall-clock bound for progressive-mode jobs (default: 300 seconds)
    #[serde(default = "default_progressive_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub progressive_timeout: Duration,

    /// Time allowed for output readers to drain after the process is gone (default: 2 seconds)
    #[serde(default = "default_drain_grace", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub drain_grace: Duration,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            binary_path: None,
            search_path: true,
            base_args: default_base_args(),
            direct_timeout: default_direct_timeout(),
            progressive_timeout: default_progressive_timeout(),
            drain_grace: default_drain_grace(),
        }
    }
}

/// Temporary artifact storage
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageConfig {
    /// Directory that receives in-flight artifacts (default: system temp dir + "media-relay")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
        }
    }
}

/// Job admission and cancellation behavior
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct JobConfig {
    /// Maximum concurrently running jobs (default: 4)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent_jobs: usize,

    /// Kill a progressive job's process when its subscriber disconnects (default: true)
    ///
    /// When false, the process runs to completion unobserved and its artifact
    /// is discarded afterwards.
    #[serde(default = "default_true")]
    pub cancel_on_disconnect: bool,

    /// How long shutdown waits for running jobs to wind down (default: 10 seconds)
    #[serde(default = "default_shutdown_timeout", with = "duration_serde")]
    #[schema(value_type = u64)]
    pub shutdown_timeout: Duration,
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: default_max_concurrent(),
            cancel_on_disconnect: true,
            shutdown_timeout: default_shutdown_timeout(),
        }
    }
}

/// Main configuration for the retrieval service
///
/// Fields are organized into logical sub-configs:
/// - [`extractor`](ExtractorConfig): tool binary, arguments, timeouts
/// - [`storage`](StorageConfig): where artifacts live while in flight
/// - [`jobs`](JobConfig): admission and cancellation
/// - [`server`](ServerIntegrationConfig): REST API
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct Config {
    /// Extraction tool settings
    #[serde(default)]
    pub extractor: ExtractorConfig,

    /// Artifact storage settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Job admission settings
    #[serde(default)]
    pub jobs: JobConfig,

    /// API and external server integration
    #[serde(flatten)]
    pub server: ServerIntegrationConfig,
}

impl Config {
    /// Temporary directory
    pub fn temp_dir(&self) -> &PathBuf {
        &self.storage.temp_dir
    }

    /// Check settings that would otherwise fail at request time
    pub fn validate(&self) -> Result<()> {
        if self.jobs.max_concurrent_jobs == 0 {
            return Err(Error::Config {
                message: "max_concurrent_jobs must be at least 1".to_string(),
                key: Some("max_concurrent_jobs".to_string()),
            });
        }

        if self.jobs.max_concurrent_jobs > tokio::sync::Semaphore::MAX_PERMITS {
            return Err(Error::Config {
                message: format!(
                    "max_concurrent_jobs must not exceed {}",
                    tokio::sync::Semaphore::MAX_PERMITS
                ),
                key: Some("max_concurrent_jobs".to_string()),
            });
        }

        if self.extractor.direct_timeout.is_zero() || self.extractor.progressive_timeout.is_zero()
        {
            return Err(Error::Config {
                message: "extraction timeouts must be non-zero".to_string(),
                key: Some("direct_timeout".to_string()),
            });
        }

        if self.storage.temp_dir.as_os_str().is_empty() {
            return Err(Error::Config {
                message: "temp_dir must not be empty".to_string(),
                key: Some("temp_dir".to_string()),
            });
        }

        Ok(())
    }
}

/// API and external server integration configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ServerIntegrationConfig {
    /// REST API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

/// REST API configuration
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiConfig {
    /// Address to bind to (default: 127.0.0.1:6790)
    #[serde(default = "default_bind_address")]
    pub bind_address: SocketAddr,

    /// Enable CORS for browser access (default: true)
    #[serde(default = "default_true")]
    pub cors_enabled: bool,

    /// Allowed CORS origins (default: ["*"])
    #[serde(default = "default_cors_origins")]
    pub cors_origins: Vec<String>,

    /// Enable Swagger UI at /swagger-ui (default: true)
    #[serde(default = "default_true")]
    pub swagger_ui: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            cors_enabled: true,
            cors_origins: default_cors_origins(),
            swagger_ui: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_base_args() -> Vec<String> {
    vec![
        "--no-check-certificate".to_string(),
        "--no-playlist".to_string(),
    ]
}

fn default_direct_timeout() -> Duration {
    Duration::from_secs(120)
}

fn default_progressive_timeout() -> Duration {
    Duration::from_secs(300)
}

fn default_drain_grace() -> Duration {
    Duration::from_secs(2)
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join("media-relay")
}

fn default_max_concurrent() -> usize {
    4
}

fn default_shutdown_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_bind_address() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 6790))
}

fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
