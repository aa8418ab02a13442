//! Retrieval coordination
//!
//! [`RetrievalOrchestrator`] is the one place that decides what a request
//! turns into:
//! - [`fetch_direct`](RetrievalOrchestrator::fetch_direct) waits for the
//!   artifact and falls back to resolving upstream URLs once
//! - [`fetch_progressive`](RetrievalOrchestrator::fetch_progressive) returns a
//!   live event stream immediately and runs the job in its own task
//!
//! Both go through the same admission gate, and both are stopped by
//! [`shutdown`](RetrievalOrchestrator::shutdown).

use crate::artifact::ArtifactStore;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::extractor::{self, Extractor};
use crate::types::Capabilities;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{OwnedSemaphorePermit, Semaphore};
use tokio_util::sync::CancellationToken;

mod direct;
mod lifecycle;
mod progressive;


/// Admission and shutdown state shared by every clone of the orchestrator
#[derive(Clone)]
pub(crate) struct AdmissionState {
    /// Semaphore to limit concurrent jobs (respects max_concurrent_jobs config)
    pub(crate) concurrent_limit: Arc<Semaphore>,
    /// Flag to indicate whether new jobs are accepted (set to false during shutdown)
    pub(crate) accepting_new: Arc<AtomicBool>,
    /// Fired once on shutdown; every running job watches it
    pub(crate) shutdown: CancellationToken,
}

impl AdmissionState {
    fn new(max_concurrent_jobs: usize) -> Self {
        Self {
            concurrent_limit: Arc::new(Semaphore::new(max_concurrent_jobs)),
            accepting_new: Arc::new(AtomicBool::new(true)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Wait for a job slot
    ///
    /// Fails with [`Error::ShuttingDown`] if shutdown has begun or begins
    /// while waiting.
    pub(crate) async fn acquire(&self) -> Result<OwnedSemaphorePermit> {
        if !self.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        tokio::select! {
            permit = self.concurrent_limit.clone().acquire_owned() => {
                permit.map_err(|_| Error::ShuttingDown)
            }
            _ = self.shutdown.cancelled() => Err(Error::ShuttingDown),
        }
    }
}

/// Top-level coordinator for retrieval requests (cloneable, all state is shared)
#[derive(Clone)]
pub struct RetrievalOrchestrator {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Extraction tool (trait object for pluggable implementations)
    pub(crate) extractor: Arc<dyn Extractor>,
    /// Temporary artifact storage
    pub(crate) store: ArtifactStore,
    /// Admission control and shutdown signalling
    pub(crate) admission: AdmissionState,
}

impl RetrievalOrchestrator {
    /// Create an orchestrator, picking the extractor from configuration
    pub fn new(config: Config) -> Result<Self> {
        let extractor = extractor::from_config(&config.extractor);
        Self::with_extractor(config, extractor)
    }

    /// Create an orchestrator around a specific extractor
    pub fn with_extractor(config: Config, extractor: Arc<dyn Extractor>) -> Result<Self> {
        config.validate()?;

        tracing::info!(
            extractor = extractor.name(),
            binary = ?extractor.binary(),
            max_concurrent_jobs = config.jobs.max_concurrent_jobs,
            temp_dir = %config.temp_dir().display(),
            "retrieval orchestrator initialized"
        );

        Ok(Self {
            store: ArtifactStore::new(config.temp_dir().clone()),
            admission: AdmissionState::new(config.jobs.max_concurrent_jobs),
            config: Arc::new(config),
            extractor,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Jobs currently holding an admission slot
    pub fn active_jobs(&self) -> usize {
        self.config
            .jobs
            .max_concurrent_jobs
            .saturating_sub(self.admission.concurrent_limit.available_permits())
    }

    /// Report what this instance can do right now
    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            extractor_binary: self.extractor.binary().map(|path| path.to_path_buf()),
            extractor_name: self.extractor.name().to_string(),
            max_concurrent_jobs: self.config.jobs.max_concurrent_jobs,
            active_jobs: self.active_jobs(),
            cancel_on_disconnect: self.config.jobs.cancel_on_disconnect,
        }
    }
}
