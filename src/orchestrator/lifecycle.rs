//! Shutdown coordination.

use super::RetrievalOrchestrator;
use std::sync::atomic::Ordering;
use std::time::Duration;

impl RetrievalOrchestrator {
    /// Gracefully shut down the orchestrator
    ///
    /// 1. Stops accepting new requests
    /// 2. Cancels every running job (their processes are killed)
    /// 3. Waits, up to `jobs.shutdown_timeout`, for the jobs to release
    ///    their slots and files
    pub async fn shutdown(&self) {
        tracing::info!("Initiating graceful shutdown");

        self.admission.accepting_new.store(false, Ordering::SeqCst);
        self.admission.shutdown.cancel();
        tracing::info!(active_jobs = self.active_jobs(), "Stopped accepting new jobs");

        let shutdown_timeout = self.config.jobs.shutdown_timeout;
        match tokio::time::timeout(shutdown_timeout, self.wait_for_active_jobs()).await {
            Ok(()) => tracing::info!("All active jobs wound down"),
            Err(_) => tracing::warn!(
                active_jobs = self.active_jobs(),
                "Timeout waiting for jobs to wind down, proceeding with shutdown"
            ),
        }

        tracing::info!("Graceful shutdown complete");
    }

    /// Whether new requests are accepted
    pub fn is_accepting(&self) -> bool {
        self.admission.accepting_new.load(Ordering::SeqCst)
    }

    async fn wait_for_active_jobs(&self) {
        loop {
            let active_jobs = self.active_jobs();
            if active_jobs == 0 {
                return;
            }

            tracing::debug!(active_jobs, "Waiting for active jobs to finish");
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
    }
}
