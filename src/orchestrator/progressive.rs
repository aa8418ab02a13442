//! Progressive mode: stream a job's events to one subscriber

use super::RetrievalOrchestrator;
use crate::error::{Error, Result};
use crate::extractor::{JobExit, JobSignal, RunMode};
use crate::job::Job;
use crate::progress::EventSequencer;
use crate::relay::{ProgressRelay, RelayStream};
use crate::types::{ProgressEvent, RetrievalRequest};
use std::sync::atomic::Ordering;

impl RetrievalOrchestrator {
    /// Start a job for `request` and return its event stream right away
    ///
    /// The stream starts with `Start` and ends after exactly one `Complete`
    /// or `Error`. The artifact itself is discarded; `Complete` carries a
    /// handle for a follow-up [`fetch_direct`](Self::fetch_direct).
    ///
    /// Dropping the stream stops delivery; with `cancel_on_disconnect` it
    /// also kills the process.
    pub fn fetch_progressive(&self, request: RetrievalRequest) -> Result<RelayStream> {
        if !self.admission.accepting_new.load(Ordering::SeqCst) {
            return Err(Error::ShuttingDown);
        }

        let (relay, stream) = ProgressRelay::channel();
        let orchestrator = self.clone();
        tokio::spawn(async move { orchestrator.drive_progressive(request, relay).await });

        Ok(stream)
    }

    async fn drive_progressive(self, request: RetrievalRequest, mut relay: ProgressRelay) {
        let permit = tokio::select! {
            permit = self.admission.acquire() => permit,
            _ = relay.disconnected() => {
                tracing::debug!(url = request.url(), "subscriber left before the job was admitted");
                return;
            }
        };
        let _permit = match permit {
            Ok(permit) => permit,
            Err(e) => return publish_failure(&mut relay, &e),
        };

        let mut job = match Job::start(
            self.extractor.as_ref(),
            &self.store,
            &request,
            RunMode::Progressive,
            self.config.extractor.progressive_timeout,
        )
        .await
        {
            Ok(job) => job,
            Err(e) => {
                tracing::warn!(url = request.url(), error = %e, "failed to start job");
                return publish_failure(&mut relay, &e);
            }
        };

        for event in job.admit(ProgressEvent::Start) {
            relay.send(event);
        }

        let disconnected = relay.disconnected();
        tokio::pin!(disconnected);
        let mut watching = self.config.jobs.cancel_on_disconnect;
        let mut stopping = false;
        let mut terminal = Vec::new();

        loop {
            tokio::select! {
                _ = &mut disconnected, if watching => {
                    watching = false;
                    tracing::info!(job_id = job.id(), "subscriber disconnected, cancelling job");
                    job.cancel();
                }
                _ = self.admission.shutdown.cancelled(), if !stopping => {
                    stopping = true;
                    tracing::info!(job_id = job.id(), "shutdown requested, cancelling job");
                    job.cancel();
                }
                signal = job.next_signal() => match signal {
                    Some(JobSignal::Output(line) | JobSignal::ErrorOutput(line)) => {
                        for event in job.observe(&line) {
                            relay.send(event);
                        }
                    }
                    Some(JobSignal::Exit(exit)) => {
                        let event = self.terminal_event(&job, exit, &request).await;
                        terminal = job.admit(event);
                        break;
                    }
                    None => break,
                },
            }
        }

        // files are gone before the subscriber learns the job is over
        job.release().await;
        for event in terminal {
            relay.send(event);
        }
        relay.close();
    }

    async fn terminal_event(
        &self,
        job: &Job,
        exit: JobExit,
        request: &RetrievalRequest,
    ) -> ProgressEvent {
        let size = match job.outcome(exit).await {
            Ok(path) => self.store.size(&path).await,
            Err(e) => Err(e),
        };

        match size {
            Ok(file_size_bytes) => ProgressEvent::Complete {
                file_size_bytes,
                handle: request.handle(),
            },
            Err(e) => ProgressEvent::Error {
                message: e.to_string(),
            },
        }
    }
}

/// Send `Start` and a terminal `Error` for a job that never ran
fn publish_failure(relay: &mut ProgressRelay, error: &Error) {
    let mut sequencer = EventSequencer::new();
    for event in sequencer.admit(ProgressEvent::Error {
        message: error.to_string(),
    }) {
        relay.send(event);
    }
}
