//! One run of the extraction tool for one request
//!
//! A [`Job`] owns everything the run touches: the process (through its
//! [`JobHandle`]), the parser and sequencer state, and every file under its
//! artifact stem. However the job ends, dropping it kills the process and
//! removes those files.

use crate::artifact::{ArtifactPath, ArtifactStore};
use crate::error::{Error, Result};
use crate::extractor::{Extractor, JobExit, JobHandle, JobSignal, RunMode};
use crate::progress::{EventSequencer, ProgressLineParser};
use crate::types::{ProgressEvent, RetrievalRequest};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::time::Duration;

/// Error output lines kept for failure details
const DIAGNOSTIC_LINES: usize = 20;

pub(crate) struct Job {
    handle: JobHandle,
    parser: ProgressLineParser,
    sequencer: EventSequencer,
    store: ArtifactStore,
    artifact: ArtifactPath,
    diagnostics: VecDeque<String>,
    timeout: Duration,
    released: bool,
}

impl Job {
    /// Allocate an artifact location and launch the tool for `request`
    pub(crate) async fn start(
        extractor: &dyn Extractor,
        store: &ArtifactStore,
        request: &RetrievalRequest,
        mode: RunMode,
        timeout: Duration,
    ) -> Result<Self> {
        store.ensure_dir().await?;
        let artifact = store.allocate(request.kind());

        let handle = extractor
            .start(request, &artifact.output_template(), mode, timeout)
            .await?;

        tracing::info!(
            job_id = artifact.stem(),
            url = request.url(),
            quality = %request.quality(),
            audio_only = request.audio_only(),
            ?mode,
            "job started"
        );

        Ok(Self {
            handle,
            parser: ProgressLineParser::new(),
            sequencer: EventSequencer::new(),
            store: store.clone(),
            artifact,
            diagnostics: VecDeque::with_capacity(DIAGNOSTIC_LINES),
            timeout,
            released: false,
        })
    }

    pub(crate) fn id(&self) -> &str {
        self.artifact.stem()
    }

    /// Next signal from the process; error output is remembered for diagnostics
    pub(crate) async fn next_signal(&mut self) -> Option<JobSignal> {
        let signal = self.handle.next().await?;
        if let JobSignal::ErrorOutput(ref line) = signal {
            if self.diagnostics.len() == DIAGNOSTIC_LINES {
                self.diagnostics.pop_front();
            }
            self.diagnostics.push_back(line.clone());
        }
        Some(signal)
    }

    /// Turn one output line into the events that may be published
    pub(crate) fn observe(&mut self, line: &str) -> Vec<ProgressEvent> {
        let parsed = self.parser.feed_line(line);
        parsed
            .into_iter()
            .flat_map(|event| self.sequencer.admit(event))
            .collect()
    }

    /// Pass an event the job itself produced through the ordering rules
    pub(crate) fn admit(&mut self, event: ProgressEvent) -> Vec<ProgressEvent> {
        self.sequencer.admit(event)
    }

    /// Ask the process to stop; its exit signal still follows
    pub(crate) fn cancel(&self) {
        self.handle.cancel();
    }

    /// Consume signals until the process is gone and report the result
    pub(crate) async fn run_to_exit(&mut self) -> Result<PathBuf> {
        while let Some(signal) = self.next_signal().await {
            if let JobSignal::Exit(exit) = signal {
                return self.outcome(exit).await;
            }
        }
        self.outcome(JobExit::Exited(None)).await
    }

    /// Map how the process ended to the artifact path or a failure
    ///
    /// A zero exit code with the expected file present is the only success.
    pub(crate) async fn outcome(&self, exit: JobExit) -> Result<PathBuf> {
        let result = match exit {
            JobExit::Exited(Some(0)) => {
                let path = self.artifact.final_path();
                if self.store.exists(&path).await {
                    Ok(path)
                } else {
                    Err(Error::ArtifactMissing { path })
                }
            }
            JobExit::Exited(code) => Err(Error::ExtractionFailed {
                code,
                detail: crate::extractor::diagnostic_summary(
                    self.diagnostics.iter().map(String::as_str),
                ),
            }),
            JobExit::TimedOut => Err(Error::Timeout {
                seconds: self.timeout.as_secs(),
            }),
            JobExit::Cancelled => Err(Error::Cancelled),
        };

        match &result {
            Ok(path) => tracing::info!(job_id = self.id(), ?path, "job succeeded"),
            Err(e) => tracing::warn!(job_id = self.id(), error = %e, "job failed"),
        }
        result
    }

    /// Stop the process if needed, wait for it, and remove the job's files
    pub(crate) async fn release(mut self) {
        if !self.handle.has_exited() {
            self.handle.cancel();
            while self.handle.next().await.is_some() {}
        }
        self.store.purge(&self.artifact).await;
        self.released = true;
    }
}

impl Drop for Job {
    fn drop(&mut self) {
        // the handle's own Drop cancels the process
        if !self.released {
            self.store.purge_blocking(&self.artifact);
        }
    }
}
