//! Job lifecycle signals

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// How a job's process ended
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum JobExit {
    /// The process exited on its own; `None` means it died from a signal
    Exited(Option<i32>),
    /// The wall-clock bound elapsed and the process was killed
    TimedOut,
    /// The job was cancelled and the process was killed
    Cancelled,
}

impl JobExit {
    /// Whether the process reported success
    pub fn success(self) -> bool {
        self == JobExit::Exited(Some(0))
    }
}

/// One signal from a running job
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum JobSignal {
    /// A line from standard output
    Output(String),
    /// A line from standard error
    ErrorOutput(String),
    /// The job is over; nothing follows
    Exit(JobExit),
}

/// Owner's side of a running job
///
/// Dropping the handle cancels the job.
#[derive(Debug)]
pub struct JobHandle {
    signals: mpsc::UnboundedReceiver<JobSignal>,
    cancel: CancellationToken,
    exited: bool,
}

impl JobHandle {
    /// Assemble a handle from a signal channel and the job's cancel token
    ///
    /// Whoever feeds `signals` must send [`JobSignal::Exit`] last and stop the
    /// job once `cancel` fires.
    pub fn from_parts(
        signals: mpsc::UnboundedReceiver<JobSignal>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            signals,
            cancel,
            exited: false,
        }
    }

    /// Next signal, or `None` once the exit signal has been delivered
    ///
    /// A feeder that vanishes without an exit signal is reported as
    /// `Exited(None)`.
    pub async fn next(&mut self) -> Option<JobSignal> {
        if self.exited {
            return None;
        }

        let signal = self
            .signals
            .recv()
            .await
            .unwrap_or(JobSignal::Exit(JobExit::Exited(None)));
        if matches!(signal, JobSignal::Exit(_)) {
            self.exited = true;
        }
        Some(signal)
    }

    /// Ask the job to stop; the exit signal follows once the process is gone
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether the exit signal has been delivered
    pub fn has_exited(&self) -> bool {
        self.exited
    }
}

impl Drop for JobHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
