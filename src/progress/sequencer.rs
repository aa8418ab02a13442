//! Per-job event ordering rules

use crate::types::ProgressEvent;

/// Gatekeeper between raw parsed events and a job's published stream
///
/// Guarantees, for everything passed through [`admit`](Self::admit):
/// - `Start` comes first (it is injected if a caller forgets it)
/// - progress percent never decreases; lower samples are discarded
/// - at most one `Processing`, and no `Progress` after it
/// - exactly one terminal event, and nothing after it
#[derive(Debug, Default)]
pub struct EventSequencer {
    started: bool,
    processing: bool,
    finished: bool,
    high_water: f64,
}

impl EventSequencer {
    /// Create a sequencer for a fresh job
    pub fn new() -> Self {
        Self::default()
    }

    /// Filter one event, returning what should actually be published
    ///
    /// The result is empty when the event is dropped and holds two events
    /// when a missing `Start` has to be injected first.
    pub fn admit(&mut self, event: ProgressEvent) -> Vec<ProgressEvent> {
        if self.finished {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(2);
        if !self.started {
            self.started = true;
            out.push(ProgressEvent::Start);
            if matches!(event, ProgressEvent::Start) {
                return out;
            }
        }

        match event {
            ProgressEvent::Start => {}
            ProgressEvent::Progress { percent, .. } => {
                if !self.processing && percent >= self.high_water {
                    self.high_water = percent;
                    out.push(event);
                }
            }
            ProgressEvent::Processing { .. } => {
                if !self.processing {
                    self.processing = true;
                    out.push(event);
                }
            }
            ProgressEvent::Complete { .. } | ProgressEvent::Error { .. } => {
                self.finished = true;
                out.push(event);
            }
        }

        out
    }

    /// Whether a terminal event has been admitted
    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Quality, RetrievalRequest};

    fn progress(percent: f64) -> ProgressEvent {
        ProgressEvent::Progress {
            percent,
            downloaded_bytes: 0,
            total_bytes: 0,
        }
    }

    fn complete() -> ProgressEvent {
        let request = RetrievalRequest::new("https://youtu.be/x", Quality::Best, false).unwrap();
        ProgressEvent::Complete {
            file_size_bytes: 1,
            handle: request.handle(),
        }
    }

    #[test]
    fn start_is_injected_before_first_event() {
        let mut sequencer = EventSequencer::new();
        let out = sequencer.admit(progress(5.0));
        assert_eq!(out, vec![ProgressEvent::Start, progress(5.0)]);
    }

    #[test]
    fn explicit_start_is_published_once() {
        let mut sequencer = EventSequencer::new();
        assert_eq!(sequencer.admit(ProgressEvent::Start), vec![ProgressEvent::Start]);
        assert!(sequencer.admit(ProgressEvent::Start).is_empty());
    }

    #[test]
    fn lower_progress_samples_are_discarded() {
        let mut sequencer = EventSequencer::new();
        sequencer.admit(ProgressEvent::Start);
        assert_eq!(sequencer.admit(progress(40.0)).len(), 1);
        // second format starts over at 0%
        assert!(sequencer.admit(progress(3.0)).is_empty());
        assert_eq!(sequencer.admit(progress(40.0)).len(), 1);
        assert!(sequencer.admit(progress(39.9)).is_empty());
    }

    #[test]
    fn processing_is_published_once_and_ends_the_download_phase() {
        let mut sequencer = EventSequencer::new();
        sequencer.admit(ProgressEvent::Start);
        assert_eq!(sequencer.admit(progress(100.0)).len(), 1);
        assert_eq!(sequencer.admit(ProgressEvent::Processing { percent: 95.0 }).len(), 1);
        assert!(sequencer.admit(ProgressEvent::Processing { percent: 95.0 }).is_empty());
        // a second stream's samples after the merge started are not a new download
        assert!(sequencer.admit(progress(60.0)).is_empty());
        assert!(sequencer.admit(progress(100.0)).is_empty());
        assert_eq!(sequencer.admit(complete()).len(), 1);
    }

    #[test]
    fn nothing_passes_after_terminal_event() {
        let mut sequencer = EventSequencer::new();
        sequencer.admit(ProgressEvent::Start);
        assert_eq!(sequencer.admit(complete()).len(), 1);
        assert!(sequencer.is_finished());

        assert!(sequencer.admit(progress(100.0)).is_empty());
        assert!(
            sequencer
                .admit(ProgressEvent::Error {
                    message: "late".into()
                })
                .is_empty()
        );
        assert!(sequencer.admit(complete()).is_empty());
    }
}
