//! Progress extraction from tool output
//!
//! - [`LineBuffer`] turns arbitrary chunks into complete lines
//! - [`ProgressLineParser`] maps lines to [`ProgressEvent`](crate::types::ProgressEvent)s
//! - [`EventSequencer`] enforces the per-job event ordering rules

mod line_buffer;
mod parser;
mod sequencer;

pub use line_buffer::LineBuffer;
pub use parser::{ProgressLineParser, parse_line};
pub use sequencer::EventSequencer;
