//! Parser for extraction tool progress output

use super::line_buffer::LineBuffer;
use crate::size::find_sizes;
use crate::types::ProgressEvent;
use regex::Regex;
use std::sync::LazyLock;

/// Token that marks a download progress line
const PROGRESS_MARKER: &str = "[download]";

/// Tokens that mark the post-download phase
const PROCESSING_MARKERS: [&str; 4] = ["[Merger]", "[ffmpeg]", "[ExtractAudio]", "Merging"];

/// Percent reported for the post-download phase
const PROCESSING_PERCENT: f64 = 95.0;

#[allow(clippy::expect_used)]
static PERCENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+(?:\.\d+)?)%").expect("percent pattern should compile"));

/// Map one complete output line to at most one event
///
/// Lines that match nothing yield `None`; so do progress lines whose percent
/// cannot be read.
pub fn parse_line(line: &str) -> Option<ProgressEvent> {
    if line.contains(PROGRESS_MARKER) && line.contains('%') {
        return parse_progress(line);
    }

    if PROCESSING_MARKERS.iter().any(|marker| line.contains(marker)) {
        return Some(ProgressEvent::Processing {
            percent: PROCESSING_PERCENT,
        });
    }

    None
}

fn parse_progress(line: &str) -> Option<ProgressEvent> {
    let captures = PERCENT.captures(line)?;
    let percent: f64 = captures[1].parse().ok()?;
    let percent = if percent.is_finite() {
        percent.clamp(0.0, 100.0)
    } else {
        return None;
    };

    let sizes = find_sizes(line);
    let (downloaded_bytes, total_bytes) = match sizes.as_slice() {
        [downloaded, total, ..] => (*downloaded, *total),
        // "[download]  45.3% of ~12.34MiB at ..." names only the total
        [total] => ((*total as f64 * percent / 100.0).round() as u64, *total),
        [] => (0, 0),
    };

    Some(ProgressEvent::Progress {
        percent,
        downloaded_bytes,
        total_bytes,
    })
}

/// Line-oriented progress parser for one output stream
///
/// Only complete lines are matched; partial lines wait for the rest of their
/// text. The parser keeps no other state between chunks, so event ordering
/// rules live in [`EventSequencer`](super::EventSequencer).
#[derive(Debug, Default)]
pub struct ProgressLineParser {
    buffer: LineBuffer,
}

impl ProgressLineParser {
    /// Create a parser with an empty line buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of output and collect the events of every completed line
    ///
    /// Events come out in line order.
    pub fn feed(&mut self, chunk: &str) -> Vec<ProgressEvent> {
        self.buffer
            .push(chunk)
            .iter()
            .filter_map(|line| parse_line(line))
            .collect()
    }

    /// Feed one line the caller has already framed
    ///
    /// Any partial tail left by earlier chunks is flushed first.
    pub fn feed_line(&mut self, line: &str) -> Vec<ProgressEvent> {
        let mut events = self.finish();
        events.extend(self.feed(line));
        events.extend(self.finish());
        events
    }

    /// Flush the unterminated tail at end of stream
    pub fn finish(&mut self) -> Vec<ProgressEvent> {
        self.buffer
            .finish()
            .and_then(|line| parse_line(&line))
            .into_iter()
            .collect()
    }
}
