//! Chunk-to-line reassembly

/// Accumulates text chunks and hands out complete lines only
///
/// Both `\n` and `\r` terminate a line; the extraction tool redraws its
/// progress line with carriage returns unless asked for newlines. Whatever
/// follows the last terminator is kept until the next chunk or [`finish`].
///
/// [`finish`]: LineBuffer::finish
#[derive(Debug, Default)]
pub struct LineBuffer {
    tail: String,
}

impl LineBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and return every line it completed
    ///
    /// Empty lines are dropped.
    pub fn push(&mut self, chunk: &str) -> Vec<String> {
        self.tail.push_str(chunk);

        let Some(last_break) = self.tail.rfind(['\n', '\r']) else {
            return Vec::new();
        };

        let rest = self.tail.split_off(last_break + 1);
        let complete = std::mem::replace(&mut self.tail, rest);

        complete
            .split(['\n', '\r'])
            .filter(|line| !line.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Take the unterminated remainder at end of stream
    pub fn finish(&mut self) -> Option<String> {
        let tail = std::mem::take(&mut self.tail);
        if tail.trim().is_empty() { None } else { Some(tail) }
    }
}
