//! Newline-delimited JSON parser for streamed generation responses.
//!
//! The backend replies with one JSON object per line, each carrying a text
//! fragment and a completion flag. Bytes arrive in arbitrary network chunks,
//! so lines are reassembled before decoding.

use serde::Deserialize;
use tracing::{debug, warn};

/// Maximum characters of a rejected line echoed into the log.
const LOG_SNIPPET_CHARS: usize = 200;

/// One decoded line of the stream. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
struct GenerationChunk {
    #[serde(default)]
    response: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    error: Option<String>,
}

/// Accumulates text fragments from a streamed generation response.
#[derive(Debug, Default)]
pub struct ResponseAccumulator {
    buffer: Vec<u8>,
    text: String,
    done: bool,
    skipped_lines: usize,
}

impl ResponseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of raw bytes.
    ///
    /// Returns `true` once a line with `done: true` has been consumed; any
    /// bytes after that line are discarded.
    pub fn push(&mut self, bytes: &[u8]) -> bool {
        if self.done {
            return true;
        }

        self.buffer.extend_from_slice(bytes);

        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.consume_line(&line[..line.len() - 1]);

            if self.done {
                self.buffer.clear();
                break;
            }
        }

        self.done
    }

    /// Whether the completion flag has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Number of lines rejected as malformed so far.
    pub fn skipped_lines(&self) -> usize {
        self.skipped_lines
    }

    /// Parse any trailing unterminated line and return the assembled text.
    pub fn finish(mut self) -> String {
        if !self.done && !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.consume_line(&rest);
        }
        self.text
    }

    fn consume_line(&mut self, raw: &[u8]) {
        let line = match std::str::from_utf8(raw) {
            Ok(line) => line.trim(),
            Err(e) => {
                warn!(error = %e, "skipping non-UTF-8 line in generation stream");
                self.skipped_lines += 1;
                return;
            }
        };

        // Keep-alive noise.
        if line.is_empty() {
            return;
        }

        match serde_json::from_str::<GenerationChunk>(line) {
            Ok(chunk) => {
                if let Some(error) = chunk.error {
                    warn!(%error, "generation backend reported an error");
                }
                self.text.push_str(&chunk.response);
                if chunk.done {
                    debug!(chars = self.text.len(), "completion flag received");
                    self.done = true;
                }
            }
            Err(e) => {
                let snippet: String = line.chars().take(LOG_SNIPPET_CHARS).collect();
                warn!(error = %e, line = %snippet, "skipping malformed line in generation stream");
                self.skipped_lines += 1;
            }
        }
    }
}
