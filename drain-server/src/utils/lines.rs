use bytes::{Bytes, BytesMut};
use drain_statsd::metric;

use crate::statsd::ServerCounters;

/// Splits a streamed body into lines.
///
/// Chunks are appended with [`push`](Self::push) and complete lines are taken out with
/// [`next_line`](Self::next_line). Line breaks are `\n`, optionally preceded by `\r`, and are not
/// part of the returned lines.
///
/// Lines longer than the limit are skipped up to the next line break, so the buffer never holds
/// much more than `limit` bytes plus the last chunk.
#[derive(Debug)]
pub struct LineSplitter {
    buffer: BytesMut,
    // Bytes at the start of `buffer` known to contain no line break.
    scanned: usize,
    limit: usize,
    // Set while skipping the rest of an oversized line.
    discarding: bool,
}

impl LineSplitter {
    /// Creates an empty splitter for lines of at most `limit` bytes.
    pub fn new(limit: usize) -> Self {
        Self {
            buffer: BytesMut::new(),
            scanned: 0,
            limit,
            discarding: false,
        }
    }

    /// Appends a chunk of the body.
    pub fn push(&mut self, mut chunk: &[u8]) {
        if self.discarding {
            match chunk.iter().position(|&b| b == b'\n') {
                Some(offset) => {
                    self.discarding = false;
                    chunk = &chunk[offset + 1..];
                }
                None => return,
            }
        }

        self.buffer.extend_from_slice(chunk);
    }

    /// Takes the next complete line, if one has been received.
    pub fn next_line(&mut self) -> Option<Bytes> {
        loop {
            let offset = self.buffer[self.scanned..]
                .iter()
                .position(|&b| b == b'\n');

            let Some(offset) = offset else {
                self.scanned = self.buffer.len();
                if self.buffer.len() > self.limit {
                    self.skip_line();
                }
                return None;
            };

            let mut line = self.buffer.split_to(self.scanned + offset + 1);
            self.scanned = 0;

            line.truncate(line.len() - 1);
            if line.last() == Some(&b'\r') {
                line.truncate(line.len() - 1);
            }

            if line.len() > self.limit {
                oversized(line.len());
                continue;
            }

            return Some(line.freeze());
        }
    }

    /// Returns the last line if the body did not end with a line break.
    pub fn finish(mut self) -> Option<Bytes> {
        if self.discarding {
            return None;
        }

        if self.buffer.last() == Some(&b'\r') {
            self.buffer.truncate(self.buffer.len() - 1);
        }

        if self.buffer.len() > self.limit {
            oversized(self.buffer.len());
            return None;
        }

        match self.buffer.is_empty() {
            true => None,
            false => Some(self.buffer.freeze()),
        }
    }

    /// Drops the incomplete line in the buffer and everything up to its line break.
    fn skip_line(&mut self) {
        oversized(self.buffer.len());
        self.buffer.clear();
        self.scanned = 0;
        self.discarding = true;
    }
}

fn oversized(size: usize) {
    drain_log::debug!(size, "skipping oversized log line");
    metric!(counter(ServerCounters::LinesOversized) += 1);
}
