//! Supervised fifo reader.
//!
//! The outer loop is one writer session: open the fifo (blocking until a
//! writer shows up), read it to end of input, then open it again. The inner
//! loop reads one line at a time and hands it to the broadcast engine. A
//! failed open is retried after a fixed delay, forever.
//!
//! A line longer than [`MAX_LINE_BYTES`] is forwarded in pieces of at most
//! that size.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crate::gateway::BroadcastEngine;

/// Upper bound on the bytes buffered for a single line.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

pub struct ChannelReader {
    path: PathBuf,
    retry: Duration,
    engine: Arc<BroadcastEngine>,
}

impl ChannelReader {
    pub fn new(path: impl Into<PathBuf>, retry: Duration, engine: Arc<BroadcastEngine>) -> Self {
        Self {
            path: path.into(),
            retry,
            engine,
        }
    }

    /// Run the reader on its own OS thread.
    ///
    /// Opening a fifo blocks in the kernel until a writer appears, so this
    /// stays off the async runtime.
    pub fn spawn(self) -> io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("fifo-reader".to_string())
            .spawn(move || self.run())
    }

    fn run(self) {
        tracing::info!(path = %self.path.display(), "fifo reader started");
        loop {
            match File::open(&self.path) {
                Ok(file) => {
                    tracing::info!(path = %self.path.display(), "fifo opened");
                    let lines = self.read_session(BufReader::new(file));
                    tracing::debug!(lines, "fifo writer closed, reopening");
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %self.path.display(),
                        retry_secs = self.retry.as_secs_f64(),
                        "failed to open fifo"
                    );
                    thread::sleep(self.retry);
                }
            }
        }
    }

    /// Broadcast every line until end of input or a read error.
    ///
    /// Returns the number of lines forwarded.
    fn read_session<R: BufRead>(&self, mut reader: R) -> usize {
        let mut buf = Vec::new();
        let mut forwarded = 0;

        loop {
            buf.clear();
            match reader.by_ref().take(MAX_LINE_BYTES as u64).read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let text = String::from_utf8_lossy(&buf);
                    let line = text.trim_end();
                    tracing::info!(message = %line, "message from fifo");
                    self.engine.relay_line(line);
                    forwarded += 1;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!(error = %e, "fifo read error, reopening");
                    break;
                }
            }
        }

        forwarded
    }
}
