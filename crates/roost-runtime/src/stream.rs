//! Lossy line reading for child output streams.
//!
//! A child process can emit non-UTF8 bytes on stdout/stderr, and
//! `BufReader::lines()` would terminate the reader on the first invalid
//! sequence. Lines here are read as bytes and decoded lossily so stream
//! watching survives arbitrary output.

use std::io;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::debug;

/// Byte-based line reader with lossy UTF-8 decoding.
///
/// `next_line` is cancellation-safe: a partially read line stays in the
/// internal buffer and the next call continues it, so the reader can sit
/// inside a `select!` arm.
pub struct LossyLines<R> {
    reader: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LossyLines<R> {
    pub fn new(inner: R) -> Self {
        Self {
            reader: BufReader::new(inner),
            buf: Vec::with_capacity(1024),
        }
    }

    /// Read the next line, without the trailing newline.
    ///
    /// Returns `Ok(None)` at end of stream. A final line without a
    /// terminating newline is still returned.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        let n = self.reader.read_until(b'\n', &mut self.buf).await?;
        if n == 0 && self.buf.is_empty() {
            return Ok(None);
        }

        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }

        let line = String::from_utf8_lossy(&self.buf).into_owned();
        self.buf.clear();
        Ok(Some(line))
    }
}

/// Keep draining a stream on a detached task, logging each line.
///
/// Used once the port is resolved: the announcement watcher hands the
/// readers off here so the child never blocks on a full pipe.
pub fn spawn_drain<R>(mut lines: LossyLines<R>, stream_name: &'static str)
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        loop {
            match lines.next_line().await {
                Ok(Some(text)) => debug!(stream = stream_name, "server {}: {}", stream_name, text),
                Ok(None) => break,
                Err(e) => {
                    debug!(stream = stream_name, error = %e, "drain exiting on read error");
                    break;
                }
            }
        }
        debug!(stream = stream_name, "output drain task exiting");
    });
}
