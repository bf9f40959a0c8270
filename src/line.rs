//! LineReader – bounded newline framing for the inbound control channel.
//!
//! A line longer than `max_line_len` is discarded up to and including its
//! newline, then reading carries on with the next line. The buffer never
//! grows much past the cap, however long the stray line is.

use bytes::BytesMut;
use log::warn;
use tokio::io::{AsyncRead, AsyncReadExt};

pub const DEFAULT_MAX_LINE_LEN: usize = 64 * 1024;

pub struct LineReader<R> {
    inner: R,
    buf: BytesMut,
    max_line_len: usize,
    /// Dropping the remainder of an oversized line.
    discarding: bool,
}

impl<R> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(8 * 1024),
            max_line_len: DEFAULT_MAX_LINE_LEN,
            discarding: false,
        }
    }

    pub fn max_line_len(mut self, max: usize) -> Self {
        self.max_line_len = max.max(1);
        self
    }
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Next line without its `\n` / `\r\n`, or `None` at EOF.
    ///
    /// Cancel safe: all partial state lives in `self`. A trailing line with
    /// no newline is still returned at EOF.
    pub async fn next_line(&mut self) -> std::io::Result<Option<String>> {
        loop {
            if let Some(i) = self.buf.iter().position(|b| *b == b'\n') {
                let raw = self.buf.split_to(i + 1);
                if self.discarding {
                    self.discarding = false;
                    continue;
                }
                if i > self.max_line_len {
                    warn!("Discarding control line of {} bytes", i);
                    continue;
                }
                return Ok(Some(decode(&raw)));
            }

            if self.buf.len() > self.max_line_len {
                if !self.discarding {
                    warn!(
                        "Discarding control line longer than {} bytes",
                        self.max_line_len
                    );
                }
                self.discarding = true;
                self.buf.clear();
            }

            let n = self.inner.read_buf(&mut self.buf).await?;
            if n == 0 {
                if self.buf.is_empty() || self.discarding {
                    self.buf.clear();
                    return Ok(None);
                }
                let raw = self.buf.split();
                return Ok(Some(decode(&raw)));
            }
        }
    }
}

fn decode(raw: &[u8]) -> String {
    let mut end = raw.len();
    if end > 0 && raw[end - 1] == b'\n' {
        end -= 1;
    }
    if end > 0 && raw[end - 1] == b'\r' {
        end -= 1;
    }
    String::from_utf8_lossy(&raw[..end]).into_owned()
}
