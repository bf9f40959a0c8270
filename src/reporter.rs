//! EventReporter – writes outbound records to the control channel.

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::protocol::Record;

/// Render `record` as one protocol line, without the trailing newline.
pub fn format_record(record: &Record) -> serde_json::Result<String> {
    serde_json::to_string(record)
}

/// One JSON object per line, flushed per record, in the order given.
pub struct EventReporter<W> {
    out: W,
}

impl<W: AsyncWrite + Unpin> EventReporter<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub async fn emit(&mut self, record: &Record) -> std::io::Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.out.write_all(&line).await?;
        self.out.flush().await
    }

    pub async fn emit_all(&mut self, records: &[Record]) -> std::io::Result<()> {
        for record in records {
            self.emit(record).await?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
