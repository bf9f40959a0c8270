//! Agent – the single ordered event loop.
//!
//! Control lines and world events are funnelled onto one sequence and
//! handled one at a time to completion, so the dispatcher needs no locks.
//! The only suspended work is the post-spawn grace timer, which re-enters
//! the queue as [`AgentEvent::BootstrapDue`].

use anyhow::{Context, Result};
use log::info;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;

use crate::dispatch::CommandDispatcher;
use crate::event::AgentEvent;
use crate::line::{LineReader, DEFAULT_MAX_LINE_LEN};
use crate::protocol::{Record, StatusLabel};
use crate::reporter::EventReporter;
use crate::session::Connector;
use crate::types::AgentConfig;

pub struct Agent<C> {
    dispatcher: CommandDispatcher<C>,
    events: mpsc::UnboundedReceiver<AgentEvent>,
    max_line_len: usize,
}

impl<C: Connector> Agent<C> {
    pub fn new(config: &AgentConfig, connector: C) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            dispatcher: CommandDispatcher::new(config, connector, tx),
            events: rx,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }

    /// Control lines longer than `max` bytes are dropped unread.
    pub fn max_line_len(mut self, max: usize) -> Self {
        self.max_line_len = max;
        self
    }

    /// Announce `Ready`, then process events until `input` reaches EOF.
    ///
    /// Pending world events are always handled before the next control
    /// line. On EOF the live connection is released.
    pub async fn run<R, W>(mut self, input: R, output: W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut reporter = EventReporter::new(output);
        reporter
            .emit(&Record::status(StatusLabel::Ready))
            .await
            .context("Failed to announce readiness")?;

        let mut lines = LineReader::new(input).max_line_len(self.max_line_len);

        loop {
            let event = tokio::select! {
                biased;
                Some(event) = self.events.recv() => event,
                line = lines.next_line() => {
                    match line.context("Failed to read control channel")? {
                        Some(line) => AgentEvent::Control(line),
                        None => break,
                    }
                }
            };

            let records = self.dispatcher.handle(event);
            reporter
                .emit_all(&records)
                .await
                .context("Failed to write control channel")?;
        }

        info!("Control channel closed; shutting down");
        self.dispatcher.shutdown();
        Ok(())
    }
}
