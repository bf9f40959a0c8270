//! Events delivered onto the agent's single ordered processing queue.

use tokio::sync::mpsc;

/// Identifies one connection lifetime. Events carrying an older id than the
/// live session are stale and dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(pub u64);

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Something that happened inside a world connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldEvent {
    /// May fire more than once per connection (respawn, dimension change).
    Spawned,
    Chat { username: String, message: String },
    Error(String),
    Kicked(String),
    Disconnected,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentEvent {
    /// One raw line from the control channel.
    Control(String),
    World {
        session: SessionId,
        event: WorldEvent,
    },
    /// The post-spawn grace period of `session` elapsed.
    BootstrapDue(SessionId),
}

/// Handle a world connection uses to push its events onto the agent queue.
#[derive(Debug, Clone)]
pub struct WorldEventSink {
    session: SessionId,
    tx: mpsc::UnboundedSender<AgentEvent>,
}

impl WorldEventSink {
    pub fn new(session: SessionId, tx: mpsc::UnboundedSender<AgentEvent>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn emit(&self, event: WorldEvent) {
        // The receiver only goes away when the agent is shutting down.
        let _ = self.tx.send(AgentEvent::World {
            session: self.session,
            event,
        });
    }
}
