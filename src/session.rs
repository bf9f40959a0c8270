//! SessionManager – owns the single live world connection.
//!
//! ## Lifecycle
//!
//! ```text
//! connect ──▶ Connecting ──spawn──▶ Spawned ──end──▶ (released)
//!    ▲                                 │
//!    └──── connect again: prior connection torn down, errors discarded
//! ```
//!
//! Every connection gets a fresh [`SessionId`]. Its events are tagged with
//! that id, and events from a replaced connection are dropped here, so the
//! controller only ever observes the latest connection.

use log::{debug, info, warn};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

use crate::error::WorldError;
use crate::event::{AgentEvent, SessionId, WorldEvent, WorldEventSink};
use crate::goal::{Navigator, PlayerDirectory};
use crate::intent::Utterance;
use crate::protocol::{Record, StatusLabel};
use crate::types::{
    AgentConfig, BootstrapConfig, ConnectionParams, ConnectionStatus, MovementProfile,
};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// A live session in the game world.
///
/// Doubles as the [`PlayerDirectory`] and [`Navigator`] for that session.
pub trait WorldConnection: PlayerDirectory + Navigator + Send {
    /// Username the connection is logged in as.
    fn username(&self) -> &str;
    fn chat(&mut self, message: &str) -> Result<(), WorldError>;
    /// Ask the server to end the session. Completion arrives later as
    /// [`WorldEvent::Disconnected`].
    fn quit(&mut self) -> Result<(), WorldError>;
    fn apply_skin(&mut self, skin: &str) -> Result<(), WorldError>;
}

/// Creates world connections. Errors here are synchronous creation
/// failures; everything later arrives through the event sink.
pub trait Connector: Send {
    fn connect(
        &mut self,
        params: &ConnectionParams,
        events: WorldEventSink,
    ) -> Result<Box<dyn WorldConnection>, WorldError>;
}

// ---------------------------------------------------------------------------
// Session state
// ---------------------------------------------------------------------------

struct ActiveSession {
    id: SessionId,
    params: ConnectionParams,
    status: ConnectionStatus,
    /// Latch: the one-time spawn bootstrap already ran for this connection.
    has_spawned: bool,
    bootstrap: Option<AbortHandle>,
    conn: Box<dyn WorldConnection>,
}

impl ActiveSession {
    fn cancel_bootstrap(&mut self) {
        if let Some(handle) = self.bootstrap.take() {
            handle.abort();
        }
    }
}

/// What a world event produced.
#[derive(Debug, Default)]
pub struct SessionUpdate {
    pub records: Vec<Record>,
    /// Chat from another player, to be run through the intent parser.
    pub utterance: Option<Utterance>,
    /// The live connection went away; the goal must fall back to Idle.
    pub connection_lost: bool,
}

// ---------------------------------------------------------------------------
// Manager
// ---------------------------------------------------------------------------

pub struct SessionManager<C> {
    connector: C,
    events: mpsc::UnboundedSender<AgentEvent>,
    profile: MovementProfile,
    bootstrap: BootstrapConfig,
    fallback_name: String,
    active: Option<ActiveSession>,
    next_id: u64,
}

impl<C: Connector> SessionManager<C> {
    pub fn new(
        config: &AgentConfig,
        connector: C,
        events: mpsc::UnboundedSender<AgentEvent>,
    ) -> Self {
        Self {
            connector,
            events,
            profile: config.movement.profile.clone(),
            bootstrap: config.bootstrap.clone(),
            fallback_name: config.agent_name.clone(),
            active: None,
            next_id: 0,
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn session_id(&self) -> Option<SessionId> {
        self.active.as_ref().map(|s| s.id)
    }

    pub fn status(&self) -> Option<ConnectionStatus> {
        self.active.as_ref().map(|s| s.status)
    }

    pub fn params(&self) -> Option<&ConnectionParams> {
        self.active.as_ref().map(|s| &s.params)
    }

    /// Name the agent answers to: the live username, else the configured name.
    pub fn agent_name(&self) -> &str {
        self.active
            .as_ref()
            .map(|s| s.conn.username())
            .unwrap_or(self.fallback_name.as_str())
    }

    pub fn connection_mut(&mut self) -> Option<&mut (dyn WorldConnection + 'static)> {
        match self.active.as_mut() {
            Some(session) => Some(session.conn.as_mut()),
            None => None,
        }
    }

    // -----------------------------------------------------------------------
    // Commands
    // -----------------------------------------------------------------------

    pub fn connect(&mut self, params: ConnectionParams) -> Vec<Record> {
        self.teardown();

        let mut records = vec![Record::info(format!(
            "Connecting to {}:{} as {}...",
            params.host, params.port, params.username
        ))];

        self.next_id += 1;
        let id = SessionId(self.next_id);
        let sink = WorldEventSink::new(id, self.events.clone());

        match self.connector.connect(&params, sink) {
            Ok(conn) => {
                info!(
                    "Session {} connecting to {}:{} as {} (auth={}, version={})",
                    id, params.host, params.port, params.username, params.auth, params.version
                );
                self.active = Some(ActiveSession {
                    id,
                    params,
                    status: ConnectionStatus::Connecting,
                    has_spawned: false,
                    bootstrap: None,
                    conn,
                });
            }
            Err(e) => {
                warn!("Session {} failed to connect: {}", id, e);
                records.push(Record::error(e.to_string()));
            }
        }

        records
    }

    /// Say `message` in-game. `Err(NotConnected)` when there is no connection.
    pub fn chat(&mut self, message: &str) -> Result<(), WorldError> {
        match self.active.as_mut() {
            Some(session) => session.conn.chat(message),
            None => Err(WorldError::NotConnected),
        }
    }

    /// Ask the live connection to end. Failures are logged, never reported.
    pub fn quit(&mut self) {
        let Some(session) = self.active.as_mut() else {
            return;
        };
        session.cancel_bootstrap();
        match session.conn.quit() {
            Ok(()) => info!("Session {} quitting", session.id),
            Err(e) => debug!("Ignoring quit failure for session {}: {}", session.id, e),
        }
    }

    /// Release the live connection without reporting anything.
    pub fn shutdown(&mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        let Some(mut session) = self.active.take() else {
            return;
        };
        session.cancel_bootstrap();
        // Teardown failures are never reported and never block the
        // replacement connection.
        if let Err(e) = session.conn.quit() {
            debug!("Ignoring teardown failure for session {}: {}", session.id, e);
        }
    }

    // -----------------------------------------------------------------------
    // World events
    // -----------------------------------------------------------------------

    pub fn on_world_event(&mut self, id: SessionId, event: WorldEvent) -> SessionUpdate {
        let mut update = SessionUpdate::default();

        let Some(session) = self.active.as_mut().filter(|s| s.id == id) else {
            debug!("Dropping {:?} from stale session {}", event, id);
            return update;
        };

        match event {
            WorldEvent::Spawned => {
                session.status = ConnectionStatus::Spawned;
                update.records.push(Record::status(StatusLabel::Spawned));
                update
                    .records
                    .push(Record::info("Bot has spawned in the world."));

                if !session.has_spawned {
                    session.has_spawned = true;
                    info!("Session {} spawned; running one-time bootstrap", id);
                    session.conn.set_movement_profile(&self.profile);
                    session.bootstrap = schedule_bootstrap(&self.bootstrap, &self.events, id);
                }
            }
            WorldEvent::Chat { username, message } => {
                if username == session.conn.username() {
                    return update;
                }
                update.records.push(Record::chat(&username, &message));
                update.utterance = Some(Utterance::chat(username, message));
            }
            WorldEvent::Error(message) => {
                warn!("Session {} error: {}", id, message);
                update.records.push(Record::error(message));
            }
            WorldEvent::Kicked(reason) => {
                warn!("Session {} kicked: {}", id, reason);
                update.records.push(Record::error(format!("Kicked: {}", reason)));
            }
            WorldEvent::Disconnected => {
                session.status = ConnectionStatus::Disconnected;
                session.cancel_bootstrap();
                info!("Session {} disconnected", id);
                self.active = None;
                update.records.push(Record::status(StatusLabel::Disconnected));
                update.connection_lost = true;
            }
        }

        update
    }

    /// Run the delayed cosmetic action, if `id` is still the live session.
    pub fn run_bootstrap(&mut self, id: SessionId) {
        let Some(session) = self.active.as_mut().filter(|s| s.id == id) else {
            return;
        };
        session.bootstrap = None;
        let Some(skin) = self.bootstrap.skin.as_deref() else {
            return;
        };
        match session.conn.apply_skin(skin) {
            Ok(()) => info!("Session {} applied skin '{}'", id, skin),
            Err(e) => warn!("Session {} could not apply skin '{}': {}", id, skin, e),
        }
    }
}

/// Spawn the grace-period timer. Nothing is scheduled without a skin.
fn schedule_bootstrap(
    config: &BootstrapConfig,
    events: &mpsc::UnboundedSender<AgentEvent>,
    id: SessionId,
) -> Option<AbortHandle> {
    config.skin.as_ref()?;
    let delay = config.grace_period();
    let tx = events.clone();
    let handle = tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = tx.send(AgentEvent::BootstrapDue(id));
    });
    Some(handle.abort_handle())
}
