//! CommandDispatcher – routes every queued event to the owning component.
//!
//! ## Routing
//!
//! | Source                  | Handler                                        |
//! |-------------------------|------------------------------------------------|
//! | `connect`, `chat`, `quit` | [`SessionManager`]                           |
//! | `follow`, `come`, `stop`  | [`GoalController`] (origin: controller)      |
//! | `voice`                 | [`IntentParser`] (voice) → [`GoalController`]  |
//! | world chat              | [`IntentParser`] (chat) → [`GoalController`]   |
//! | other world events      | [`SessionManager`]                             |
//!
//! The dispatcher owns all agent state, so independent instances never
//! share anything.

use log::{debug, warn};
use tokio::sync::mpsc;

use crate::error::WorldError;
use crate::event::{AgentEvent, SessionId, WorldEvent};
use crate::goal::{Feedback, GoalController, GoalRequest, MovementGoal, Origin};
use crate::intent::{IntentParser, Utterance};
use crate::protocol::{Command, Record};
use crate::session::{Connector, SessionManager};
use crate::types::{AgentConfig, ConnectionStatus};

/// Decode one control line.
///
/// Callers drop the line on `Err`: malformed JSON and unknown command tags
/// produce no output and touch no state.
pub fn parse_command(line: &str) -> Result<Command, serde_json::Error> {
    serde_json::from_str(line.trim())
}

pub struct CommandDispatcher<C> {
    sessions: SessionManager<C>,
    goals: GoalController,
    parser: IntentParser,
}

impl<C: Connector> CommandDispatcher<C> {
    pub fn new(
        config: &AgentConfig,
        connector: C,
        events: mpsc::UnboundedSender<AgentEvent>,
    ) -> Self {
        Self {
            sessions: SessionManager::new(config, connector, events),
            goals: GoalController::new(&config.movement),
            parser: IntentParser::new(&config.phrases),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn goal(&self) -> &MovementGoal {
        self.goals.goal()
    }

    pub fn connection_status(&self) -> Option<ConnectionStatus> {
        self.sessions.status()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.sessions.session_id()
    }

    // -----------------------------------------------------------------------
    // Entry points
    // -----------------------------------------------------------------------

    /// Handle one queued event to completion.
    pub fn handle(&mut self, event: AgentEvent) -> Vec<Record> {
        match event {
            AgentEvent::Control(line) => self.handle_line(&line),
            AgentEvent::World { session, event } => self.handle_world(session, event),
            AgentEvent::BootstrapDue(session) => {
                self.sessions.run_bootstrap(session);
                Vec::new()
            }
        }
    }

    pub fn handle_line(&mut self, line: &str) -> Vec<Record> {
        match parse_command(line) {
            Ok(command) => self.dispatch(command),
            // Dropped silently; never reported.
            Err(e) => {
                debug!("Dropping control line: {}", e);
                Vec::new()
            }
        }
    }

    pub fn dispatch(&mut self, command: Command) -> Vec<Record> {
        debug!("Dispatching {:?}", command);
        match command {
            Command::Connect { options } => {
                self.goals.reset();
                self.sessions.connect(options.into())
            }
            Command::Chat { message } => {
                // Forwarding failures are absorbed like any other control-line failure.
                if let Err(e) = self.sessions.chat(&message) {
                    debug!("Ignoring chat forward failure: {}", e);
                }
                Vec::new()
            }
            Command::Quit => {
                self.sessions.quit();
                self.goals.reset();
                Vec::new()
            }
            Command::Follow { username } => {
                self.request(GoalRequest::Follow { target: username }, Origin::Controller)
            }
            Command::Come { username } => {
                self.request(GoalRequest::Approach { target: username }, Origin::Controller)
            }
            Command::Stop => self.request(GoalRequest::Halt, Origin::Controller),
            Command::Voice { username, text } => self.hear(Utterance::voice(username, text)),
        }
    }

    /// Release the live connection before the process exits.
    pub fn shutdown(&mut self) {
        self.sessions.shutdown();
        self.goals.reset();
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn handle_world(&mut self, session: SessionId, event: WorldEvent) -> Vec<Record> {
        let update = self.sessions.on_world_event(session, event);
        let mut records = update.records;

        if update.connection_lost {
            self.goals.reset();
        }
        if let Some(utterance) = update.utterance {
            records.extend(self.hear(utterance));
        }

        records
    }

    fn hear(&mut self, utterance: Utterance) -> Vec<Record> {
        let intent = self.parser.parse(&utterance, self.sessions.agent_name());
        match GoalRequest::from_intent(intent, &utterance.speaker) {
            Some(request) => self.request(request, Origin::Spoken),
            None => Vec::new(),
        }
    }

    fn request(&mut self, request: GoalRequest, origin: Origin) -> Vec<Record> {
        let feedback = self
            .goals
            .apply(request, origin, self.sessions.connection_mut());
        self.deliver(feedback)
    }

    /// Chat feedback is said in-game; without a connection it degrades to
    /// an `info` record. A failed send on a live connection is only logged.
    fn deliver(&mut self, feedback: Vec<Feedback>) -> Vec<Record> {
        let mut records = Vec::new();
        for item in feedback {
            match item {
                Feedback::Info(message) => records.push(Record::info(message)),
                Feedback::Chat(message) => match self.sessions.chat(&message) {
                    Ok(()) => {}
                    Err(WorldError::NotConnected) => records.push(Record::info(message)),
                    Err(e) => warn!("Could not say '{}': {}", message, e),
                },
            }
        }
        records
    }
}
