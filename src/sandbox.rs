//! Sandbox backend – an in-process world.
//!
//! Stands in for a real game server: a shared [`SandboxWorld`] holds the
//! visible player table and records everything the agent does (chat lines,
//! navigator calls, skins). Every connection spawns immediately and echoes
//! its own chat back as a chat event, like a real server does.

use log::debug;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::WorldError;
use crate::event::{WorldEvent, WorldEventSink};
use crate::goal::{MovementGoal, Navigator, PlayerDirectory};
use crate::session::{Connector, WorldConnection};
use crate::types::{ConnectionParams, MovementProfile, PlayerRef, Vec3};

// ---------------------------------------------------------------------------
// Shared world state
// ---------------------------------------------------------------------------

/// One `Navigator::set_goal` call.
#[derive(Debug, Clone, PartialEq)]
pub struct GoalCall {
    pub goal: Option<MovementGoal>,
    pub continuous: bool,
}

#[derive(Default)]
struct SandboxState {
    players: HashMap<String, Vec3>,
    said: Vec<String>,
    goal_calls: Vec<GoalCall>,
    profile: Option<MovementProfile>,
    skins: Vec<String>,
    connects: Vec<ConnectionParams>,
    quits: usize,
    refuse_connect: Option<String>,
    fail_quit: bool,
    /// Sink of the most recent connection.
    sink: Option<WorldEventSink>,
}

/// Cloneable handle on the sandbox world.
#[derive(Clone, Default)]
pub struct SandboxWorld {
    state: Arc<Mutex<SandboxState>>,
}

impl SandboxWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connector(&self) -> SandboxConnector {
        SandboxConnector {
            world: self.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Scripting
    // -----------------------------------------------------------------------

    pub fn add_player(&self, username: impl Into<String>, position: Vec3) {
        self.state.lock().players.insert(username.into(), position);
    }

    pub fn remove_player(&self, username: &str) {
        self.state.lock().players.remove(username);
    }

    /// Another player says `message` on the latest connection.
    pub fn say(&self, username: impl Into<String>, message: impl Into<String>) {
        self.emit(WorldEvent::Chat {
            username: username.into(),
            message: message.into(),
        });
    }

    /// Push an arbitrary event on the latest connection.
    pub fn emit(&self, event: WorldEvent) {
        let sink = self.state.lock().sink.clone();
        if let Some(sink) = sink {
            sink.emit(event);
        }
    }

    /// Make the next connect attempts fail with `reason` (`None` to clear).
    pub fn refuse_connections(&self, reason: Option<&str>) {
        self.state.lock().refuse_connect = reason.map(str::to_string);
    }

    pub fn fail_quits(&self, fail: bool) {
        self.state.lock().fail_quit = fail;
    }

    // -----------------------------------------------------------------------
    // Inspection
    // -----------------------------------------------------------------------

    /// Chat lines sent by the agent, oldest first.
    pub fn said(&self) -> Vec<String> {
        self.state.lock().said.clone()
    }

    pub fn goal_calls(&self) -> Vec<GoalCall> {
        self.state.lock().goal_calls.clone()
    }

    /// The goal currently installed on the navigator.
    pub fn active_goal(&self) -> Option<MovementGoal> {
        self.state
            .lock()
            .goal_calls
            .last()
            .and_then(|call| call.goal.clone())
    }

    pub fn profile(&self) -> Option<MovementProfile> {
        self.state.lock().profile.clone()
    }

    pub fn skins(&self) -> Vec<String> {
        self.state.lock().skins.clone()
    }

    pub fn connects(&self) -> Vec<ConnectionParams> {
        self.state.lock().connects.clone()
    }

    pub fn quits(&self) -> usize {
        self.state.lock().quits
    }
}

// ---------------------------------------------------------------------------
// Connector
// ---------------------------------------------------------------------------

pub struct SandboxConnector {
    world: SandboxWorld,
}

impl Connector for SandboxConnector {
    fn connect(
        &mut self,
        params: &ConnectionParams,
        events: WorldEventSink,
    ) -> Result<Box<dyn WorldConnection>, WorldError> {
        {
            let mut state = self.world.state.lock();
            if let Some(reason) = &state.refuse_connect {
                return Err(WorldError::Connect(reason.clone()));
            }
            state.connects.push(params.clone());
            state.sink = Some(events.clone());
        }

        debug!("Sandbox session {} joined as {}", events.session(), params.username);
        events.emit(WorldEvent::Spawned);

        Ok(Box::new(SandboxConnection {
            world: self.world.clone(),
            username: params.username.clone(),
            events,
            closed: false,
        }))
    }
}

// ---------------------------------------------------------------------------
// Connection
// ---------------------------------------------------------------------------

pub struct SandboxConnection {
    world: SandboxWorld,
    username: String,
    events: WorldEventSink,
    closed: bool,
}

impl PlayerDirectory for SandboxConnection {
    fn resolve(&self, username: &str) -> Option<PlayerRef> {
        if username == self.username {
            return None;
        }
        let state = self.world.state.lock();
        state
            .players
            .get(username)
            .map(|pos| PlayerRef::new(username, *pos))
    }
}

impl Navigator for SandboxConnection {
    fn set_movement_profile(&mut self, profile: &MovementProfile) {
        self.world.state.lock().profile = Some(profile.clone());
    }

    fn set_goal(&mut self, goal: Option<&MovementGoal>, continuous: bool) {
        self.world.state.lock().goal_calls.push(GoalCall {
            goal: goal.cloned(),
            continuous,
        });
    }
}

impl WorldConnection for SandboxConnection {
    fn username(&self) -> &str {
        &self.username
    }

    fn chat(&mut self, message: &str) -> Result<(), WorldError> {
        if self.closed {
            return Err(WorldError::Closed);
        }
        self.world.state.lock().said.push(message.to_string());
        self.events.emit(WorldEvent::Chat {
            username: self.username.clone(),
            message: message.to_string(),
        });
        Ok(())
    }

    fn quit(&mut self) -> Result<(), WorldError> {
        {
            let mut state = self.world.state.lock();
            if state.fail_quit {
                return Err(WorldError::Send("socket already gone".into()));
            }
            state.quits += 1;
        }
        if self.closed {
            return Err(WorldError::Closed);
        }
        self.closed = true;
        self.events.emit(WorldEvent::Disconnected);
        Ok(())
    }

    fn apply_skin(&mut self, skin: &str) -> Result<(), WorldError> {
        if self.closed {
            return Err(WorldError::Closed);
        }
        self.world.state.lock().skins.push(skin.to_string());
        Ok(())
    }
}
