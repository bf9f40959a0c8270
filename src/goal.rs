//! GoalController – the movement-goal state machine.
//!
//! ```text
//!            ┌──────────── Halt ─────────────┐
//!            ▼                               │
//!          Idle ◀──▶ ApproachPoint ◀──▶ GotoBlock ◀──▶ FollowEntity
//! ```
//!
//! Every transition is direct and any state may move to any other. There
//! is no queue: a new goal always preempts the active one, and the
//! Navigator is left to abandon the old motion.

use log::debug;

use crate::intent::Intent;
use crate::types::{BlockPos, MovementConfig, MovementProfile, PlayerRef, Vec3};

// ---------------------------------------------------------------------------
// Collaborators
// ---------------------------------------------------------------------------

/// Live player list of the world connection.
pub trait PlayerDirectory {
    /// `None` means "not visible right now", never an error.
    fn resolve(&self, username: &str) -> Option<PlayerRef>;
}

/// External path search and movement execution.
pub trait Navigator {
    fn set_movement_profile(&mut self, profile: &MovementProfile);
    /// Install `goal`, replacing any prior one. `None` clears it.
    fn set_goal(&mut self, goal: Option<&MovementGoal>, continuous: bool);
}

// ---------------------------------------------------------------------------
// Goals
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum MovementGoal {
    Idle,
    ApproachPoint {
        position: Vec3,
        radius: f64,
    },
    GotoBlock(BlockPos),
    /// Re-evaluated by the Navigator against the target's live position
    /// when `continuous` is set.
    FollowEntity {
        target: PlayerRef,
        radius: f64,
        continuous: bool,
    },
}

impl MovementGoal {
    pub fn is_idle(&self) -> bool {
        matches!(self, MovementGoal::Idle)
    }

    pub fn is_continuous(&self) -> bool {
        matches!(
            self,
            MovementGoal::FollowEntity {
                continuous: true,
                ..
            }
        )
    }
}

/// A goal-affecting request, from either an utterance or a controller command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GoalRequest {
    Approach { target: String },
    Halt,
    Follow { target: String },
    Goto(BlockPos),
}

impl GoalRequest {
    /// Map a classified intent to a request on behalf of `speaker`.
    pub fn from_intent(intent: Intent, speaker: &str) -> Option<Self> {
        match intent {
            Intent::ComeHere => Some(GoalRequest::Approach {
                target: speaker.to_string(),
            }),
            Intent::StopMoving => Some(GoalRequest::Halt),
            Intent::FollowPlayer => Some(GoalRequest::Follow {
                target: speaker.to_string(),
            }),
            Intent::GotoCoordinate(pos) => Some(GoalRequest::Goto(pos)),
            Intent::None => None,
        }
    }
}

/// Where a request came from. Decides how feedback is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Chat or voice utterance: feedback is said in-game.
    Spoken,
    /// Structured controller command: feedback is an `info` record.
    Controller,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    Chat(String),
    Info(String),
}

impl Feedback {
    fn for_origin(origin: Origin, spoken: &str, controller: String) -> Self {
        match origin {
            Origin::Spoken => Feedback::Chat(spoken.to_string()),
            Origin::Controller => Feedback::Info(controller),
        }
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

pub struct GoalController {
    goal: MovementGoal,
    approach_radius: f64,
    follow_radius: f64,
}

impl GoalController {
    pub fn new(config: &MovementConfig) -> Self {
        Self {
            goal: MovementGoal::Idle,
            approach_radius: config.approach_radius,
            follow_radius: config.follow_radius,
        }
    }

    pub fn goal(&self) -> &MovementGoal {
        &self.goal
    }

    /// Drop to Idle without touching any Navigator (the connection is gone).
    pub fn reset(&mut self) {
        if !self.goal.is_idle() {
            debug!("Goal reset to Idle (connection lost)");
        }
        self.goal = MovementGoal::Idle;
    }

    /// Apply `request`. `world` is `None` while no connection is live:
    /// targets then resolve as not visible and nothing reaches a Navigator.
    pub fn apply<W>(
        &mut self,
        request: GoalRequest,
        origin: Origin,
        mut world: Option<&mut W>,
    ) -> Vec<Feedback>
    where
        W: PlayerDirectory + Navigator + ?Sized,
    {
        match request {
            GoalRequest::Approach { target } => {
                let Some(player) = world.as_deref().and_then(|w| w.resolve(&target)) else {
                    return vec![not_visible(origin, &target)];
                };
                let goal = MovementGoal::ApproachPoint {
                    position: player.position,
                    radius: self.approach_radius,
                };
                self.install(goal, world.as_deref_mut());
                vec![Feedback::for_origin(
                    origin,
                    "Coming!",
                    format!("Approaching {} at {}", player.username, player.position),
                )]
            }
            GoalRequest::Halt => {
                self.install(MovementGoal::Idle, world.as_deref_mut());
                vec![Feedback::for_origin(
                    origin,
                    "Stopping.",
                    "Stopped moving".to_string(),
                )]
            }
            GoalRequest::Follow { target } => {
                let Some(player) = world.as_deref().and_then(|w| w.resolve(&target)) else {
                    return vec![not_visible(origin, &target)];
                };
                let username = player.username.clone();
                let goal = MovementGoal::FollowEntity {
                    target: player,
                    radius: self.follow_radius,
                    continuous: true,
                };
                self.install(goal, world.as_deref_mut());
                vec![Feedback::for_origin(
                    origin,
                    "Following you!",
                    format!("Following {}", username),
                )]
            }
            GoalRequest::Goto(pos) => {
                self.install(MovementGoal::GotoBlock(pos), world.as_deref_mut());
                let message = format!("Going to {}", pos);
                vec![Feedback::for_origin(origin, &message, message.clone())]
            }
        }
    }

    fn install<W>(&mut self, goal: MovementGoal, world: Option<&mut W>)
    where
        W: Navigator + ?Sized,
    {
        debug!("Goal {:?} -> {:?}", self.goal, goal);
        if let Some(nav) = world {
            if goal.is_idle() {
                nav.set_goal(None, false);
            } else {
                nav.set_goal(Some(&goal), goal.is_continuous());
            }
        }
        self.goal = goal;
    }
}

fn not_visible(origin: Origin, target: &str) -> Feedback {
    Feedback::for_origin(origin, "I can't see you!", format!("Cannot see {}", target))
}
