//! Craft Agent
//!
//! Drives one agent inside a multiplayer voxel world on behalf of a
//! controlling process that talks to it over line-delimited JSON.
//!
//! ## Architecture
//!
//! ```text
//! Agent  (agent.rs)                 ← single ordered event loop
//!   ├── LineReader     (line.rs)     ← control channel
//!   ├── EventReporter  (reporter.rs) → control channel
//!   └── CommandDispatcher  (dispatch.rs)
//!         ├── SessionManager  (session.rs) ← one live WorldConnection
//!         ├── IntentParser    (intent.rs)  ← chat / voice → Intent
//!         └── GoalController  (goal.rs)    ← Intent → MovementGoal → Navigator
//! ```
//!
//! The interpreter and goal state machine have no runtime dependencies.
//! Everything that owns a connection or the event loop requires the
//! `runtime` feature.

// Pure modules are always available (no runtime feature needed).
pub mod config;
pub mod error;
pub mod goal;
pub mod intent;
pub mod protocol;
pub mod types;

// Event loop and world plumbing require the `runtime` feature.
#[cfg(feature = "runtime")]
pub mod agent;
#[cfg(feature = "runtime")]
pub mod dispatch;
#[cfg(feature = "runtime")]
pub mod event;
#[cfg(feature = "runtime")]
pub mod line;
#[cfg(feature = "runtime")]
pub mod reporter;
#[cfg(feature = "runtime")]
pub mod sandbox;
#[cfg(feature = "runtime")]
pub mod session;

// Convenience re-exports (runtime only)
#[cfg(feature = "runtime")]
pub use agent::Agent;
#[cfg(feature = "runtime")]
pub use dispatch::CommandDispatcher;
#[cfg(feature = "runtime")]
pub use session::{Connector, SessionManager, WorldConnection};
pub use goal::{GoalController, MovementGoal, Navigator, PlayerDirectory};
pub use intent::{Channel, Intent, IntentParser, Utterance};
pub use protocol::{Command, Record, StatusLabel};
pub use types::{AgentConfig, BlockPos, PlayerRef, Vec3};
