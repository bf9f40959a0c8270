//! Core agent types shared across all modules.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Basic math
// ---------------------------------------------------------------------------

/// World-space position of an entity (block units, fractional).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.2}, {:.2}, {:.2})", self.x, self.y, self.z)
    }
}

/// Integer block coordinate.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockPos {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPos {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for BlockPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} {}", self.x, self.y, self.z)
    }
}

// ---------------------------------------------------------------------------
// Players
// ---------------------------------------------------------------------------

/// A player currently visible to the agent.
///
/// Never cached: resolved again on every goal-affecting action.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerRef {
    pub username: String,
    pub position: Vec3,
}

impl PlayerRef {
    pub fn new(username: impl Into<String>, position: Vec3) -> Self {
        Self {
            username: username.into(),
            position,
        }
    }
}

// ---------------------------------------------------------------------------
// Connections
// ---------------------------------------------------------------------------

/// Authentication scheme handed to the connector. Names other than the
/// two well-known ones are passed through untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(from = "String", into = "String")]
pub enum AuthMode {
    #[default]
    Offline,
    Microsoft,
    Other(String),
}

impl From<String> for AuthMode {
    fn from(raw: String) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("offline") {
            AuthMode::Offline
        } else if trimmed.eq_ignore_ascii_case("microsoft") {
            AuthMode::Microsoft
        } else {
            AuthMode::Other(trimmed.to_string())
        }
    }
}

impl From<AuthMode> for String {
    fn from(mode: AuthMode) -> Self {
        mode.to_string()
    }
}

impl std::fmt::Display for AuthMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthMode::Offline => write!(f, "offline"),
            AuthMode::Microsoft => write!(f, "microsoft"),
            AuthMode::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Protocol version to negotiate. `Auto` lets the server decide.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum VersionSpec {
    #[default]
    Auto,
    Exact(String),
}

impl From<Option<String>> for VersionSpec {
    fn from(raw: Option<String>) -> Self {
        match raw {
            Some(v) if !v.trim().is_empty() && !v.trim().eq_ignore_ascii_case("auto") => {
                VersionSpec::Exact(v.trim().to_string())
            }
            _ => VersionSpec::Auto,
        }
    }
}

impl std::fmt::Display for VersionSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VersionSpec::Auto => write!(f, "auto"),
            VersionSpec::Exact(v) => write!(f, "{}", v),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub auth: AuthMode,
    pub version: VersionSpec,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connecting,
    Spawned,
    Disconnected,
}

// ---------------------------------------------------------------------------
// Navigation
// ---------------------------------------------------------------------------

/// Traversal rules handed to the Navigator once per connection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MovementProfile {
    /// Allow breaking blocks that are in the way.
    pub can_dig: bool,
    pub allow_sprinting: bool,
    pub allow_parkour: bool,
    /// Maximum number of blocks the agent may drop in one step.
    pub max_drop_down: u8,
}

impl Default for MovementProfile {
    fn default() -> Self {
        Self {
            can_dig: true,
            allow_sprinting: true,
            allow_parkour: true,
            max_drop_down: 4,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Phrase tables for the intent parser. Stored as written; the parser
/// normalizes them on construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PhraseConfig {
    /// Generic hail phrases that address the agent ("hey bot").
    pub hail: Vec<String>,
    pub approach: Vec<String>,
    pub halt: Vec<String>,
    /// Halt words that act even when the utterance is not directed.
    pub halt_bare: Vec<String>,
    pub follow: Vec<String>,
    /// Follow phrases that act even when the utterance is not directed.
    pub follow_bare: Vec<String>,
    pub goto_prefix: String,
}

fn phrases(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for PhraseConfig {
    fn default() -> Self {
        Self {
            hail: phrases(&["hey bot", "bot"]),
            approach: phrases(&["come here", "come to me", "over here"]),
            halt: phrases(&["stop", "halt", "stay", "wait"]),
            halt_bare: phrases(&["stop", "halt"]),
            follow: phrases(&["follow me", "follow"]),
            follow_bare: phrases(&["follow me", "follow"]),
            goto_prefix: "goto".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// How close `ApproachPoint` goals must get to the target.
    pub approach_radius: f64,
    /// Distance kept while following.
    pub follow_radius: f64,
    pub profile: MovementProfile,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            approach_radius: 1.0,
            follow_radius: 1.0,
            profile: MovementProfile::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Cosmetic skin applied once after the first spawn. `None` disables it.
    pub skin: Option<String>,
    /// Delay between the first spawn and the cosmetic action.
    pub grace_period_ms: u64,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            skin: None,
            grace_period_ms: 2000,
        }
    }
}

impl BootstrapConfig {
    pub fn grace_period(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.grace_period_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Name the agent answers to while no connection is live. Once
    /// connected, the connection's username is used instead.
    pub agent_name: String,
    pub phrases: PhraseConfig,
    pub movement: MovementConfig,
    pub bootstrap: BootstrapConfig,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            agent_name: "YazukiBot".into(),
            phrases: PhraseConfig::default(),
            movement: MovementConfig::default(),
            bootstrap: BootstrapConfig::default(),
        }
    }
}
