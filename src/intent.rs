//! IntentParser – classifies chat and voice utterances into movement intents.
//!
//! Classification is an ordered rule table evaluated top to bottom; the
//! first rule that matches decides the intent and later rules are never
//! consulted.
//!
//! | Order | Rule     | Needs directedness            | Intent            |
//! |-------|----------|-------------------------------|-------------------|
//! | 1     | approach | never                         | `ComeHere`        |
//! | 2     | halt     | yes, unless bare halt word    | `StopMoving`      |
//! | 3     | follow   | yes, unless bare follow phrase| `FollowPlayer`    |
//! | 4     | goto     | never                         | `GotoCoordinate`  |
//!
//! Approach being actionable on ambient chat while halt/follow are not is
//! observed behaviour that controllers rely on. Keep it asymmetric.

use log::debug;

use crate::types::{BlockPos, PhraseConfig};

// ---------------------------------------------------------------------------
// Utterances
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    /// In-game chat. Directed only when it addresses the agent.
    Chat,
    /// Transcribed speech from the controller. Always directed.
    Voice,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    pub speaker: String,
    pub text: String,
    pub channel: Channel,
}

impl Utterance {
    pub fn chat(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            channel: Channel::Chat,
        }
    }

    pub fn voice(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            channel: Channel::Voice,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    ComeHere,
    StopMoving,
    FollowPlayer,
    GotoCoordinate(BlockPos),
    None,
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Lowercase, drop punctuation, collapse whitespace.
///
/// A `-` is kept when it starts a token and is followed by a digit so that
/// negative coordinates survive ("goto 10 64 -20"). A `.` between two
/// digits is kept too, so "1.5" stays a non-integer instead of becoming "15".
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut chars = lowered.chars().peekable();
    let mut at_token_start = true;

    while let Some(c) = chars.next() {
        if c.is_whitespace() {
            if !at_token_start {
                out.push(' ');
            }
            at_token_start = true;
        } else if c.is_alphanumeric() {
            out.push(c);
            at_token_start = false;
        } else if c == '-' && at_token_start && chars.peek().is_some_and(|n| n.is_ascii_digit())
        {
            out.push(c);
            at_token_start = false;
        } else if c == '.'
            && out.ends_with(|p: char| p.is_ascii_digit())
            && chars.peek().is_some_and(|n| n.is_ascii_digit())
        {
            out.push(c);
        }
    }

    out.trim_end().to_string()
}

/// Whole-word phrase containment on normalized text.
fn contains_phrase(text: &str, phrase: &str) -> bool {
    if phrase.is_empty() {
        return false;
    }
    format!(" {} ", text).contains(&format!(" {} ", phrase))
}

fn normalize_all(items: &[String]) -> Vec<String> {
    items
        .iter()
        .map(|s| normalize(s))
        .filter(|s| !s.is_empty())
        .collect()
}

// ---------------------------------------------------------------------------
// Rule table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Directedness {
    NotRequired,
    /// Directed utterances only, except an exact bare phrase.
    RequiredUnlessBare,
}

#[derive(Debug, Clone)]
enum Matcher {
    Phrases {
        any: Vec<String>,
        bare: Vec<String>,
        directedness: Directedness,
        intent: Intent,
    },
    /// `<prefix> <x> <y> <z>` with exactly three integer tokens.
    Coordinates { prefix: String },
}

#[derive(Debug, Clone)]
struct Rule {
    name: &'static str,
    matcher: Matcher,
}

impl Rule {
    fn evaluate(&self, text: &str, directed: bool) -> Option<Intent> {
        match &self.matcher {
            Matcher::Phrases {
                any,
                bare,
                directedness,
                intent,
            } => {
                if !any.iter().any(|p| contains_phrase(text, p)) {
                    return None;
                }
                let qualifies = match directedness {
                    Directedness::NotRequired => true,
                    Directedness::RequiredUnlessBare => {
                        directed || bare.iter().any(|b| b == text)
                    }
                };
                qualifies.then_some(*intent)
            }
            Matcher::Coordinates { prefix } => parse_coordinates(text, prefix),
        }
    }
}

fn parse_coordinates(text: &str, prefix: &str) -> Option<Intent> {
    let mut tokens = text.split_whitespace();
    if tokens.next()? != prefix {
        return None;
    }
    let args: Vec<&str> = tokens.collect();
    let [x, y, z] = args.as_slice() else {
        return None;
    };
    let pos = BlockPos::new(x.parse().ok()?, y.parse().ok()?, z.parse().ok()?);
    Some(Intent::GotoCoordinate(pos))
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct IntentParser {
    hail: Vec<String>,
    rules: Vec<Rule>,
}

impl IntentParser {
    pub fn new(config: &PhraseConfig) -> Self {
        let rules = vec![
            Rule {
                name: "approach",
                matcher: Matcher::Phrases {
                    any: normalize_all(&config.approach),
                    bare: Vec::new(),
                    directedness: Directedness::NotRequired,
                    intent: Intent::ComeHere,
                },
            },
            Rule {
                name: "halt",
                matcher: Matcher::Phrases {
                    any: normalize_all(&config.halt),
                    bare: normalize_all(&config.halt_bare),
                    directedness: Directedness::RequiredUnlessBare,
                    intent: Intent::StopMoving,
                },
            },
            Rule {
                name: "follow",
                matcher: Matcher::Phrases {
                    any: normalize_all(&config.follow),
                    bare: normalize_all(&config.follow_bare),
                    directedness: Directedness::RequiredUnlessBare,
                    intent: Intent::FollowPlayer,
                },
            },
            Rule {
                name: "goto",
                matcher: Matcher::Coordinates {
                    prefix: normalize(&config.goto_prefix),
                },
            },
        ];

        Self {
            hail: normalize_all(&config.hail),
            rules,
        }
    }

    /// Whether `text` (already normalized) is addressed to the agent.
    pub fn is_directed(&self, channel: Channel, text: &str, agent_name: &str) -> bool {
        if channel == Channel::Voice {
            return true;
        }
        let name = normalize(agent_name);
        contains_phrase(text, &name) || self.hail.iter().any(|h| contains_phrase(text, h))
    }

    pub fn parse(&self, utterance: &Utterance, agent_name: &str) -> Intent {
        let text = normalize(&utterance.text);
        if text.is_empty() {
            return Intent::None;
        }
        let directed = self.is_directed(utterance.channel, &text, agent_name);

        for rule in &self.rules {
            if let Some(intent) = rule.evaluate(&text, directed) {
                debug!(
                    "Utterance from {} matched rule '{}' (directed={}) -> {:?}",
                    utterance.speaker, rule.name, directed, intent
                );
                return intent;
            }
        }

        Intent::None
    }
}

impl Default for IntentParser {
    fn default() -> Self {
        Self::new(&PhraseConfig::default())
    }
}
