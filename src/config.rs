//! Layered agent configuration.
//!
//! Sources, lowest precedence first:
//!
//! 1. [`AgentConfig::default`]
//! 2. optional config file (TOML, JSON or YAML, picked by extension)
//! 3. environment variables prefixed `AGENT_`, `__` between nested keys
//!    (`AGENT_BOOTSTRAP__SKIN=steve`)

use std::path::Path;

use config::{Config, Environment, File};

use crate::error::ConfigError;
use crate::types::AgentConfig;

pub const ENV_PREFIX: &str = "AGENT";

pub fn load(path: Option<&Path>) -> Result<AgentConfig, ConfigError> {
    let mut builder = Config::builder();

    if let Some(path) = path {
        builder = builder.add_source(File::from(path).required(true));
    }

    let settings = builder
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("phrases.hail")
                .with_list_parse_key("phrases.approach")
                .with_list_parse_key("phrases.halt")
                .with_list_parse_key("phrases.halt_bare")
                .with_list_parse_key("phrases.follow")
                .with_list_parse_key("phrases.follow_bare")
                .try_parsing(true),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}
