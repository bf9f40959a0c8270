//! craft-agent binary
//!
//! Reads commands from stdin and writes records to stdout, one JSON object
//! per line. Logs go to stderr so they never mix with protocol records.
//!
//! ## Configuration (CLI / env / file via `config` crate)
//!
//! | Key / flag                 | Default        | Description                        |
//! |----------------------------|----------------|------------------------------------|
//! | `--config`, `AGENT_CONFIG` | *(none)*       | Config file (TOML / JSON / YAML)   |
//! | `--agent-name`             | `YazukiBot`    | Name answered to while offline     |
//! | `--skin`                   | *(none)*       | Skin applied once after spawn      |
//! | `--log`, `AGENT_LOG`       | `craft_agent=info` | tracing env-filter directive   |
//! | `AGENT_*`                  |                | Any config key, `__` for nesting   |

use anyhow::Result;
use clap::Parser;
use craft_agent::{config, sandbox::SandboxWorld, Agent};
use std::path::PathBuf;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "craft-agent", about = "Craft Agent", version)]
struct Args {
    /// Configuration file
    #[arg(long, env = "AGENT_CONFIG")]
    config: Option<PathBuf>,

    /// Name the agent answers to before it is connected
    #[arg(long)]
    agent_name: Option<String>,

    /// Skin applied once after the first spawn
    #[arg(long)]
    skin: Option<String>,

    /// Log filter directive
    #[arg(long = "log", env = "AGENT_LOG", default_value = "craft_agent=info")]
    log_filter: String,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialise logging (stderr: stdout is the control channel)
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(args.log_filter.parse()?),
        )
        .init();

    let mut agent_config = config::load(args.config.as_deref())?;
    if let Some(name) = args.agent_name {
        agent_config.agent_name = name;
    }
    if let Some(skin) = args.skin {
        agent_config.bootstrap.skin = Some(skin);
    }

    tracing::info!(
        agent_name = %agent_config.agent_name,
        skin = ?agent_config.bootstrap.skin,
        "Starting craft-agent with sandbox backend"
    );

    let world = SandboxWorld::new();
    let agent = Agent::new(&agent_config, world.connector());

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    tokio::select! {
        result = agent.run(stdin, stdout) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("craft-agent shutting down (SIGINT)");
        }
    }

    Ok(())
}
