//! `openclaw-nudge`: single-shot JSON bridge onto the proactive nudge
//! engine. Same stdin-request/stdout-response contract as `openclaw-kg`;
//! see that binary's module doc for the protocol shape.

use std::io;
use std::path::PathBuf;

use clap::Parser;
use openclaw_core::nudge::{NudgeConfig, NudgeEngine};
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use openclaw_dispatch::nudge_commands;

#[derive(Parser)]
#[command(name = "openclaw-nudge", about = "Single-shot JSON bridge onto the proactive nudge engine")]
struct Args {
    /// Path to the knowledge graph's SQLite file (nudges are derived, not
    /// stored separately).
    #[arg(long)]
    data_dir: PathBuf,

    /// JSON object of config overrides, deep-merged over the defaults.
    #[arg(long)]
    config: Option<String>,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    let config = match args.config {
        Some(raw) => match serde_json::from_str(&raw)
            .map_err(|e| e.to_string())
            .and_then(|overrides| NudgeConfig::with_overrides(&overrides).map_err(|e| e.to_string()))
        {
            Ok(config) => config,
            Err(e) => {
                error!("invalid --config argument: {e}");
                std::process::exit(1);
            }
        },
        None => NudgeConfig::default(),
    };

    let db_path = args.data_dir.join("kg.sqlite3");
    let engine = match NudgeEngine::open(&db_path, config) {
        Ok(engine) => engine,
        Err(e) => {
            error!("failed to open knowledge graph at {}: {e}", db_path.display());
            std::process::exit(1);
        }
    };
    info!("nudge engine opened against {}", db_path.display());

    let dispatcher = nudge_commands::build(engine);
    if let Err(e) = dispatcher.run(&mut io::stdin(), &mut io::stdout()) {
        error!("dispatcher I/O failure: {e}");
        std::process::exit(1);
    }
}
