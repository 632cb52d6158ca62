//! `openclaw-kg`: single-shot JSON bridge onto the knowledge graph.
//!
//! Reads one `{command, args}` request from stdin, runs it against the
//! entity/relation store, writes one `{success, ...}` response to stdout,
//! and exits. stdout carries only that one line, all logging goes to
//! stderr so a caller piping stdout to `jq` never sees a stray line.

use std::io;
use std::path::PathBuf;

use clap::Parser;
use openclaw_core::kg::KnowledgeGraph;
use tracing::{error, info, Level};
use tracing_subscriber::EnvFilter;

use openclaw_dispatch::kg_commands;

#[derive(Parser)]
#[command(name = "openclaw-kg", about = "Single-shot JSON bridge onto the knowledge graph")]
struct Args {
    /// Path to the knowledge graph's SQLite file.
    #[arg(long)]
    data_dir: PathBuf,
}

fn main() {
    let args = Args::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .with_target(false)
        .with_ansi(false)
        .init();

    let db_path = args.data_dir.join("kg.sqlite3");
    let kg = match KnowledgeGraph::open(&db_path) {
        Ok(kg) => kg,
        Err(e) => {
            error!("failed to open knowledge graph at {}: {e}", db_path.display());
            std::process::exit(1);
        }
    };
    info!("knowledge graph opened at {}", db_path.display());

    let dispatcher = kg_commands::build(kg);
    if let Err(e) = dispatcher.run(&mut io::stdin(), &mut io::stdout()) {
        error!("dispatcher I/O failure: {e}");
        std::process::exit(1);
    }
}
