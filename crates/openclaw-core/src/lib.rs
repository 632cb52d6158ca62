//! # OpenClaw Core
//!
//! A personal knowledge graph, semantic memory store, and proactive nudge
//! engine, all backed by embedded SQLite.
//!
//! - **Knowledge Graph** ([`kg`]): typed entities and relations, with a
//!   90-day rolling changelog of every mutation.
//! - **Semantic Memory** ([`memory`]): content-addressed text memories with
//!   hybrid vector + full-text retrieval.
//! - **Nudge Engine** ([`nudge`]): deterministic rules over the graph and
//!   the wall clock: follow-ups, stale projects, travel prep, birthdays,
//!   relationship insights.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use openclaw_core::kg::{KnowledgeGraph, EntityType};
//!
//! let kg = KnowledgeGraph::open("kg.sqlite3")?;
//! let entity = kg.upsert_entity("Ada Lovelace", EntityType::Person, serde_json::Value::Null, None, 0.8)?;
//! ```
//!
//! ## Feature flags
//!
//! - `bundled-sqlite` (default): statically link SQLite rather than
//!   requiring a system library.
//! - `vector-search`: accelerate [`memory`] search with a USearch HNSW
//!   index instead of brute-force cosine similarity.

pub mod clock;
pub mod config;
pub mod error;
pub mod kg;
pub mod logging;
pub mod memory;
pub mod metrics;
pub mod nudge;
pub mod storage;

pub use error::{Error, Result};

/// Crate version, as published.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Convenient imports for common usage.
pub mod prelude {
    pub use crate::config::NudgeConfig;
    pub use crate::error::{Error, Result};
    pub use crate::kg::{Entity, EntityType, KnowledgeGraph, Relation};
    pub use crate::memory::{MemoryEntry, MemorySearchResult, SemanticMemory};
    pub use crate::nudge::{Nudge, NudgeEngine, NudgeKind};
}
