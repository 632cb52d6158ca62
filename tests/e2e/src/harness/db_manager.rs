//! Test environment harness.
//!
//! Provides an isolated, temp-directory-backed knowledge graph and
//! semantic memory store for end-to-end tests, so tests never share
//! on-disk state with each other.

use std::path::PathBuf;

use openclaw_core::kg::KnowledgeGraph;
use openclaw_core::memory::SemanticMemory;
use openclaw_core::nudge::{NudgeConfig, NudgeEngine};
use tempfile::TempDir;

/// Owns a temp directory plus one knowledge graph, one semantic memory
/// store, and one nudge engine, all pointed at files inside it. Dropping
/// this struct deletes the directory.
pub struct TestEnv {
    pub kg: KnowledgeGraph,
    pub memory: SemanticMemory,
    _temp_dir: TempDir,
    kg_path: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp directory");
        let kg_path = temp_dir.path().join("kg.sqlite3");
        let memory_path = temp_dir.path().join("memory.sqlite3");

        let kg = KnowledgeGraph::open(&kg_path).expect("failed to open test knowledge graph");
        let memory = SemanticMemory::open(&memory_path).expect("failed to open test memory store");

        Self {
            kg,
            memory,
            _temp_dir: temp_dir,
            kg_path,
        }
    }

    /// A nudge engine pointed at the same knowledge graph, with the given
    /// config overrides deep-merged over the defaults.
    pub fn nudge_engine(&self, config: NudgeConfig) -> NudgeEngine {
        NudgeEngine::open(&self.kg_path, config).expect("failed to open test nudge engine")
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_env_has_empty_graph_and_memory() {
        let env = TestEnv::new();
        let stats = env.kg.stats().unwrap();
        assert_eq!(stats.total_entities, 0);
        assert_eq!(stats.total_relations, 0);
    }
}
