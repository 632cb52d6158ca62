//! Optional HNSW acceleration for semantic memory search (`vector-search`
//! feature). Without it, [`super::SemanticMemory`] falls back to brute-force
//! cosine similarity over stored embeddings, which is what this index
//! accelerates; both paths return identically-shaped results.

use std::collections::HashMap;

use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use super::embedding::EMBEDDING_DIM;

/// A small wrapper around a USearch HNSW index keyed by memory id.
pub struct VectorIndex {
    index: Index,
    key_to_id: HashMap<String, u64>,
    next_id: u64,
}

impl VectorIndex {
    pub fn new() -> Result<Self, usearch::Error> {
        let options = IndexOptions {
            dimensions: EMBEDDING_DIM,
            metric: MetricKind::Cos,
            quantization: ScalarKind::F32,
            connectivity: 16,
            expansion_add: 128,
            expansion_search: 64,
            multi: false,
        };
        let index = Index::new(&options)?;
        index.reserve(64)?;
        Ok(Self {
            index,
            key_to_id: HashMap::new(),
            next_id: 0,
        })
    }

    pub fn add(&mut self, key: &str, vector: &[f32]) -> Result<(), usearch::Error> {
        if self.index.size() >= self.index.capacity() {
            self.index.reserve(std::cmp::max(self.index.capacity() * 2, 16))?;
        }
        let id = self.next_id;
        self.next_id += 1;
        self.index.add(id, vector)?;
        self.key_to_id.insert(key.to_string(), id);
        Ok(())
    }

    pub fn search(&self, query: &[f32], limit: usize) -> Result<Vec<(String, f32)>, usearch::Error> {
        let matches = self.index.search(query, limit)?;
        let id_to_key: HashMap<u64, &String> =
            self.key_to_id.iter().map(|(k, v)| (*v, k)).collect();
        Ok(matches
            .keys
            .iter()
            .zip(matches.distances.iter())
            .filter_map(|(id, dist)| id_to_key.get(id).map(|k| ((*k).clone(), *dist)))
            .collect())
    }

    pub fn len(&self) -> usize {
        self.index.size()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
