//! Semantic Memory (C4): content-addressed text memories with hybrid
//! vector + full-text retrieval and graceful degradation when no vector
//! index is available.

mod embedding;
mod node;

#[cfg(feature = "vector-search")]
mod vector_index;

pub use node::MemoryEntry;

use std::collections::HashMap;
use std::path::Path;
#[cfg(feature = "vector-search")]
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::storage::{self, ConnectionPool};

/// Optional narrowing applied to a [`SemanticMemory::search`] call.
/// `min_score` defaults to 0, which keeps every result.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub session_id: Option<String>,
    pub memory_type: Option<String>,
    pub min_score: f32,
}

/// A memory returned from search, carrying the score that ranked it and
/// which retrieval path produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemorySearchResult {
    pub entry: MemoryEntry,
    pub score: f32,
    pub search_method: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryStats {
    pub total: i64,
    pub by_type: HashMap<String, i64>,
    pub unique_sessions: i64,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
    pub vector_search_available: bool,
}

/// The semantic memory store: one SQLite database, one connection pool, and
/// (when the `vector-search` feature is enabled) an in-process HNSW index
/// mirroring the embeddings already persisted in `memories.embedding`.
pub struct SemanticMemory {
    pool: ConnectionPool,
    #[cfg(feature = "vector-search")]
    index: Mutex<vector_index::VectorIndex>,
}

impl SemanticMemory {
    /// Open (creating and migrating if necessary) the memory database at
    /// `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let pool = storage::open_memory_pool(path)?;
        #[cfg(feature = "vector-search")]
        {
            let index = vector_index::VectorIndex::new()
                .map_err(|e| crate::error::Error::invalid_input(format!("vector index: {e}")))?;
            let memory = Self {
                pool,
                index: Mutex::new(index),
            };
            memory.rebuild_index()?;
            Ok(memory)
        }
        #[cfg(not(feature = "vector-search"))]
        {
            Ok(Self { pool })
        }
    }

    /// Whether vector-accelerated search is compiled into this build.
    pub fn vector_search_available(&self) -> bool {
        cfg!(feature = "vector-search")
    }

    #[cfg(feature = "vector-search")]
    fn rebuild_index(&self) -> Result<()> {
        self.pool.with_scope(|tx| {
            let mut stmt = tx.prepare(
                "SELECT id, embedding FROM memories WHERE embedding IS NOT NULL",
            )?;
            let rows = stmt.query_map([], |row| {
                let id: String = row.get(0)?;
                let blob: Vec<u8> = row.get(1)?;
                Ok((id, blob))
            })?;
            let mut index = self.index.lock().expect("vector index mutex poisoned");
            for row in rows {
                let (id, blob) = row?;
                let vector = embedding::from_bytes(&blob);
                let _ = index.add(&id, &vector);
            }
            Ok(())
        })
    }

    /// Store a new memory. The id is content-addressed
    /// (`sha256(text ++ now)[:16]`), so re-storing identical text at a
    /// different instant always yields a new row.
    pub fn store(
        &self,
        text: impl Into<String>,
        metadata: Value,
        session_id: Option<String>,
        memory_type: impl Into<String>,
    ) -> Result<MemoryEntry> {
        let mut entry = MemoryEntry::new(text, metadata, session_id, memory_type);
        let vector = embedding::embed(&entry.text);
        entry.embedding = Some(vector.clone());

        self.pool.with_scope(|tx| {
            tx.execute(
                "INSERT INTO memories (id, text, embedding, metadata, created_at, session_id, memory_type)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![
                    entry.id,
                    entry.text,
                    embedding::to_bytes(&vector),
                    entry.metadata.to_string(),
                    crate::clock::format_ts(entry.created_at),
                    entry.session_id,
                    entry.memory_type,
                ],
            )?;
            Ok(())
        })?;

        #[cfg(feature = "vector-search")]
        {
            let mut index = self.index.lock().expect("vector index mutex poisoned");
            let _ = index.add(&entry.id, &vector);
        }

        Ok(entry)
    }

    /// Hybrid search: vector similarity first (when available), falling
    /// back to FTS5 keyword matching. Results are always sorted by score,
    /// descending, truncated to `k`.
    pub fn search(&self, query: &str, k: usize, filters: SearchFilters) -> Result<Vec<MemorySearchResult>> {
        let mut results = self.vector_search(query, k * 2)?;
        if results.is_empty() {
            results = self.keyword_search(query, k * 2)?;
        }

        let filtered: Vec<MemorySearchResult> = results
            .into_iter()
            .filter(|r| {
                r.score >= filters.min_score
                    && filters
                        .session_id
                        .as_ref()
                        .is_none_or(|s| r.entry.session_id.as_deref() == Some(s.as_str()))
                    && filters
                        .memory_type
                        .as_ref()
                        .is_none_or(|t| r.entry.memory_type == *t)
            })
            .collect();

        let mut ranked = filtered;
        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        ranked.truncate(k);
        Ok(ranked)
    }

    fn vector_search(&self, query: &str, limit: usize) -> Result<Vec<MemorySearchResult>> {
        let query_vec = embedding::embed(query);

        #[cfg(feature = "vector-search")]
        {
            let index = self.index.lock().expect("vector index mutex poisoned");
            if index.is_empty() {
                return Ok(Vec::new());
            }
            let hits = index
                .search(&query_vec, limit)
                .map_err(|e| crate::error::Error::invalid_input(format!("vector search: {e}")))?;
            drop(index);
            let mut out = Vec::with_capacity(hits.len());
            for (id, distance) in hits {
                if let Some(entry) = self.get(&id)? {
                    out.push(MemorySearchResult {
                        entry,
                        score: 1.0 / (1.0 + distance),
                        search_method: "vector",
                    });
                }
            }
            return Ok(out);
        }

        #[cfg(not(feature = "vector-search"))]
        {
            self.pool.with_scope(|tx| {
                let mut stmt = tx.prepare("SELECT * FROM memories WHERE embedding IS NOT NULL")?;
                let rows = stmt.query_map([], row_to_entry)?;
                let mut scored = Vec::new();
                for row in rows {
                    let entry = row?;
                    if let Some(vector) = &entry.embedding {
                        let score = embedding::cosine_similarity(&query_vec, vector);
                        scored.push(MemorySearchResult { entry, score, search_method: "vector" });
                    }
                }
                scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
                scored.truncate(limit);
                Ok(scored)
            })
        }
    }

    fn keyword_search(&self, query: &str, limit: usize) -> Result<Vec<MemorySearchResult>> {
        let query_words: Vec<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(String::from)
            .collect();
        if query_words.is_empty() {
            return Ok(Vec::new());
        }

        self.pool.with_scope(|tx| {
            let mut stmt = tx.prepare(
                "SELECT m.* FROM memories m
                 JOIN memories_fts fts ON fts.rowid = m.rowid
                 WHERE memories_fts MATCH ?1
                 LIMIT ?2",
            )?;
            let sanitized = sanitize_match_query(query);
            let rows = stmt.query_map(params![sanitized, limit as i64], row_to_entry)?;
            let mut scored = Vec::new();
            for row in rows {
                let entry = row?;
                let text_words: std::collections::HashSet<String> = entry
                    .text
                    .to_lowercase()
                    .split_whitespace()
                    .map(String::from)
                    .collect();
                let overlap = query_words.iter().filter(|w| text_words.contains(*w)).count();
                let score = overlap as f32 / query_words.len() as f32;
                scored.push(MemorySearchResult { entry, score, search_method: "keyword" });
            }
            Ok(scored)
        })
    }

    /// Fetch a single memory by id.
    pub fn get(&self, id: &str) -> Result<Option<MemoryEntry>> {
        self.pool.with_scope(|tx| {
            tx.query_row("SELECT * FROM memories WHERE id = ?1", params![id], row_to_entry)
                .optional()
                .map_err(Into::into)
        })
    }

    /// Most recently created memories, newest first.
    pub fn get_recent(&self, limit: usize) -> Result<Vec<MemoryEntry>> {
        self.pool.with_scope(|tx| {
            let mut stmt =
                tx.prepare("SELECT * FROM memories ORDER BY created_at DESC LIMIT ?1")?;
            let rows = stmt.query_map(params![limit as i64], row_to_entry)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
        })
    }

    /// Memories for a session, oldest first (conversation order).
    pub fn get_by_session(&self, session_id: &str) -> Result<Vec<MemoryEntry>> {
        self.pool.with_scope(|tx| {
            let mut stmt =
                tx.prepare("SELECT * FROM memories WHERE session_id = ?1 ORDER BY created_at ASC")?;
            let rows = stmt.query_map(params![session_id], row_to_entry)?;
            rows.collect::<rusqlite::Result<Vec<_>>>().map_err(Into::into)
        })
    }

    /// Delete memories older than `days` days. Returns the number removed.
    pub fn delete_old(&self, days: i64) -> Result<usize> {
        self.pool.with_scope(|tx| {
            let cutoff = crate::clock::now() - chrono::Duration::days(days);
            let count = tx.execute(
                "DELETE FROM memories WHERE created_at < ?1",
                params![crate::clock::format_ts(cutoff)],
            )?;
            Ok(count)
        })
    }

    pub fn stats(&self) -> Result<MemoryStats> {
        self.pool.with_scope(|tx| {
            let total: i64 = tx.query_row("SELECT COUNT(*) FROM memories", [], |r| r.get(0))?;
            let unique_sessions: i64 = tx.query_row(
                "SELECT COUNT(DISTINCT session_id) FROM memories WHERE session_id IS NOT NULL",
                [],
                |r| r.get(0),
            )?;
            let oldest: Option<String> =
                tx.query_row("SELECT MIN(created_at) FROM memories", [], |r| r.get(0))?;
            let newest: Option<String> =
                tx.query_row("SELECT MAX(created_at) FROM memories", [], |r| r.get(0))?;

            let mut by_type = HashMap::new();
            let mut stmt =
                tx.prepare("SELECT memory_type, COUNT(*) FROM memories GROUP BY memory_type")?;
            let rows = stmt.query_map([], |row| {
                let t: String = row.get(0)?;
                let c: i64 = row.get(1)?;
                Ok((t, c))
            })?;
            for row in rows {
                let (t, c) = row?;
                by_type.insert(t, c);
            }

            Ok(MemoryStats {
                total,
                by_type,
                unique_sessions,
                oldest: oldest.and_then(|s| crate::clock::parse_ts(&s)),
                newest: newest.and_then(|s| crate::clock::parse_ts(&s)),
                vector_search_available: cfg!(feature = "vector-search"),
            })
        })
    }
}

fn sanitize_match_query(query: &str) -> String {
    // FTS5 treats `" * ( ) : ^ -` as syntax; a bare user query is safest
    // quoted word-by-word and joined with implicit AND.
    query
        .split_whitespace()
        .map(|w| format!("\"{}\"", w.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" ")
}

fn row_to_entry(row: &Row) -> rusqlite::Result<MemoryEntry> {
    let metadata_raw: String = row.get("metadata")?;
    let created_raw: String = row.get("created_at")?;
    let embedding_blob: Option<Vec<u8>> = row.get("embedding")?;
    Ok(MemoryEntry {
        id: row.get("id")?,
        text: row.get("text")?,
        embedding: embedding_blob.map(|b| embedding::from_bytes(&b)),
        metadata: serde_json::from_str(&metadata_raw).unwrap_or(Value::Null),
        created_at: crate::clock::parse_ts(&created_raw).unwrap_or_else(crate::clock::now),
        session_id: row.get("session_id")?,
        memory_type: row.get("memory_type")?,
    })
}
