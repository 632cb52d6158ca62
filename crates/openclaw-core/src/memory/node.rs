//! Memory entry, the fundamental unit of semantic memory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::clock;

/// A single stored memory: free text plus metadata and an optional
/// embedding used for similarity search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryEntry {
    pub id: String,
    pub text: String,
    pub embedding: Option<Vec<f32>>,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub session_id: Option<String>,
    pub memory_type: String,
}

impl MemoryEntry {
    /// Build a new entry with a content-addressed id:
    /// `sha256(text ++ ":" ++ now)` truncated to 16 hex characters.
    pub fn new(
        text: impl Into<String>,
        metadata: Value,
        session_id: Option<String>,
        memory_type: impl Into<String>,
    ) -> Self {
        let text = text.into();
        let created_at = clock::now();
        let id = content_id(&text, created_at);
        Self {
            id,
            text,
            embedding: None,
            metadata,
            created_at,
            session_id,
            memory_type: memory_type.into(),
        }
    }
}

fn content_id(text: &str, ts: DateTime<Utc>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update(b":");
    hasher.update(clock::format_ts(ts).as_bytes());
    let digest = hasher.finalize();
    digest.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_id_is_sixteen_hex_chars() {
        let id = content_id("hello", clock::now());
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn distinct_text_yields_distinct_ids() {
        let ts = clock::now();
        assert_ne!(content_id("hello", ts), content_id("goodbye", ts));
    }
}
