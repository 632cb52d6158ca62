//! Audit log for graph mutations. Pruned to the last 90 days by a trigger
//! fired on every insert (see `storage::migrations::KG_MIGRATIONS`).

use chrono::{DateTime, Utc};
use rusqlite::{params, Transaction};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub id: i64,
    pub ts: DateTime<Utc>,
    pub action: String,
    pub entity_id: Option<i64>,
    pub relation_id: Option<i64>,
    pub detail: String,
}

pub fn record(
    tx: &Transaction,
    action: &str,
    entity_id: Option<i64>,
    relation_id: Option<i64>,
    detail: &str,
) -> rusqlite::Result<()> {
    tx.execute(
        "INSERT INTO kg_changelog (ts, action, entity_id, relation_id, detail)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![crate::clock::now_string(), action, entity_id, relation_id, detail],
    )?;
    Ok(())
}
