//! Knowledge graph relations: directed, typed edges between entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relation {
    pub id: i64,
    pub source_id: i64,
    pub target_id: i64,
    #[serde(rename = "type")]
    pub relation_type: String,
    pub strength: f64,
    pub metadata: Value,
    pub bidirectional: bool,
    pub last_confirmed: DateTime<Utc>,
}
