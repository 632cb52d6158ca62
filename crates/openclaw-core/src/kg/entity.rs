//! Knowledge graph entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The seven entity types the graph accepts. Anything else is rejected at
/// the write boundary rather than stored as a free-form string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityType {
    Person,
    Org,
    Project,
    Place,
    Event,
    Topic,
    Skill,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EntityType::Person => "person",
            EntityType::Org => "org",
            EntityType::Project => "project",
            EntityType::Place => "place",
            EntityType::Event => "event",
            EntityType::Topic => "topic",
            EntityType::Skill => "skill",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for EntityType {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "person" => Ok(EntityType::Person),
            "org" => Ok(EntityType::Org),
            "project" => Ok(EntityType::Project),
            "place" => Ok(EntityType::Place),
            "event" => Ok(EntityType::Event),
            "topic" => Ok(EntityType::Topic),
            "skill" => Ok(EntityType::Skill),
            other => Err(crate::error::Error::invalid_input(format!(
                "unknown entity type: {other}"
            ))),
        }
    }
}

/// A node in the knowledge graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub metadata: Value,
    pub notes: String,
    pub confidence: f64,
    pub mention_count: i64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub last_mentioned: DateTime<Utc>,
}
