//! Proactive Nudge Engine (C6): deterministic rules over the knowledge
//! graph and the wall clock, no LLM involved.

mod config;
mod kinds;

pub use config::{deep_merge, NudgeConfig, QuietHours};
pub use kinds::{is_quiet_hours, Nudge, NudgeKind, StaleContact};

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::storage::{self, ConnectionPool};

pub struct NudgeEngine {
    pool: ConnectionPool,
    config: NudgeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MorningBriefing {
    pub nudges: Vec<Nudge>,
    pub counts_by_kind: HashMap<String, i64>,
    pub stats: crate::kg::GraphStats,
    pub total_nudges_available: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationshipReview {
    pub stale_contacts: Vec<StaleContact>,
    pub count: usize,
}

impl NudgeEngine {
    /// Open the knowledge-graph database the nudge engine reads from.
    /// Nudges are derived, not stored, there is no separate nudge
    /// database, only rules run against the graph at request time.
    pub fn open(kg_path: impl AsRef<Path>, config: NudgeConfig) -> Result<Self> {
        Ok(Self {
            pool: storage::open_kg_pool(kg_path)?,
            config,
        })
    }

    /// Run every rule and return the nudges that survive, highest priority
    /// first, capped at `max_nudges_per_day`. During quiet hours the whole
    /// batch is suppressed and an empty list is returned.
    pub fn check_all(&self, now: DateTime<Utc>) -> Result<Vec<Nudge>> {
        if is_quiet_hours(now.hour(), &self.config) {
            return Ok(Vec::new());
        }

        self.pool.with_scope(|tx| {
            let mut all = Vec::new();
            all.extend(kinds::check_followups(tx, &self.config, now)?);
            all.extend(kinds::check_travel(tx, &self.config, now)?);
            all.extend(kinds::check_stale_projects(tx, &self.config, now)?);
            all.extend(kinds::check_birthdays(tx, &self.config, now)?);
            all.extend(kinds::check_relationship_insights(tx, &self.config, now)?);

            // Stable sort: equal-priority nudges keep the emission order
            // above (follow_up, travel_prep, stale_project, birthday,
            // relationship_insight).
            all.sort_by(|a, b| b.priority.cmp(&a.priority));
            all.truncate(self.config.max_nudges_per_day as usize);
            Ok(all)
        })
    }

    /// All current nudges, grouped for a daily summary view. Ignores the
    /// `max_nudges_per_day` cap and quiet-hours suppression that
    /// [`check_all`] applies, since a briefing is explicitly requested.
    pub fn morning_briefing(&self, now: DateTime<Utc>) -> Result<MorningBriefing> {
        self.pool.with_scope(|tx| {
            let mut all = Vec::new();
            all.extend(kinds::check_followups(tx, &self.config, now)?);
            all.extend(kinds::check_travel(tx, &self.config, now)?);
            all.extend(kinds::check_stale_projects(tx, &self.config, now)?);
            all.extend(kinds::check_birthdays(tx, &self.config, now)?);
            all.extend(kinds::check_relationship_insights(tx, &self.config, now)?);
            all.sort_by(|a, b| b.priority.cmp(&a.priority));

            let total_nudges_available = all.len();
            let mut counts_by_kind = HashMap::new();
            for nudge in &all {
                *counts_by_kind.entry(nudge.kind.config_key().to_string()).or_insert(0) += 1;
            }

            let stats = crate::kg::stats(tx)?;

            Ok(MorningBriefing { nudges: all, counts_by_kind, stats, total_nudges_available })
        })
    }

    /// The five people most overdue for a check-in, each decorated with who
    /// they're connected to, for a dedicated review view.
    pub fn relationship_review(&self, now: DateTime<Utc>) -> Result<RelationshipReview> {
        self.pool.with_scope(|tx| {
            let stale_contacts = kinds::stale_contacts(tx, &self.config, now)?;
            let count = stale_contacts.len();
            Ok(RelationshipReview { stale_contacts, count })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn engine_with(dir: &tempfile::TempDir) -> NudgeEngine {
        NudgeEngine::open(dir.path().join("kg.sqlite3"), NudgeConfig::default()).unwrap()
    }

    #[test]
    fn stale_project_surfaces_after_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let kg = crate::kg::KnowledgeGraph::open(dir.path().join("kg.sqlite3")).unwrap();
        kg.upsert_entity("Migrate to Postgres", crate::kg::EntityType::Project, Value::Null, None, 0.8)
            .unwrap();
        drop(kg);

        let engine = engine_with(&dir);
        let far_future = Utc::now() + chrono::Duration::days(20);
        let nudges = engine.check_all(far_future).unwrap();
        assert!(nudges.iter().any(|n| n.kind == NudgeKind::StaleProject));
    }

    #[test]
    fn quiet_hours_suppresses_all_nudges() {
        let dir = tempfile::tempdir().unwrap();
        let kg = crate::kg::KnowledgeGraph::open(dir.path().join("kg.sqlite3")).unwrap();
        kg.upsert_entity("Migrate to Postgres", crate::kg::EntityType::Project, Value::Null, None, 0.8)
            .unwrap();
        drop(kg);

        let engine = engine_with(&dir);
        let midnight = Utc::now()
            .with_hour(2)
            .unwrap()
            .with_timezone(&Utc)
            + chrono::Duration::days(20);
        let nudges = engine.check_all(midnight).unwrap();
        assert!(nudges.is_empty());
    }

    #[test]
    fn birthday_nudge_handles_feb_29_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let kg = crate::kg::KnowledgeGraph::open(dir.path().join("kg.sqlite3")).unwrap();
        kg.upsert_entity(
            "Leap Day Larry",
            crate::kg::EntityType::Person,
            json!({ "important_dates": { "birthday": "02-29" } }),
            None,
            0.8,
        )
        .unwrap();
        drop(kg);

        let engine = engine_with(&dir);
        // Should not panic even in a non-leap year.
        let _ = engine.morning_briefing(Utc::now()).unwrap();
    }
}
