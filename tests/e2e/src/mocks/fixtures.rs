//! Test data factory: builds entities, relations, and memories with
//! realistic content for end-to-end scenarios.

use chrono::{Duration, Utc};
use openclaw_core::kg::{EntityRef, EntityType, KnowledgeGraph};
use openclaw_core::memory::SemanticMemory;
use serde_json::{json, Value};

/// Factory for creating test data against a live knowledge graph or
/// semantic memory store.
pub struct TestDataFactory;

impl TestDataFactory {
    /// Upsert a person with no extra metadata.
    pub fn create_person(kg: &KnowledgeGraph, name: &str) -> i64 {
        kg.upsert_entity(name, EntityType::Person, json!({}), None, 0.8)
            .expect("upsert_entity failed")
            .id
    }

    /// Upsert a person with a birthday, in `"MM-DD"` form.
    pub fn create_person_with_birthday(kg: &KnowledgeGraph, name: &str, birthday: &str) -> i64 {
        kg.upsert_entity(
            name,
            EntityType::Person,
            json!({ "important_dates": { "birthday": birthday } }),
            None,
            0.8,
        )
        .expect("upsert_entity failed")
        .id
    }

    /// Upsert a travel event whose `start_date` is `days_from_now` days out.
    pub fn create_upcoming_event(kg: &KnowledgeGraph, name: &str, days_from_now: i64) -> i64 {
        let date = (Utc::now() + Duration::days(days_from_now)).format("%Y-%m-%d").to_string();
        kg.upsert_entity(name, EntityType::Event, json!({ "start_date": date }), None, 0.8)
            .expect("upsert_entity failed")
            .id
    }

    /// Upsert a project, backdating `last_mentioned` is not supported at
    /// this layer, callers that need staleness should upsert once, then
    /// rely on `stale()`'s threshold against a synthetic `now`.
    pub fn create_project(kg: &KnowledgeGraph, name: &str) -> i64 {
        kg.upsert_entity(name, EntityType::Project, json!({}), None, 0.8)
            .expect("upsert_entity failed")
            .id
    }

    pub fn link(
        kg: &KnowledgeGraph,
        source_name: &str,
        _source_type: EntityType,
        target_name: &str,
        _target_type: EntityType,
        relation_type: &str,
    ) {
        kg.upsert_relation(
            EntityRef::Name(source_name),
            EntityRef::Name(target_name),
            relation_type,
            0.5,
            json!({}),
            false,
        )
        .expect("upsert_relation failed");
    }

    /// Store a handful of memories with distinct, searchable content.
    pub fn seed_memories(memory: &SemanticMemory, texts: &[&str]) -> Vec<String> {
        texts
            .iter()
            .map(|text| {
                memory
                    .store(text, Value::Null, None, "conversation")
                    .expect("store failed")
                    .id
            })
            .collect()
    }
}
