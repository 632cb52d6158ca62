//! Knowledge Graph (C3): entities, typed relations between them, and a
//! 90-day rolling changelog of every mutation.

mod changelog;
mod entity;
mod relation;
mod reader;
mod writer;

pub use changelog::ChangelogEntry;
pub use entity::{Entity, EntityType};
pub use reader::{
    get, neighbors, query, stale, stats, ConnectedEntity, DecoratedEntity, DecoratedRelation,
    EntityRef, GraphStats, QueryResult, StaleSummary,
};
pub use relation::Relation;
pub use writer::{delete_entity, upsert_entity, upsert_relation};

use std::path::Path;

use serde_json::Value;

use crate::error::Result;
use crate::storage::{self, ConnectionPool};

/// The knowledge graph store: one SQLite database, one connection pool.
/// Every operation runs inside a single cursor scope (begin/commit or
/// rollback around one call).
pub struct KnowledgeGraph {
    pool: ConnectionPool,
}

impl KnowledgeGraph {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            pool: storage::open_kg_pool(path)?,
        })
    }

    pub fn upsert_entity(
        &self,
        name: &str,
        entity_type: EntityType,
        metadata: Value,
        notes: Option<&str>,
        confidence: f64,
    ) -> Result<Entity> {
        self.pool
            .with_scope(|tx| writer::upsert_entity(tx, name, entity_type, metadata, notes, confidence))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn upsert_relation(
        &self,
        source: EntityRef<'_>,
        target: EntityRef<'_>,
        relation_type: &str,
        strength: f64,
        metadata: Value,
        bidirectional: bool,
    ) -> Result<Relation> {
        self.pool.with_scope(|tx| {
            let source_id = reader::resolve_required(tx, &source)?;
            let target_id = reader::resolve_required(tx, &target)?;
            writer::upsert_relation(tx, source_id, target_id, relation_type, strength, metadata, bidirectional)
        })
    }

    pub fn delete_entity(&self, entity_ref: EntityRef<'_>) -> Result<bool> {
        self.pool.with_scope(|tx| writer::delete_entity(tx, &entity_ref))
    }

    #[allow(clippy::too_many_arguments)]
    pub fn query(
        &self,
        text: Option<&str>,
        entity_type: Option<EntityType>,
        metadata: Option<&serde_json::Map<String, Value>>,
        limit: usize,
        offset: usize,
    ) -> Result<QueryResult> {
        self.pool.with_scope(|tx| reader::query(tx, text, entity_type, metadata, limit, offset))
    }

    pub fn get(&self, entity_ref: EntityRef<'_>) -> Result<Option<(Entity, Vec<DecoratedRelation>)>> {
        self.pool.with_scope(|tx| reader::get(tx, &entity_ref))
    }

    pub fn stale(&self, threshold_days: i64, entity_type: Option<EntityType>) -> Result<Vec<DecoratedEntity>> {
        self.pool.with_scope(|tx| reader::stale(tx, threshold_days, entity_type))
    }

    pub fn neighbors(
        &self,
        entity_ref: EntityRef<'_>,
        hops: u32,
        filter_type: Option<EntityType>,
    ) -> Result<Option<Vec<(Entity, u32)>>> {
        self.pool.with_scope(|tx| reader::neighbors(tx, &entity_ref, hops, filter_type))
    }

    pub fn stats(&self) -> Result<GraphStats> {
        self.pool.with_scope(reader::stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_temp() -> (tempfile::TempDir, KnowledgeGraph) {
        let dir = tempfile::tempdir().unwrap();
        let kg = KnowledgeGraph::open(dir.path().join("kg.sqlite3")).unwrap();
        (dir, kg)
    }

    #[test]
    fn upsert_entity_is_case_insensitive_and_monotonic() {
        let (_dir, kg) = open_temp();
        let a = kg
            .upsert_entity("Ada Lovelace", EntityType::Person, Value::Null, None, 0.6)
            .unwrap();
        assert_eq!(a.mention_count, 1);

        let b = kg
            .upsert_entity("ada lovelace", EntityType::Person, Value::Null, None, 0.9)
            .unwrap();
        assert_eq!(a.id, b.id);
        assert_eq!(b.mention_count, 2);
        assert_eq!(b.confidence, 0.9);

        let c = kg
            .upsert_entity("ADA LOVELACE", EntityType::Person, Value::Null, None, 0.2)
            .unwrap();
        assert_eq!(c.confidence, 0.9, "confidence must never decrease");
    }

    #[test]
    fn upsert_relation_strengthens_existing_edge() {
        let (_dir, kg) = open_temp();
        kg.upsert_entity("Ada", EntityType::Person, Value::Null, None, 0.8).unwrap();
        kg.upsert_entity("Turing Machine Project", EntityType::Project, Value::Null, None, 0.8)
            .unwrap();

        let r1 = kg
            .upsert_relation(
                EntityRef::Name("Ada"), EntityRef::Name("Turing Machine Project"),
                "works_on", 0.4, Value::Null, false,
            )
            .unwrap();
        let r2 = kg
            .upsert_relation(
                EntityRef::Name("Ada"), EntityRef::Name("Turing Machine Project"),
                "works_on", 0.8, Value::Null, false,
            )
            .unwrap();
        assert_eq!(r1.id, r2.id);
        assert_eq!(r2.strength, 0.8);
    }

    #[test]
    fn upsert_relation_fails_when_endpoint_is_missing() {
        let (_dir, kg) = open_temp();
        kg.upsert_entity("Ada", EntityType::Person, Value::Null, None, 0.8).unwrap();
        let err = kg
            .upsert_relation(
                EntityRef::Name("Ada"), EntityRef::Name("Ghost"), "knows", 0.5, Value::Null, false,
            )
            .unwrap_err();
        assert!(matches!(err, crate::error::Error::EntityNotFound(_)));
    }

    #[test]
    fn delete_entity_cascades_relations() {
        let (_dir, kg) = open_temp();
        kg.upsert_entity("Ada", EntityType::Person, Value::Null, None, 0.8).unwrap();
        kg.upsert_entity("Charles", EntityType::Person, Value::Null, None, 0.8).unwrap();
        let rel = kg
            .upsert_relation(EntityRef::Name("Ada"), EntityRef::Name("Charles"), "knows", 0.5, Value::Null, true)
            .unwrap();

        let ada = kg.query(Some("Ada"), None, None, 10, 0).unwrap();
        let ada_id = ada.entities[0].id;

        kg.delete_entity(EntityRef::Id(ada_id)).unwrap();
        let (_, relations) = kg.get(EntityRef::Id(rel.target_id)).unwrap().unwrap();
        assert!(relations.is_empty());
    }

    #[test]
    fn neighbors_respects_hop_limit_and_filters_after_traversal() {
        let (_dir, kg) = open_temp();
        kg.upsert_entity("A", EntityType::Person, Value::Null, None, 0.8).unwrap();
        kg.upsert_entity("B", EntityType::Project, Value::Null, None, 0.8).unwrap();
        kg.upsert_entity("C", EntityType::Person, Value::Null, None, 0.8).unwrap();
        kg.upsert_relation(EntityRef::Name("A"), EntityRef::Name("B"), "related", 0.5, Value::Null, false)
            .unwrap();
        kg.upsert_relation(EntityRef::Name("B"), EntityRef::Name("C"), "related", 0.5, Value::Null, false)
            .unwrap();

        let a_id = kg.query(Some("A"), None, None, 10, 0).unwrap().entities[0].id;
        let one_hop = kg.neighbors(EntityRef::Id(a_id), 1, None).unwrap().unwrap();
        assert_eq!(one_hop.len(), 1);

        let two_hop = kg.neighbors(EntityRef::Id(a_id), 2, None).unwrap().unwrap();
        assert_eq!(two_hop.len(), 2);

        let filtered = kg.neighbors(EntityRef::Id(a_id), 2, Some(EntityType::Person)).unwrap().unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].0.name, "C");
    }

    #[test]
    fn neighbors_returns_none_for_unknown_name() {
        let (_dir, kg) = open_temp();
        assert!(kg.neighbors(EntityRef::Name("Nobody"), 1, None).unwrap().is_none());
    }
}
