//! Mutating knowledge graph operations: upsert and delete.
//!
//! Every entity upsert is monotonic: confidence only rises (`MAX`),
//! `mention_count` only grows, and `first_seen <= last_seen <=
//! last_mentioned` always holds because `last_seen`/`last_mentioned` are
//! driven forward to the call's timestamp on every mention.

use rusqlite::{params, OptionalExtension, Transaction};
use serde_json::Value;

use crate::error::{Error, Result};

use super::changelog;
use super::entity::{Entity, EntityType};
use super::reader::{row_to_entity, row_to_relation, EntityRef};
use super::relation::Relation;

/// Insert a new entity or, if one with the same name (case-insensitive) and
/// type already exists, merge the mention into it.
pub fn upsert_entity(
    tx: &Transaction,
    name: &str,
    entity_type: EntityType,
    metadata: Value,
    notes: Option<&str>,
    confidence: f64,
) -> Result<Entity> {
    if name.trim().is_empty() {
        return Err(Error::invalid_input("entity name must not be empty"));
    }

    let now = crate::clock::now_string();
    let metadata_str = metadata.to_string();
    let notes = notes.unwrap_or("");

    let updated = tx.execute(
        "UPDATE kg_entities SET
            confidence = MAX(confidence, ?1),
            mention_count = mention_count + 1,
            last_seen = ?2,
            last_mentioned = ?2,
            metadata = CASE WHEN ?3 != '{}' THEN ?3 ELSE metadata END,
            notes = CASE WHEN ?4 != '' THEN ?4 ELSE notes END
         WHERE name = ?5 COLLATE NOCASE AND type = ?6",
        params![confidence, now, metadata_str, notes, name, entity_type.to_string()],
    )?;

    let id = if updated > 0 {
        tx.query_row(
            "SELECT id FROM kg_entities WHERE name = ?1 COLLATE NOCASE AND type = ?2",
            params![name, entity_type.to_string()],
            |row| row.get::<_, i64>(0),
        )?
    } else {
        tx.execute(
            "INSERT INTO kg_entities
                (name, type, metadata, notes, confidence, mention_count, first_seen, last_seen, last_mentioned)
             VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?6, ?6)",
            params![name, entity_type.to_string(), metadata_str, notes, confidence, now],
        )?;
        tx.last_insert_rowid()
    };

    changelog::record(
        tx,
        if updated > 0 { "entity_mentioned" } else { "entity_created" },
        Some(id),
        None,
        name,
    )?;

    tx.query_row("SELECT * FROM kg_entities WHERE id = ?1", params![id], row_to_entity)
        .map_err(Into::into)
}

/// Insert a new relation or, if one with the same `(source, target, type)`
/// already exists, strengthen it.
#[allow(clippy::too_many_arguments)]
pub fn upsert_relation(
    tx: &Transaction,
    source_id: i64,
    target_id: i64,
    relation_type: &str,
    strength: f64,
    metadata: Value,
    bidirectional: bool,
) -> Result<Relation> {
    let now = crate::clock::now_string();
    let metadata_str = metadata.to_string();

    tx.execute(
        "INSERT INTO kg_relations (source_id, target_id, type, strength, metadata, bidirectional, last_confirmed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
         ON CONFLICT(source_id, target_id, type) DO UPDATE SET
            strength = MAX(kg_relations.strength, excluded.strength),
            metadata = CASE WHEN excluded.metadata != '{}' THEN excluded.metadata ELSE kg_relations.metadata END,
            bidirectional = excluded.bidirectional OR kg_relations.bidirectional,
            last_confirmed = excluded.last_confirmed",
        params![source_id, target_id, relation_type, strength, metadata_str, bidirectional, now],
    )?;

    let relation = tx
        .query_row(
            "SELECT * FROM kg_relations WHERE source_id = ?1 AND target_id = ?2 AND type = ?3",
            params![source_id, target_id, relation_type],
            row_to_relation,
        )?;

    changelog::record(tx, "relation_upserted", None, Some(relation.id), relation_type)?;
    Ok(relation)
}

/// Delete an entity and (via `ON DELETE CASCADE`) every relation touching
/// it, recording the deletion in the changelog.
pub fn delete_entity(tx: &Transaction, entity_ref: &EntityRef) -> Result<bool> {
    let Some(entity_id) = super::reader::resolve_ref(tx, entity_ref)? else {
        return Ok(false);
    };
    let name: Option<String> = tx
        .query_row("SELECT name FROM kg_entities WHERE id = ?1", params![entity_id], |row| {
            row.get(0)
        })
        .optional()?;
    let Some(name) = name else {
        return Ok(false);
    };

    tx.execute("DELETE FROM kg_entities WHERE id = ?1", params![entity_id])?;
    changelog::record(tx, "entity_deleted", Some(entity_id), None, &name)?;
    Ok(true)
}
