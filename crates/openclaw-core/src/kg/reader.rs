//! Read-only knowledge graph operations: query, get, neighbors, stale,
//! stats.

use std::collections::{HashMap, VecDeque};

use rusqlite::{params, OptionalExtension, Row, Transaction};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

use super::entity::{Entity, EntityType};
use super::relation::Relation;

pub(super) fn row_to_entity(row: &Row) -> rusqlite::Result<Entity> {
    let metadata_raw: String = row.get("metadata")?;
    let type_raw: String = row.get("type")?;
    Ok(Entity {
        id: row.get("id")?,
        name: row.get("name")?,
        entity_type: type_raw.parse().unwrap_or(EntityType::Topic),
        metadata: serde_json::from_str(&metadata_raw).unwrap_or(Value::Null),
        notes: row.get("notes")?,
        confidence: row.get("confidence")?,
        mention_count: row.get("mention_count")?,
        first_seen: parse_ts(row, "first_seen")?,
        last_seen: parse_ts(row, "last_seen")?,
        last_mentioned: parse_ts(row, "last_mentioned")?,
    })
}

pub(super) fn row_to_relation(row: &Row) -> rusqlite::Result<Relation> {
    let metadata_raw: String = row.get("metadata")?;
    Ok(Relation {
        id: row.get("id")?,
        source_id: row.get("source_id")?,
        target_id: row.get("target_id")?,
        relation_type: row.get("type")?,
        strength: row.get("strength")?,
        metadata: serde_json::from_str(&metadata_raw).unwrap_or(Value::Null),
        bidirectional: row.get::<_, i64>("bidirectional")? != 0,
        last_confirmed: parse_ts(row, "last_confirmed")?,
    })
}

fn parse_ts(row: &Row, col: &str) -> rusqlite::Result<chrono::DateTime<chrono::Utc>> {
    let raw: String = row.get(col)?;
    Ok(crate::clock::parse_ts(&raw).unwrap_or_else(crate::clock::now))
}

/// A wire-level reference to an entity: either its id or its name. Names
/// are resolved case-insensitively against `kg_entities.name`.
#[derive(Debug, Clone, Copy)]
pub enum EntityRef<'a> {
    Id(i64),
    Name(&'a str),
}

impl std::fmt::Display for EntityRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityRef::Id(id) => write!(f, "id {id}"),
            EntityRef::Name(name) => write!(f, "{name:?}"),
        }
    }
}

/// Resolve a reference to an id. A name that matches nothing resolves to
/// `None`; an id is returned as-is without checking that it exists.
pub fn resolve_ref(tx: &Transaction, r: &EntityRef) -> rusqlite::Result<Option<i64>> {
    match r {
        EntityRef::Id(id) => Ok(Some(*id)),
        EntityRef::Name(name) => tx
            .query_row(
                "SELECT id FROM kg_entities WHERE name = ?1 COLLATE NOCASE",
                params![name],
                |row| row.get(0),
            )
            .optional(),
    }
}

/// Resolve a reference to an id, failing with [`Error::entity_not_found`]
/// instead of returning `None`. Relation endpoints must already exist;
/// unlike entity upsert this never creates one.
pub fn resolve_required(tx: &Transaction, r: &EntityRef) -> Result<i64> {
    resolve_ref(tx, r)?.ok_or_else(|| Error::entity_not_found(format!("entity not found: {r}")))
}

/// Reject metadata-filter keys that aren't a plain `name`/`a.b.c` path, or
/// that could reach a prototype-pollution-sensitive consumer downstream.
fn is_safe_metadata_key(key: &str) -> bool {
    if key.is_empty() || !key.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-')) {
        return false;
    }
    let lower = key.to_ascii_lowercase();
    if lower.starts_with("__") {
        return false;
    }
    !matches!(lower.as_str(), "__proto__" | "constructor" | "prototype")
}

fn json_scalar_to_sql(value: &Value) -> Box<dyn rusqlite::ToSql> {
    match value {
        Value::String(s) => Box::new(s.clone()),
        Value::Bool(b) => Box::new(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Box::new(i)
            } else if let Some(f) = n.as_f64() {
                Box::new(f)
            } else {
                Box::new(n.to_string())
            }
        }
        other => Box::new(other.to_string()),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResult {
    pub entities: Vec<Entity>,
    pub total: i64,
}

/// Free-text plus type/metadata-filtered entity search. An empty or
/// whitespace-only `text` skips the FTS stage and filters the full table.
/// `metadata` keys are sanitized against a prototype-pollution denylist
/// before being used as a `json_extract` path; unsafe keys are dropped
/// rather than rejecting the whole query, and values are always
/// parameter-bound. Results are ordered by `last_mentioned DESC`; `total`
/// reports the pre-limit, pre-offset match count.
pub fn query(
    tx: &Transaction,
    text: Option<&str>,
    entity_type: Option<EntityType>,
    metadata: Option<&Map<String, Value>>,
    limit: usize,
    offset: usize,
) -> Result<QueryResult> {
    let mut conditions: Vec<String> = Vec::new();
    let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    if let Some(t) = entity_type {
        conditions.push("type = ?".to_string());
        params.push(Box::new(t.to_string()));
    }

    if let Some(t) = text {
        if !t.trim().is_empty() {
            let sanitized = sanitize_fts_query(t);
            let mut stmt = tx.prepare("SELECT rowid FROM kg_entities_fts WHERE kg_entities_fts MATCH ?1")?;
            let ids = stmt
                .query_map(params![sanitized], |row| row.get::<_, i64>(0))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            if ids.is_empty() {
                return Ok(QueryResult { entities: Vec::new(), total: 0 });
            }
            let placeholders = vec!["?"; ids.len()].join(",");
            conditions.push(format!("id IN ({placeholders})"));
            for id in ids {
                params.push(Box::new(id));
            }
        }
    }

    if let Some(filter) = metadata {
        for (key, value) in filter {
            if !is_safe_metadata_key(key) {
                continue;
            }
            conditions.push("json_extract(metadata, ?) = ?".to_string());
            params.push(Box::new(format!("$.{key}")));
            params.push(json_scalar_to_sql(value));
        }
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };
    let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|b| b.as_ref()).collect();

    let total: i64 = tx.query_row(
        &format!("SELECT COUNT(*) FROM kg_entities{where_clause}"),
        param_refs.as_slice(),
        |row| row.get(0),
    )?;

    let limit = limit as i64;
    let offset = offset as i64;
    let mut all_refs = param_refs;
    all_refs.push(&limit);
    all_refs.push(&offset);

    let sql = format!("SELECT * FROM kg_entities{where_clause} ORDER BY last_mentioned DESC LIMIT ? OFFSET ?");
    let mut stmt = tx.prepare(&sql)?;
    let entities = stmt
        .query_map(all_refs.as_slice(), row_to_entity)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(QueryResult { entities, total })
}

fn sanitize_fts_query(text: &str) -> String {
    text.split_whitespace()
        .map(|w| format!("\"{}\"", w.replace('"', "")))
        .collect::<Vec<_>>()
        .join(" ")
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoratedRelation {
    pub relation: Relation,
    pub other_id: i64,
    pub other_name: String,
    pub other_type: EntityType,
    pub direction: &'static str,
}

/// Fetch an entity along with every relation touching it, decorated with
/// the other endpoint's id/name/type and the direction from the queried
/// entity's perspective. Relations are ordered by `strength DESC`.
pub fn get(tx: &Transaction, entity_ref: &EntityRef) -> Result<Option<(Entity, Vec<DecoratedRelation>)>> {
    let Some(entity_id) = resolve_ref(tx, entity_ref)? else {
        return Ok(None);
    };

    let entity = tx.query_row("SELECT * FROM kg_entities WHERE id = ?1", params![entity_id], row_to_entity);
    let entity = match entity {
        Ok(e) => e,
        Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let mut stmt = tx.prepare(
        "SELECT * FROM kg_relations WHERE source_id = ?1 OR target_id = ?1 ORDER BY strength DESC",
    )?;
    let relations = stmt
        .query_map(params![entity_id], row_to_relation)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut decorated = Vec::with_capacity(relations.len());
    for rel in relations {
        let (other_id, direction) = if rel.source_id == entity_id {
            (rel.target_id, "outgoing")
        } else {
            (rel.source_id, "incoming")
        };
        let (other_name, other_type_raw): (String, String) = tx.query_row(
            "SELECT name, type FROM kg_entities WHERE id = ?1",
            params![other_id],
            |r| Ok((r.get(0)?, r.get(1)?)),
        )?;
        decorated.push(DecoratedRelation {
            relation: rel,
            other_id,
            other_name,
            other_type: other_type_raw.parse().unwrap_or(EntityType::Topic),
            direction,
        });
    }

    Ok(Some((entity, decorated)))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecoratedEntity {
    pub entity: Entity,
    pub rel_count: i64,
}

/// Entities not mentioned in at least `threshold_days` days, optionally
/// restricted to one type, each decorated with its relation count.
pub fn stale(tx: &Transaction, threshold_days: i64, entity_type: Option<EntityType>) -> Result<Vec<DecoratedEntity>> {
    let cutoff = crate::clock::now() - chrono::Duration::days(threshold_days);
    let cutoff_str = crate::clock::format_ts(cutoff);
    let mut stmt = tx.prepare(
        "SELECT * FROM kg_entities WHERE last_mentioned < ?1 ORDER BY last_mentioned ASC",
    )?;
    let rows = stmt.query_map(params![cutoff_str], row_to_entity)?;
    let mut entities = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    if let Some(t) = entity_type {
        entities.retain(|e| e.entity_type == t);
    }

    let mut decorated = Vec::with_capacity(entities.len());
    for entity in entities {
        let rel_count: i64 = tx.query_row(
            "SELECT COUNT(*) FROM kg_relations WHERE source_id = ?1 OR target_id = ?1",
            params![entity.id],
            |r| r.get(0),
        )?;
        decorated.push(DecoratedEntity { entity, rel_count });
    }
    Ok(decorated)
}

/// Breadth-first traversal out to `hops` edges. Type filtering is applied
/// after traversal completes, not during it, so a filtered-out entity can
/// still serve as a bridge to reach others of the requested type. `None`
/// means `entity_ref` named an entity that doesn't exist.
pub fn neighbors(
    tx: &Transaction,
    entity_ref: &EntityRef,
    hops: u32,
    filter_type: Option<EntityType>,
) -> Result<Option<Vec<(Entity, u32)>>> {
    let Some(entity_id) = resolve_ref(tx, entity_ref)? else {
        return Ok(None);
    };

    let mut visited: HashMap<i64, u32> = HashMap::new();
    visited.insert(entity_id, 0);
    let mut frontier: VecDeque<i64> = VecDeque::new();
    frontier.push_back(entity_id);

    for depth in 1..=hops {
        let mut next_frontier = VecDeque::new();
        while let Some(current) = frontier.pop_front() {
            let mut stmt = tx.prepare(
                "SELECT source_id, target_id FROM kg_relations WHERE source_id = ?1 OR target_id = ?1",
            )?;
            let edges: Vec<(i64, i64)> = stmt
                .query_map(params![current], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<rusqlite::Result<Vec<_>>>()?;
            for (source, target) in edges {
                let other = if source == current { target } else { source };
                if !visited.contains_key(&other) {
                    visited.insert(other, depth);
                    next_frontier.push_back(other);
                }
            }
        }
        frontier = next_frontier;
        if frontier.is_empty() {
            break;
        }
    }
    visited.remove(&entity_id);

    let mut result = Vec::with_capacity(visited.len());
    for (id, depth) in visited {
        if let Ok(entity) = tx.query_row("SELECT * FROM kg_entities WHERE id = ?1", params![id], row_to_entity) {
            result.push((entity, depth));
        }
    }

    if let Some(t) = filter_type {
        result.retain(|(e, _)| e.entity_type == t);
    }
    result.sort_by_key(|(_, depth)| *depth);
    Ok(Some(result))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectedEntity {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub rel_count: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleSummary {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub entity_type: EntityType,
    pub last_mentioned: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphStats {
    pub total_entities: i64,
    pub total_relations: i64,
    pub by_type: HashMap<String, i64>,
    pub most_connected: Vec<ConnectedEntity>,
    pub most_stale: Vec<StaleSummary>,
}

pub fn stats(tx: &Transaction) -> Result<GraphStats> {
    let total_entities: i64 = tx.query_row("SELECT COUNT(*) FROM kg_entities", [], |r| r.get(0))?;
    let total_relations: i64 = tx.query_row("SELECT COUNT(*) FROM kg_relations", [], |r| r.get(0))?;

    let mut by_type = HashMap::new();
    let mut stmt = tx.prepare("SELECT type, COUNT(*) FROM kg_entities GROUP BY type")?;
    let rows = stmt.query_map([], |row| {
        let t: String = row.get(0)?;
        let c: i64 = row.get(1)?;
        Ok((t, c))
    })?;
    for row in rows {
        let (t, c) = row?;
        by_type.insert(t, c);
    }

    let mut stmt = tx.prepare(
        "SELECT e.id, e.name, e.type,
                (SELECT COUNT(*) FROM kg_relations r
                 WHERE r.source_id = e.id OR r.target_id = e.id) AS rel_count
         FROM kg_entities e
         ORDER BY rel_count DESC LIMIT 10",
    )?;
    let most_connected = stmt
        .query_map([], |row| {
            let type_raw: String = row.get(2)?;
            Ok(ConnectedEntity {
                id: row.get(0)?,
                name: row.get(1)?,
                entity_type: type_raw.parse().unwrap_or(EntityType::Topic),
                rel_count: row.get(3)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let mut stmt = tx.prepare(
        "SELECT id, name, type, last_mentioned FROM kg_entities ORDER BY last_mentioned ASC LIMIT 10",
    )?;
    let most_stale = stmt
        .query_map([], |row| {
            let type_raw: String = row.get(2)?;
            Ok(StaleSummary {
                id: row.get(0)?,
                name: row.get(1)?,
                entity_type: type_raw.parse().unwrap_or(EntityType::Topic),
                last_mentioned: parse_ts(row, "last_mentioned")?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(GraphStats {
        total_entities,
        total_relations,
        by_type,
        most_connected,
        most_stale,
    })
}
