//! Command handlers exposing [`openclaw_core::kg::KnowledgeGraph`] over the
//! dispatcher's `{command, args}` wire protocol.

use std::rc::Rc;

use openclaw_core::kg::{EntityRef, EntityType, KnowledgeGraph};
use serde_json::Value;

use crate::dispatcher::Dispatcher;

fn arg_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, String> {
    args.get(key)
        .and_then(Value::as_str)
        .ok_or_else(|| format!("missing or non-string argument: {key}"))
}

fn arg_entity_type(args: &Value, key: &str) -> Result<EntityType, String> {
    arg_str(args, key)?.parse().map_err(|e: openclaw_core::Error| e.to_string())
}

fn opt_entity_type(args: &Value, key: &str) -> Result<Option<EntityType>, String> {
    match args.get(key).and_then(Value::as_str) {
        Some(s) => Ok(Some(s.parse().map_err(|e: openclaw_core::Error| e.to_string())?)),
        None => Ok(None),
    }
}

/// An `id` argument that may be either an integer id or a name string, the
/// wire-level equivalent of [`EntityRef`].
fn arg_entity_ref<'a>(args: &'a Value, key: &str) -> Result<EntityRef<'a>, String> {
    match args.get(key) {
        Some(Value::Number(n)) => {
            n.as_i64().map(EntityRef::Id).ok_or_else(|| format!("invalid integer argument: {key}"))
        }
        Some(Value::String(s)) => Ok(EntityRef::Name(s.as_str())),
        _ => Err(format!("missing id or name argument: {key}")),
    }
}

pub fn build(kg: KnowledgeGraph) -> Dispatcher {
    let kg = Rc::new(kg);

    let k = Rc::clone(&kg);
    let upsert_entity = move |args: &Value| -> Result<Value, String> {
        let name = arg_str(args, "name")?;
        let entity_type = arg_entity_type(args, "type")?;
        let metadata = args.get("metadata").cloned().unwrap_or(Value::Object(Default::default()));
        let notes = args.get("notes").and_then(Value::as_str);
        let confidence = args.get("confidence").and_then(Value::as_f64).unwrap_or(0.8);
        let entity = k
            .upsert_entity(name, entity_type, metadata, notes, confidence)
            .map_err(|e| e.to_string())?;
        serde_json::to_value(entity).map_err(|e| e.to_string())
    };

    let k = Rc::clone(&kg);
    let upsert_relation = move |args: &Value| -> Result<Value, String> {
        let source = arg_entity_ref(args, "source")?;
        let target = arg_entity_ref(args, "target")?;
        let relation_type = arg_str(args, "type")?;
        let strength = args.get("strength").and_then(Value::as_f64).unwrap_or(0.5);
        let metadata = args.get("metadata").cloned().unwrap_or(Value::Object(Default::default()));
        let bidirectional = args.get("bidirectional").and_then(Value::as_bool).unwrap_or(false);
        let relation = k
            .upsert_relation(source, target, relation_type, strength, metadata, bidirectional)
            .map_err(|e| e.to_string())?;
        serde_json::to_value(relation).map_err(|e| e.to_string())
    };

    let k = Rc::clone(&kg);
    let query = move |args: &Value| -> Result<Value, String> {
        let text = args.get("text").and_then(Value::as_str);
        let entity_type = opt_entity_type(args, "type")?;
        let metadata = args.get("metadata").and_then(Value::as_object);
        let limit = args.get("limit").and_then(Value::as_u64).unwrap_or(20) as usize;
        let offset = args.get("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
        let result = k.query(text, entity_type, metadata, limit, offset).map_err(|e| e.to_string())?;
        serde_json::to_value(result).map_err(|e| e.to_string())
    };

    let k = Rc::clone(&kg);
    let get = move |args: &Value| -> Result<Value, String> {
        let entity_ref = arg_entity_ref(args, "id")?;
        match k.get(entity_ref).map_err(|e| e.to_string())? {
            Some((entity, relations)) => Ok(serde_json::json!({ "entity": entity, "relations": relations })),
            None => Err("entity not found".to_string()),
        }
    };

    let k = Rc::clone(&kg);
    let stale = move |args: &Value| -> Result<Value, String> {
        let threshold_days = args.get("threshold_days").and_then(Value::as_i64).unwrap_or(14);
        let entity_type = opt_entity_type(args, "type")?;
        let entities = k.stale(threshold_days, entity_type).map_err(|e| e.to_string())?;
        serde_json::to_value(entities).map_err(|e| e.to_string())
    };

    let k = Rc::clone(&kg);
    let neighbors = move |args: &Value| -> Result<Value, String> {
        let entity_ref = arg_entity_ref(args, "id")?;
        let hops = args.get("hops").and_then(Value::as_u64).unwrap_or(1) as u32;
        let filter_type = opt_entity_type(args, "type")?;
        let neighbors = k.neighbors(entity_ref, hops, filter_type).map_err(|e| e.to_string())?;
        let Some(neighbors) = neighbors else {
            return Err("entity not found".to_string());
        };
        let payload: Vec<Value> = neighbors
            .into_iter()
            .map(|(entity, hop)| serde_json::json!({ "entity": entity, "hops": hop }))
            .collect();
        Ok(Value::Array(payload))
    };

    let k = Rc::clone(&kg);
    let delete_entity = move |args: &Value| -> Result<Value, String> {
        let entity_ref = arg_entity_ref(args, "id")?;
        let deleted = k.delete_entity(entity_ref).map_err(|e| e.to_string())?;
        Ok(serde_json::json!({ "deleted": deleted }))
    };

    let k = Rc::clone(&kg);
    let stats = move |_args: &Value| -> Result<Value, String> {
        let stats = k.stats().map_err(|e| e.to_string())?;
        serde_json::to_value(stats).map_err(|e| e.to_string())
    };

    Dispatcher::new()
        .register("upsert_entity", Box::new(upsert_entity))
        .register("upsert_relation", Box::new(upsert_relation))
        .register("query", Box::new(query))
        .register("get", Box::new(get))
        .register("stale", Box::new(stale))
        .register("neighbors", Box::new(neighbors))
        .register("delete_entity", Box::new(delete_entity))
        .register("stats", Box::new(stats))
}
