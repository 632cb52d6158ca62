//! End-to-end journeys over the knowledge graph: upsert monotonicity,
//! case-insensitive identity, relation cascade, and BFS neighbor growth.

use openclaw_e2e_tests::harness::db_manager::TestEnv;
use openclaw_e2e_tests::mocks::fixtures::TestDataFactory;
use openclaw_core::kg::{EntityRef, EntityType};
use serde_json::json;

#[test]
fn entity_upsert_is_idempotent_and_monotonic() {
    let env = TestEnv::new();

    let first = env
        .kg
        .upsert_entity("Heather McCargo", EntityType::Person, json!({}), None, 1.0)
        .unwrap();
    assert_eq!(first.mention_count, 1);

    let second = env
        .kg
        .upsert_entity("Heather McCargo", EntityType::Person, json!({}), None, 1.0)
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.mention_count, 2);
    assert_eq!(second.first_seen, first.first_seen);
    assert!(second.last_mentioned >= first.last_mentioned);
    assert!(second.confidence >= first.confidence);
}

#[test]
fn case_insensitive_upsert_yields_one_row() {
    let env = TestEnv::new();

    env.kg
        .upsert_entity("Heather McCargo", EntityType::Person, json!({}), None, 0.9)
        .unwrap();
    env.kg
        .upsert_entity("HEATHER mccargo", EntityType::Person, json!({}), None, 0.9)
        .unwrap();

    let matches = env.kg.query(Some("Heather"), Some(EntityType::Person), None, 10, 0).unwrap();
    assert_eq!(matches.entities.len(), 1);
    assert_eq!(matches.entities[0].mention_count, 2);
}

#[test]
fn delete_entity_cascades_relations() {
    let env = TestEnv::new();

    TestDataFactory::create_person(&env.kg, "A");
    TestDataFactory::create_person(&env.kg, "B");
    TestDataFactory::link(&env.kg, "A", EntityType::Person, "B", EntityType::Person, "knows");

    let stats_before = env.kg.stats().unwrap();
    assert_eq!(stats_before.total_entities, 2);
    assert_eq!(stats_before.total_relations, 1);

    let a = env.kg.query(Some("A"), None, None, 1, 0).unwrap().entities.remove(0);
    let deleted = env.kg.delete_entity(EntityRef::Id(a.id)).unwrap();
    assert!(deleted);

    let stats_after = env.kg.stats().unwrap();
    assert_eq!(stats_after.total_entities, 1);
    assert_eq!(stats_after.total_relations, 0);
}

#[test]
fn neighbors_bfs_grows_monotonically_with_hop_limit() {
    let env = TestEnv::new();

    for name in ["A", "B", "C", "D"] {
        TestDataFactory::create_person(&env.kg, name);
    }
    TestDataFactory::link(&env.kg, "A", EntityType::Person, "B", EntityType::Person, "r1");
    TestDataFactory::link(&env.kg, "B", EntityType::Person, "C", EntityType::Person, "r2");
    TestDataFactory::link(&env.kg, "C", EntityType::Person, "D", EntityType::Person, "r3");

    let a = env.kg.query(Some("A"), None, None, 1, 0).unwrap().entities.remove(0);

    let two_hop = env.kg.neighbors(EntityRef::Id(a.id), 2, None).unwrap().unwrap();
    let names_two: Vec<&str> = two_hop.iter().map(|(e, _)| e.name.as_str()).collect();
    assert!(names_two.contains(&"B"));
    assert!(names_two.contains(&"C"));
    assert!(!names_two.contains(&"D"));

    let three_hop = env.kg.neighbors(EntityRef::Id(a.id), 3, None).unwrap().unwrap();
    let names_three: Vec<&str> = three_hop.iter().map(|(e, _)| e.name.as_str()).collect();
    for name in &names_two {
        assert!(names_three.contains(name));
    }
    assert!(names_three.contains(&"D"));
}
