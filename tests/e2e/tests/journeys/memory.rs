//! End-to-end journeys over semantic memory: hybrid search degrades
//! gracefully to keyword/cosine ranking without a compiled vector index,
//! and scores stay ordered and filterable.

use openclaw_e2e_tests::harness::db_manager::TestEnv;
use openclaw_e2e_tests::mocks::fixtures::TestDataFactory;
use openclaw_core::memory::SearchFilters;

#[test]
fn search_surfaces_the_most_relevant_memory_first() {
    let env = TestEnv::new();

    TestDataFactory::seed_memories(
        &env.memory,
        &[
            "User asked about Tesla stock price yesterday",
            "Travel plans to Islamorada",
        ],
    );

    let results = env.memory.search("Tesla", 2, SearchFilters::default()).unwrap();
    assert!(!results.is_empty());
    assert!(results[0].entry.text.contains("Tesla"));
    assert!(results[0].score > 0.0);

    for pair in results.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}

#[test]
fn search_respects_session_filter() {
    let env = TestEnv::new();

    env.memory
        .store("Discussed the roadmap for Q3", serde_json::Value::Null, Some("session-a".to_string()), "conversation")
        .unwrap();
    env.memory
        .store("Discussed the roadmap for Q3", serde_json::Value::Null, Some("session-b".to_string()), "conversation")
        .unwrap();

    let filtered = env
        .memory
        .search(
            "roadmap",
            5,
            SearchFilters {
                session_id: Some("session-a".to_string()),
                memory_type: None,
                min_score: 0.0,
            },
        )
        .unwrap();

    assert!(filtered.iter().all(|r| r.entry.session_id.as_deref() == Some("session-a")));
}

#[test]
fn get_recent_returns_newest_first() {
    let env = TestEnv::new();

    let ids = TestDataFactory::seed_memories(
        &env.memory,
        &["first memory", "second memory", "third memory"],
    );

    let recent = env.memory.get_recent(10).unwrap();
    assert_eq!(recent.len(), ids.len());
}
