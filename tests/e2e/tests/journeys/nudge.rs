//! End-to-end journeys over the nudge engine: priority ordering, the
//! daily cap, and quiet-hours suppression.

use chrono::{TimeZone, Utc};
use openclaw_e2e_tests::harness::db_manager::TestEnv;
use openclaw_e2e_tests::mocks::fixtures::TestDataFactory;
use openclaw_core::nudge::NudgeConfig;

#[test]
fn check_all_orders_by_priority_and_respects_the_daily_cap() {
    let env = TestEnv::new();

    TestDataFactory::create_upcoming_event(&env.kg, "Tokyo trip", 1);
    TestDataFactory::create_person_with_birthday(&env.kg, "Sam", "01-02");

    let mut config = NudgeConfig::default();
    config.max_nudges_per_day = 2;
    config.quiet_hours.start = 23;
    config.quiet_hours.end = 5;

    let engine = env.nudge_engine(config);
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

    let nudges = engine.check_all(now).unwrap();
    assert!(nudges.len() <= 2);
    for pair in nudges.windows(2) {
        assert!(pair[0].priority >= pair[1].priority);
    }
}

#[test]
fn quiet_hours_suppress_every_nudge() {
    let env = TestEnv::new();

    TestDataFactory::create_upcoming_event(&env.kg, "Tokyo trip", 1);

    let mut config = NudgeConfig::default();
    config.quiet_hours.start = 10;
    config.quiet_hours.end = 14;

    let engine = env.nudge_engine(config);
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

    let nudges = engine.check_all(now).unwrap();
    assert!(nudges.is_empty());
}

#[test]
fn morning_briefing_ignores_quiet_hours_and_cap() {
    let env = TestEnv::new();

    TestDataFactory::create_upcoming_event(&env.kg, "Tokyo trip", 1);
    TestDataFactory::create_person_with_birthday(&env.kg, "Sam", "01-02");

    let mut config = NudgeConfig::default();
    config.quiet_hours.start = 0;
    config.quiet_hours.end = 23;
    config.max_nudges_per_day = 1;

    let engine = env.nudge_engine(config);
    let now = Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap();

    let briefing = engine.morning_briefing(now).unwrap();
    assert!(briefing.nudges.len() >= 2);
    assert!(briefing.counts_by_kind.values().sum::<i64>() as usize == briefing.nudges.len());
}
