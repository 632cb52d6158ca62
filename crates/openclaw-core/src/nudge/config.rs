//! Config Surface (C8): a validated nudge-rule record plus a
//! deep-merge-over-defaults helper for layering user overrides onto
//! [`NudgeConfig::default`].

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuietHours {
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NudgeConfig {
    pub stale_thresholds_days: HashMap<String, i64>,
    pub travel_alert_days: Vec<i64>,
    pub birthday_alert_days: i64,
    pub quiet_hours: QuietHours,
    pub max_nudges_per_day: i64,
    pub priority_weights: HashMap<String, i64>,
    pub min_strength_for_followup: f64,
    /// Name of the graph owner, excluded from follow_up / relationship_insight
    /// projections so the owner never gets nudged about themself.
    pub owner_name: String,
}

impl Default for NudgeConfig {
    fn default() -> Self {
        let stale_thresholds_days = [
            ("person", 14),
            ("project", 10),
            ("org", 30),
            ("event", 7),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let priority_weights = [
            ("birthday", 10),
            ("travel_prep", 9),
            ("follow_up", 7),
            ("stale_project", 6),
            ("relationship_insight", 5),
            ("opportunity", 4),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        Self {
            stale_thresholds_days,
            travel_alert_days: vec![7, 3, 1],
            birthday_alert_days: 7,
            quiet_hours: QuietHours { start: 23, end: 8 },
            max_nudges_per_day: 5,
            priority_weights,
            min_strength_for_followup: 0.5,
            owner_name: "Adam McCargo".to_string(),
        }
    }
}

impl NudgeConfig {
    /// Apply `overrides` on top of the defaults. Nested maps merge
    /// key-by-key rather than replacing the whole object, matching the
    /// layering semantics a config file's partial overrides expect.
    pub fn with_overrides(overrides: &Value) -> crate::error::Result<Self> {
        let mut base = serde_json::to_value(Self::default())
            .expect("NudgeConfig always serializes");
        deep_merge(&mut base, overrides);
        serde_json::from_value(base)
            .map_err(|e| crate::error::Error::config_invalid(format!("invalid nudge config: {e}")))
    }
}

/// Recursively merge `overrides` into `base`. Scalars and arrays in
/// `overrides` replace the corresponding value in `base`; objects merge
/// key-by-key so a partial override doesn't erase sibling defaults.
pub fn deep_merge(base: &mut Value, overrides: &Value) {
    match (base, overrides) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            for (key, value) in override_map {
                deep_merge(base_map.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (base_slot, other) => {
            *base_slot = other.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_match_known_baseline() {
        let cfg = NudgeConfig::default();
        assert_eq!(cfg.stale_thresholds_days.get("person"), Some(&14));
        assert_eq!(cfg.travel_alert_days, vec![7, 3, 1]);
        assert_eq!(cfg.owner_name, "Adam McCargo");
    }

    #[test]
    fn partial_override_preserves_sibling_defaults() {
        let overrides = json!({ "stale_thresholds_days": { "person": 21 } });
        let cfg = NudgeConfig::with_overrides(&overrides).unwrap();
        assert_eq!(cfg.stale_thresholds_days.get("person"), Some(&21));
        assert_eq!(cfg.stale_thresholds_days.get("project"), Some(&10));
    }

    #[test]
    fn owner_name_is_overridable() {
        let overrides = json!({ "owner_name": "Taylor" });
        let cfg = NudgeConfig::with_overrides(&overrides).unwrap();
        assert_eq!(cfg.owner_name, "Taylor");
    }
}
