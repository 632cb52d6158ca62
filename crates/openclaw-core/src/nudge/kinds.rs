//! The five nudge kinds and the rule that produces each of them.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use rusqlite::{params, Transaction};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::kg::EntityType;

use super::config::NudgeConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NudgeKind {
    FollowUp,
    TravelPrep,
    StaleProject,
    Birthday,
    RelationshipInsight,
}

impl NudgeKind {
    pub fn config_key(self) -> &'static str {
        match self {
            NudgeKind::FollowUp => "follow_up",
            NudgeKind::TravelPrep => "travel_prep",
            NudgeKind::StaleProject => "stale_project",
            NudgeKind::Birthday => "birthday",
            NudgeKind::RelationshipInsight => "relationship_insight",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nudge {
    pub kind: NudgeKind,
    pub entity_id: i64,
    pub entity_name: String,
    pub message: String,
    pub priority: i64,
    pub urgency_days: Option<i64>,
}

fn days_since(last_mentioned: DateTime<Utc>, now: DateTime<Utc>) -> i64 {
    (now - last_mentioned).num_days()
}

/// People whose strongest relation clears `min_strength_for_followup`, or who
/// have no relations at all, but who haven't been mentioned in
/// `stale_thresholds_days["person"]` days. The graph owner is never nudged
/// about themself.
pub fn check_followups(tx: &Transaction, config: &NudgeConfig, now: DateTime<Utc>) -> Result<Vec<Nudge>> {
    let threshold = *config.stale_thresholds_days.get("person").unwrap_or(&14);
    let mut stmt = tx.prepare(
        "SELECT e.id, e.name, e.last_mentioned,
                (SELECT MAX(r.strength) FROM kg_relations r
                 WHERE r.source_id = e.id OR r.target_id = e.id) AS max_strength
         FROM kg_entities e
         WHERE e.type = 'person' AND e.name != ?1",
    )?;
    let rows = stmt.query_map(params![config.owner_name], |row| {
        let id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        let last_mentioned_raw: String = row.get(2)?;
        let max_strength: Option<f64> = row.get(3)?;
        Ok((id, name, last_mentioned_raw, max_strength))
    })?;

    let mut nudges = Vec::new();
    for row in rows {
        let (id, name, last_mentioned_raw, max_strength) = row?;
        if let Some(strength) = max_strength {
            if strength < config.min_strength_for_followup {
                continue;
            }
        }
        let last_mentioned = crate::clock::parse_ts(&last_mentioned_raw).unwrap_or(now);
        let days = days_since(last_mentioned, now);
        if days >= threshold {
            nudges.push(Nudge {
                kind: NudgeKind::FollowUp,
                entity_id: id,
                entity_name: name.clone(),
                message: format!("You haven't checked in with {name} in {days} days."),
                priority: *config.priority_weights.get("follow_up").unwrap_or(&7),
                urgency_days: Some(days),
            });
        }
    }
    Ok(nudges)
}

/// Events carrying a `metadata.start_date` field within `travel_alert_days`
/// of `now`. Matches the earliest (smallest) configured threshold the event
/// still falls within, then stops, an event 2 days out should fire once,
/// at the `1`-day urgency, not once per threshold it has already cleared.
pub fn check_travel(tx: &Transaction, config: &NudgeConfig, now: DateTime<Utc>) -> Result<Vec<Nudge>> {
    let mut stmt = tx.prepare("SELECT id, name, metadata FROM kg_entities WHERE type = 'event'")?;
    let rows = stmt.query_map([], |row| {
        let id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        let metadata: String = row.get(2)?;
        Ok((id, name, metadata))
    })?;

    let mut sorted_thresholds = config.travel_alert_days.clone();
    sorted_thresholds.sort_unstable();

    let mut nudges = Vec::new();
    for row in rows {
        let (id, name, metadata_raw) = row?;
        let metadata: serde_json::Value = serde_json::from_str(&metadata_raw).unwrap_or(serde_json::Value::Null);
        let Some(date_str) = metadata.get("start_date").and_then(|v| v.as_str()) else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
            continue;
        };
        let days_until = (date - now.date_naive()).num_days();
        if days_until < 0 {
            continue;
        }
        for threshold in &sorted_thresholds {
            if days_until <= *threshold {
                let weight = *config.priority_weights.get("travel_prep").unwrap_or(&9);
                let bump = if days_until <= 1 {
                    3
                } else if days_until <= 3 {
                    1
                } else {
                    0
                };
                let priority = weight + bump;
                nudges.push(Nudge {
                    kind: NudgeKind::TravelPrep,
                    entity_id: id,
                    entity_name: name.clone(),
                    message: format!("{name} is {days_until} day(s) away, time to prep."),
                    priority,
                    urgency_days: Some(days_until),
                });
                break;
            }
        }
    }
    Ok(nudges)
}

/// Projects not mentioned in `stale_thresholds_days["project"]` days.
pub fn check_stale_projects(tx: &Transaction, config: &NudgeConfig, now: DateTime<Utc>) -> Result<Vec<Nudge>> {
    let threshold = *config.stale_thresholds_days.get("project").unwrap_or(&10);
    let entities = crate::kg::stale(tx, threshold, Some(EntityType::Project))?;
    Ok(entities
        .into_iter()
        .map(|decorated| {
            let e = decorated.entity;
            let days = days_since(e.last_mentioned, now);
            Nudge {
                kind: NudgeKind::StaleProject,
                entity_id: e.id,
                entity_name: e.name.clone(),
                message: format!("{} hasn't moved in {days} days.", e.name),
                priority: *config.priority_weights.get("stale_project").unwrap_or(&6),
                urgency_days: Some(days),
            }
        })
        .collect())
}

/// People with a `metadata.important_dates.birthday` field (`"MM-DD"`)
/// within `birthday_alert_days` of today. An unparsable or
/// Feb-29-on-a-non-leap-year birthday is skipped for that entity rather
/// than failing the whole rule.
pub fn check_birthdays(tx: &Transaction, config: &NudgeConfig, now: DateTime<Utc>) -> Result<Vec<Nudge>> {
    let mut stmt = tx.prepare("SELECT id, name, metadata FROM kg_entities WHERE type = 'person'")?;
    let rows = stmt.query_map([], |row| {
        let id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        let metadata: String = row.get(2)?;
        Ok((id, name, metadata))
    })?;

    let today = now.date_naive();
    let mut nudges = Vec::new();
    for row in rows {
        let (id, name, metadata_raw) = row?;
        let metadata: serde_json::Value = serde_json::from_str(&metadata_raw).unwrap_or(serde_json::Value::Null);
        let Some(bday) = metadata
            .get("important_dates")
            .and_then(|v| v.get("birthday"))
            .and_then(|v| v.as_str())
        else {
            continue;
        };
        let Some((month, day)) = bday.split_once('-').and_then(|(m, d)| {
            Some((m.parse::<u32>().ok()?, d.parse::<u32>().ok()?))
        }) else {
            continue;
        };

        let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
        let next_occurrence = match this_year {
            Some(d) if d >= today => Some(d),
            Some(_) => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
            None => continue, // e.g. Feb 29 on a non-leap year
        };
        let Some(next_occurrence) = next_occurrence else { continue };

        let days_until = (next_occurrence - today).num_days();
        if days_until <= config.birthday_alert_days {
            nudges.push(Nudge {
                kind: NudgeKind::Birthday,
                entity_id: id,
                entity_name: name.clone(),
                message: format!("{name}'s birthday is in {days_until} day(s)."),
                priority: *config.priority_weights.get("birthday").unwrap_or(&10),
                urgency_days: Some(days_until),
            });
        }
    }
    Ok(nudges)
}

/// Upcoming events (within 30 days) carrying a `metadata.location`: each
/// location is tokenized and matched against `place` entities by
/// case-insensitive substring, then every `person` connected to a matched
/// place via a relation (other than the owner) is surfaced as someone worth
/// reaching out to before the trip. One nudge per matched place.
pub fn check_relationship_insights(tx: &Transaction, config: &NudgeConfig, now: DateTime<Utc>) -> Result<Vec<Nudge>> {
    let mut stmt = tx.prepare("SELECT id, name, metadata FROM kg_entities WHERE type = 'event'")?;
    let rows = stmt.query_map([], |row| {
        let id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        let metadata: String = row.get(2)?;
        Ok((id, name, metadata))
    })?;

    let mut nudges = Vec::new();
    for row in rows {
        let (event_id, event_name, metadata_raw) = row?;
        let metadata: serde_json::Value = serde_json::from_str(&metadata_raw).unwrap_or(serde_json::Value::Null);
        let Some(date_str) = metadata.get("start_date").and_then(|v| v.as_str()) else {
            continue;
        };
        let Some(location) = metadata.get("location").and_then(|v| v.as_str()) else {
            continue;
        };
        let Ok(date) = NaiveDate::parse_from_str(date_str, "%Y-%m-%d") else {
            continue;
        };
        let days_until = (date - now.date_naive()).num_days();
        if !(0..=30).contains(&days_until) {
            continue;
        }

        let words: Vec<String> = location
            .split(['→', ','])
            .flat_map(|part| part.split_whitespace())
            .map(|w| w.to_lowercase())
            .filter(|w| w.len() > 2)
            .collect();

        for word in &words {
            let pattern = format!("%{word}%");
            let mut place_stmt =
                tx.prepare("SELECT id FROM kg_entities WHERE type = 'place' AND LOWER(name) LIKE ?1")?;
            let place_ids: Vec<i64> =
                place_stmt.query_map(params![pattern], |row| row.get(0))?.collect::<rusqlite::Result<_>>()?;

            for place_id in place_ids {
                let mut person_stmt = tx.prepare(
                    "SELECT DISTINCT p.name FROM kg_entities p
                     JOIN kg_relations r ON (r.source_id = p.id AND r.target_id = ?1)
                                         OR (r.target_id = p.id AND r.source_id = ?1)
                     WHERE p.type = 'person' AND p.name != ?2",
                )?;
                let names: Vec<String> = person_stmt
                    .query_map(params![place_id, config.owner_name], |row| row.get(0))?
                    .collect::<rusqlite::Result<_>>()?;

                if names.is_empty() {
                    continue;
                }
                let destination = title_case(word);
                nudges.push(Nudge {
                    kind: NudgeKind::RelationshipInsight,
                    entity_id: event_id,
                    entity_name: event_name.clone(),
                    message: format!(
                        "You know {} people near {destination}: {}",
                        names.len(),
                        names.join(", ")
                    ),
                    priority: *config.priority_weights.get("relationship_insight").unwrap_or(&5),
                    urgency_days: Some(days_until),
                });
            }
        }
    }
    Ok(nudges)
}

/// A stale person decorated for the relationship review view: their
/// strongest relation, how long since they were last mentioned, and a
/// handful of who they're connected to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaleContact {
    pub entity_id: i64,
    pub name: String,
    pub notes: String,
    pub last_mentioned: DateTime<Utc>,
    pub days_stale: i64,
    pub mention_count: i64,
    pub strength: f64,
    pub connected_to: Vec<String>,
}

/// Up to five people ranked by `(strength DESC, last_mentioned ASC)`,
/// relationless people sort after everyone with a relation. The graph
/// owner never appears.
pub fn stale_contacts(tx: &Transaction, config: &NudgeConfig, now: DateTime<Utc>) -> Result<Vec<StaleContact>> {
    let mut stmt = tx.prepare(
        "SELECT e.id, e.name, e.notes, e.last_mentioned, e.mention_count,
                (SELECT MAX(r.strength) FROM kg_relations r
                 WHERE r.source_id = e.id OR r.target_id = e.id) AS max_strength
         FROM kg_entities e
         WHERE e.type = 'person' AND e.name != ?1
         ORDER BY max_strength DESC, e.last_mentioned ASC
         LIMIT 5",
    )?;
    let rows = stmt.query_map(params![config.owner_name], |row| {
        let id: i64 = row.get(0)?;
        let name: String = row.get(1)?;
        let notes: String = row.get(2)?;
        let last_mentioned_raw: String = row.get(3)?;
        let mention_count: i64 = row.get(4)?;
        let max_strength: Option<f64> = row.get(5)?;
        Ok((id, name, notes, last_mentioned_raw, mention_count, max_strength))
    })?;

    let mut contacts = Vec::new();
    for row in rows {
        let (id, name, notes, last_mentioned_raw, mention_count, max_strength) = row?;
        let last_mentioned = crate::clock::parse_ts(&last_mentioned_raw).unwrap_or(now);
        let days_stale = days_since(last_mentioned, now);

        let mut conn_stmt = tx.prepare(
            "SELECT DISTINCT t.name FROM kg_relations r
             JOIN kg_entities t ON t.id = CASE WHEN r.source_id = ?1 THEN r.target_id ELSE r.source_id END
             WHERE r.source_id = ?1 OR r.target_id = ?1
             LIMIT 5",
        )?;
        let connected_to: Vec<String> =
            conn_stmt.query_map(params![id], |row| row.get(0))?.collect::<rusqlite::Result<_>>()?;

        contacts.push(StaleContact {
            entity_id: id,
            name,
            notes,
            last_mentioned,
            days_stale,
            mention_count,
            strength: max_strength.unwrap_or(0.0),
            connected_to,
        });
    }
    Ok(contacts)
}

fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// `true` when `now` (in the caller's local time, as `hour`) falls inside
/// the configured quiet-hours window. `start > end` means the window wraps
/// past midnight (e.g. 23 → 8 covers 23:00 through 07:59).
pub fn is_quiet_hours(hour: u32, config: &NudgeConfig) -> bool {
    let (start, end) = (config.quiet_hours.start, config.quiet_hours.end);
    if start > end {
        hour >= start || hour < end
    } else {
        hour >= start && hour < end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_hours_wraps_past_midnight() {
        let config = NudgeConfig::default(); // 23 -> 8
        assert!(is_quiet_hours(23, &config));
        assert!(is_quiet_hours(2, &config));
        assert!(!is_quiet_hours(8, &config));
        assert!(!is_quiet_hours(12, &config));
    }

    #[test]
    fn quiet_hours_non_wrapping_window() {
        let mut config = NudgeConfig::default();
        config.quiet_hours = super::super::config::QuietHours { start: 1, end: 6 };
        assert!(is_quiet_hours(3, &config));
        assert!(!is_quiet_hours(7, &config));
        assert!(!is_quiet_hours(0, &config));
    }
}
