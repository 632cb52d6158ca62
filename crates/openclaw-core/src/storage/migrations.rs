//! Schema migrations for the two databases this crate owns: the knowledge
//! graph store and the semantic memory store. Each gets its own
//! `schema_version` table and an ordered, append-only list of migrations
//! applied in a single batch per missing version.

use rusqlite::Connection;

/// A single schema migration.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub up: &'static str,
}

pub const KG_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "entities, relations, changelog, FTS5 index and sync triggers",
    up: KG_MIGRATION_V1_UP,
}];

const KG_MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS kg_entities (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    type TEXT NOT NULL CHECK(type IN (
        'person','org','project','place','event','topic','skill'
    )),
    metadata TEXT NOT NULL DEFAULT '{}',
    notes TEXT NOT NULL DEFAULT '',
    confidence REAL NOT NULL DEFAULT 0.8 CHECK(confidence >= 0 AND confidence <= 1),
    mention_count INTEGER NOT NULL DEFAULT 1,
    first_seen TEXT NOT NULL,
    last_seen TEXT NOT NULL,
    last_mentioned TEXT NOT NULL
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_entity_name_type
    ON kg_entities(name COLLATE NOCASE, type);

CREATE INDEX IF NOT EXISTS idx_entity_type ON kg_entities(type);
CREATE INDEX IF NOT EXISTS idx_entity_last_mentioned ON kg_entities(last_mentioned);

CREATE VIRTUAL TABLE IF NOT EXISTS kg_entities_fts USING fts5(
    name, notes, content=kg_entities, content_rowid=id
);

CREATE TRIGGER IF NOT EXISTS kg_entities_ai AFTER INSERT ON kg_entities BEGIN
    INSERT INTO kg_entities_fts(rowid, name, notes)
    VALUES (new.id, new.name, new.notes);
END;

CREATE TRIGGER IF NOT EXISTS kg_entities_ad AFTER DELETE ON kg_entities BEGIN
    INSERT INTO kg_entities_fts(kg_entities_fts, rowid, name, notes)
    VALUES ('delete', old.id, old.name, old.notes);
END;

CREATE TRIGGER IF NOT EXISTS kg_entities_au AFTER UPDATE ON kg_entities BEGIN
    INSERT INTO kg_entities_fts(kg_entities_fts, rowid, name, notes)
    VALUES ('delete', old.id, old.name, old.notes);
    INSERT INTO kg_entities_fts(rowid, name, notes)
    VALUES (new.id, new.name, new.notes);
END;

CREATE TABLE IF NOT EXISTS kg_relations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source_id INTEGER NOT NULL REFERENCES kg_entities(id) ON DELETE CASCADE,
    target_id INTEGER NOT NULL REFERENCES kg_entities(id) ON DELETE CASCADE,
    type TEXT NOT NULL,
    strength REAL NOT NULL DEFAULT 0.5 CHECK(strength >= 0 AND strength <= 1),
    metadata TEXT NOT NULL DEFAULT '{}',
    bidirectional INTEGER NOT NULL DEFAULT 0,
    last_confirmed TEXT NOT NULL,
    UNIQUE(source_id, target_id, type)
);

CREATE INDEX IF NOT EXISTS idx_rel_source ON kg_relations(source_id);
CREATE INDEX IF NOT EXISTS idx_rel_target ON kg_relations(target_id);
CREATE INDEX IF NOT EXISTS idx_rel_type ON kg_relations(type);

CREATE TABLE IF NOT EXISTS kg_changelog (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    ts TEXT NOT NULL,
    action TEXT NOT NULL,
    entity_id INTEGER,
    relation_id INTEGER,
    detail TEXT NOT NULL DEFAULT ''
);

CREATE INDEX IF NOT EXISTS idx_changelog_ts ON kg_changelog(ts);

-- Auto-prune changelog entries older than 90 days on each insert.
CREATE TRIGGER IF NOT EXISTS kg_changelog_prune AFTER INSERT ON kg_changelog BEGIN
    DELETE FROM kg_changelog
    WHERE ts < datetime('now', '-90 days');
END;

CREATE VIEW IF NOT EXISTS kg_entity_summary AS
SELECT
    e.id, e.name, e.type, e.confidence, e.mention_count,
    e.first_seen, e.last_seen, e.last_mentioned, e.notes,
    (SELECT COUNT(*) FROM kg_relations r
     WHERE r.source_id = e.id OR r.target_id = e.id) AS rel_count
FROM kg_entities e;

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

pub const MEMORY_MIGRATIONS: &[Migration] = &[Migration {
    version: 1,
    description: "memories table with FTS5 index and sync triggers",
    up: MEMORY_MIGRATION_V1_UP,
}];

const MEMORY_MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS memories (
    id TEXT PRIMARY KEY,
    text TEXT NOT NULL,
    embedding BLOB,
    metadata TEXT NOT NULL DEFAULT '{}',
    created_at TEXT NOT NULL,
    session_id TEXT,
    memory_type TEXT NOT NULL DEFAULT 'conversation'
);

CREATE VIRTUAL TABLE IF NOT EXISTS memories_fts USING fts5(
    text, content='memories', content_rowid='rowid'
);

CREATE TRIGGER IF NOT EXISTS memories_ai AFTER INSERT ON memories BEGIN
    INSERT INTO memories_fts(rowid, text) VALUES (new.rowid, new.text);
END;

CREATE TRIGGER IF NOT EXISTS memories_ad AFTER DELETE ON memories BEGIN
    INSERT INTO memories_fts(memories_fts, rowid, text) VALUES ('delete', old.rowid, old.text);
END;

CREATE TRIGGER IF NOT EXISTS memories_au AFTER UPDATE ON memories BEGIN
    INSERT INTO memories_fts(memories_fts, rowid, text) VALUES ('delete', old.rowid, old.text);
    INSERT INTO memories_fts(rowid, text) VALUES (new.rowid, new.text);
END;

CREATE INDEX IF NOT EXISTS idx_memories_session ON memories(session_id);
CREATE INDEX IF NOT EXISTS idx_memories_created ON memories(created_at);
CREATE INDEX IF NOT EXISTS idx_memories_type ON memories(memory_type);

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);
INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// Current applied schema version.
pub fn current_version(conn: &Connection) -> rusqlite::Result<u32> {
    conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |row| {
        row.get(0)
    })
    .or(Ok(0))
}

/// Apply every migration newer than the current version, in order.
pub fn apply(conn: &Connection, migrations: &[Migration]) -> rusqlite::Result<u32> {
    let current = current_version(conn)?;
    let mut applied = 0;
    for migration in migrations {
        if migration.version > current {
            tracing::info!(
                version = migration.version,
                description = migration.description,
                "applying migration"
            );
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }
    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kg_migrations_apply_cleanly() {
        let conn = Connection::open_in_memory().unwrap();
        let applied = apply(&conn, KG_MIGRATIONS).unwrap();
        assert_eq!(applied, 1);
        assert_eq!(current_version(&conn).unwrap(), 1);
        // Re-applying is a no-op.
        assert_eq!(apply(&conn, KG_MIGRATIONS).unwrap(), 0);
    }

    #[test]
    fn memory_migrations_apply_cleanly() {
        let conn = Connection::open_in_memory().unwrap();
        let applied = apply(&conn, MEMORY_MIGRATIONS).unwrap();
        assert_eq!(applied, 1);
        conn.execute(
            "INSERT INTO memories (id, text, created_at) VALUES ('a', 'hello world', '2026-01-01T00:00:00Z')",
            [],
        )
        .unwrap();
        let hits: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM memories_fts WHERE memories_fts MATCH 'hello'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(hits, 1);
    }
}
