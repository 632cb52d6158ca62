//! Storage Engine (C2): bounded connection pools, migrations, and the
//! standard pragmas applied to every connection this crate opens.

mod pool;
mod migrations;

pub use pool::{ConnectionPool, MAX_POOL_SIZE, PooledConnection};
pub use migrations::{Migration, KG_MIGRATIONS, MEMORY_MIGRATIONS};

use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

/// Apply the standard per-connection pragmas: WAL journaling, foreign key
/// enforcement, a short busy timeout to absorb transient cross-connection
/// lock contention, and a relaxed synchronous level appropriate for a
/// single-machine personal store.
fn apply_pragmas(conn: &Connection) -> rusqlite::Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", true)?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(std::time::Duration::from_millis(5000))?;
    Ok(())
}

/// Open (creating if absent) the knowledge-graph database at `path` and
/// return a connection pool with its schema migrated to the latest version.
pub fn open_kg_pool(path: impl AsRef<Path>) -> Result<ConnectionPool> {
    open_pool(path, migrations::KG_MIGRATIONS)
}

/// Open (creating if absent) the semantic-memory database at `path` and
/// return a connection pool with its schema migrated to the latest version.
pub fn open_memory_pool(path: impl AsRef<Path>) -> Result<ConnectionPool> {
    open_pool(path, migrations::MEMORY_MIGRATIONS)
}

fn open_pool(path: impl AsRef<Path>, migrations: &'static [Migration]) -> Result<ConnectionPool> {
    let path = path.as_ref().to_path_buf();

    // Migrate eagerly on the opening connection so callers observe a fully
    // migrated schema before the pool hands out its first connection.
    let bootstrap = Connection::open(&path)?;
    apply_pragmas(&bootstrap)?;
    migrations::apply(&bootstrap, migrations)?;
    drop(bootstrap);

    let pool = ConnectionPool::new(move || {
        let conn = Connection::open(&path)?;
        apply_pragmas(&conn)?;
        Ok(conn)
    });
    Ok(pool)
}
