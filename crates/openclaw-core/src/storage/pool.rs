//! Storage Engine (C2): bounded connection pool over an embedded database.
//!
//! `acquire` hands back a verified-alive connection, creating a fresh one
//! when nothing idle is reusable. `release` (driven by `Drop`) only stashes
//! the connection back into the idle set when the pool isn't already full
//! and the connection survives a liveness probe; otherwise it's dropped and
//! closed. A connection released out of a panicking scope is always closed,
//! never reused.

use std::sync::Mutex;

use rusqlite::Connection;

use crate::error::Result;

/// Maximum number of idle connections the pool will hold onto.
pub const MAX_POOL_SIZE: usize = 5;

type Factory = Box<dyn Fn() -> rusqlite::Result<Connection> + Send + Sync>;

struct PoolInner {
    idle: Vec<Connection>,
    in_use: usize,
}

/// A bounded, mutex-protected set of reusable SQLite connections.
pub struct ConnectionPool {
    factory: Factory,
    inner: Mutex<PoolInner>,
}

impl ConnectionPool {
    pub fn new(factory: impl Fn() -> rusqlite::Result<Connection> + Send + Sync + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            inner: Mutex::new(PoolInner {
                idle: Vec::with_capacity(MAX_POOL_SIZE),
                in_use: 0,
            }),
        }
    }

    /// Acquire a connection, reusing an idle one if it's still alive.
    pub fn acquire(&self) -> Result<PooledConnection<'_>> {
        let mut inner = self.inner.lock().expect("connection pool mutex poisoned");
        while let Some(conn) = inner.idle.pop() {
            if is_alive(&conn) {
                inner.in_use += 1;
                return Ok(PooledConnection {
                    conn: Some(conn),
                    pool: self,
                });
            }
            // Dead connection, drop it and try the next idle candidate.
        }
        inner.in_use += 1;
        drop(inner);

        let conn = (self.factory)()?;
        Ok(PooledConnection {
            conn: Some(conn),
            pool: self,
        })
    }

    /// Number of connections currently checked out. Exposed for diagnostics
    /// and tests of the pool invariant, not used on the hot path.
    pub fn in_use(&self) -> usize {
        self.inner.lock().expect("connection pool mutex poisoned").in_use
    }

    /// Number of idle connections currently held.
    pub fn idle_count(&self) -> usize {
        self.inner.lock().expect("connection pool mutex poisoned").idle.len()
    }

    /// Drain both the idle and in-use accounting. Any idle connections are
    /// dropped (closing them); in-use connections close themselves when
    /// their scope ends since they no longer have a pool slot to return to.
    pub fn close_all(&self) {
        let mut inner = self.inner.lock().expect("connection pool mutex poisoned");
        inner.idle.clear();
    }

    fn release(&self, conn: Option<Connection>, panicking: bool) {
        let mut inner = self.inner.lock().expect("connection pool mutex poisoned");
        inner.in_use = inner.in_use.saturating_sub(1);
        if let Some(conn) = conn {
            if !panicking && inner.idle.len() < MAX_POOL_SIZE && is_alive(&conn) {
                inner.idle.push(conn);
            }
            // Otherwise `conn` is dropped here, closing it.
        }
    }

    /// Run `f` inside a single cursor scope: a transaction on a
    /// pool-acquired connection, committed on success, rolled back on
    /// error, with the connection released on every exit path.
    pub fn with_scope<T>(&self, f: impl FnOnce(&rusqlite::Transaction) -> Result<T>) -> Result<T> {
        let mut pooled = self.acquire()?;
        let tx = pooled.conn_mut().transaction()?;
        let result = f(&tx);
        match result {
            Ok(value) => {
                tx.commit()?;
                Ok(value)
            }
            Err(e) => {
                let _ = tx.rollback();
                Err(e)
            }
        }
    }
}

fn is_alive(conn: &Connection) -> bool {
    conn.query_row("SELECT 1", [], |_| Ok(())).is_ok()
}

/// A connection checked out of a [`ConnectionPool`]. Returned to the pool
/// (or closed) when dropped.
pub struct PooledConnection<'p> {
    conn: Option<Connection>,
    pool: &'p ConnectionPool,
}

impl PooledConnection<'_> {
    pub fn conn_mut(&mut self) -> &mut Connection {
        self.conn.as_mut().expect("pooled connection already released")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        let conn = self.conn.take();
        self.pool.release(conn, std::thread::panicking());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn memory_pool() -> ConnectionPool {
        ConnectionPool::new(|| Connection::open_in_memory())
    }

    #[test]
    fn acquire_and_release_keeps_pool_within_bound() {
        let pool = memory_pool();
        for _ in 0..(MAX_POOL_SIZE + 3) {
            let _c = pool.acquire().unwrap();
        }
        assert_eq!(pool.in_use(), 0);
        assert!(pool.idle_count() <= MAX_POOL_SIZE);
    }

    #[test]
    fn in_use_tracks_live_borrows() {
        let pool = memory_pool();
        let a = pool.acquire().unwrap();
        let b = pool.acquire().unwrap();
        assert_eq!(pool.in_use(), 2);
        drop(a);
        drop(b);
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn scope_commits_on_success_and_rolls_back_on_error() {
        let pool = memory_pool();
        pool.with_scope(|tx| {
            tx.execute_batch("CREATE TABLE t(x INTEGER)")?;
            Ok(())
        })
        .unwrap();

        let err: Result<()> = pool.with_scope(|tx| {
            tx.execute("INSERT INTO t(x) VALUES (1)", [])?;
            Err(crate::error::Error::invalid_input("boom"))
        });
        assert!(err.is_err());

        pool.with_scope(|tx| {
            let count: i64 = tx.query_row("SELECT COUNT(*) FROM t", [], |r| r.get(0))?;
            assert_eq!(count, 0);
            Ok(())
        })
        .unwrap();
    }

    #[test]
    fn close_all_drains_idle_set() {
        let pool = memory_pool();
        let _ = pool.acquire().unwrap();
        assert_eq!(pool.idle_count(), 1);
        pool.close_all();
        assert_eq!(pool.idle_count(), 0);
    }
}
