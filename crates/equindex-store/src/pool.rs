//! DuckDB connection handling.
//!
//! All handles share one database instance via `try_clone`, so readers and
//! the single writer coexist inside one process without fighting over the
//! file lock.

use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use duckdb::Connection;

struct PoolInner {
    db_path: PathBuf,
    seed: Mutex<Connection>,
    idle: Mutex<Vec<Connection>>,
    max_idle: usize,
}

/// Pool of cloned connections over a single database instance.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    /// Open the database file and seed the pool.
    pub fn open(path: impl Into<PathBuf>, max_idle: usize) -> Result<Self, duckdb::Error> {
        let db_path = path.into();
        let seed = Connection::open(&db_path)?;
        Ok(Self {
            inner: Arc::new(PoolInner {
                db_path,
                seed: Mutex::new(seed),
                idle: Mutex::new(Vec::new()),
                max_idle: max_idle.max(1),
            }),
        })
    }

    /// Acquire a connection, cloning from the seed when the pool is empty.
    ///
    /// # Panics
    /// Panics if a pool mutex is poisoned (a previous panic while holding it).
    pub fn acquire(&self) -> Result<PooledConnection, duckdb::Error> {
        let recycled = self
            .inner
            .idle
            .lock()
            .expect("connection pool mutex poisoned")
            .pop();

        let connection = match recycled {
            Some(connection) => connection,
            None => self
                .inner
                .seed
                .lock()
                .expect("connection pool mutex poisoned")
                .try_clone()?,
        };

        Ok(PooledConnection {
            pool: Arc::clone(&self.inner),
            connection: Some(connection),
        })
    }

    pub fn db_path(&self) -> &Path {
        self.inner.db_path.as_path()
    }
}

/// Connection that returns to the pool when dropped.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    connection: Option<Connection>,
}

impl Deref for PooledConnection {
    type Target = Connection;

    fn deref(&self) -> &Self::Target {
        self.connection
            .as_ref()
            .expect("pooled connection unexpectedly missing")
    }
}

impl DerefMut for PooledConnection {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.connection
            .as_mut()
            .expect("pooled connection unexpectedly missing")
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(connection) = self.connection.take() else {
            return;
        };

        let mut idle = self
            .pool
            .idle
            .lock()
            .expect("connection pool mutex poisoned");
        if idle.len() < self.pool.max_idle {
            idle.push(connection);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn acquired_connections_share_one_database() {
        let temp = tempdir().expect("tempdir");
        let pool = ConnectionPool::open(temp.path().join("pool.duckdb"), 2).expect("open");

        {
            let conn = pool.acquire().expect("acquire");
            conn.execute_batch("CREATE TABLE t (id INTEGER); INSERT INTO t VALUES (1);")
                .expect("create");
        }

        let conn = pool.acquire().expect("acquire");
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .expect("count");
        assert_eq!(count, 1);
    }
}
