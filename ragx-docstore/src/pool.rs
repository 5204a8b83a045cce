use std::ops::{Deref, DerefMut};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use log::debug;
use rusqlite::Connection;

use crate::errors::{StoreError, StoreResult};

/// How long a connection waits on a locked database before giving up.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

///
/// A small pool of SQLite connections to one database file.
///
/// `rusqlite::Connection` can move between threads but not be shared by them, so every
/// worker checks out a connection of its own. Returned connections are kept for reuse,
/// up to `max_idle` of them.
///
#[derive(Debug)]
pub struct ConnectionPool {
    path: PathBuf,
    idle: Mutex<Vec<Connection>>,
    max_idle: usize,
}

impl ConnectionPool {
    pub fn new<P: AsRef<Path>>(path: P, max_idle: usize) -> Self {
        ConnectionPool {
            path: path.as_ref().to_path_buf(),
            idle: Mutex::new(Vec::new()),
            max_idle: max_idle.max(1),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    ///
    /// Check out a connection, opening a new one when none is idle.
    ///
    pub fn get(&self) -> StoreResult<PooledConnection<'_>> {
        let reused = self.idle.lock().map_err(|_| StoreError::Poisoned)?.pop();
        let conn = match reused {
            Some(conn) => conn,
            None => self.connect()?,
        };

        Ok(PooledConnection {
            pool: self,
            conn: Some(conn),
        })
    }

    /// Number of connections currently waiting for reuse.
    pub fn idle_count(&self) -> usize {
        self.idle.lock().map(|idle| idle.len()).unwrap_or(0)
    }

    fn connect(&self) -> StoreResult<Connection> {
        debug!("opening sqlite connection to {}", self.path.display());
        let conn = Connection::open(&self.path).map_err(|e| StoreError::Connection {
            target: self.path.display().to_string(),
            reason: e.to_string(),
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(conn)
    }

    fn put_back(&self, conn: Connection) {
        if let Ok(mut idle) = self.idle.lock() {
            if idle.len() < self.max_idle {
                idle.push(conn);
            }
        }
    }
}

///
/// A connection on loan from a [`ConnectionPool`]; it goes back to the pool on drop.
///
pub struct PooledConnection<'a> {
    pool: &'a ConnectionPool,
    conn: Option<Connection>,
}

impl Deref for PooledConnection<'_> {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        self.conn
            .as_ref()
            .expect("pooled connection is only taken on drop")
    }
}

impl DerefMut for PooledConnection<'_> {
    fn deref_mut(&mut self) -> &mut Connection {
        self.conn
            .as_mut()
            .expect("pooled connection is only taken on drop")
    }
}

impl Drop for PooledConnection<'_> {
    fn drop(&mut self) {
        if let Some(conn) = self.conn.take() {
            self.pool.put_back(conn);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rstest::*;

    #[rstest]
    fn test_connections_are_reused() {
        let tempdir = tempfile::tempdir().unwrap();
        let pool = ConnectionPool::new(tempdir.path().join("pool.sqlite"), 2);

        assert_eq!(pool.idle_count(), 0);
        {
            let first = pool.get().unwrap();
            let second = pool.get().unwrap();
            let third = pool.get().unwrap();
            for conn in [&first, &second, &third] {
                let one: i64 = conn.query_row("SELECT 1", [], |row| row.get(0)).unwrap();
                assert_eq!(one, 1);
            }
        }
        // only max_idle connections are kept
        assert_eq!(pool.idle_count(), 2);

        let _again = pool.get().unwrap();
        assert_eq!(pool.idle_count(), 1);
    }

    #[rstest]
    fn test_unreachable_database() {
        let pool = ConnectionPool::new("/definitely/not/a/dir/db.sqlite", 1);
        assert!(matches!(pool.get(), Err(StoreError::Connection { .. })));
    }
}
