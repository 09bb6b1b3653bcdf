//! Shared application state.
//!
//! # Invariants
//! - Exactly one SQLite connection is shared by all requests.
//! - Every store access holds the connection lock for its whole use-case,
//!   so enrollment read-then-write sequences never interleave.
//! - A use-case that panics does not wedge the server: the next caller
//!   reclaims the lock and rolls back any transaction left open.

use crate::error::ApiError;
use log::warn;
use rusqlite::Connection;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

#[derive(Clone)]
pub struct AppState {
    conn: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Wraps a migrated connection (see `healthrec_core::db::open_db`).
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Runs one blocking store operation on the blocking thread pool while
    /// holding the connection lock.
    pub async fn run<T, F>(&self, op: F) -> Result<T, ApiError>
    where
        F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = match conn.lock() {
                Ok(guard) => guard,
                Err(poisoned) => recover(&conn, poisoned)?,
            };
            op(&guard)
        })
        .await
        .map_err(|err| ApiError::Internal(format!("store task failed: {err}")))?
    }
}

// A use-case panicked while holding the lock; roll back whatever it left open.
fn recover<'a>(
    conn: &'a Mutex<Connection>,
    poisoned: PoisonError<MutexGuard<'a, Connection>>,
) -> Result<MutexGuard<'a, Connection>, ApiError> {
    conn.clear_poison();
    let guard = poisoned.into_inner();
    let open_transaction = !guard.is_autocommit();
    if open_transaction {
        guard
            .execute_batch("ROLLBACK;")
            .map_err(|err| ApiError::Store(format!("rollback after panic failed: {err}")))?;
    }
    warn!("event=db_lock module=api status=recovered reason=poisoned rolled_back={open_transaction}");
    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::AppState;
    use crate::error::ApiError;
    use healthrec_core::db::open_db_in_memory;

    #[tokio::test]
    async fn panicking_use_case_does_not_block_later_requests() {
        let state = AppState::new(open_db_in_memory().expect("in-memory db should open"));

        let failed = state
            .run(|conn| -> Result<(), ApiError> {
                conn.execute_batch("BEGIN; INSERT INTO programs (uuid, name) VALUES ('p-1', 'TB');")
                    .expect("insert should run");
                panic!("use-case failure");
            })
            .await;
        assert!(matches!(failed, Err(ApiError::Internal(_))));

        let autocommit = state
            .run(|conn| Ok(conn.is_autocommit()))
            .await
            .expect("lock should be reclaimed");
        assert!(autocommit);

        let programs: i64 = state
            .run(|conn| {
                conn.query_row("SELECT COUNT(*) FROM programs;", [], |row| row.get(0))
                    .map_err(|err| ApiError::Store(err.to_string()))
            })
            .await
            .expect("count should run after recovery");
        assert_eq!(programs, 0);
    }
}
