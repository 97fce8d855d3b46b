//! Connection plumbing shared by both SQLite-backed stores.
//!
//! Every store call runs on the blocking pool. A call either opens its own
//! connection and commits on its own, or runs on the connection owned by a
//! `Session`, which holds an open `BEGIN IMMEDIATE` transaction until it is
//! committed, aborted or dropped.

use crate::error::StoreError;
use log::{error, warn};
use rusqlite::{ffi, Connection};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

pub(crate) fn open_connection(path: &Path) -> Result<Connection, StoreError> {
    let conn = Connection::open(path)?;
    conn.busy_timeout(BUSY_TIMEOUT)?;
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    Ok(conn)
}

/// True for a UNIQUE or PRIMARY KEY violation. Other constraint failures,
/// such as a missing foreign key target, are not duplicates.
pub(crate) fn is_duplicate_key(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => matches!(
            e.extended_code,
            ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        ),
        _ => false,
    }
}

/// Runs `f` on the blocking thread pool and flattens the join error.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, StoreError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| StoreError::Join(e.to_string()))?
}

pub(crate) struct SessionConn {
    conn: Connection,
    active: bool,
}

/// Where a single store call gets its connection from.
pub(crate) enum Handle {
    Fresh(PathBuf),
    Session(Arc<Mutex<SessionConn>>),
}

impl Handle {
    pub(crate) async fn run<T, F>(self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
        T: Send + 'static,
    {
        run_blocking(move || match self {
            Handle::Fresh(path) => {
                let conn = open_connection(&path)?;
                f(&conn)
            }
            Handle::Session(shared) => {
                let guard = shared.lock().map_err(|_| StoreError::Poisoned)?;
                if !guard.active {
                    return Err(StoreError::SessionFinished);
                }
                f(&guard.conn)
            }
        })
        .await
    }
}

/// A dedicated connection with an open transaction.
pub(crate) struct Session {
    shared: Arc<Mutex<SessionConn>>,
}

impl Session {
    pub(crate) async fn begin(path: PathBuf) -> Result<Self, StoreError> {
        let conn = run_blocking(move || {
            let conn = open_connection(&path)?;
            conn.execute_batch("BEGIN IMMEDIATE;")?;
            Ok(conn)
        })
        .await?;

        Ok(Self {
            shared: Arc::new(Mutex::new(SessionConn { conn, active: true })),
        })
    }

    pub(crate) fn handle(&self) -> Handle {
        Handle::Session(Arc::clone(&self.shared))
    }

    pub(crate) async fn commit(self) -> Result<(), StoreError> {
        self.finish("COMMIT;").await
    }

    pub(crate) async fn abort(self) -> Result<(), StoreError> {
        self.finish("ROLLBACK;").await
    }

    async fn finish(self, statement: &'static str) -> Result<(), StoreError> {
        run_blocking(move || self.finish_blocking(statement)).await
    }

    fn finish_blocking(&self, statement: &str) -> Result<(), StoreError> {
        let mut guard = self.shared.lock().map_err(|_| StoreError::Poisoned)?;
        if !guard.active {
            return Err(StoreError::SessionFinished);
        }
        // A failed COMMIT may leave the transaction open; Drop rolls it back.
        guard.conn.execute_batch(statement)?;
        guard.active = false;
        Ok(())
    }
}

/// Commits `first`, then `second`, inside one blocking task.
///
/// Both sessions move into the task, so once it has started the pair is
/// finished even if the awaiting future is dropped. When `second` fails after
/// `first` committed, `compensate` runs before the error is returned.
pub(crate) async fn commit_pair<C>(
    first: Session,
    second: Session,
    compensate: C,
) -> Result<(), StoreError>
where
    C: FnOnce() -> Result<(), StoreError> + Send + 'static,
{
    run_blocking(move || {
        first.finish_blocking("COMMIT;")?;
        if let Err(e) = second.finish_blocking("COMMIT;") {
            error!("second commit failed after the first succeeded: {}", e);
            if let Err(undo) = compensate() {
                error!("compensation failed: {}", undo);
            }
            return Err(e);
        }
        Ok(())
    })
    .await
}

impl Drop for Session {
    fn drop(&mut self) {
        let Ok(mut guard) = self.shared.lock() else {
            return;
        };
        if guard.active {
            warn!("rolling back transaction of a session dropped before commit");
            if let Err(e) = guard.conn.execute_batch("ROLLBACK;") {
                warn!("rollback on drop failed: {}", e);
            }
            guard.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    fn setup(path: &Path) {
        open_connection(path)
            .unwrap()
            .execute_batch("CREATE TABLE t (v INTEGER);")
            .unwrap();
    }

    fn rows(path: &Path) -> i64 {
        open_connection(path)
            .unwrap()
            .query_row("SELECT COUNT(*) FROM t", [], |row| row.get(0))
            .unwrap()
    }

    async fn session_with_row(path: &Path) -> Session {
        let session = Session::begin(path.to_path_buf()).await.unwrap();
        session
            .handle()
            .run(|conn| {
                conn.execute_batch("INSERT INTO t (v) VALUES (1);")?;
                Ok(())
            })
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn commit_pair_commits_both() {
        let dir = TempDir::new().unwrap();
        let (a, b) = (dir.path().join("a.sqlite"), dir.path().join("b.sqlite"));
        setup(&a);
        setup(&b);

        let first = session_with_row(&a).await;
        let second = session_with_row(&b).await;
        commit_pair(first, second, || Ok(())).await.unwrap();

        assert_eq!((rows(&a), rows(&b)), (1, 1));
    }

    #[tokio::test]
    async fn failed_second_commit_runs_compensation() {
        let dir = TempDir::new().unwrap();
        let (a, b) = (dir.path().join("a.sqlite"), dir.path().join("b.sqlite"));
        setup(&a);
        setup(&b);

        let first = session_with_row(&a).await;
        let second = session_with_row(&b).await;
        // End the second transaction behind the session's back so its COMMIT fails.
        second
            .handle()
            .run(|conn| {
                conn.execute_batch("ROLLBACK;")?;
                Ok(())
            })
            .await
            .unwrap();

        let compensated = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&compensated);
        let err = commit_pair(first, second, move || {
            flag.store(true, Ordering::SeqCst);
            Ok(())
        })
        .await
        .unwrap_err();

        assert!(matches!(err, StoreError::Sqlite(_)));
        assert!(compensated.load(Ordering::SeqCst));
        assert_eq!((rows(&a), rows(&b)), (1, 0));
    }

    #[tokio::test]
    async fn commit_pair_finishes_after_the_caller_gives_up() {
        let dir = TempDir::new().unwrap();
        let (a, b) = (dir.path().join("a.sqlite"), dir.path().join("b.sqlite"));
        setup(&a);
        setup(&b);

        let first = session_with_row(&a).await;
        let second = session_with_row(&b).await;
        // Polled once, then dropped: the blocking task is already running.
        let _ = tokio::time::timeout(Duration::ZERO, commit_pair(first, second, || Ok(()))).await;

        let mut committed = (0, 0);
        for _ in 0..200 {
            committed = (rows(&a), rows(&b));
            if committed == (1, 1) {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(committed, (1, 1));
    }
}
