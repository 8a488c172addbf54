//! Test cases stored in a local SQLite database.
//!
//! `rusqlite` is blocking, so every statement runs on the blocking pool while
//! holding the connection mutex.

use crate::domain::model::{TestCase, TestCaseFilter, TestCaseId, TestCaseStatus, TestCaseUpdate};
use crate::domain::ports::{TestCaseCommandGateway, TestCaseQueryGateway};
use crate::domain::source::Source;
use crate::utils::error::{Result, ServiceError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, Row};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::task;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS test_cases (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    status TEXT NOT NULL,
    priority TEXT,
    labels TEXT NOT NULL DEFAULT '[]',
    updated_at TEXT
);
CREATE INDEX IF NOT EXISTS idx_test_cases_status ON test_cases(status);
"#;

const SELECT_COLUMNS: &str = "SELECT id, title, status, priority, labels, updated_at FROM test_cases";

#[derive(Clone)]
pub struct SqliteTestCaseGateway {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteTestCaseGateway {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let conn = task::spawn_blocking(move || -> Result<Connection> {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let conn = Connection::open(&path)?;
            conn.execute_batch(SCHEMA)?;
            Ok(conn)
        })
        .await
        .map_err(join_error)??;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Inserts a new row; an existing id is a conflict.
    pub async fn insert(&self, test_case: TestCase) -> Result<()> {
        self.with_conn(move |conn, _| {
            let labels = serde_json::to_string(&test_case.labels)?;
            conn.execute(
                "INSERT INTO test_cases (id, title, status, priority, labels, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    test_case.id.as_str(),
                    test_case.title,
                    test_case.status.as_str(),
                    test_case.priority,
                    labels,
                    test_case.updated_at.map(|ts| ts.to_rfc3339()),
                ],
            )
            .map_err(|e| map_constraint(e, &test_case.id))?;
            Ok(())
        })
        .await
    }

    /// Runs `f` on the blocking pool. Dropping the returned future aborts a task
    /// that has not started and flags a running one so it stops before committing.
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection, &Cancellation) -> Result<T> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let cancellation = Cancellation::default();
        let flag = cancellation.clone();

        let handle = task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| ServiceError::integration(Source::Database, "connection lock poisoned"))?;
            flag.check()?;
            f(&mut guard, &flag)
        });

        let mut on_drop = CancelOnDrop {
            cancellation,
            abort: handle.abort_handle(),
            finished: false,
        };
        let result = handle.await.map_err(join_error);
        on_drop.finished = true;
        result?
    }

    /// Reads, changes and writes back one row inside a transaction.
    async fn mutate<F>(&self, id: &TestCaseId, change: F) -> Result<TestCase>
    where
        F: FnOnce(&mut TestCase) -> Result<()> + Send + 'static,
    {
        let id = id.clone();
        self.with_conn(move |conn, cancellation| {
            let tx = conn.transaction()?;
            let mut test_case = select_one(&tx, &id)?.ok_or_else(|| ServiceError::not_found(&id))?;

            change(&mut test_case)?;

            let labels = serde_json::to_string(&test_case.labels)?;
            tx.execute(
                "UPDATE test_cases SET title = ?2, status = ?3, priority = ?4, labels = ?5, updated_at = ?6 WHERE id = ?1",
                params![
                    test_case.id.as_str(),
                    test_case.title,
                    test_case.status.as_str(),
                    test_case.priority,
                    labels,
                    test_case.updated_at.map(|ts| ts.to_rfc3339()),
                ],
            )
            .map_err(|e| map_constraint(e, &id))?;

            // 呼叫端已放棄時直接返回，tx 被 drop 即 rollback
            cancellation.check()?;
            tx.commit()?;

            Ok(test_case)
        })
        .await
    }
}

/// Set once the future awaiting a blocking task has been dropped.
#[derive(Clone, Default)]
struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    fn check(&self) -> Result<()> {
        if self.0.load(Ordering::SeqCst) {
            return Err(ServiceError::integration(Source::Database, "operation cancelled"));
        }
        Ok(())
    }
}

struct CancelOnDrop {
    cancellation: Cancellation,
    abort: task::AbortHandle,
    finished: bool,
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if !self.finished {
            self.cancellation.cancel();
            self.abort.abort();
        }
    }
}

fn join_error(e: task::JoinError) -> ServiceError {
    ServiceError::integration(Source::Database, format!("blocking task failed: {}", e))
}

fn map_constraint(e: rusqlite::Error, id: &TestCaseId) -> ServiceError {
    match e.sqlite_error_code() {
        Some(ErrorCode::ConstraintViolation) => ServiceError::conflict(id, e.to_string()),
        _ => ServiceError::DatabaseError(e),
    }
}

fn select_one(conn: &Connection, id: &TestCaseId) -> Result<Option<TestCase>> {
    let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
    let raw = conn
        .query_row(&sql, params![id.as_str()], RawRow::read)
        .optional()?;
    raw.map(RawRow::into_test_case).transpose()
}

struct RawRow {
    id: String,
    title: String,
    status: String,
    priority: Option<String>,
    labels: String,
    updated_at: Option<String>,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            status: row.get(2)?,
            priority: row.get(3)?,
            labels: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    fn into_test_case(self) -> Result<TestCase> {
        let status = TestCaseStatus::parse(&self.status).ok_or_else(|| {
            ServiceError::integration(
                Source::Database,
                format!("row {} has unknown status '{}'", self.id, self.status),
            )
        })?;
        let labels: Vec<String> = serde_json::from_str(&self.labels)?;
        let updated_at = self
            .updated_at
            .as_deref()
            .map(DateTime::parse_from_rfc3339)
            .transpose()
            .map_err(|e| {
                ServiceError::integration(
                    Source::Database,
                    format!("row {} has invalid updated_at: {}", self.id, e),
                )
            })?
            .map(|ts| ts.with_timezone(&Utc));

        Ok(TestCase {
            id: TestCaseId::new(self.id),
            title: self.title,
            status,
            priority: self.priority,
            labels,
            updated_at,
        })
    }
}

#[async_trait]
impl TestCaseCommandGateway for SqliteTestCaseGateway {
    async fn activate(&self, id: &TestCaseId) -> Result<TestCase> {
        self.mutate(id, TestCase::activate).await
    }

    async fn deactivate(&self, id: &TestCaseId) -> Result<TestCase> {
        self.mutate(id, TestCase::deactivate).await
    }

    async fn update(&self, id: &TestCaseId, changes: &TestCaseUpdate) -> Result<TestCase> {
        let changes = changes.clone();
        self.mutate(id, move |tc| tc.apply(&changes)).await
    }
}

#[async_trait]
impl TestCaseQueryGateway for SqliteTestCaseGateway {
    async fn get(&self, id: &TestCaseId) -> Result<TestCase> {
        let id = id.clone();
        self.with_conn(move |conn, _| select_one(conn, &id)?.ok_or_else(|| ServiceError::not_found(&id)))
            .await
    }

    async fn list(&self, filter: &TestCaseFilter) -> Result<Vec<TestCase>> {
        let filter = filter.clone();
        self.with_conn(move |conn, _| {
            // Status is pushed down; label and title matching happen in memory.
            let (sql, status) = match filter.status {
                Some(status) => (
                    format!("{} WHERE status = ?1 ORDER BY id", SELECT_COLUMNS),
                    Some(status.as_str()),
                ),
                None => (format!("{} ORDER BY id", SELECT_COLUMNS), None),
            };

            let mut stmt = conn.prepare(&sql)?;
            let rows = match status {
                Some(status) => stmt
                    .query_map(params![status], RawRow::read)?
                    .collect::<rusqlite::Result<Vec<_>>>()?,
                None => stmt
                    .query_map([], RawRow::read)?
                    .collect::<rusqlite::Result<Vec<_>>>()?,
            };

            let test_cases = rows
                .into_iter()
                .map(RawRow::into_test_case)
                .collect::<Result<Vec<_>>>()?;
            Ok(filter.apply(test_cases))
        })
        .await
    }
}
