use crate::models::period::WEEK_FORMAT;
use crate::models::snapshot::{SnapshotContent, SnapshotKey, SnapshotPayload, WeeklySnapshot};
use chrono::NaiveDate;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;
use thiserror::Error;

const DB_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("snapshot already exists for {0}")]
    AlreadyExists(String),
    #[error("corrupt snapshot payload {id}: {reason}")]
    CorruptPayload { id: String, reason: String },
    #[error("snapshot store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence contract for weekly snapshots. Rows are write-once.
pub trait SnapshotStore {
    fn get(&self, key: &SnapshotKey) -> Result<Option<WeeklySnapshot>, StoreError>;

    /// Fails with [`StoreError::AlreadyExists`] when the key is taken.
    fn create(&self, key: &SnapshotKey, content: SnapshotContent) -> Result<WeeklySnapshot, StoreError>;

    /// Up to `limit` snapshots, newest week first.
    fn list_recent(
        &self,
        github_user_id: &str,
        repo_scope: &str,
        limit: u32,
    ) -> Result<Vec<WeeklySnapshot>, StoreError>;

    /// Snapshots whose week starts within `[start, end]`, oldest week first.
    /// Without a user filter every user's rows for the scope are returned.
    fn list_range(
        &self,
        github_user_id: Option<&str>,
        repo_scope: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeeklySnapshot>, StoreError>;
}

fn key_label(key: &SnapshotKey) -> String {
    format!(
        "{}/{}/{}",
        key.github_user_id,
        key.week_start.format(WEEK_FORMAT),
        key.repo_scope
    )
}

fn new_snapshot(key: &SnapshotKey, content: SnapshotContent) -> WeeklySnapshot {
    WeeklySnapshot {
        id: uuid::Uuid::new_v4().to_string(),
        github_user_id: key.github_user_id.clone(),
        week_start: key.week_start,
        repo_scope: key.repo_scope.clone(),
        metrics: content.metrics,
        verdict: content.verdict,
        targets: content.targets,
        qualified: content.qualified,
        created_at: chrono::Utc::now().timestamp(),
    }
}

pub fn initialize_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "PRAGMA journal_mode = WAL;
         PRAGMA synchronous = NORMAL;",
    )?;

    let mut version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        apply_migration_1(conn)?;
        version = 1;
        conn.pragma_update(None, "user_version", version)?;
    }

    if version > DB_SCHEMA_VERSION {
        log::warn!("Snapshot database schema v{version} is newer than v{DB_SCHEMA_VERSION}");
    }

    Ok(())
}

fn apply_migration_1(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS weekly_snapshots (
            id TEXT PRIMARY KEY,
            github_user_id TEXT NOT NULL,
            week_start TEXT NOT NULL,
            repo_scope TEXT NOT NULL,
            payload_json TEXT NOT NULL,
            qualified INTEGER NOT NULL DEFAULT 0,
            created_at INTEGER NOT NULL,
            UNIQUE (github_user_id, week_start, repo_scope)
        );
        CREATE INDEX IF NOT EXISTS idx_weekly_snapshots_user_scope_week
            ON weekly_snapshots(github_user_id, repo_scope, week_start);
        CREATE INDEX IF NOT EXISTS idx_weekly_snapshots_scope_week
            ON weekly_snapshots(repo_scope, week_start);
        ",
    )
}

/// SQLite-backed snapshot store.
pub struct SqliteSnapshotStore {
    conn: Connection,
}

impl SqliteSnapshotStore {
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        conn.busy_timeout(Duration::from_secs(5))?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }

    fn query_snapshots(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<WeeklySnapshot>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, SnapshotRow::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        rows.into_iter().map(SnapshotRow::into_snapshot).collect()
    }
}

const SNAPSHOT_COLUMNS: &str =
    "id, github_user_id, week_start, repo_scope, payload_json, qualified, created_at";

struct SnapshotRow {
    id: String,
    github_user_id: String,
    week_start: String,
    repo_scope: String,
    payload_json: String,
    qualified: bool,
    created_at: i64,
}

impl SnapshotRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            github_user_id: row.get(1)?,
            week_start: row.get(2)?,
            repo_scope: row.get(3)?,
            payload_json: row.get(4)?,
            qualified: row.get::<_, i64>(5)? != 0,
            created_at: row.get(6)?,
        })
    }

    fn into_snapshot(self) -> Result<WeeklySnapshot, StoreError> {
        let corrupt = |reason: String| StoreError::CorruptPayload {
            id: self.id.clone(),
            reason,
        };

        let week_start = NaiveDate::parse_from_str(&self.week_start, WEEK_FORMAT)
            .map_err(|e| corrupt(format!("week_start '{}': {e}", self.week_start)))?;
        let payload: SnapshotPayload =
            serde_json::from_str(&self.payload_json).map_err(|e| corrupt(e.to_string()))?;
        payload.validate().map_err(corrupt)?;
        let (metrics, verdict, targets) = payload.into_parts();

        Ok(WeeklySnapshot {
            id: self.id,
            github_user_id: self.github_user_id,
            week_start,
            repo_scope: self.repo_scope,
            metrics,
            verdict,
            targets,
            qualified: self.qualified,
            created_at: self.created_at,
        })
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn get(&self, key: &SnapshotKey) -> Result<Option<WeeklySnapshot>, StoreError> {
        let row = self
            .conn
            .query_row(
                &format!(
                    "SELECT {SNAPSHOT_COLUMNS} FROM weekly_snapshots
                     WHERE github_user_id = ?1 AND week_start = ?2 AND repo_scope = ?3"
                ),
                params![
                    key.github_user_id,
                    key.week_start.format(WEEK_FORMAT).to_string(),
                    key.repo_scope
                ],
                SnapshotRow::from_row,
            )
            .optional()?;

        row.map(SnapshotRow::into_snapshot).transpose()
    }

    fn create(&self, key: &SnapshotKey, content: SnapshotContent) -> Result<WeeklySnapshot, StoreError> {
        let snapshot = new_snapshot(key, content);
        let payload = SnapshotPayload::current(snapshot.metrics, snapshot.verdict, snapshot.targets);
        let payload_json = serde_json::to_string(&payload).map_err(|e| StoreError::CorruptPayload {
            id: snapshot.id.clone(),
            reason: e.to_string(),
        })?;

        let inserted = self.conn.execute(
            "INSERT INTO weekly_snapshots (id, github_user_id, week_start, repo_scope, payload_json, qualified, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                snapshot.id,
                snapshot.github_user_id,
                snapshot.week_start.format(WEEK_FORMAT).to_string(),
                snapshot.repo_scope,
                payload_json,
                snapshot.qualified as i64,
                snapshot.created_at,
            ],
        );

        match inserted {
            Ok(_) => Ok(snapshot),
            Err(rusqlite::Error::SqliteFailure(err, _)) if err.code == ErrorCode::ConstraintViolation => {
                Err(StoreError::AlreadyExists(key_label(key)))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list_recent(
        &self,
        github_user_id: &str,
        repo_scope: &str,
        limit: u32,
    ) -> Result<Vec<WeeklySnapshot>, StoreError> {
        self.query_snapshots(
            &format!(
                "SELECT {SNAPSHOT_COLUMNS} FROM weekly_snapshots
                 WHERE github_user_id = ?1 AND repo_scope = ?2
                 ORDER BY week_start DESC
                 LIMIT ?3"
            ),
            &[&github_user_id, &repo_scope, &i64::from(limit)],
        )
    }

    fn list_range(
        &self,
        github_user_id: Option<&str>,
        repo_scope: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeeklySnapshot>, StoreError> {
        let start = start.format(WEEK_FORMAT).to_string();
        let end = end.format(WEEK_FORMAT).to_string();

        match github_user_id {
            Some(user) => self.query_snapshots(
                &format!(
                    "SELECT {SNAPSHOT_COLUMNS} FROM weekly_snapshots
                     WHERE github_user_id = ?1 AND repo_scope = ?2 AND week_start >= ?3 AND week_start <= ?4
                     ORDER BY week_start ASC, created_at ASC"
                ),
                &[&user, &repo_scope, &start, &end],
            ),
            None => self.query_snapshots(
                &format!(
                    "SELECT {SNAPSHOT_COLUMNS} FROM weekly_snapshots
                     WHERE repo_scope = ?1 AND week_start >= ?2 AND week_start <= ?3
                     ORDER BY week_start ASC, created_at ASC"
                ),
                &[&repo_scope, &start, &end],
            ),
        }
    }
}

/// Process-local store with the same contract; used for dry runs and tests.
#[derive(Debug, Default)]
pub struct InMemorySnapshotStore {
    rows: Mutex<BTreeMap<(String, String, NaiveDate), WeeklySnapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn with_rows<T>(
        &self,
        f: impl FnOnce(&mut BTreeMap<(String, String, NaiveDate), WeeklySnapshot>) -> T,
    ) -> Result<T, StoreError> {
        let mut rows = self
            .rows
            .lock()
            .map_err(|_| StoreError::Unavailable("snapshot lock poisoned".to_string()))?;
        Ok(f(&mut rows))
    }
}

impl SnapshotStore for InMemorySnapshotStore {
    fn get(&self, key: &SnapshotKey) -> Result<Option<WeeklySnapshot>, StoreError> {
        self.with_rows(|rows| {
            rows.get(&(key.github_user_id.clone(), key.repo_scope.clone(), key.week_start))
                .cloned()
        })
    }

    fn create(&self, key: &SnapshotKey, content: SnapshotContent) -> Result<WeeklySnapshot, StoreError> {
        let row_key = (key.github_user_id.clone(), key.repo_scope.clone(), key.week_start);
        self.with_rows(|rows| {
            if rows.contains_key(&row_key) {
                return Err(StoreError::AlreadyExists(key_label(key)));
            }
            let snapshot = new_snapshot(key, content);
            rows.insert(row_key, snapshot.clone());
            Ok(snapshot)
        })?
    }

    fn list_recent(
        &self,
        github_user_id: &str,
        repo_scope: &str,
        limit: u32,
    ) -> Result<Vec<WeeklySnapshot>, StoreError> {
        self.with_rows(|rows| {
            rows.values()
                .filter(|s| s.github_user_id == github_user_id && s.repo_scope == repo_scope)
                .rev()
                .take(limit as usize)
                .cloned()
                .collect()
        })
    }

    fn list_range(
        &self,
        github_user_id: Option<&str>,
        repo_scope: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<WeeklySnapshot>, StoreError> {
        self.with_rows(|rows| {
            let mut matched: Vec<WeeklySnapshot> = rows
                .values()
                .filter(|s| github_user_id.map_or(true, |user| s.github_user_id == user))
                .filter(|s| s.repo_scope == repo_scope && s.week_start >= start && s.week_start <= end)
                .cloned()
                .collect();
            matched.sort_by(|a, b| a.week_start.cmp(&b.week_start).then(a.created_at.cmp(&b.created_at)));
            matched
        })
    }
}
