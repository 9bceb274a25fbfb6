//! SQLite persistence for shared layouts.
//!
//! The codec never sees the database and the store never inspects an
//! encoded string; records pass through as opaque text plus metadata.

use anyhow::Context;
use crossbars_protocol::{EncodedSlots, Layout, LayoutRecord};
use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis()
        .try_into()
        .unwrap_or(i64::MAX)
}

fn rfc3339(ms: i64) -> Option<String> {
    let ts = OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()?;
    ts.format(&Rfc3339).ok()
}

const RECORD_COLUMNS: &str = "id, title, description, job_id, is_pvp, layout, encoded_slots, author, hearts, created_at_ms, updated_at_ms";

#[derive(Debug, Clone)]
pub struct Store {
    db_path: PathBuf,
}

impl Store {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    pub fn open(&self) -> anyhow::Result<Connection> {
        let path = self.db_path.clone();
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create db dir: {}", dir.display()))?;
        }

        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("open sqlite db: {}", path.display()))?;

        // Durable + fast defaults.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        migrate(&conn)?;
        Ok(conn)
    }

    /// Inserts (`id` absent) or updates (`id` present) a layout. Returns
    /// the stored row, or `None` when updating an id that does not exist.
    pub fn save(&self, record: &LayoutRecord) -> anyhow::Result<Option<LayoutRecord>> {
        let conn = self.open()?;
        let ts = now_ms();

        let id = match record.id {
            Some(id) => {
                let n = conn
                    .execute(
                        "UPDATE layouts SET title = ?1, description = ?2, job_id = ?3, is_pvp = ?4,
                         layout = ?5, encoded_slots = ?6, author = ?7, updated_at_ms = ?8
                         WHERE id = ?9",
                        (
                            &record.title,
                            &record.description,
                            &record.job_id,
                            record.is_pvp,
                            record.layout.code(),
                            record.encoded_slots.as_str(),
                            &record.author,
                            ts,
                            id,
                        ),
                    )
                    .with_context(|| format!("update layout {id}"))?;
                if n == 0 {
                    return Ok(None);
                }
                id
            }
            None => {
                conn.execute(
                    "INSERT INTO layouts (title, description, job_id, is_pvp, layout, encoded_slots,
                     author, hearts, created_at_ms, updated_at_ms)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 0, ?8, ?8)",
                    (
                        &record.title,
                        &record.description,
                        &record.job_id,
                        record.is_pvp,
                        record.layout.code(),
                        record.encoded_slots.as_str(),
                        &record.author,
                        ts,
                    ),
                )
                .context("insert layout")?;
                conn.last_insert_rowid()
            }
        };

        tracing::debug!(id, job = %record.job_id, "layout saved");
        self.get_with(&conn, id)
    }

    pub fn get(&self, id: i64) -> anyhow::Result<Option<LayoutRecord>> {
        let conn = self.open()?;
        self.get_with(&conn, id)
    }

    fn get_with(&self, conn: &Connection, id: i64) -> anyhow::Result<Option<LayoutRecord>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM layouts WHERE id = ?1"
        ))?;
        let mut rows = stmt.query_map([id], record_from_row)?;
        match rows.next() {
            Some(row) => Ok(Some(row?)),
            None => Ok(None),
        }
    }

    /// Latest published layout per author, newest first. `job` narrows the
    /// list to one job. Untitled drafts are not listed.
    pub fn list_recent(&self, job: Option<&str>, limit: usize) -> anyhow::Result<Vec<LayoutRecord>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS}, MAX(updated_at_ms) FROM layouts
             WHERE title <> '' AND (?1 IS NULL OR job_id = ?1)
             GROUP BY COALESCE(author, 'anon:' || id)
             ORDER BY updated_at_ms DESC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map((job, limit as i64), record_from_row)?;
        Ok(rows.filter_map(Result::ok).collect())
    }

    /// Most hearted layouts first; layouts nobody hearted are not listed.
    pub fn list_popular(
        &self,
        job: Option<&str>,
        limit: usize,
    ) -> anyhow::Result<Vec<LayoutRecord>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {RECORD_COLUMNS} FROM layouts
             WHERE title <> '' AND hearts > 0 AND (?1 IS NULL OR job_id = ?1)
             ORDER BY hearts DESC, updated_at_ms DESC
             LIMIT ?2"
        ))?;
        let rows = stmt.query_map((job, limit as i64), record_from_row)?;
        Ok(rows.filter_map(Result::ok).collect())
    }

    pub fn destroy(&self, id: i64) -> anyhow::Result<bool> {
        let conn = self.open()?;
        let n = conn
            .execute("DELETE FROM layouts WHERE id = ?1", [id])
            .with_context(|| format!("destroy layout {id}"))?;
        if n > 0 {
            tracing::debug!(id, "layout destroyed");
        }
        Ok(n > 0)
    }

    /// Bumps the heart count. Returns false for an unknown id.
    pub fn heart(&self, id: i64) -> anyhow::Result<bool> {
        let conn = self.open()?;
        let n = conn
            .execute("UPDATE layouts SET hearts = hearts + 1 WHERE id = ?1", [id])
            .with_context(|| format!("heart layout {id}"))?;
        Ok(n > 0)
    }
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<LayoutRecord> {
    let layout_code: i64 = row.get(5)?;
    let created_ms: i64 = row.get(9)?;
    let updated_ms: i64 = row.get(10)?;
    Ok(LayoutRecord {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        description: row.get(2)?,
        job_id: row.get(3)?,
        is_pvp: row.get(4)?,
        layout: Layout::from_code(layout_code),
        encoded_slots: EncodedSlots::new(row.get::<_, String>(6)?),
        author: row.get(7)?,
        hearts: row.get(8)?,
        created_at: rfc3339(created_ms),
        updated_at: rfc3339(updated_ms),
    })
}

fn migrate(conn: &Connection) -> anyhow::Result<()> {
    // Lightweight migrations: `user_version` + IF NOT EXISTS, so existing
    // installs pick up schema changes without a migration framework.
    let v: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if v < 1 {
        conn.execute_batch(
            r#"
CREATE TABLE IF NOT EXISTS layouts (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL DEFAULT '',
  description TEXT NOT NULL DEFAULT '',
  job_id TEXT NOT NULL,
  is_pvp INTEGER NOT NULL DEFAULT 0,
  layout INTEGER NOT NULL DEFAULT 0,
  encoded_slots TEXT NOT NULL DEFAULT '',
  author TEXT,
  hearts INTEGER NOT NULL DEFAULT 0,
  created_at_ms INTEGER NOT NULL,
  updated_at_ms INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_layouts_job ON layouts(job_id);
CREATE INDEX IF NOT EXISTS idx_layouts_updated_at ON layouts(updated_at_ms);
CREATE INDEX IF NOT EXISTS idx_layouts_hearts ON layouts(hearts);
"#,
        )?;

        conn.pragma_update(None, "user_version", 1_i64)?;
    }

    Ok(())
}
