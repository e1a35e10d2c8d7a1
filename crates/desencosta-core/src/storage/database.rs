//! SQLite-backed storage.
//!
//! Provides persistent storage for:
//! - Key-value records (settings, urgency level, last action, schedule copy)
//! - The relaxation log
//! - The desktop notification spool that stands in for an OS scheduler

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::{data_dir, KeyValueStore};
use crate::error::{CoreError, StorageError};
use crate::notify::NativeNotification;

/// How a relaxation was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelaxationKind {
    Reminder,
    Manual,
}

impl RelaxationKind {
    fn as_str(self) -> &'static str {
        match self {
            RelaxationKind::Reminder => "reminder",
            RelaxationKind::Manual => "manual",
        }
    }

    fn parse(s: &str) -> Self {
        match s {
            "reminder" => RelaxationKind::Reminder,
            _ => RelaxationKind::Manual,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaxationEntry {
    pub id: i64,
    pub kind: RelaxationKind,
    pub at: DateTime<Utc>,
}

/// SQLite database for desencosta state.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open the database at `<data dir>/desencosta.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self, CoreError> {
        let path = data_dir()?.join("desencosta.db");
        Ok(Self::open_at(&path)?)
    }

    /// Open (or create) a database file at an explicit path.
    pub fn open_at(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path).map_err(|source| StorageError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests and ephemeral hosts).
    pub fn open_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn.lock().map_err(|_| StorageError::Poisoned)
    }

    fn migrate(&self) -> Result<(), StorageError> {
        self.conn()?.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS relaxations (
                id    INTEGER PRIMARY KEY AUTOINCREMENT,
                kind  TEXT NOT NULL,
                at    TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS notification_spool (
                id          INTEGER PRIMARY KEY,
                trigger_at  TEXT NOT NULL,
                title       TEXT NOT NULL,
                body        TEXT NOT NULL,
                channel_id  TEXT NOT NULL,
                sound       INTEGER NOT NULL DEFAULT 0,
                delivered   INTEGER NOT NULL DEFAULT 0
            );

            CREATE INDEX IF NOT EXISTS idx_relaxations_at ON relaxations(at);
            CREATE INDEX IF NOT EXISTS idx_spool_trigger_at ON notification_spool(trigger_at);",
        )?;
        Ok(())
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row(params![key], |row| row.get::<_, String>(0));
        match result {
            Ok(v) => Ok(Some(v)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.conn()?.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, key: &str) -> Result<(), StorageError> {
        self.conn()?
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ── Relaxation log ───────────────────────────────────────────────

    /// Append a relaxation to the log.
    pub fn record_relaxation(
        &self,
        kind: RelaxationKind,
        at: DateTime<Utc>,
    ) -> Result<i64, StorageError> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO relaxations (kind, at) VALUES (?1, ?2)",
            params![kind.as_str(), encode_instant(at)],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Relaxations at or after `since`, oldest first.
    pub fn relaxations_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<RelaxationEntry>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, kind, at FROM relaxations WHERE at >= ?1 ORDER BY at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![encode_instant(since)], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut entries = Vec::new();
        for row in rows {
            let (id, kind, at) = row?;
            entries.push(RelaxationEntry {
                id,
                kind: RelaxationKind::parse(&kind),
                at: decode_instant("relaxations.at", &at)?,
            });
        }
        Ok(entries)
    }

    // ── Notification spool ───────────────────────────────────────────

    /// Insert a batch in a single transaction; either all rows land or none.
    pub fn spool_insert(&self, batch: &[NativeNotification]) -> Result<(), StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        for n in batch {
            tx.execute(
                "INSERT OR REPLACE INTO notification_spool
                    (id, trigger_at, title, body, channel_id, sound, delivered)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
                params![
                    n.id,
                    encode_instant(n.trigger_at),
                    n.title,
                    n.body,
                    n.channel_id,
                    n.sound,
                ],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Remove rows by id, delivered or not.
    pub fn spool_delete(&self, ids: &[i32]) -> Result<usize, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut removed = 0;
        for id in ids {
            removed += tx.execute("DELETE FROM notification_spool WHERE id = ?1", params![id])?;
        }
        tx.commit()?;
        Ok(removed)
    }

    /// Undelivered rows, earliest first.
    pub fn spool_pending(&self) -> Result<Vec<NativeNotification>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, trigger_at, title, body, channel_id, sound
             FROM notification_spool WHERE delivered = 0 ORDER BY trigger_at ASC",
        )?;
        collect_spool_rows(&mut stmt, params![])
    }

    /// Mark every undelivered row due at or before `now` as delivered and return them.
    pub fn spool_take_due(
        &self,
        now: DateTime<Utc>,
    ) -> Result<Vec<NativeNotification>, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let due = {
            let mut stmt = tx.prepare(
                "SELECT id, trigger_at, title, body, channel_id, sound
                 FROM notification_spool
                 WHERE delivered = 0 AND trigger_at <= ?1
                 ORDER BY trigger_at ASC",
            )?;
            collect_spool_rows(&mut stmt, params![encode_instant(now)])?
        };
        for n in &due {
            tx.execute(
                "UPDATE notification_spool SET delivered = 1 WHERE id = ?1",
                params![n.id],
            )?;
        }
        tx.commit()?;
        Ok(due)
    }
}

impl KeyValueStore for Database {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.kv_get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.kv_set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.kv_remove(key)
    }
}

fn collect_spool_rows(
    stmt: &mut rusqlite::Statement<'_>,
    args: &[&dyn rusqlite::ToSql],
) -> Result<Vec<NativeNotification>, StorageError> {
    let rows = stmt.query_map(args, |row| {
        Ok((
            row.get::<_, i32>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, bool>(5)?,
        ))
    })?;

    let mut out = Vec::new();
    for row in rows {
        let (id, trigger_at, title, body, channel_id, sound) = row?;
        out.push(NativeNotification {
            id,
            trigger_at: decode_instant("notification_spool.trigger_at", &trigger_at)?,
            title,
            body,
            channel_id,
            sound,
        });
    }
    Ok(out)
}

// Fixed-width UTC form so TEXT comparison orders chronologically.
fn encode_instant(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn decode_instant(key: &str, raw: &str) -> Result<DateTime<Utc>, StorageError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StorageError::Malformed {
            key: key.to_string(),
            message: e.to_string(),
        })
}
