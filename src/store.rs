//! SQLite-backed local key-value store.
//!
//! Durable per-device storage for the session (`token`, `user`) and the
//! pending / dead-letter scan records. A single `kv` table, one global slot
//! per key, last write wins — no transactions across keys.

use crate::error::Result;
use crate::model::{PendingScan, User};
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::Path;

/// Session token issued by the login endpoint.
const KEY_TOKEN: &str = "token";

/// Logged-in user profile (JSON object with at least `id`).
const KEY_USER: &str = "user";

/// Pre-login attendance intent awaiting replay (JSON `PendingScan`).
const KEY_PENDING: &str = "pendingQR";

/// A reconciliation that failed against the server, kept for manual
/// resubmission instead of being silently dropped.
const KEY_DEAD_LETTER: &str = "deadLetterQR";

/// Local key-value store.
pub struct KvStore {
    conn: Mutex<rusqlite::Connection>,
}

impl KvStore {
    /// Open (or create) the store at the given path.
    pub fn open(db_path: &Path) -> Result<Self> {
        Self::init(rusqlite::Connection::open(db_path)?)
    }

    /// Open an in-memory store. Nothing survives the process; used in tests
    /// and available for dry runs.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(rusqlite::Connection::open_in_memory()?)
    }

    fn init(conn: rusqlite::Connection) -> Result<Self> {
        // WAL mode for crash safety on abrupt device power-off
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;",
        )?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    // ── Raw slot access ─────────────────────────────────────────────

    fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock();
        let row = conn.query_row(
            "SELECT value FROM kv WHERE key = ?1",
            rusqlite::params![key],
            |row| row.get::<_, String>(0),
        );

        match row {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at",
            rusqlite::params![key, value, epoch_millis() as i64],
        )?;
        Ok(())
    }

    /// Delete a slot. Returns whether a value was present.
    fn delete(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let deleted = conn.execute("DELETE FROM kv WHERE key = ?1", rusqlite::params![key])?;
        Ok(deleted > 0)
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get(key)? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.put(key, &serde_json::to_string(value)?)
    }

    // ── Session ─────────────────────────────────────────────────────

    /// Persist the token and user profile from a successful login.
    pub fn set_session(&self, token: &str, user: &User) -> Result<()> {
        self.put(KEY_TOKEN, token)?;
        self.put_json(KEY_USER, user)
    }

    /// The stored session token, if any.
    pub fn token(&self) -> Result<Option<String>> {
        self.get(KEY_TOKEN)
    }

    /// The stored user profile, if any.
    pub fn user(&self) -> Result<Option<User>> {
        self.get_json(KEY_USER)
    }

    /// Remove the token and user profile (logout).
    pub fn clear_session(&self) -> Result<()> {
        self.delete(KEY_TOKEN)?;
        self.delete(KEY_USER)?;
        Ok(())
    }

    // ── Pending scan ────────────────────────────────────────────────

    /// Store a pre-login scan, overwriting any prior one.
    pub fn set_pending_scan(&self, pending: &PendingScan) -> Result<()> {
        self.put_json(KEY_PENDING, pending)
    }

    /// The stored pending scan, if any.
    pub fn pending_scan(&self) -> Result<Option<PendingScan>> {
        self.get_json(KEY_PENDING)
    }

    /// Remove the pending scan. Returns whether one was present.
    pub fn clear_pending_scan(&self) -> Result<bool> {
        self.delete(KEY_PENDING)
    }

    // ── Dead letter ─────────────────────────────────────────────────

    /// Park a scan whose reconciliation failed, for manual resubmission.
    pub fn set_dead_letter(&self, pending: &PendingScan) -> Result<()> {
        self.put_json(KEY_DEAD_LETTER, pending)
    }

    /// The parked dead-letter scan, if any.
    pub fn dead_letter(&self) -> Result<Option<PendingScan>> {
        self.get_json(KEY_DEAD_LETTER)
    }

    /// Remove the dead-letter scan. Returns whether one was present.
    pub fn clear_dead_letter(&self) -> Result<bool> {
        self.delete(KEY_DEAD_LETTER)
    }
}

/// Current Unix epoch in milliseconds.
pub fn epoch_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

// ── Tests ───────────────────────────────────────────────────────────
