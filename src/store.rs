//! SQLite persistence for messages and projects.
//!
//! One connection behind one mutex. Every operation takes the lock, opens a
//! transaction, runs its statement and commits, so reads and writes across
//! both tables are fully serialised. Load is a personal site's guestbook;
//! a single writer is plenty.
//!
//! Calls block. Async callers run them on the blocking pool.

use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{SecondsFormat, Utc};
use rusqlite::{Connection, OpenFlags, params};
use thiserror::Error;
use tracing::debug;

use crate::model::{Message, MessageDraft, Project, ProjectDraft, ProjectEdit};

/// Newest messages returned by [`Store::list_messages`].
pub const MESSAGE_LIST_LIMIT: i64 = 200;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS messages (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  name TEXT NOT NULL,
  text TEXT NOT NULL,
  created_at TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS projects (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL,
  username TEXT NOT NULL,
  fullname TEXT NOT NULL,
  repo_url TEXT NOT NULL,
  created_at TEXT NOT NULL
);
";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection} {id} not found")]
    NotFound { collection: &'static str, id: i64 },

    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Thread-safe facade over the database file.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Opens (creating if needed) the database at `path` and ensures both
    /// tables exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path.as_ref(), flags)?;
        Self::init(conn)
    }

    /// A private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// A panic while holding the lock leaves at most an uncommitted
    /// transaction, which rusqlite rolls back on drop.
    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ── messages ────────────────────────────────────────────────────────────

    /// Up to [`MESSAGE_LIST_LIMIT`] messages, newest first.
    pub fn list_messages(&self) -> Result<Vec<Message>, StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let rows = {
            let mut stmt = tx.prepare(
                "SELECT id, name, text, created_at FROM messages ORDER BY id DESC LIMIT ?1",
            )?;
            stmt.query_map(params![MESSAGE_LIST_LIMIT], |row| {
                Ok(Message {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    text: row.get(2)?,
                    created_at: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?
        };
        tx.commit()?;
        Ok(rows)
    }

    pub fn create_message(&self, draft: &MessageDraft) -> Result<Message, StoreError> {
        let created_at = timestamp();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO messages (name, text, created_at) VALUES (?1, ?2, ?3)",
            params![draft.name, draft.text, created_at],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!(id, "message created");
        Ok(Message { id, name: draft.name.clone(), text: draft.text.clone(), created_at })
    }

    pub fn update_message(&self, id: i64, draft: &MessageDraft) -> Result<(), StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE messages SET name = ?1, text = ?2 WHERE id = ?3",
            params![draft.name, draft.text, id],
        )?;
        tx.commit()?;
        found(changed, "message", id)
    }

    pub fn delete_message(&self, id: i64) -> Result<(), StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let changed = tx.execute("DELETE FROM messages WHERE id = ?1", params![id])?;
        tx.commit()?;
        found(changed, "message", id)
    }

    // ── projects ────────────────────────────────────────────────────────────

    /// Every project, newest first.
    pub fn list_projects(&self) -> Result<Vec<Project>, StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let rows = {
            let mut stmt = tx.prepare(
                "SELECT id, title, username, fullname, repo_url, created_at \
                 FROM projects ORDER BY id DESC",
            )?;
            stmt.query_map([], |row| {
                Ok(Project {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    username: row.get(2)?,
                    fullname: row.get(3)?,
                    repo_url: row.get(4)?,
                    created_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?
        };
        tx.commit()?;
        Ok(rows)
    }

    pub fn create_project(&self, draft: &ProjectDraft) -> Result<Project, StoreError> {
        let created_at = timestamp();
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        tx.execute(
            "INSERT INTO projects (title, username, fullname, repo_url, created_at) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![draft.title, draft.username, draft.fullname, draft.repo_url, created_at],
        )?;
        let id = tx.last_insert_rowid();
        tx.commit()?;
        debug!(id, "project created");
        Ok(Project {
            id,
            title: draft.title.clone(),
            username: draft.username.clone(),
            fullname: draft.fullname.clone(),
            repo_url: draft.repo_url.clone(),
            created_at,
        })
    }

    pub fn update_project(&self, id: i64, edit: &ProjectEdit) -> Result<(), StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let changed = tx.execute(
            "UPDATE projects SET title = ?1, fullname = ?2, repo_url = ?3 WHERE id = ?4",
            params![edit.title, edit.fullname, edit.repo_url, id],
        )?;
        tx.commit()?;
        found(changed, "project", id)
    }

    pub fn delete_project(&self, id: i64) -> Result<(), StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;
        let changed = tx.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        tx.commit()?;
        found(changed, "project", id)
    }
}

fn found(changed: usize, collection: &'static str, id: i64) -> Result<(), StoreError> {
    if changed == 0 {
        return Err(StoreError::NotFound { collection, id });
    }
    Ok(())
}

/// UTC creation time, e.g. `2025-03-01T09:30:12.345678Z`.
fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
