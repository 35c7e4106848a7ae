//! SqliteRecordStore — local stand-in for the managed record API
//!
//! Rows are scoped to the session's user, the way an owner-authorized model
//! only ever shows a user their own records.

use async_trait::async_trait;
use chrono::Utc;
use notes_types::{CreateNoteInput, NoteRecord, StoreError};
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use std::path::Path;
use uuid::Uuid;

use super::{DeleteAck, ListResponse, RecordStore};
use crate::error::NotesError;
use crate::session::Session;

pub struct SqliteRecordStore {
    conn: Mutex<Connection>,
}

impl SqliteRecordStore {
    /// Open (or create) the database file and ensure the schema exists
    pub fn open(db_path: &str) -> Result<Self, NotesError> {
        if let Some(parent) = Path::new(db_path).parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(db_path)?)
    }

    pub fn in_memory() -> Result<Self, NotesError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, NotesError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS notes (
                id TEXT PRIMARY KEY,
                owner TEXT NOT NULL,
                content TEXT NOT NULL,
                image TEXT,
                created_at TEXT NOT NULL
            )",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_notes_owner ON notes(owner)",
            [],
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    async fn list(&self, session: &Session) -> Result<ListResponse, NotesError> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id, content, image, created_at FROM notes WHERE owner = ?1 ORDER BY rowid",
        )?;

        let data = stmt
            .query_map(params![session.user], |row| {
                Ok(NoteRecord {
                    id: row.get(0)?,
                    content: row.get(1)?,
                    image: row.get(2)?,
                    created_at: Some(row.get(3)?),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(ListResponse {
            data,
            errors: Vec::new(),
        })
    }

    async fn create(
        &self,
        session: &Session,
        input: CreateNoteInput,
    ) -> Result<NoteRecord, NotesError> {
        if input.content.is_empty() {
            return Err(NotesError::Store(vec![StoreError::new(
                "Variable 'content' has an invalid value: required",
            )]));
        }

        let record = NoteRecord {
            id: Uuid::new_v4().to_string(),
            content: input.content,
            image: input.image,
            created_at: Some(Utc::now().to_rfc3339()),
        };

        let conn = self.conn.lock();
        conn.execute(
            "INSERT INTO notes (id, owner, content, image, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id,
                session.user,
                record.content,
                record.image,
                record.created_at
            ],
        )?;

        log::debug!("[RECORDS] Created note {} for {}", record.id, session.user);
        Ok(record)
    }

    async fn delete(&self, session: &Session, id: &str) -> Result<DeleteAck, NotesError> {
        let conn = self.conn.lock();
        let rows = conn.execute(
            "DELETE FROM notes WHERE id = ?1 AND owner = ?2",
            params![id, session.user],
        )?;

        if rows == 0 {
            return Ok(DeleteAck {
                id: None,
                errors: vec![StoreError {
                    message: format!("Note not found: {}", id),
                    error_type: Some("ConditionalCheckFailedException".to_string()),
                }],
            });
        }

        Ok(DeleteAck {
            id: Some(id.to_string()),
            errors: Vec::new(),
        })
    }
}
