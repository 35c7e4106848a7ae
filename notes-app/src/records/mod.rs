//! Record store seam: where note records live.
//!
//! A store distinguishes two failure channels. A store-level error list
//! comes back inside an `Ok` response (the call went through but the store
//! refused some or all of it); a transport or auth failure is an `Err`.

pub mod graphql;
pub mod sqlite;

use async_trait::async_trait;
use notes_types::{CreateNoteInput, NoteRecord, StoreError};

use crate::error::NotesError;
use crate::session::Session;

pub use graphql::GraphqlRecordStore;
pub use sqlite::SqliteRecordStore;

/// Response of a bulk list
#[derive(Debug, Clone, Default)]
pub struct ListResponse {
    pub data: Vec<NoteRecord>,
    pub errors: Vec<StoreError>,
}

/// Acknowledgment of a delete
#[derive(Debug, Clone, Default)]
pub struct DeleteAck {
    /// Id of the removed record, when the store reports one
    pub id: Option<String>,
    pub errors: Vec<StoreError>,
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    async fn list(&self, session: &Session) -> Result<ListResponse, NotesError>;

    async fn create(
        &self,
        session: &Session,
        input: CreateNoteInput,
    ) -> Result<NoteRecord, NotesError>;

    async fn delete(&self, session: &Session, id: &str) -> Result<DeleteAck, NotesError>;
}
