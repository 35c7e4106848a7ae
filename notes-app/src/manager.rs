//! NoteManager — view state plus the list/create/delete round trips.
//!
//! Every mutation is followed by a full list refresh. Failures are logged and
//! returned; the view state is only written after a call succeeds. The state
//! lock is never held across a remote call, so refreshes started by
//! overlapping mutations publish in completion order and the last one wins.

use futures_util::future::try_join_all;
use notes_types::{CreateNoteInput, Note, NoteRecord};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::Arc;

use crate::blobs::{image_path, BlobStore};
use crate::error::NotesError;
use crate::records::RecordStore;
use crate::session::Session;

/// Image chosen in the form but not yet uploaded
#[derive(Clone, PartialEq, Eq)]
pub struct PendingImage {
    pub file_name: String,
    pub data: Vec<u8>,
}

impl fmt::Debug for PendingImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingImage")
            .field("file_name", &self.file_name)
            .field("bytes", &self.data.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub struct ViewState {
    pub notes: Vec<Note>,
    pub draft: String,
    pub pending_image: Option<PendingImage>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateOutcome {
    /// Empty or whitespace-only draft; nothing was sent
    Skipped,
    Created(NoteRecord),
}

/// Millisecond clock used to name uploads
pub type Clock = Arc<dyn Fn() -> i64 + Send + Sync>;

pub struct NoteManager {
    records: Arc<dyn RecordStore>,
    blobs: Arc<dyn BlobStore>,
    session: RwLock<Option<Session>>,
    state: Mutex<ViewState>,
    clock: Clock,
}

impl NoteManager {
    pub fn new(records: Arc<dyn RecordStore>, blobs: Arc<dyn BlobStore>, session: Session) -> Self {
        Self {
            records,
            blobs,
            session: RwLock::new(Some(session)),
            state: Mutex::new(ViewState::default()),
            clock: Arc::new(|| chrono::Utc::now().timestamp_millis()),
        }
    }

    /// Replace the upload clock (builder pattern)
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn record_backend(&self) -> &'static str {
        self.records.backend_tag()
    }

    pub fn snapshot(&self) -> ViewState {
        self.state.lock().clone()
    }

    pub fn notes(&self) -> Vec<Note> {
        self.state.lock().notes.clone()
    }

    pub fn set_draft(&self, text: impl Into<String>) {
        self.state.lock().draft = text.into();
    }

    pub fn attach_image(&self, image: PendingImage) {
        self.state.lock().pending_image = Some(image);
    }

    pub fn clear_image(&self) {
        self.state.lock().pending_image = None;
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.read().is_some()
    }

    /// Drop the credential and the view state
    pub fn sign_out(&self) {
        let previous = self.session.write().take();
        *self.state.lock() = ViewState::default();
        if let Some(session) = previous {
            log::info!("[NOTES] {} signed out", session.user);
        }
    }

    fn session(&self) -> Result<Session, NotesError> {
        self.session.read().clone().ok_or(NotesError::SignedOut)
    }

    // --- List ---

    /// Refetch all notes and resolve their image URLs.
    ///
    /// The list is published only after every URL resolves; any failure
    /// leaves the previous list in place.
    pub async fn refresh(&self) -> Result<usize, NotesError> {
        match self.fetch_notes().await {
            Ok(notes) => {
                let count = notes.len();
                self.state.lock().notes = notes;
                log::debug!("[NOTES] Refreshed {} notes", count);
                Ok(count)
            }
            Err(NotesError::Store(errors)) => {
                log::error!("[NOTES] Fetch errors: {:?}", errors);
                Err(NotesError::Store(errors))
            }
            Err(e) => {
                log::error!("[NOTES] Error fetching notes: {}", e);
                Err(e)
            }
        }
    }

    async fn fetch_notes(&self) -> Result<Vec<Note>, NotesError> {
        let session = self.session()?;
        let resp = self.records.list(&session).await?;
        if !resp.errors.is_empty() {
            return Err(NotesError::Store(resp.errors));
        }

        try_join_all(
            resp.data
                .into_iter()
                .map(|record| self.resolve_image(&session, record)),
        )
        .await
    }

    async fn resolve_image(&self, session: &Session, record: NoteRecord) -> Result<Note, NotesError> {
        match record.image.clone() {
            Some(path) => {
                let signed = self.blobs.get_url(session, &path).await?;
                log::debug!("[NOTES] Signed {} until {}", path, signed.expires_at);
                Ok(Note::from(record).with_image_url(signed.url))
            }
            None => Ok(Note::from(record)),
        }
    }

    // --- Create ---

    /// Submit the current draft.
    ///
    /// On success the draft and pending image are cleared and the list is
    /// refreshed. On failure both are kept so the user can resubmit.
    pub async fn create_note(&self) -> Result<CreateOutcome, NotesError> {
        let (draft, image) = {
            let state = self.state.lock();
            (state.draft.clone(), state.pending_image.clone())
        };

        if draft.trim().is_empty() {
            return Ok(CreateOutcome::Skipped);
        }

        match self.persist_note(draft, image).await {
            Ok(record) => {
                {
                    let mut state = self.state.lock();
                    state.draft.clear();
                    state.pending_image = None;
                }
                log::info!("[NOTES] Created note {}", record.id);
                self.refresh().await.ok();
                Ok(CreateOutcome::Created(record))
            }
            Err(e) => {
                log::error!("[NOTES] Error creating note: {}", e);
                Err(e)
            }
        }
    }

    /// Set the draft and optional image, then submit
    pub async fn submit(
        &self,
        content: impl Into<String>,
        image: Option<PendingImage>,
    ) -> Result<CreateOutcome, NotesError> {
        self.set_draft(content);
        if let Some(image) = image {
            self.attach_image(image);
        }
        self.create_note().await
    }

    /// Create a note from explicit content and image, leaving the draft and
    /// pending image untouched. Blank content is skipped like a blank draft.
    pub async fn create_detached(
        &self,
        content: impl Into<String>,
        image: Option<PendingImage>,
    ) -> Result<CreateOutcome, NotesError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Ok(CreateOutcome::Skipped);
        }

        match self.persist_note(content, image).await {
            Ok(record) => {
                log::info!("[NOTES] Created note {} (detached)", record.id);
                self.refresh().await.ok();
                Ok(CreateOutcome::Created(record))
            }
            Err(e) => {
                log::error!("[NOTES] Error creating note: {}", e);
                Err(e)
            }
        }
    }

    async fn persist_note(
        &self,
        content: String,
        image: Option<PendingImage>,
    ) -> Result<NoteRecord, NotesError> {
        let session = self.session()?;

        let image = match image {
            Some(pending) => {
                let path = image_path((self.clock)(), &pending.file_name);
                self.blobs.upload(&session, &path, pending.data).await?;
                Some(path)
            }
            None => None,
        };

        self.records
            .create(&session, CreateNoteInput { content, image })
            .await
    }

    // --- Delete ---

    /// Delete by id, then refresh. Errors in the delete response body are
    /// logged but still followed by the refresh.
    pub async fn delete_note(&self, id: &str) -> Result<(), NotesError> {
        let result = match self.session() {
            Ok(session) => self.records.delete(&session, id).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(ack) => {
                if ack.errors.is_empty() {
                    log::info!("[NOTES] Deleted note {}", ack.id.as_deref().unwrap_or(id));
                } else {
                    log::warn!("[NOTES] Delete {} reported errors: {:?}", id, ack.errors);
                }
                self.refresh().await.ok();
                Ok(())
            }
            Err(e) => {
                log::error!("[NOTES] Error deleting note: {}", e);
                Err(e)
            }
        }
    }
}
