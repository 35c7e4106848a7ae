use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use notes_types::{RpcResponse, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotesError {
    #[error("Signed out")]
    SignedOut,

    #[error("Record store errors: {}", join_messages(.0))]
    Store(Vec<StoreError>),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Blob store error: {0}")]
    Blob(String),

    #[error("Invalid blob path: {0}")]
    InvalidPath(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<reqwest::Error> for NotesError {
    fn from(e: reqwest::Error) -> Self {
        NotesError::Transport(e.to_string())
    }
}

fn join_messages(errors: &[StoreError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl NotesError {
    pub fn status(&self) -> StatusCode {
        match self {
            NotesError::SignedOut => StatusCode::UNAUTHORIZED,
            NotesError::InvalidPath(_) => StatusCode::BAD_REQUEST,
            NotesError::Store(_) | NotesError::Transport(_) => StatusCode::BAD_GATEWAY,
            NotesError::Blob(_)
            | NotesError::Config(_)
            | NotesError::Database(_)
            | NotesError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for NotesError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, axum::Json(RpcResponse::<()>::err(self.to_string()))).into_response()
    }
}
