//! HTML surface: the notes page, its form posts, and signed blob downloads.
//!
//! Form handlers always redirect back to `/`; failures only reach the log.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Redirect, Response};
use notes_types::Note;
use serde::Deserialize;
use std::fmt::Write as _;
use std::sync::Arc;

use crate::error::NotesError;
use crate::manager::{PendingImage, ViewState};
use crate::routes::AppState;

// GET /
pub async fn index(State(state): State<Arc<AppState>>) -> Html<String> {
    if !state.manager.is_signed_in() {
        return Html(render_signed_out());
    }

    // Every page load is a mount
    state.manager.refresh().await.ok();
    Html(render_page(&state.manager.snapshot()))
}

// POST /notes
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Response {
    let mut content = String::new();
    let mut image: Option<PendingImage> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                log::warn!("[WEB] Bad note form: {}", e);
                return (StatusCode::BAD_REQUEST, e.to_string()).into_response();
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("content") => match field.text().await {
                Ok(text) => content = text,
                Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
            },
            Some("image") => {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let data = match field.bytes().await {
                    Ok(bytes) => bytes.to_vec(),
                    Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
                };
                // An untouched file input still sends an empty part
                if !file_name.is_empty() && !data.is_empty() {
                    image = Some(PendingImage { file_name, data });
                }
            }
            _ => {}
        }
    }

    state.manager.submit(content, image).await.ok();
    Redirect::to("/").into_response()
}

// POST /notes/image/clear
pub async fn clear_image(State(state): State<Arc<AppState>>) -> Redirect {
    state.manager.clear_image();
    Redirect::to("/")
}

// POST /notes/:id/delete
pub async fn delete_note(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Redirect {
    state.manager.delete_note(&id).await.ok();
    Redirect::to("/")
}

// POST /signout
pub async fn sign_out(State(state): State<Arc<AppState>>) -> Redirect {
    state.manager.sign_out();
    Redirect::to("/")
}

#[derive(Debug, Deserialize)]
pub struct BlobQuery {
    expires: i64,
    sig: String,
}

// GET /blobs/*path
pub async fn serve_blob(
    State(state): State<Arc<AppState>>,
    Path(path): Path<String>,
    Query(query): Query<BlobQuery>,
) -> Result<Response, NotesError> {
    if !state.blobs.verify(&path, query.expires, &query.sig) {
        return Ok((StatusCode::FORBIDDEN, "Invalid or expired link").into_response());
    }

    match state.blobs.read(&path).await {
        Ok(contents) => Ok((
            [
                (header::CONTENT_TYPE, crate::blobs::mime_for_path(&path)),
                (header::CACHE_CONTROL, "private, max-age=60"),
            ],
            contents,
        )
            .into_response()),
        Err(NotesError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok((StatusCode::NOT_FOUND, "File not found").into_response())
        }
        Err(e) => {
            log::error!("[WEB] Failed to serve blob {}: {}", path, e);
            Err(e)
        }
    }
}

// --- Rendering ---

const STYLE: &str = "body{font-family:sans-serif;padding:2rem}\
header{display:flex;justify-content:space-between;align-items:center;margin-bottom:1rem}\
.compose{display:flex;gap:.5rem;margin-bottom:1rem}\
.grid{display:grid;grid-template-columns:repeat(auto-fill,minmax(250px,1fr));gap:1rem}\
.note{display:flex;flex-direction:column;padding:1rem;border:1px solid #ccc;border-radius:8px}\
.note img{margin-top:.5rem;max-height:150px;object-fit:cover}";

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn render_note(out: &mut String, note: &Note) {
    let _ = write!(out, "<div class=\"note\"><p>{}</p>", escape_html(&note.content));
    if let Some(url) = &note.image_url {
        let _ = write!(out, "<img src=\"{}\" alt=\"note\">", escape_html(url));
    }
    let _ = write!(
        out,
        "<form method=\"post\" action=\"/notes/{}/delete\"><button type=\"submit\">Delete</button></form></div>",
        urlencoding::encode(&note.id)
    );
}

pub fn render_page(view: &ViewState) -> String {
    let mut out = String::new();
    let _ = write!(
        out,
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>My Notes</title><style>{}</style></head><body>",
        STYLE
    );
    out.push_str(
        "<header><h3>My Notes</h3><form method=\"post\" action=\"/signout\"><button type=\"submit\">Sign out</button></form></header>",
    );
    let _ = write!(
        out,
        "<form class=\"compose\" method=\"post\" action=\"/notes\" enctype=\"multipart/form-data\">\
<input name=\"content\" placeholder=\"Write a note\" value=\"{}\">\
<input type=\"file\" name=\"image\" accept=\"image/*\">\
<button type=\"submit\">Add Note</button></form>",
        escape_html(&view.draft)
    );
    if let Some(pending) = &view.pending_image {
        let _ = write!(
            out,
            "<form method=\"post\" action=\"/notes/image/clear\">Attached: {} <button type=\"submit\">Remove</button></form>",
            escape_html(&pending.file_name)
        );
    }
    out.push_str("<hr><div class=\"grid\">");
    for note in &view.notes {
        render_note(&mut out, note);
    }
    out.push_str("</div></body></html>");
    out
}

fn render_signed_out() -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\"><title>My Notes</title><style>{}</style></head>\
<body><h3>My Notes</h3><p>You are signed out.</p></body></html>",
        STYLE
    )
}
