//! Router assembly and the JSON RPC handlers.

use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{delete, get, post};
use axum::Router;
use notes_types::*;
use std::sync::Arc;
use std::time::Instant;

use crate::blobs::FsBlobStore;
use crate::manager::{CreateOutcome, NoteManager};
use crate::web;

/// Largest accepted form upload
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub struct AppState {
    pub manager: NoteManager,
    pub blobs: Arc<FsBlobStore>,
    pub start_time: Instant,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(web::index))
        .route("/notes", post(web::create_note))
        .route("/notes/image/clear", post(web::clear_image))
        .route("/notes/:id/delete", post(web::delete_note))
        .route("/signout", post(web::sign_out))
        .route("/blobs/*path", get(web::serve_blob))
        .route("/rpc/notes", get(list_notes).post(create_note))
        .route("/rpc/notes/:id", delete(delete_note))
        .route("/rpc/status", get(status))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(state)
}

// GET /rpc/notes
pub async fn list_notes(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<RpcResponse<Vec<Note>>>) {
    match state.manager.refresh().await {
        Ok(_) => (StatusCode::OK, Json(RpcResponse::ok(state.manager.notes()))),
        Err(e) => (e.status(), Json(RpcResponse::err(e.to_string()))),
    }
}

// POST /rpc/notes
pub async fn create_note(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateNoteRequest>,
) -> (StatusCode, Json<RpcResponse<CreateNoteResult>>) {
    match state.manager.create_detached(req.content, None).await {
        Ok(CreateOutcome::Skipped) => (
            StatusCode::OK,
            Json(RpcResponse::ok(CreateNoteResult {
                skipped: true,
                note: None,
            })),
        ),
        Ok(CreateOutcome::Created(record)) => (
            StatusCode::CREATED,
            Json(RpcResponse::ok(CreateNoteResult {
                skipped: false,
                note: Some(record),
            })),
        ),
        Err(e) => (e.status(), Json(RpcResponse::err(e.to_string()))),
    }
}

// DELETE /rpc/notes/:id
pub async fn delete_note(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> (StatusCode, Json<RpcResponse<String>>) {
    match state.manager.delete_note(&id).await {
        Ok(()) => (StatusCode::OK, Json(RpcResponse::ok(id))),
        Err(e) => (e.status(), Json(RpcResponse::err(e.to_string()))),
    }
}

// GET /rpc/status
pub async fn status(State(state): State<Arc<AppState>>) -> (StatusCode, Json<RpcResponse<ServiceStatus>>) {
    let status = ServiceStatus {
        running: true,
        uptime_secs: state.start_time.elapsed().as_secs(),
        signed_in: state.manager.is_signed_in(),
        record_backend: state.manager.record_backend().to_string(),
        note_count: state.manager.notes().len(),
    };

    (StatusCode::OK, Json(RpcResponse::ok(status)))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::blobs::UrlSigner;
    use crate::manager::PendingImage;
    use crate::records::SqliteRecordStore;
    use crate::session::Session;
    use axum::body::Body;
    use axum::http::Request;
    use tempfile::TempDir;
    use tower::ServiceExt;

    pub(crate) fn test_state(dir: &TempDir) -> Arc<AppState> {
        let signer = UrlSigner::new(b"test".to_vec(), std::time::Duration::from_secs(300));
        let blobs = Arc::new(
            FsBlobStore::new(dir.path().join("blobs"), signer, "http://notes.test").unwrap(),
        );
        let records = Arc::new(SqliteRecordStore::in_memory().unwrap());
        Arc::new(AppState {
            manager: NoteManager::new(records, blobs.clone(), Session::new("alice", "")),
            blobs,
            start_time: Instant::now(),
        })
    }

    pub(crate) async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_rpc_create_list_delete() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let resp = router(state.clone())
            .oneshot(json_request("POST", "/rpc/notes", serde_json::json!({ "content": "Buy milk" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created = body_json(resp).await;
        assert_eq!(created["data"]["skipped"], false);
        let id = created["data"]["note"]["id"].as_str().unwrap().to_string();

        let resp = router(state.clone())
            .oneshot(Request::get("/rpc/notes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let listed = body_json(resp).await;
        let notes = listed["data"].as_array().unwrap();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0]["content"], "Buy milk");
        assert!(notes[0].get("imageUrl").is_none());

        let resp = router(state.clone())
            .oneshot(
                Request::delete(format!("/rpc/notes/{}", id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.manager.notes().is_empty());
    }

    #[tokio::test]
    async fn test_rpc_create_ignores_form_draft() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        let pending = PendingImage {
            file_name: "beach.jpg".to_string(),
            data: b"jpeg".to_vec(),
        };
        state.manager.set_draft("typed in the page");
        state.manager.attach_image(pending.clone());

        let resp = router(state.clone())
            .oneshot(json_request("POST", "/rpc/notes", serde_json::json!({ "content": "Buy milk" })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created = body_json(resp).await;
        assert_eq!(created["data"]["note"]["content"], "Buy milk");
        assert!(created["data"]["note"]["image"].is_null());

        let view = state.manager.snapshot();
        assert_eq!(view.draft, "typed in the page");
        assert_eq!(view.pending_image, Some(pending));
        assert!(!dir.path().join("blobs/images").exists());
    }

    #[tokio::test]
    async fn test_rpc_blank_create_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);

        let resp = router(state.clone())
            .oneshot(json_request("POST", "/rpc/notes", serde_json::json!({ "content": "  " })))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = body_json(resp).await;
        assert_eq!(body["data"]["skipped"], true);
        assert!(body["data"]["note"].is_null());
    }

    #[tokio::test]
    async fn test_rpc_after_sign_out_is_unauthorized() {
        let dir = tempfile::tempdir().unwrap();
        let state = test_state(&dir);
        state.manager.sign_out();

        let resp = router(state.clone())
            .oneshot(Request::get("/rpc/notes").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(resp).await;
        assert_eq!(body["success"], false);

        let resp = router(state)
            .oneshot(Request::get("/rpc/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let body = body_json(resp).await;
        assert_eq!(body["data"]["signed_in"], false);
        assert_eq!(body["data"]["record_backend"], "sqlite");
    }
}
