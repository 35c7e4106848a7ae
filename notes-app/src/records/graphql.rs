//! Typed GraphQL client for the managed `Notes` model API.
//!
//! The GraphQL `errors` array is the store-level error list; HTTP and
//! decoding failures are transport errors.

use async_trait::async_trait;
use notes_types::{CreateNoteInput, NoteRecord, StoreError};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;

use super::{DeleteAck, ListResponse, RecordStore};
use crate::error::NotesError;
use crate::session::Session;

const LIST_NOTES: &str = "query ListNotes($nextToken: String) {
  listNotes(nextToken: $nextToken) { items { id content image createdAt } nextToken }
}";

const CREATE_NOTES: &str = "mutation CreateNotes($input: CreateNotesInput!) {
  createNotes(input: $input) { id content image createdAt }
}";

const DELETE_NOTES: &str = "mutation DeleteNotes($input: DeleteNotesInput!) {
  deleteNotes(input: $input) { id }
}";

/// Upper bound on followed `nextToken` pages per list
const MAX_PAGES: usize = 100;

pub struct GraphqlRecordStore {
    endpoint: String,
    client: reqwest::Client,
}

// ── GraphQL wire types ──────────────────────────────

#[derive(Debug, Serialize)]
struct GraphqlRequest<'a> {
    query: &'a str,
    variables: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct GraphqlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<StoreError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListNotesData {
    list_notes: Option<NotesPage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct NotesPage {
    #[serde(default)]
    items: Vec<Option<NoteRecord>>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateNotesData {
    create_notes: Option<NoteRecord>,
}

#[derive(Debug, Deserialize)]
struct DeletedId {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeleteNotesData {
    delete_notes: Option<DeletedId>,
}

// ── Client impl ─────────────────────────────────────

impl GraphqlRecordStore {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        session: &Session,
        query: &str,
        variables: serde_json::Value,
    ) -> Result<GraphqlResponse<T>, NotesError> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::AUTHORIZATION, &session.token)
            .json(&GraphqlRequest { query, variables })
            .timeout(std::time::Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| NotesError::Transport(format!("GraphQL request failed: {}", e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(NotesError::Transport(format!("GraphQL HTTP {}: {}", status, body)));
        }

        resp.json::<GraphqlResponse<T>>()
            .await
            .map_err(|e| NotesError::Transport(format!("Parse GraphQL response: {}", e)))
    }
}

#[async_trait]
impl RecordStore for GraphqlRecordStore {
    fn backend_tag(&self) -> &'static str {
        "graphql"
    }

    async fn list(&self, session: &Session) -> Result<ListResponse, NotesError> {
        let mut out = ListResponse::default();
        let mut next_token: Option<String> = None;

        for page_no in 0..MAX_PAGES {
            let resp: GraphqlResponse<ListNotesData> = self
                .execute(session, LIST_NOTES, json!({ "nextToken": next_token }))
                .await?;

            out.errors.extend(resp.errors);
            let Some(page) = resp.data.and_then(|d| d.list_notes) else {
                break;
            };

            // Null items are records the caller may not read
            out.data.extend(page.items.into_iter().flatten());

            match page.next_token {
                Some(token) if !out.errors.is_empty() => {
                    log::warn!("[RECORDS] Stopping pagination at {} after errors", token);
                    break;
                }
                Some(token) if page_no + 1 == MAX_PAGES => {
                    log::warn!("[RECORDS] listNotes still paging after {} pages", MAX_PAGES);
                    out.errors.push(StoreError {
                        message: format!("listNotes truncated after {} pages (nextToken {})", MAX_PAGES, token),
                        error_type: Some("PageLimitExceeded".to_string()),
                    });
                }
                Some(token) => next_token = Some(token),
                None => break,
            }
        }

        Ok(out)
    }

    async fn create(
        &self,
        session: &Session,
        input: CreateNoteInput,
    ) -> Result<NoteRecord, NotesError> {
        let resp: GraphqlResponse<CreateNotesData> = self
            .execute(session, CREATE_NOTES, json!({ "input": input }))
            .await?;

        if !resp.errors.is_empty() {
            return Err(NotesError::Store(resp.errors));
        }

        resp.data
            .and_then(|d| d.create_notes)
            .ok_or_else(|| NotesError::Transport("createNotes returned no record".to_string()))
    }

    async fn delete(&self, session: &Session, id: &str) -> Result<DeleteAck, NotesError> {
        let resp: GraphqlResponse<DeleteNotesData> = self
            .execute(session, DELETE_NOTES, json!({ "input": { "id": id } }))
            .await?;

        Ok(DeleteAck {
            id: resp.data.and_then(|d| d.delete_notes).map(|d| d.id),
            errors: resp.errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderMap;
    use axum::routing::post;
    use axum::{Json, Router};
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[test]
    fn test_list_page_skips_null_items() {
        let body = r#"{
            "data": { "listNotes": {
                "items": [
                    { "id": "a", "content": "Buy milk", "image": null },
                    null,
                    { "id": "b", "content": "Vacation photo", "image": "images/1-beach.jpg" }
                ],
                "nextToken": null
            } }
        }"#;
        let resp: GraphqlResponse<ListNotesData> = serde_json::from_str(body).unwrap();
        assert!(resp.errors.is_empty());
        let page = resp.data.unwrap().list_notes.unwrap();
        let records: Vec<NoteRecord> = page.items.into_iter().flatten().collect();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].image.as_deref(), Some("images/1-beach.jpg"));
    }

    #[test]
    fn test_error_list_without_data() {
        let body = r#"{ "data": null, "errors": [ { "message": "Not Authorized to access listNotes", "errorType": "Unauthorized" } ] }"#;
        let resp: GraphqlResponse<ListNotesData> = serde_json::from_str(body).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.errors.len(), 1);
        assert_eq!(resp.errors[0].error_type.as_deref(), Some("Unauthorized"));
    }

    /// Serves canned GraphQL responses in order and records request bodies
    async fn spawn_graphql(
        responses: Vec<serde_json::Value>,
    ) -> (String, Arc<Mutex<Vec<(Option<String>, serde_json::Value)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let queue = Arc::new(Mutex::new(responses.into_iter()));

        let seen_handler = seen.clone();
        let app = Router::new().route(
            "/graphql",
            post(move |headers: HeaderMap, Json(body): Json<serde_json::Value>| {
                let seen = seen_handler.clone();
                let queue = queue.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|h| h.to_str().ok())
                        .map(str::to_string);
                    seen.lock().push((auth, body));
                    let next = queue.lock().next().unwrap_or(json!({ "data": null }));
                    Json(next)
                }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}/graphql", addr), seen)
    }

    #[tokio::test]
    async fn test_list_follows_next_token_with_bearer() {
        let (url, seen) = spawn_graphql(vec![
            json!({ "data": { "listNotes": {
                "items": [ { "id": "a", "content": "one", "image": null } ],
                "nextToken": "page-2"
            } } }),
            json!({ "data": { "listNotes": {
                "items": [ { "id": "b", "content": "two", "image": null } ],
                "nextToken": null
            } } }),
        ])
        .await;

        let store = GraphqlRecordStore::new(&url);
        let session = Session::new("alice", "id-token-123");
        let listed = store.list(&session).await.unwrap();

        let ids: Vec<&str> = listed.data.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert!(listed.errors.is_empty());

        let seen = seen.lock();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0].0.as_deref(), Some("id-token-123"));
        assert!(seen[0].1["variables"]["nextToken"].is_null());
        assert_eq!(seen[1].1["variables"]["nextToken"], "page-2");
    }

    #[tokio::test]
    async fn test_endless_paging_reports_truncation() {
        let pages: Vec<serde_json::Value> = (0..MAX_PAGES)
            .map(|i| {
                json!({ "data": { "listNotes": {
                    "items": [ { "id": format!("n{}", i), "content": "x", "image": null } ],
                    "nextToken": format!("page-{}", i + 1)
                } } })
            })
            .collect();
        let (url, seen) = spawn_graphql(pages).await;

        let store = GraphqlRecordStore::new(&url);
        let listed = store.list(&Session::new("alice", "tok")).await.unwrap();

        assert_eq!(seen.lock().len(), MAX_PAGES);
        assert_eq!(listed.data.len(), MAX_PAGES);
        assert_eq!(listed.errors.len(), 1);
        assert_eq!(listed.errors[0].error_type.as_deref(), Some("PageLimitExceeded"));
    }

    #[tokio::test]
    async fn test_create_surfaces_error_list() {
        let (url, seen) = spawn_graphql(vec![json!({
            "data": { "createNotes": null },
            "errors": [ { "message": "Unauthorized" } ]
        })])
        .await;

        let store = GraphqlRecordStore::new(&url);
        let result = store
            .create(
                &Session::new("alice", "tok"),
                CreateNoteInput {
                    content: "Buy milk".to_string(),
                    image: None,
                },
            )
            .await;

        assert!(matches!(result, Err(NotesError::Store(ref errs)) if errs[0].message == "Unauthorized"));
        assert_eq!(seen.lock()[0].1["variables"]["input"]["content"], "Buy milk");
    }

    #[tokio::test]
    async fn test_delete_returns_ack() {
        let (url, _seen) =
            spawn_graphql(vec![json!({ "data": { "deleteNotes": { "id": "a" } } })]).await;

        let store = GraphqlRecordStore::new(&url);
        let ack = store.delete(&Session::new("alice", "tok"), "a").await.unwrap();
        assert_eq!(ack.id.as_deref(), Some("a"));
        assert!(ack.errors.is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let store = GraphqlRecordStore::new(&format!("http://{}/graphql", addr));
        let result = store.list(&Session::new("alice", "tok")).await;
        assert!(matches!(result, Err(NotesError::Transport(_))));
    }
}
