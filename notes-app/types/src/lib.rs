//! Shared types for the notes service and its RPC clients.

use serde::{Deserialize, Serialize};

// =====================================================
// Record Types
// =====================================================

/// A note as held by the record store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteRecord {
    pub id: String,
    pub content: String,
    /// Stored blob path of the attached image, if any
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

/// Input for creating a note record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateNoteInput {
    pub content: String,
    pub image: Option<String>,
}

/// One entry of a store-level error list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreError {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            error_type: None,
        }
    }
}

// =====================================================
// View Types
// =====================================================

/// A note as displayed: the record plus a freshly resolved image URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: String,
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    /// Signed URL, valid only for the refresh that produced it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
}

impl From<NoteRecord> for Note {
    fn from(record: NoteRecord) -> Self {
        Self {
            id: record.id,
            content: record.content,
            image: record.image,
            image_url: None,
        }
    }
}

impl Note {
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

// =====================================================
// RPC Request Types
// =====================================================

/// Create a text-only note over RPC
#[derive(Debug, Serialize, Deserialize)]
pub struct CreateNoteRequest {
    pub content: String,
}

// =====================================================
// RPC Response Types
// =====================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct RpcResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> RpcResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(msg.into()),
        }
    }
}

/// Result of an RPC create; `note` is absent when the submission was skipped
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNoteResult {
    pub skipped: bool,
    #[serde(default)]
    pub note: Option<NoteRecord>,
}

/// Service health status
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub running: bool,
    pub uptime_secs: u64,
    pub signed_in: bool,
    pub record_backend: String,
    pub note_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_decodes_graphql_shape() {
        let json = r#"{"id":"n1","content":"Buy milk","image":null,"createdAt":"2024-01-01T00:00:00Z"}"#;
        let record: NoteRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, "n1");
        assert_eq!(record.image, None);
        assert_eq!(record.created_at.as_deref(), Some("2024-01-01T00:00:00Z"));
    }

    #[test]
    fn test_note_omits_missing_image_url() {
        let note = Note::from(NoteRecord {
            id: "n1".to_string(),
            content: "Buy milk".to_string(),
            image: None,
            created_at: None,
        });
        let json = serde_json::to_value(&note).unwrap();
        assert!(json.get("imageUrl").is_none());

        let with_url = note.with_image_url("https://example.test/x");
        let json = serde_json::to_value(&with_url).unwrap();
        assert_eq!(json["imageUrl"], "https://example.test/x");
    }

    #[test]
    fn test_store_error_reads_error_type() {
        let json = r#"{"message":"Not Authorized","errorType":"Unauthorized"}"#;
        let err: StoreError = serde_json::from_str(json).unwrap();
        assert_eq!(err.message, "Not Authorized");
        assert_eq!(err.error_type.as_deref(), Some("Unauthorized"));
    }
}
