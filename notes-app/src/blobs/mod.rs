//! Blob store seam: image bytes addressed by path, read back through
//! time-limited signed URLs.

pub mod fs;
pub mod signing;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::NotesError;
use crate::session::Session;

pub use fs::FsBlobStore;
pub use signing::UrlSigner;

/// Prefix under which note images are uploaded
pub const IMAGE_PREFIX: &str = "images";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedUrl {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` at `path`; returns once the write is complete
    async fn upload(&self, session: &Session, path: &str, data: Vec<u8>) -> Result<(), NotesError>;

    async fn get_url(&self, session: &Session, path: &str) -> Result<SignedUrl, NotesError>;
}

/// Upload path for an image: `images/<unix-millis>-<file name>`.
///
/// Two same-name uploads within one millisecond land on the same path.
pub fn image_path(timestamp_ms: i64, file_name: &str) -> String {
    // Keep only the base name; some clients send full paths
    let base = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name);
    format!("{}/{}-{}", IMAGE_PREFIX, timestamp_ms, base)
}

/// Reject paths that could escape the store root
pub fn validate_path(path: &str) -> Result<(), NotesError> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.contains('\0')
        || path
            .split('/')
            .any(|seg| seg.is_empty() || seg == "." || seg == ".." || seg.starts_with('.'));

    if bad {
        return Err(NotesError::InvalidPath(path.to_string()));
    }
    Ok(())
}

/// Get MIME type for a blob path by extension
pub fn mime_for_path(path: &str) -> &'static str {
    let ext = path.rsplit('.').next().unwrap_or("").to_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "svg" => "image/svg+xml",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "avif" => "image/avif",
        _ => "application/octet-stream",
    }
}
