//! Filesystem-backed blob store whose signed URLs are served by `/blobs/`.

use async_trait::async_trait;
use chrono::Utc;
use std::path::PathBuf;

use super::signing::UrlSigner;
use super::{validate_path, BlobStore, SignedUrl};
use crate::error::NotesError;
use crate::session::Session;

pub struct FsBlobStore {
    root: PathBuf,
    signer: UrlSigner,
    /// Base URL signed links are minted against (no trailing slash)
    public_url: String,
}

impl FsBlobStore {
    pub fn new(root: PathBuf, signer: UrlSigner, public_url: &str) -> Result<Self, NotesError> {
        std::fs::create_dir_all(&root)?;
        Ok(Self {
            root,
            signer,
            public_url: public_url.trim_end_matches('/').to_string(),
        })
    }

    /// Check a signed link's query parameters for `path`
    pub fn verify(&self, path: &str, expires: i64, sig: &str) -> bool {
        validate_path(path).is_ok() && self.signer.verify(path, expires, sig, Utc::now())
    }

    /// Read stored bytes; callers must `verify` first
    pub async fn read(&self, path: &str) -> Result<Vec<u8>, NotesError> {
        validate_path(path)?;

        // Canonicalize and verify within the store root
        let canonical_root = tokio::fs::canonicalize(&self.root).await?;
        let canonical_file = tokio::fs::canonicalize(self.root.join(path)).await?;
        if !canonical_file.starts_with(&canonical_root) {
            return Err(NotesError::InvalidPath(path.to_string()));
        }

        Ok(tokio::fs::read(&canonical_file).await?)
    }
}

/// Percent-encode each segment, keeping the separators
fn encode_path(path: &str) -> String {
    path.split('/')
        .map(|seg| urlencoding::encode(seg).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn upload(
        &self,
        session: &Session,
        path: &str,
        data: Vec<u8>,
    ) -> Result<(), NotesError> {
        validate_path(path)?;

        let full_path = self.root.join(path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let size = data.len();
        tokio::fs::write(&full_path, data)
            .await
            .map_err(|e| NotesError::Blob(format!("Failed to write {}: {}", path, e)))?;

        log::info!("[BLOBS] {} uploaded {} ({} bytes)", session.user, path, size);
        Ok(())
    }

    async fn get_url(&self, _session: &Session, path: &str) -> Result<SignedUrl, NotesError> {
        validate_path(path)?;

        let (expires_at, sig) = self.signer.sign(path, Utc::now())?;
        Ok(SignedUrl {
            url: format!(
                "{}/blobs/{}?expires={}&sig={}",
                self.public_url,
                encode_path(path),
                expires_at.timestamp(),
                sig
            ),
            expires_at,
        })
    }
}
