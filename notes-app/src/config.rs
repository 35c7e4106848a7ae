use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::NotesError;
use crate::session::Session;

/// Environment variable names - single source of truth
pub mod env_vars {
    pub const PORT: &str = "NOTES_PORT";
    /// Externally reachable base URL, used when minting signed blob URLs.
    /// Falls back to http://127.0.0.1:{PORT}.
    pub const PUBLIC_URL: &str = "NOTES_PUBLIC_URL";
    /// "sqlite" (default) or "graphql"
    pub const RECORD_BACKEND: &str = "NOTES_RECORD_BACKEND";
    pub const DATABASE_URL: &str = "NOTES_DATABASE_URL";
    pub const GRAPHQL_URL: &str = "NOTES_GRAPHQL_URL";
    pub const BLOB_DIR: &str = "NOTES_BLOB_DIR";
    /// HMAC key for signed blob URLs. A random key is generated per process when unset,
    /// which invalidates outstanding URLs on restart.
    pub const SIGNING_KEY: &str = "NOTES_SIGNING_KEY";
    pub const URL_TTL_SECS: &str = "NOTES_URL_TTL_SECS";
    pub const USER: &str = "NOTES_USER";
    pub const ID_TOKEN: &str = "NOTES_ID_TOKEN";
}

/// Default values
pub mod defaults {
    pub const PORT: u16 = 9110;
    pub const DATABASE_URL: &str = "./.db/notes.db";
    pub const BLOB_DIR: &str = "./.blobs";
    pub const URL_TTL_SECS: u64 = 900;
    /// Longest allowed signed-URL lifetime (7 days)
    pub const MAX_URL_TTL_SECS: u64 = 7 * 24 * 3600;
    pub const USER: &str = "local";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordBackend {
    Sqlite,
    Graphql,
}

impl RecordBackend {
    fn parse(s: &str) -> Result<Self, NotesError> {
        match s.trim().to_lowercase().as_str() {
            "sqlite" => Ok(RecordBackend::Sqlite),
            "graphql" => Ok(RecordBackend::Graphql),
            other => Err(NotesError::Config(format!(
                "unknown {}: {}",
                env_vars::RECORD_BACKEND,
                other
            ))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub public_url: String,
    pub record_backend: RecordBackend,
    pub database_url: String,
    pub graphql_url: Option<String>,
    pub blob_dir: PathBuf,
    pub signing_key: Option<String>,
    pub url_ttl: Duration,
    pub session: Session,
}

impl Config {
    /// Load from the process environment (call `dotenvy::dotenv()` first)
    pub fn from_env() -> Result<Self, NotesError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, NotesError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = match var(env_vars::PORT) {
            Some(s) => s.trim().parse().map_err(|e| {
                NotesError::Config(format!("invalid {}: {}", env_vars::PORT, e))
            })?,
            None => defaults::PORT,
        };

        let public_url = var(env_vars::PUBLIC_URL)
            .map(|u| u.trim_end_matches('/').to_string())
            .unwrap_or_else(|| format!("http://127.0.0.1:{}", port));

        let record_backend = match var(env_vars::RECORD_BACKEND) {
            Some(s) => RecordBackend::parse(&s)?,
            None => RecordBackend::Sqlite,
        };

        let graphql_url = var(env_vars::GRAPHQL_URL);
        let token = var(env_vars::ID_TOKEN).unwrap_or_default();

        if record_backend == RecordBackend::Graphql {
            if graphql_url.is_none() {
                return Err(NotesError::Config(format!(
                    "{} is required for the graphql backend",
                    env_vars::GRAPHQL_URL
                )));
            }
            if token.is_empty() {
                return Err(NotesError::Config(format!(
                    "{} is required for the graphql backend",
                    env_vars::ID_TOKEN
                )));
            }
        }

        let url_ttl_secs = match var(env_vars::URL_TTL_SECS) {
            Some(s) => s.trim().parse().map_err(|e| {
                NotesError::Config(format!("invalid {}: {}", env_vars::URL_TTL_SECS, e))
            })?,
            None => defaults::URL_TTL_SECS,
        };
        if url_ttl_secs > defaults::MAX_URL_TTL_SECS {
            return Err(NotesError::Config(format!(
                "{} must be at most {} seconds",
                env_vars::URL_TTL_SECS,
                defaults::MAX_URL_TTL_SECS
            )));
        }

        Ok(Self {
            port,
            public_url,
            record_backend,
            database_url: var(env_vars::DATABASE_URL)
                .unwrap_or_else(|| defaults::DATABASE_URL.to_string()),
            graphql_url,
            blob_dir: PathBuf::from(
                var(env_vars::BLOB_DIR).unwrap_or_else(|| defaults::BLOB_DIR.to_string()),
            ),
            signing_key: var(env_vars::SIGNING_KEY),
            url_ttl: Duration::from_secs(url_ttl_secs),
            session: Session::new(
                var(env_vars::USER).unwrap_or_else(|| defaults::USER.to_string()),
                token,
            ),
        })
    }
}
