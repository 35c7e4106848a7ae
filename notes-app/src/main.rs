//! Notes service — a small note-taking client over a record store and a blob store.
//!
//! Serves the notes page and a JSON RPC surface. Notes live in the configured
//! record store (local SQLite or the managed GraphQL API); images live in the
//! blob store and are read back through signed, time-limited URLs.
//!
//! Default: http://127.0.0.1:9110/

mod blobs;
mod config;
mod error;
mod manager;
mod records;
mod routes;
mod session;
mod web;

use blobs::{FsBlobStore, UrlSigner};
use config::{Config, RecordBackend};
use manager::NoteManager;
use records::{GraphqlRecordStore, RecordStore, SqliteRecordStore};
use routes::AppState;
use std::sync::Arc;
use std::time::Instant;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    };

    let records: Arc<dyn RecordStore> = match config.record_backend {
        RecordBackend::Sqlite => match SqliteRecordStore::open(&config.database_url) {
            Ok(store) => {
                log::info!("[RECORDS] Using SQLite store at {}", config.database_url);
                Arc::new(store)
            }
            Err(e) => {
                log::error!("Failed to open {}: {}", config.database_url, e);
                std::process::exit(1);
            }
        },
        RecordBackend::Graphql => {
            // Presence checked by Config::from_env
            let url = config.graphql_url.clone().unwrap_or_default();
            log::info!("[RECORDS] Using GraphQL store at {}", url);
            Arc::new(GraphqlRecordStore::new(&url))
        }
    };

    let signer = match &config.signing_key {
        Some(key) => UrlSigner::new(key.as_bytes().to_vec(), config.url_ttl),
        None => {
            log::warn!("[BLOBS] No signing key set; signed URLs will not survive a restart");
            UrlSigner::random(config.url_ttl)
        }
    };

    let blobs = match FsBlobStore::new(config.blob_dir.clone(), signer, &config.public_url) {
        Ok(store) => Arc::new(store),
        Err(e) => {
            log::error!("Failed to open blob dir {}: {}", config.blob_dir.display(), e);
            std::process::exit(1);
        }
    };

    let manager = NoteManager::new(records, blobs.clone(), config.session.clone());
    match manager.refresh().await {
        Ok(count) => log::info!("[NOTES] Loaded {} notes for {}", count, config.session.user),
        Err(e) => log::warn!("[NOTES] Initial load failed: {}", e),
    }

    let state = Arc::new(AppState {
        manager,
        blobs,
        start_time: Instant::now(),
    });

    let cors = tower_http::cors::CorsLayer::permissive();
    let app = routes::router(state).layer(cors);

    let addr = format!("127.0.0.1:{}", config.port);
    log::info!("Notes service listening on http://{}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            log::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(listener, app).await {
        log::error!("Server error: {}", e);
    }
}
