//! HMAC-SHA256 signatures for time-limited blob URLs.
//!
//! The signature covers the blob path and the expiry, so a URL cannot be
//! re-pointed at another blob or extended.

use chrono::{DateTime, Duration, TimeZone, Utc};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha256;

use crate::error::NotesError;

type HmacSha256 = Hmac<Sha256>;

pub struct UrlSigner {
    key: Vec<u8>,
    ttl: Duration,
}

impl UrlSigner {
    pub fn new(key: impl Into<Vec<u8>>, ttl: std::time::Duration) -> Self {
        Self {
            key: key.into(),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::seconds(900)),
        }
    }

    /// Signer with a random per-process key
    pub fn random(ttl: std::time::Duration) -> Self {
        let mut key = vec![0u8; 32];
        rand::thread_rng().fill_bytes(&mut key);
        Self::new(key, ttl)
    }

    fn mac(&self, path: &str, expires: i64) -> HmacSha256 {
        // HMAC accepts keys of any length
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC can take key of any size");
        mac.update(path.as_bytes());
        mac.update(b"\n");
        mac.update(expires.to_string().as_bytes());
        mac
    }

    /// Returns the expiry and hex signature for `path`
    pub fn sign(&self, path: &str, now: DateTime<Utc>) -> Result<(DateTime<Utc>, String), NotesError> {
        let expires_at = now.checked_add_signed(self.ttl).ok_or_else(|| {
            NotesError::Config(format!("URL TTL of {}s overflows the clock", self.ttl.num_seconds()))
        })?;
        let sig = hex::encode(self.mac(path, expires_at.timestamp()).finalize().into_bytes());
        Ok((expires_at, sig))
    }

    /// Constant-time check of signature and expiry
    pub fn verify(&self, path: &str, expires: i64, sig: &str, now: DateTime<Utc>) -> bool {
        let Some(expires_at) = Utc.timestamp_opt(expires, 0).single() else {
            return false;
        };
        if expires_at <= now {
            return false;
        }
        let Ok(sig_bytes) = hex::decode(sig) else {
            return false;
        };
        self.mac(path, expires).verify_slice(&sig_bytes).is_ok()
    }
}
