//! Tenant-token signature.
//!
//! `signature = hex(SHA256(token || body || tenant_id || ts || nonce))`
//!
//! The server rejects timestamps more than a few seconds old, so `ts` is
//! read from the clock for every request. The 8-character nonce and
//! 1-second timestamp only give loose replay protection.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::auth::{SignError, SignedHeaders};

pub const TENANT_ID: &str = "Tenant-Id";
pub const TENANT_TS: &str = "Tenant-Ts";
pub const TENANT_NONCE: &str = "Tenant-Nonce";
pub const TENANT_SIGNATURE: &str = "Tenant-Signature";

const NONCE_LEN: usize = 8;

#[derive(Clone)]
pub struct SimpleSigner {
    tenant_id: String,
    token: String,
}

impl SimpleSigner {
    pub fn new(tenant_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            token: token.into(),
        }
    }

    /// Sign `body` at `now` with a fresh nonce.
    pub fn sign_at(&self, body: &[u8], now: DateTime<Utc>) -> Result<SignedHeaders, SignError> {
        let nonce = fresh_nonce();
        self.sign_with(body, &now.timestamp().to_string(), &nonce)
    }

    /// Sign with an explicit timestamp and nonce.
    pub fn sign_with(&self, body: &[u8], ts: &str, nonce: &str) -> Result<SignedHeaders, SignError> {
        let signature = self.signature(body, ts, nonce);
        let mut headers = SignedHeaders::default();
        headers.push(TENANT_ID, &self.tenant_id)?;
        headers.push(TENANT_TS, ts)?;
        headers.push(TENANT_NONCE, nonce)?;
        headers.push(TENANT_SIGNATURE, &signature)?;
        Ok(headers)
    }

    /// The order token, body, tenant id, ts, nonce must not change.
    pub fn signature(&self, body: &[u8], ts: &str, nonce: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.token.as_bytes());
        hasher.update(body);
        hasher.update(self.tenant_id.as_bytes());
        hasher.update(ts.as_bytes());
        hasher.update(nonce.as_bytes());
        hex::encode(hasher.finalize())
    }
}

impl std::fmt::Debug for SimpleSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleSigner")
            .field("tenant_id", &self.tenant_id)
            .finish_non_exhaustive()
    }
}

fn fresh_nonce() -> String {
    Uuid::new_v4().simple().to_string()[..NONCE_LEN].to_string()
}
