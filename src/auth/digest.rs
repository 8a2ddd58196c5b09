//! Hash primitives shared by both signers.

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::auth::SignError;

type HmacSha256 = Hmac<Sha256>;

/// Lower-case hex SHA-256 of `data`.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// HMAC-SHA256 of `content` under `key`.
pub fn hmac_sha256(key: &[u8], content: &[u8]) -> Result<Vec<u8>, SignError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|e| SignError::Key(e.to_string()))?;
    mac.update(content);
    Ok(mac.finalize().into_bytes().to_vec())
}
