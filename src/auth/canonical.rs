//! Canonical-request HMAC signing.
//!
//! # Responsibilities
//! - Normalize the request into a canonical string
//! - Derive the per-day signing key from the secret
//! - Emit `X-Date`, `X-Content-Sha256` and `Authorization`
//!
//! Only `content-type`, `content-md5`, `host` and `x-*` headers are signed.
//! Headers the signer adds itself are not part of the signature.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use url::Url;

use crate::auth::digest::{hmac_sha256, sha256_hex};
use crate::auth::{Credential, SignError, SignedHeaders, SigningRequest};

pub const X_DATE: &str = "X-Date";
pub const X_CONTENT_SHA256: &str = "X-Content-Sha256";
pub const AUTHORIZATION: &str = "Authorization";

const ALGORITHM: &str = "HMAC-SHA256";
const TERMINATOR: &str = "request";
const X_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

#[derive(Debug, Clone)]
pub struct CanonicalSigner {
    credential: Credential,
}

/// Canonical form of a request plus the pieces later steps reuse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalRequest {
    pub text: String,
    pub signed_headers: String,
    pub body_hash: String,
}

impl CanonicalSigner {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    pub fn sign_at(
        &self,
        request: &SigningRequest<'_>,
        now: DateTime<Utc>,
    ) -> Result<SignedHeaders, SignError> {
        let x_date = now.format(X_DATE_FORMAT).to_string();
        let date = &x_date[..8];
        let scope = format!(
            "{date}/{}/{}/{TERMINATOR}",
            self.credential.region, self.credential.service
        );

        let canonical = canonical_request(request);
        let string_to_sign = format!(
            "{ALGORITHM}\n{x_date}\n{scope}\n{}",
            sha256_hex(canonical.text.as_bytes())
        );
        let key = self.signing_key(date)?;
        let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes())?);

        let authorization = format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={}, Signature={signature}",
            self.credential.access_key, canonical.signed_headers
        );

        let mut headers = SignedHeaders::default();
        headers.push(X_DATE, &x_date)?;
        headers.push(X_CONTENT_SHA256, &canonical.body_hash)?;
        headers.push(AUTHORIZATION, &authorization)?;
        Ok(headers)
    }

    /// `HMAC(HMAC(HMAC(HMAC(secret, date), region), service), "request")`
    fn signing_key(&self, date: &str) -> Result<Vec<u8>, SignError> {
        let k_date = hmac_sha256(self.credential.secret_key.as_bytes(), date.as_bytes())?;
        let k_region = hmac_sha256(&k_date, self.credential.region.as_bytes())?;
        let k_service = hmac_sha256(&k_region, self.credential.service.as_bytes())?;
        hmac_sha256(&k_service, TERMINATOR.as_bytes())
    }
}

/// Build the canonical request:
///
/// ```text
/// METHOD\nPATH\nQUERY\nNAME:VALUE\n...\nNAMES\nBODY_HASH
/// ```
pub fn canonical_request(request: &SigningRequest<'_>) -> CanonicalRequest {
    let (block, names) = canonical_headers(request.headers);
    let body_hash = sha256_hex(request.body);
    let text = [
        request.method.to_ascii_uppercase(),
        normalize_path(request.url),
        normalize_query(request.url),
        block,
        names.clone(),
        body_hash.clone(),
    ]
    .join("\n");

    CanonicalRequest {
        text,
        signed_headers: names,
        body_hash,
    }
}

fn normalize_path(url: &Url) -> String {
    let path = url.path();
    let path = if path.is_empty() { "/" } else { path };
    path.replace("%2F", "/").replace('+', "%20")
}

/// Sorted by name, first value wins, `%20` for spaces, `/` left literal.
fn normalize_query(url: &Url) -> String {
    let mut first: BTreeMap<String, String> = BTreeMap::new();
    for (name, value) in url.query_pairs() {
        first.entry(name.into_owned()).or_insert_with(|| value.into_owned());
    }
    if first.is_empty() {
        return String::new();
    }

    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(first.iter())
        .finish()
        .replace('+', "%20")
        .replace("%2F", "/")
}

fn canonical_headers(headers: &HeaderMap) -> (String, String) {
    let mut selected: BTreeMap<&str, String> = BTreeMap::new();
    for (name, value) in headers {
        let name = name.as_str();
        if !is_signed_header(name) || selected.contains_key(name) {
            continue;
        }
        let value = match value.to_str() {
            Ok(v) => v.trim().to_string(),
            Err(_) => String::from_utf8_lossy(value.as_bytes()).trim().to_string(),
        };
        let value = if name == "host" {
            strip_default_port(&value).to_string()
        } else {
            value
        };
        selected.insert(name, value);
    }

    let block: String = selected
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();
    let names = selected.keys().copied().collect::<Vec<_>>().join(";");
    (block, names)
}

fn is_signed_header(name: &str) -> bool {
    matches!(name, "content-type" | "content-md5" | "host") || name.starts_with("x-")
}

fn strip_default_port(host: &str) -> &str {
    match host.rsplit_once(':') {
        Some((bare, "80" | "443")) => bare,
        _ => host,
    }
}
