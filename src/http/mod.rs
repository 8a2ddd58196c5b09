//! Outbound HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! caller bytes + content type + RequestOptions
//!     → compression.rs (gzip, falls back to raw)
//!     → dispatcher.rs (fixed + customer + option headers)
//!     → query.rs (stage/queries merged into the URL)
//!     → auth (sign over the compressed body)
//!     → transport.rs (client scoped to the call timeout)
//!     → dispatcher.rs (classify, gunzip, decode)
//! ```
//!
//! # Design Decisions
//! - No retries here; callers decide using `ClientError::is_retryable`
//! - Automatic response decompression is off in reqwest so the gzip path
//!   is explicit and a corrupt stream degrades to an empty body
//! - Pings share the transport pool, keyed by the ping timeout

pub mod compression;
pub mod dispatcher;
pub mod options;
pub mod query;
pub mod transport;

pub use dispatcher::{RequestDispatcher, CONTENT_TYPE_JSON, CONTENT_TYPE_PROTOBUF};
pub use options::RequestOptions;
pub use transport::TransportPool;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use std::collections::BTreeMap;

pub const REQUEST_ID: HeaderName = HeaderName::from_static("request-id");
pub const TENANT_ID: HeaderName = HeaderName::from_static("tenant-id");
pub const CONTENT_DATE: HeaderName = HeaderName::from_static("content-date");
pub const CONTENT_END: HeaderName = HeaderName::from_static("content-end");
pub const TIMEOUT_MILLIS: HeaderName = HeaderName::from_static("timeout-millis");

/// Convert configured header pairs into a `HeaderMap`.
pub fn header_map(pairs: &BTreeMap<String, String>) -> Result<HeaderMap, String> {
    let mut headers = HeaderMap::with_capacity(pairs.len());
    for (name, value) in pairs {
        let header = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| format!("invalid header name {name}: {e}"))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| format!("invalid value for header {name}: {e}"))?;
        headers.insert(header, value);
    }
    Ok(headers)
}
