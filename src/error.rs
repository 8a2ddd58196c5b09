//! Error taxonomy surfaced to callers of the dispatcher.
//!
//! Exactly two kinds leave the crate from a request call:
//! - `Network`: the exchange could not complete (connect/read timeout,
//!   reset, refused). Safe to retry at a higher layer.
//! - `Protocol`: something was received (or could not be built) but it is
//!   semantically invalid: non-2xx status, undecodable body, bad header.
//!
//! Probe failures in the health monitor never become errors.

use thiserror::Error;

/// Maximum number of response-body bytes kept for diagnostics.
pub const MAX_DIAGNOSTIC_BODY: usize = 1024;

/// Errors returned by a dispatched request.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Transport could not complete the exchange in time or at all.
    #[error("network error calling {url}: {message}")]
    Network {
        url: String,
        message: String,
        timeout: bool,
    },

    /// A response was received (or the request could not be built) but it
    /// is not usable by the caller.
    #[error("protocol error calling {url}{}: {message}", status_suffix(.status))]
    Protocol {
        url: String,
        status: Option<u16>,
        message: String,
        body: String,
    },
}

impl ClientError {
    pub(crate) fn network(url: impl Into<String>, message: impl Into<String>, timeout: bool) -> Self {
        ClientError::Network {
            url: url.into(),
            message: message.into(),
            timeout,
        }
    }

    pub(crate) fn protocol(url: impl Into<String>, message: impl Into<String>) -> Self {
        ClientError::Protocol {
            url: url.into(),
            status: None,
            message: message.into(),
            body: String::new(),
        }
    }

    pub(crate) fn bad_status(url: impl Into<String>, status: u16, message: impl Into<String>, body: &[u8]) -> Self {
        ClientError::Protocol {
            url: url.into(),
            status: Some(status),
            message: message.into(),
            body: truncate_body(body),
        }
    }

    /// A 2xx body that the caller's decoder rejected.
    pub(crate) fn undecodable(url: impl Into<String>, message: impl Into<String>, body: &[u8]) -> Self {
        ClientError::Protocol {
            url: url.into(),
            status: None,
            message: message.into(),
            body: truncate_body(body),
        }
    }

    /// Network failures may be retried; protocol failures need inspection.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network { .. })
    }

    /// True when the transport gave up because the deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Network { timeout: true, .. })
    }

    /// HTTP status of the failed exchange, when one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Protocol { status, .. } => *status,
            ClientError::Network { .. } => None,
        }
    }

    /// URL the failed request was sent to.
    pub fn url(&self) -> &str {
        match self {
            ClientError::Network { url, .. } | ClientError::Protocol { url, .. } => url,
        }
    }
}

/// Result type for dispatched requests.
pub type ClientResult<T> = Result<T, ClientError>;

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" (status {s})")).unwrap_or_default()
}

/// Lossy UTF-8 rendering of at most `MAX_DIAGNOSTIC_BODY` bytes.
pub(crate) fn truncate_body(body: &[u8]) -> String {
    let end = body.len().min(MAX_DIAGNOSTIC_BODY);
    let mut text = String::from_utf8_lossy(&body[..end]).into_owned();
    if body.len() > MAX_DIAGNOSTIC_BODY {
        text.push_str("...");
    }
    text
}
