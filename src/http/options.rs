//! Per-call request options.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::NaiveDate;

/// Overrides for a single request. Built fresh per call.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Client-side call timeout; `None` uses the default transport.
    pub timeout: Option<Duration>,
    /// Server-side processing budget, sent as `Timeout-Millis`.
    pub server_timeout: Option<Duration>,
    /// Sent as `Request-Id`; generated when absent or empty.
    pub request_id: Option<String>,
    /// Extra headers; override the client's customer headers.
    pub headers: BTreeMap<String, String>,
    /// Extra query parameters; override `stage`.
    pub queries: BTreeMap<String, String>,
    /// Batch pipeline phase, sent as the `stage` query parameter.
    pub stage: Option<String>,
    /// Sent as `Content-Date` (ISO date).
    pub data_date: Option<NaiveDate>,
    /// Sent as `Content-End`.
    pub data_is_end: Option<bool>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Non-positive timeouts are ignored.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        if !timeout.is_zero() {
            self.timeout = Some(timeout);
        }
        self
    }

    pub fn with_server_timeout(mut self, timeout: Duration) -> Self {
        self.server_timeout = Some(timeout);
        self
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.queries.insert(name.into(), value.into());
        self
    }

    pub fn with_stage(mut self, stage: impl Into<String>) -> Self {
        self.stage = Some(stage.into());
        self
    }

    pub fn with_data_date(mut self, date: NaiveDate) -> Self {
        self.data_date = Some(date);
        self
    }

    pub fn with_data_end(mut self, is_end: bool) -> Self {
        self.data_is_end = Some(is_end);
        self
    }

    /// Query parameters to append: `stage` first, explicit queries win.
    pub(crate) fn query_params(&self) -> BTreeMap<String, String> {
        let mut params = BTreeMap::new();
        if let Some(stage) = &self.stage {
            params.insert("stage".to_string(), stage.clone());
        }
        params.extend(self.queries.iter().map(|(k, v)| (k.clone(), v.clone())));
        params
    }

    /// The caller's request id, if it is usable.
    pub(crate) fn explicit_request_id(&self) -> Option<&str> {
        self.request_id.as_deref().filter(|id| !id.is_empty())
    }
}
