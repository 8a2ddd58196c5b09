//! Single request/response exchange.
//!
//! # Responsibilities
//! - Compress the body and build the outbound header set
//! - Sign over the bytes actually sent
//! - Pick a timeout-scoped transport and execute
//! - Classify the outcome into `ClientError::{Network, Protocol}`
//! - Decompress and optionally decode the response

use std::fmt::Display;
use std::sync::Arc;
use std::time::Instant;

use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::auth::{RequestSigner, SigningRequest};
use crate::error::{ClientError, ClientResult};
use crate::http::compression::{self, Encoded};
use crate::http::options::RequestOptions;
use crate::http::query::merge_queries;
use crate::http::transport::TransportPool;
use crate::http::{CONTENT_DATE, CONTENT_END, REQUEST_ID, TENANT_ID, TIMEOUT_MILLIS};
use crate::observability::metrics::{
    error_type, MetricsSink, COMMON_ERROR, REQUEST_COST, REQUEST_TOTAL_COST,
};

pub const CONTENT_TYPE_PROTOBUF: &str = "application/x-protobuf";
pub const CONTENT_TYPE_JSON: &str = "application/json";

/// Executes signed, compressed business requests.
///
/// Shared by every call of a client; holds no per-call state.
pub struct RequestDispatcher {
    tenant: String,
    tenant_id: String,
    customer_headers: HeaderMap,
    signer: RequestSigner,
    transport: Arc<TransportPool>,
    metrics: Arc<dyn MetricsSink>,
}

impl RequestDispatcher {
    pub fn new(
        tenant: impl Into<String>,
        tenant_id: impl Into<String>,
        customer_headers: HeaderMap,
        signer: RequestSigner,
        transport: Arc<TransportPool>,
        metrics: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            tenant_id: tenant_id.into(),
            customer_headers,
            signer,
            transport,
            metrics,
        }
    }

    pub fn transport(&self) -> &Arc<TransportPool> {
        &self.transport
    }

    /// POST `body` to `url` and return the (decompressed) response body.
    pub async fn dispatch(
        &self,
        url: &str,
        body: &[u8],
        content_type: &str,
        options: &RequestOptions,
    ) -> ClientResult<Vec<u8>> {
        let started = Instant::now();
        let parsed =
            Url::parse(url).map_err(|e| ClientError::protocol(url, format!("invalid url: {e}")))?;
        let target = merge_queries(&parsed, &options.query_params());
        let target_str = target.to_string();

        let encoded = compression::compress(body);
        let mut headers = self
            .build_headers(content_type, &encoded, options)
            .map_err(|message| ClientError::protocol(&target_str, message))?;

        let signed = self
            .signer
            .sign(&SigningRequest {
                method: "POST",
                url: &target,
                headers: &headers,
                body: &encoded.bytes,
            })
            .map_err(|e| ClientError::protocol(&target_str, format!("signing failed: {e}")))?;
        signed.apply(&mut headers);

        let client = self
            .transport
            .client_for(options.timeout)
            .map_err(|e| ClientError::protocol(&target_str, format!("transport unavailable: {e}")))?;

        let response = client
            .post(target)
            .headers(headers)
            .body(encoded.bytes)
            .send()
            .await
            .map_err(|e| self.transport_error(&target_str, e))?;

        let tags = self.tags(&target_str);
        self.metrics
            .timer(REQUEST_COST, started.elapsed().as_millis() as u64, &tags);

        let status = response.status();
        let response_headers = response.headers().clone();
        let raw = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&target_str, e))?;
        let gzipped = compression::is_gzip(
            response_headers
                .get(CONTENT_ENCODING)
                .and_then(|v| v.to_str().ok()),
        );
        let body = if gzipped {
            compression::decompress(&raw, &target_str)
        } else {
            raw.to_vec()
        };

        let total_ms = started.elapsed().as_millis() as u64;
        self.metrics.timer(REQUEST_TOTAL_COST, total_ms, &tags);

        if !status.is_success() {
            tracing::warn!(
                url = %target_str,
                status = status.as_u16(),
                headers = ?response_headers,
                body = %crate::error::truncate_body(&body),
                "Request failed: status not ok"
            );
            self.count_error(error_type::STATUS_NOT_OK, &target_str, Some(status.as_u16()));
            return Err(ClientError::bad_status(
                target_str,
                status.as_u16(),
                status.canonical_reason().unwrap_or("unexpected status"),
                &body,
            ));
        }

        tracing::debug!(url = %target_str, cost_ms = total_ms, bytes = body.len(), "Request complete");
        Ok(body)
    }

    /// Serialize `request` as JSON, dispatch, and parse the JSON response.
    pub async fn dispatch_json<Req, Resp>(
        &self,
        url: &str,
        request: &Req,
        options: &RequestOptions,
    ) -> ClientResult<Resp>
    where
        Req: Serialize + ?Sized,
        Resp: DeserializeOwned,
    {
        let body = serde_json::to_vec(request)
            .map_err(|e| ClientError::protocol(url, format!("failed to encode request: {e}")))?;
        self.dispatch_decode(url, &body, CONTENT_TYPE_JSON, options, |bytes| {
            serde_json::from_slice::<Resp>(bytes)
        })
        .await
    }

    /// Dispatch and hand the response body to `decode` (e.g. a protobuf
    /// parser). A decode failure is a `Protocol` error without a status.
    pub async fn dispatch_decode<T, E, F>(
        &self,
        url: &str,
        body: &[u8],
        content_type: &str,
        options: &RequestOptions,
        decode: F,
    ) -> ClientResult<T>
    where
        E: Display,
        F: FnOnce(&[u8]) -> Result<T, E>,
    {
        let bytes = self.dispatch(url, body, content_type, options).await?;
        decode(&bytes).map_err(|e| {
            tracing::error!(url = %url, error = %e, "Failed to decode response");
            self.count_error(error_type::PARSE_RESPONSE_FAIL, url, None);
            ClientError::undecodable(url, format!("failed to decode response: {e}"), &bytes)
        })
    }

    fn build_headers(
        &self,
        content_type: &str,
        encoded: &Encoded,
        options: &RequestOptions,
    ) -> Result<HeaderMap, String> {
        let mut headers = HeaderMap::new();
        // A failed compression sends the raw body; it must not be labelled gzip.
        if encoded.gzipped || encoded.bytes.is_empty() {
            headers.insert(CONTENT_ENCODING, HeaderValue::from_static("gzip"));
        }
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip"));
        headers.insert(CONTENT_TYPE, header_value(content_type)?);
        headers.insert(ACCEPT, HeaderValue::from_static(CONTENT_TYPE_PROTOBUF));
        headers.insert(TENANT_ID, header_value(&self.tenant_id)?);

        for (name, value) in &self.customer_headers {
            headers.insert(name.clone(), value.clone());
        }
        for (name, value) in &options.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| format!("invalid header name {name}: {e}"))?;
            headers.insert(name, header_value(value)?);
        }

        let request_id = match options.explicit_request_id() {
            Some(id) => id.to_string(),
            None => {
                let id = Uuid::new_v4().to_string();
                tracing::debug!(request_id = %id, "No request id supplied, generated one");
                id
            }
        };
        headers.insert(REQUEST_ID, header_value(&request_id)?);

        if let Some(date) = options.data_date {
            headers.insert(CONTENT_DATE, header_value(&date.format("%Y-%m-%d").to_string())?);
        }
        if let Some(is_end) = options.data_is_end {
            headers.insert(CONTENT_END, header_value(&is_end.to_string())?);
        }
        if let Some(timeout) = options.server_timeout {
            headers.insert(TIMEOUT_MILLIS, header_value(&timeout.as_millis().to_string())?);
        }
        Ok(headers)
    }

    fn transport_error(&self, url: &str, err: reqwest::Error) -> ClientError {
        if err.is_builder() {
            tracing::error!(url = %url, error = %err, "Failed to build request");
            return ClientError::protocol(url, err.to_string());
        }
        let timeout = err.is_timeout();
        let kind = if timeout {
            error_type::REQUEST_TIMEOUT
        } else {
            error_type::REQUEST_EXCEPTION
        };
        tracing::error!(url = %url, error = %err, timeout, "Request failed: transport error");
        self.count_error(kind, url, None);
        ClientError::network(url, describe(&err), timeout)
    }

    fn count_error(&self, kind: &str, url: &str, status: Option<u16>) {
        let mut tags = self.tags(url);
        tags.push(("type", kind.to_string()));
        if let Some(status) = status {
            tags.push(("status", status.to_string()));
        }
        self.metrics.counter(COMMON_ERROR, 1, &tags);
    }

    fn tags(&self, url: &str) -> Vec<(&'static str, String)> {
        vec![("url", url.to_string()), ("tenant", self.tenant.clone())]
    }
}

impl std::fmt::Debug for RequestDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestDispatcher")
            .field("tenant", &self.tenant)
            .field("tenant_id", &self.tenant_id)
            .field("signer", &self.signer.mode())
            .finish_non_exhaustive()
    }
}

fn header_value(value: &str) -> Result<HeaderValue, String> {
    HeaderValue::from_str(value).map_err(|e| format!("invalid header value {value:?}: {e}"))
}

/// Error text including the source chain; reqwest's top-level message is
/// often just "error sending request".
fn describe(err: &reqwest::Error) -> String {
    let mut text = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}
