//! Host-qualified service URLs.
//!
//! Business calls never resolve the host themselves; they read the URL set
//! published here. `ServiceUrls` subscribes to the monitor and rebuilds the
//! whole set in one atomic swap when the selected host changes, so a
//! reader never sees URLs for two different hosts.

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::config::Schema;
use crate::health::listener::{HostChange, HostListener};

/// URLs bound to one host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlSet {
    pub host: String,
    pub ping: String,
    /// `.../data/api/{tenant}/operation?method=get`
    pub get_operation: String,
    /// `.../data/api/{tenant}/operation?method=list`
    pub list_operations: String,
}

#[derive(Debug)]
pub struct ServiceUrls {
    schema: Schema,
    tenant: String,
    ping_path: String,
    current: ArcSwap<UrlSet>,
}

impl ServiceUrls {
    pub fn new(schema: Schema, tenant: impl Into<String>, ping_path: impl Into<String>, host: &str) -> Self {
        let tenant = tenant.into();
        let ping_path = ping_path.into();
        let set = build(schema, &tenant, &ping_path, host);
        Self {
            schema,
            tenant,
            ping_path,
            current: ArcSwap::from_pointee(set),
        }
    }

    pub fn current(&self) -> Arc<UrlSet> {
        self.current.load_full()
    }

    /// `{schema}://{host}{path}` against the current host.
    pub fn url_for(&self, path: &str) -> String {
        let urls = self.current.load();
        join(self.schema, &urls.host, path)
    }

    fn refresh(&self, host: &str) {
        let set = build(self.schema, &self.tenant, &self.ping_path, host);
        self.current.store(Arc::new(set));
        tracing::debug!(host = %host, "Service URLs refreshed");
    }
}

impl HostListener for ServiceUrls {
    fn on_host_change(&self, change: &HostChange) {
        self.refresh(&change.current);
    }
}

fn build(schema: Schema, tenant: &str, ping_path: &str, host: &str) -> UrlSet {
    let operation = join(schema, host, &format!("/data/api/{tenant}/operation"));
    UrlSet {
        host: host.to_string(),
        ping: join(schema, host, ping_path),
        get_operation: format!("{operation}?method=get"),
        list_operations: format!("{operation}?method=list"),
    }
}

fn join(schema: Schema, host: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}://{}{}", schema.as_str(), host, path)
    } else {
        format!("{}://{}/{}", schema.as_str(), host, path)
    }
}
