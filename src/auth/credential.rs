//! Access-key credential for canonical-request signing.

use std::fmt;

/// Immutable credential supplied at client construction.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub access_key: String,
    pub secret_key: String,
    pub service: String,
    pub region: String,
}

impl Credential {
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        service: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            service: service.into(),
            region: region.into(),
        }
    }
}

// Never print the secret key.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .field("service", &self.service)
            .field("region", &self.region)
            .finish()
    }
}
