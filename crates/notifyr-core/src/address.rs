//! Address builder: endpoint URL construction.
//!
//! Query parameters are sorted by key before encoding, so the same inputs
//! always produce the same string regardless of the order they were given in.
//! Values use form encoding (space becomes `+`).

use url::Url;

use crate::error::NotifyError;

/// Scheme + host pair that endpoint URLs are built against.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Address {
    scheme: String,
    host: String,
}

impl Address {
    /// `host` may carry a port (`127.0.0.1:8080`).
    pub fn new(scheme: impl Into<String>, host: impl Into<String>) -> Self {
        Address {
            scheme: scheme.into(),
            host: host.into(),
        }
    }

    /// Build `scheme://host/path?k1=v1&k2=v2`.
    pub fn endpoint<K, V>(&self, path: &str, params: &[(K, V)]) -> Result<Url, NotifyError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let base = format!("{}://{}", self.scheme, self.host);
        let mut url = Url::parse(&base)
            .map_err(|e| NotifyError::Config(format!("invalid base url '{base}': {e}")))?;
        url.set_path(path);

        if params.is_empty() {
            url.set_query(None);
            return Ok(url);
        }

        let mut sorted: Vec<(&str, &str)> =
            params.iter().map(|(k, v)| (k.as_ref(), v.as_ref())).collect();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        url.query_pairs_mut().extend_pairs(sorted);
        Ok(url)
    }
}
