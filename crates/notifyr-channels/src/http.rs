//! HTTP request executor shared by the REST channels.
//!
//! One call = one request with its own wall-clock timeout. The underlying
//! `reqwest::Client` is injected so every channel (and every test) shares
//! a single connection pool.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

use notifyr_core::NotifyError;

/// Status, headers and body of a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == StatusCode::OK
    }

    /// Decode the body as JSON; failures are protocol errors.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, NotifyError> {
        serde_json::from_slice(&self.body)
            .map_err(|e| NotifyError::protocol(format!("decode response: {e}")))
    }
}

/// Performs single HTTP requests against a shared client.
#[derive(Clone, Debug)]
pub struct HttpExecutor {
    client: reqwest::Client,
}

impl HttpExecutor {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// `GET url`.
    pub async fn get(
        &self,
        url: Url,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, NotifyError> {
        self.execute(self.client.get(url), timeout).await
    }

    /// `POST url` with a JSON body.
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        url: Url,
        body: &B,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, NotifyError> {
        self.execute(self.client.post(url).json(body), timeout).await
    }

    async fn execute(
        &self,
        request: RequestBuilder,
        timeout: Option<Duration>,
    ) -> Result<HttpResponse, NotifyError> {
        let request = match timeout {
            Some(t) => request.timeout(t),
            None => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| NotifyError::Transport(format!("read response body: {e}")))?
            .to_vec();

        debug!(status = %status, bytes = body.len(), "http response received");

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}
