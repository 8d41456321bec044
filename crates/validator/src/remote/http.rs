//! `reqwest`-backed transport

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::{CONTENT_TYPE, HeaderValue};

use super::transport::{RemoteResponse, RemoteTransport, parse_response};
use crate::error::RemoteError;

const FORM_URLENCODED: &str = "application/x-www-form-urlencoded";

/// Posts remote checks over HTTP.
///
/// Relative endpoint paths are resolved against the base URL, if one is set.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
    base_url: Option<String>,
}

impl HttpTransport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses an existing client (connection pool, proxy, TLS settings).
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            base_url: None,
        }
    }

    #[must_use = "builder methods must be chained or built"]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    fn resolve(&self, url: &str) -> String {
        match &self.base_url {
            Some(base) if !url.contains("://") => {
                format!("{}/{}", base.trim_end_matches('/'), url.trim_start_matches('/'))
            }
            _ => url.to_string(),
        }
    }
}

#[async_trait]
impl RemoteTransport for HttpTransport {
    async fn post(&self, url: &str, payload: String) -> Result<RemoteResponse, RemoteError> {
        let url = self.resolve(url);
        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, HeaderValue::from_static(FORM_URLENCODED))
            .header("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"))
            .body(payload)
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;
        parse_response(&body)
    }
}
