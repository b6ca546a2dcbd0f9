//! Transport for game requests.
//!
//! Every failure, whether the network, a non-2xx status or an undecodable
//! body, collapses into one [`TransportError`] that the view shows verbatim.

use crate::error::FragmentError;
use derive_more::Error;
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Coarse failure class, named after the status words of browser AJAX.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum TransportStatus {
    /// Connection failure or non-2xx response.
    Error,
    /// The request timed out at the network layer.
    Timeout,
    /// The response could not be decoded.
    #[strum(serialize = "parsererror")]
    ParserError,
}

/// A failed round trip.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct TransportError {
    /// Failure class.
    pub status: TransportStatus,
    /// Optional detail, such as the HTTP reason phrase.
    pub reason: Option<String>,
}

impl TransportError {
    /// Creates a new transport error.
    pub fn new(status: TransportStatus, reason: Option<String>) -> Self {
        Self { status, reason }
    }

    /// Error for a non-2xx response.
    pub fn from_status(status: reqwest::StatusCode) -> Self {
        let reason = status
            .canonical_reason()
            .map(str::to_string)
            .unwrap_or_else(|| status.as_str().to_string());
        Self::new(TransportStatus::Error, Some(reason))
    }
}

impl fmt::Display for TransportError {
    /// `Error accessing server: Not Found`, status word capitalized.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} accessing server", capitalize(self.status.as_ref()))?;
        match self.reason.as_deref() {
            Some(reason) if !reason.is_empty() => write!(f, ": {}", reason),
            _ => Ok(()),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::new(TransportStatus::Timeout, Some(err.to_string()))
        } else if let Some(status) = err.status() {
            Self::from_status(status)
        } else {
            Self::new(TransportStatus::Error, Some(err.to_string()))
        }
    }
}

impl From<FragmentError> for TransportError {
    fn from(err: FragmentError) -> Self {
        Self::new(TransportStatus::ParserError, Some(err.message))
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Posts a JSON body and returns the HTML fragment the server answers with.
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Posts `body` to `path` on the game server.
    async fn post(&self, path: &str, body: serde_json::Value) -> Result<String, TransportError>;
}

/// [`Transport`] over HTTP.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    /// Base URL of game server.
    base_url: String,
    /// HTTP client.
    client: reqwest::Client,
}

impl HttpTransport {
    /// Creates a transport for the server at `base_url`.
    #[instrument(skip_all, fields(base_url = %base_url.as_ref()))]
    pub fn new(base_url: impl AsRef<str>) -> Self {
        let base_url = base_url.as_ref().trim_end_matches('/').to_string();
        info!(base_url = %base_url, "Creating HTTP transport");
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait::async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, body), fields(base_url = %self.base_url))]
    async fn post(&self, path: &str, body: serde_json::Value) -> Result<String, TransportError> {
        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, body = %body, "Posting to server");

        let response = self
            .client
            .post(&url)
            .header("Accept", "text/html")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, url = %url, "Request failed");
                TransportError::from(e)
            })?;

        let status = response.status();
        debug!(status = %status, "Received response");

        if !status.is_success() {
            warn!(status = %status, url = %url, "Server returned error status");
            return Err(TransportError::from_status(status));
        }

        let text = response.text().await.map_err(|e| {
            warn!(error = %e, "Failed to read response body");
            TransportError::from(e)
        })?;

        debug!(len = text.len(), "Response body");
        Ok(text)
    }
}
