//! HTTP client for interacting with the server.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use url::Url;

use crate::{
    error::{Error, Result},
    types::*,
};

/// HTTP client for the API.
///
/// # Example
///
/// ```rust,no_run
/// use session_replay_sdk::{Client, Recorder};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = Client::new("http://localhost:5000")?;
///
/// let recorder = Recorder::new();
/// recorder.start();
/// recorder.log("tap", "Login");
/// let created = client.sessions().upload(&recorder.stop()).await?;
///
/// let recording = client.sessions().fetch(&created.session_id).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
}

impl Client {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - The base URL of the server (e.g., "http://localhost:5000").
    ///   A path prefix is kept, with or without a trailing slash.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        Self::with_client(base_url, reqwest::Client::new())
    }

    /// Create a new client with a custom reqwest client.
    pub fn with_client(base_url: impl AsRef<str>, http: reqwest::Client) -> Result<Self> {
        let base_url = Url::parse(base_url.as_ref())?;
        if base_url.cannot_be_a_base() {
            return Err(Error::InvalidUrl(url::ParseError::RelativeUrlWithCannotBeABaseBase));
        }
        Ok(Self { base_url, http })
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Access the Sessions API.
    pub fn sessions(&self) -> SessionsApi<'_> {
        SessionsApi { client: self }
    }

    /// Check server and store health.
    pub async fn health(&self) -> Result<Health> {
        let response = self.http.get(self.endpoint(&["health"])).send().await?;
        Self::handle_response(response).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Internal helpers
    // ─────────────────────────────────────────────────────────────────────────

    /// Base URL extended by `segments`, each percent-encoded as one segment.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn handle_response<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        if status.is_success() {
            Ok(response.json().await?)
        } else {
            let text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".into());
            // The server answers `{"error": "..."}`; fall back to the raw body.
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v.get("error").and_then(Value::as_str).map(str::to_string))
                .unwrap_or(text);
            Err(Error::Api {
                status: status.as_u16(),
                message,
            })
        }
    }
}

// =============================================================================
// Sessions API
// =============================================================================

/// Sessions API client.
#[derive(Debug)]
pub struct SessionsApi<'a> {
    client: &'a Client,
}

impl SessionsApi<'_> {
    /// Upload a finished recording as a new session.
    pub async fn upload(&self, recording: &Recording) -> Result<CreatedSession> {
        self.create(recording).await
    }

    /// Store an arbitrary JSON object as a new session.
    pub async fn create<T: Serialize + ?Sized>(&self, document: &T) -> Result<CreatedSession> {
        let response = self
            .client
            .http
            .post(self.client.endpoint(&["sessions"]))
            .json(document)
            .send()
            .await?;
        Client::handle_response(response).await
    }

    /// Get a session as raw JSON, by native id or session id.
    pub async fn get(&self, id: &str) -> Result<Value> {
        let response = self
            .client
            .http
            .get(self.client.endpoint(&["sessions", id]))
            .send()
            .await?;
        Client::handle_response(response).await
    }

    /// Get a session and decode it as a [`Recording`].
    pub async fn fetch(&self, id: &str) -> Result<Recording> {
        let value = self.get(id).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// List the newest sessions. `None` uses the server default.
    pub async fn list(&self, limit: Option<usize>) -> Result<SessionList> {
        let mut url = self.client.endpoint(&["sessions"]);
        if let Some(limit) = limit {
            url.query_pairs_mut()
                .append_pair("limit", &limit.to_string());
        }
        let response = self.client.http.get(url).send().await?;
        Client::handle_response(response).await
    }

    /// Merge fields into an existing session.
    pub async fn update<T: Serialize + ?Sized>(
        &self,
        id: &str,
        fields: &T,
    ) -> Result<UpdateOutcome> {
        let response = self
            .client
            .http
            .put(self.client.endpoint(&["sessions", id]))
            .json(fields)
            .send()
            .await?;
        Client::handle_response(response).await
    }

    /// Delete a session.
    pub async fn delete(&self, id: &str) -> Result<DeleteOutcome> {
        let response = self
            .client
            .http
            .delete(self.client.endpoint(&["sessions", id]))
            .send()
            .await?;
        Client::handle_response(response).await
    }
}
