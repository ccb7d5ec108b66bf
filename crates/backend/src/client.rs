//! Shared HTTP plumbing for the backend's table routes.

use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::json;

use lutspace_core::config::BackendConfig;

/// PostgREST error code for a `.single()`-style fetch that matched zero
/// rows. Mapped to `Ok(None)` instead of an error.
const NOT_FOUND_CODE: &str = "PGRST116";

/// Postgres error code for a uniqueness-constraint violation.
const UNIQUE_VIOLATION_CODE: &str = "23505";

/// Errors from the backend query layer.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend returned an error envelope.
    #[error("Backend query failed ({code}): {message}")]
    Api {
        status: u16,
        /// PostgREST/Postgres error code, `"unknown"` when absent.
        code: String,
        message: String,
    },

    /// A success body that failed to deserialize into the expected shape.
    #[error("Backend returned an unexpected body: {0}")]
    Decode(String),
}

impl BackendError {
    /// True when the error is the zero-rows code for single-row fetches.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == NOT_FOUND_CODE)
    }

    /// True for uniqueness-constraint violations (duplicate insert).
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == UNIQUE_VIOLATION_CODE)
    }

    /// True for the known class of row-level-policy recursion
    /// misconfigurations, which non-critical reads tolerate as empty.
    pub fn is_policy_recursion(&self) -> bool {
        matches!(self, Self::Api { message, .. } if message.contains("infinite recursion"))
    }
}

/// Apply the two-tier persistence policy to an auxiliary write.
///
/// Critical-path writes propagate their errors; append-style audit writes
/// (messages, training-log updates) go through this wrapper instead,
/// which logs the failure and lets the caller continue.
pub fn best_effort<T>(result: Result<T, BackendError>, operation: &str) -> Option<T> {
    match result {
        Ok(value) => Some(value),
        Err(error) => {
            tracing::warn!(operation, error = %error, "Best-effort backend write failed");
            None
        }
    }
}

/// HTTP client for one backend project.
///
/// Holds the anonymous key plus the signed-in user's access token (when
/// present); table requests carry both so row-level security evaluates
/// against the user.
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    access_token: RwLock<Option<String>>,
}

impl BackendClient {
    /// Create a client from configuration. No network I/O happens here.
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.project_url.trim_end_matches('/').to_string(),
            anon_key: config.anon_key.clone(),
            access_token: RwLock::new(None),
        }
    }

    /// Project base URL (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Install or clear the signed-in user's access token.
    ///
    /// Managed by the session context; table requests fall back to the
    /// anonymous key when no token is installed.
    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().expect("access token lock") = token;
    }

    fn bearer(&self) -> String {
        self.access_token
            .read()
            .expect("access token lock")
            .clone()
            .unwrap_or_else(|| self.anon_key.clone())
    }

    fn table_request(&self, method: reqwest::Method, table: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, format!("{}/rest/v1/{table}", self.base_url))
            .header("apikey", &self.anon_key)
            .bearer_auth(self.bearer())
    }

    /// Fetch all rows matching the filter.
    pub(crate) async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Vec<T>, BackendError> {
        let response = self
            .table_request(reqwest::Method::GET, table)
            .query(query)
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// Fetch exactly one row, or `None` when the filter matches nothing.
    pub(crate) async fn select_one<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, BackendError> {
        let response = self
            .table_request(reqwest::Method::GET, table)
            .query(query)
            .header("Accept", "application/vnd.pgrst.object+json")
            .send()
            .await?;
        match check(response).await {
            Ok(response) => Ok(Some(decode(response).await?)),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error),
        }
    }

    /// Insert one row and return it.
    pub(crate) async fn insert_one<T: DeserializeOwned>(
        &self,
        table: &str,
        body: &impl Serialize,
    ) -> Result<T, BackendError> {
        let response = self
            .table_request(reqwest::Method::POST, table)
            .header("Prefer", "return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(body)
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// Upsert one row on a conflict target and return it.
    pub(crate) async fn upsert_one<T: DeserializeOwned>(
        &self,
        table: &str,
        on_conflict: &str,
        body: &impl Serialize,
    ) -> Result<T, BackendError> {
        let response = self
            .table_request(reqwest::Method::POST, table)
            .query(&[("on_conflict", on_conflict)])
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .header("Accept", "application/vnd.pgrst.object+json")
            .json(body)
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// Patch every row matching the filter, returning the updated rows.
    ///
    /// Zero matched rows is a valid outcome (empty vec), which is what
    /// makes conditional-update flows race-free: the filter is evaluated
    /// server-side in the same statement as the write.
    pub(crate) async fn update<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &[(&str, String)],
        body: &impl Serialize,
    ) -> Result<Vec<T>, BackendError> {
        let response = self
            .table_request(reqwest::Method::PATCH, table)
            .query(query)
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        decode(check(response).await?).await
    }

    /// Delete every row matching the filter. Zero matches is a no-op.
    pub(crate) async fn delete(
        &self,
        table: &str,
        query: &[(&str, String)],
    ) -> Result<(), BackendError> {
        let response = self
            .table_request(reqwest::Method::DELETE, table)
            .query(query)
            .send()
            .await?;
        check(response).await.map(|_| ())
    }
}

/// Map a non-2xx response onto [`BackendError::Api`].
async fn check(response: reqwest::Response) -> Result<reqwest::Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap_or_else(|_| json!({}));
    Err(BackendError::Api {
        status: status.as_u16(),
        code: value["code"].as_str().unwrap_or("unknown").to_string(),
        message: value["message"].as_str().unwrap_or(&text).to_string(),
    })
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, BackendError> {
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| BackendError::Decode(e.to_string()))
}
