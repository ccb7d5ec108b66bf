//! HTTP client for the inference service's generate/train endpoints.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;

use lutspace_core::config::InferenceConfig;
use lutspace_core::prompt::{format_prompt, format_prompt_spaced};

/// Completion length requested from `/generate`.
const COMPLETION_LENGTH: u32 = 200;

/// Tuning parameters forwarded verbatim to the inference service.
///
/// Their semantics (which internal layers a block index addresses, what a
/// residual weight does) are owned entirely by the external service.
#[derive(Debug, Clone)]
pub struct TuningParams {
    pub threshold: f64,
    pub wnn_blocks: Vec<i32>,
    pub residuals: Vec<f64>,
    /// Only sent on `/train_lut`.
    pub sparsity: f64,
    pub cost_scale: f64,
}

impl Default for TuningParams {
    fn default() -> Self {
        Self {
            threshold: 0.25,
            wnn_blocks: vec![-1, -4],
            residuals: vec![0.75, 0.25],
            sparsity: 0.1,
            cost_scale: 1.0,
        }
    }
}

/// Response returned by `POST /generate`.
///
/// The service occasionally returns bodies with fields missing; a body
/// that fails to parse at all is treated as an empty response rather than
/// an error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateResponse {
    /// Raw completion text, instruction-template artifacts included.
    #[serde(default)]
    pub completion: String,
    /// Residual weight actually applied, when reported.
    pub residual: Option<f64>,
    /// Threshold actually applied, when reported.
    pub threshold: Option<f64>,
}

/// Errors from the inference service layer.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service returned a non-2xx status code. `message` is the
    /// body's `error`/`detail` field when present, otherwise a synthesized
    /// `"<op> failed <status>"` string; Display is the bare message so it
    /// can be surfaced to users as-is.
    #[error("{message}")]
    Api { status: u16, message: String },
}

/// Trait seam over the inference service.
///
/// [`InferenceClient`] is the production implementation; orchestrator
/// tests provide stubs.
#[async_trait]
pub trait InferenceApi: Send + Sync {
    /// Generate a completion against the named lookup table.
    async fn generate(
        &self,
        lut_name: &str,
        system_prompt: &str,
        user_message: &str,
        params: &TuningParams,
    ) -> Result<GenerateResponse, InferenceError>;

    /// Train a (label, context) pair into the named lookup table.
    async fn train(
        &self,
        lut_name: &str,
        label: &str,
        label_context: Option<&str>,
        params: &TuningParams,
    ) -> Result<serde_json::Value, InferenceError>;
}

/// HTTP client for a single inference-service deployment.
pub struct InferenceClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl InferenceClient {
    /// Create a new client from configuration.
    pub fn new(config: &InferenceConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
        }
    }

    /// Base URL of the service (no trailing slash).
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn post_json(
        &self,
        route: &str,
        body: &serde_json::Value,
        op: &str,
    ) -> Result<serde_json::Value, InferenceError> {
        let response = self
            .client
            .post(format!("{}{route}", self.base_url))
            .json(body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(InferenceError::Api {
                status: status.as_u16(),
                message: extract_error_message(&text, op, status.as_u16()),
            });
        }
        // An unparseable success body is tolerated as an empty object.
        Ok(serde_json::from_str(&text).unwrap_or_else(|_| json!({})))
    }
}

#[async_trait]
impl InferenceApi for InferenceClient {
    async fn generate(
        &self,
        lut_name: &str,
        system_prompt: &str,
        user_message: &str,
        params: &TuningParams,
    ) -> Result<GenerateResponse, InferenceError> {
        tracing::debug!(lut_name, "Calling /generate");
        let body = build_generate_body(&self.model, lut_name, system_prompt, user_message, params);
        let value = self.post_json("/generate", &body, "Generate").await?;
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    async fn train(
        &self,
        lut_name: &str,
        label: &str,
        label_context: Option<&str>,
        params: &TuningParams,
    ) -> Result<serde_json::Value, InferenceError> {
        tracing::debug!(lut_name, "Calling /train_lut");
        let body = build_train_body(&self.model, lut_name, label, label_context, params);
        self.post_json("/train_lut", &body, "Train").await
    }
}

/// Build the `POST /generate` request body.
///
/// The prompt uses the tight formatter variant; the service is sensitive
/// to whitespace around the delimiters, so this must not change.
fn build_generate_body(
    model: &str,
    lut_name: &str,
    system_prompt: &str,
    user_message: &str,
    params: &TuningParams,
) -> serde_json::Value {
    json!({
        "prompt": format_prompt(system_prompt, user_message),
        "length": COMPLETION_LENGTH,
        "lut_name": lut_name,
        "model": model,
        "threshold": params.threshold,
        "residuals": params.residuals,
        "wnn_blocks": params.wnn_blocks,
        "cost_scale": params.cost_scale,
    })
}

/// Build the `POST /train_lut` request body.
///
/// A non-null `label_context` passes through the spaced formatter variant.
fn build_train_body(
    model: &str,
    lut_name: &str,
    label: &str,
    label_context: Option<&str>,
    params: &TuningParams,
) -> serde_json::Value {
    json!({
        "label": label,
        "label_context": label_context.map(|context| format_prompt_spaced("", context)),
        "lut_name": lut_name,
        "model": model,
        "wnn_blocks": params.wnn_blocks,
        "threshold": params.threshold,
        "residuals": params.residuals,
        "sparsity": params.sparsity,
        "cost_scale": params.cost_scale,
    })
}

/// Extract a user-facing message from an error body.
///
/// Prefers the body's `error` field, then `detail`; an absent field or an
/// unparseable body falls back to `"<op> failed <status>"`.
fn extract_error_message(body: &str, op: &str, status: u16) -> String {
    let value: serde_json::Value = serde_json::from_str(body).unwrap_or_else(|_| json!({}));
    value
        .get("error")
        .and_then(|v| v.as_str())
        .or_else(|| value.get("detail").and_then(|v| v.as_str()))
        .map(str::to_string)
        .unwrap_or_else(|| format!("{op} failed {status}"))
}
