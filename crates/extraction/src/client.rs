//! Chat-completion client and Q&A response parsing.

use async_trait::async_trait;
use serde_json::json;

use lutspace_core::config::ExtractionConfig;
pub use lutspace_core::types::QaPair;

/// Chat-completion endpoint of the extraction provider.
const COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Only the first 4000 characters of the source text are sent.
const MAX_SOURCE_CHARS: usize = 4000;

/// Output-token budget for one extraction call.
const MAX_COMPLETION_TOKENS: u32 = 1500;

/// Source text shorter than this (after trimming) is not worth a call.
const MIN_SOURCE_CHARS: usize = 5;

/// A pair must have both fields strictly longer than this to survive.
const MIN_FIELD_CHARS: usize = 5;

/// Errors from the extraction layer.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    /// No API credential configured. Raised at construction time, before
    /// any network call can be attempted.
    #[error("Extraction API key is not configured")]
    MissingApiKey,

    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The provider returned a non-2xx status code.
    #[error("{message}")]
    Api { status: u16, message: String },

    /// The completion could not be parsed as a JSON array of pairs.
    #[error("Failed to parse extraction response: {0}")]
    BadResponse(String),
}

/// Trait seam over the extraction service, for orchestrators and tests.
#[async_trait]
pub trait QaExtractor: Send + Sync {
    /// Extract question/answer pairs from free text.
    async fn extract_qas(&self, source_text: &str) -> Result<Vec<QaPair>, ExtractionError>;
}

/// HTTP client for the chat-completion extraction API.
#[derive(Debug)]
pub struct ExtractionClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl ExtractionClient {
    /// Create a client from configuration.
    ///
    /// Fails with [`ExtractionError::MissingApiKey`] when no credential is
    /// configured — callers must treat that as a configuration error.
    pub fn new(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(ExtractionError::MissingApiKey)?;
        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: config.model.clone(),
        })
    }
}

#[async_trait]
impl QaExtractor for ExtractionClient {
    async fn extract_qas(&self, source_text: &str) -> Result<Vec<QaPair>, ExtractionError> {
        let trimmed = source_text.trim();
        if trimmed.chars().count() < MIN_SOURCE_CHARS {
            return Ok(Vec::new());
        }

        let excerpt = truncate_chars(trimmed, MAX_SOURCE_CHARS);
        let body = json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You extract question/answer pairs from source text. \
                                You respond with strict JSON and nothing else.",
                },
                {
                    "role": "user",
                    "content": format!(
                        "Extract question and answer pairs from the following text. \
                         Respond with a JSON array of objects, each with \"question\" \
                         and \"answer\" string fields. No prose, no code fences.\n\n\
                         Text:\n{excerpt}"
                    ),
                },
            ],
            "max_tokens": MAX_COMPLETION_TOKENS,
            "temperature": 0.2,
        });

        tracing::debug!(chars = excerpt.chars().count(), "Calling extraction API");
        let response = self
            .client
            .post(COMPLETIONS_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(ExtractionError::Api {
                status: status.as_u16(),
                message: extract_error_message(&text, status.as_u16()),
            });
        }

        let value: serde_json::Value = serde_json::from_str(&text)
            .map_err(|e| ExtractionError::BadResponse(format!("invalid completion body: {e}")))?;
        let content = value["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| ExtractionError::BadResponse("completion has no content".into()))?;

        parse_qa_response(content)
    }
}

/// Truncate to at most `max` characters on a char boundary.
fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Extract a display message from an error body.
fn extract_error_message(body: &str, status: u16) -> String {
    let value: serde_json::Value = serde_json::from_str(body).unwrap_or_else(|_| json!({}));
    value["error"]["message"]
        .as_str()
        .or_else(|| value["error"].as_str())
        .or_else(|| value["detail"].as_str())
        .map(str::to_string)
        .unwrap_or_else(|| format!("Extraction failed {status}"))
}

/// Parse a model completion into Q&A pairs.
///
/// Recovery steps before parsing: strip Markdown code fences, then slice
/// from the first `[` to the last `]` to discard surrounding prose. The
/// top level must be a JSON array; each element's `question`/`answer` is
/// coerced to a string, and pairs where either trimmed field is 5 chars
/// or shorter are silently dropped.
pub fn parse_qa_response(content: &str) -> Result<Vec<QaPair>, ExtractionError> {
    let unfenced = strip_code_fences(content);

    let start = unfenced
        .find('[')
        .ok_or_else(|| ExtractionError::BadResponse("no JSON array in response".into()))?;
    let end = unfenced
        .rfind(']')
        .filter(|&end| end > start)
        .ok_or_else(|| ExtractionError::BadResponse("no JSON array in response".into()))?;

    let value: serde_json::Value = serde_json::from_str(&unfenced[start..=end])
        .map_err(|e| ExtractionError::BadResponse(format!("invalid JSON: {e}")))?;

    let items = value
        .as_array()
        .ok_or_else(|| ExtractionError::BadResponse("top-level value is not an array".into()))?;

    let pairs = items
        .iter()
        .map(|item| QaPair {
            question: coerce_field(item.get("question")),
            answer: coerce_field(item.get("answer")),
        })
        .filter(|pair| {
            pair.question.chars().count() > MIN_FIELD_CHARS
                && pair.answer.chars().count() > MIN_FIELD_CHARS
        })
        .collect();

    Ok(pairs)
}

/// Strip a wrapping Markdown code fence (```` ``` ```` or ```` ```json ````).
fn strip_code_fences(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    let rest = rest.strip_suffix("```").unwrap_or(rest);
    rest.trim()
}

/// Coerce a JSON field to a trimmed string; null/missing becomes empty.
fn coerce_field(value: Option<&serde_json::Value>) -> String {
    match value {
        Some(serde_json::Value::String(s)) => s.trim().to_string(),
        Some(serde_json::Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    const ARRAY: &str = r#"[
        {"question": "What is a lookup table?", "answer": "Per-tenant model memory."},
        {"question": "Short?", "answer": "Also a real answer."}
    ]"#;

    #[test]
    fn parses_bare_array() {
        let pairs = parse_qa_response(ARRAY).unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].question, "What is a lookup table?");
    }

    #[test]
    fn fenced_equals_unfenced() {
        let fenced = format!("```json\n{ARRAY}\n```");
        assert_eq!(
            parse_qa_response(&fenced).unwrap(),
            parse_qa_response(ARRAY).unwrap()
        );
    }

    #[test]
    fn plain_fence_without_language_tag() {
        let fenced = format!("```\n{ARRAY}\n```");
        assert_eq!(
            parse_qa_response(&fenced).unwrap(),
            parse_qa_response(ARRAY).unwrap()
        );
    }

    #[test]
    fn surrounding_prose_is_discarded() {
        let wrapped = format!("Here are the pairs you asked for:\n{ARRAY}\nLet me know!");
        assert_eq!(parse_qa_response(&wrapped).unwrap().len(), 2);
    }

    #[test]
    fn non_array_top_level_is_an_error() {
        let result = parse_qa_response(r#"{"not": "an array"}"#);
        assert_matches!(result, Err(ExtractionError::BadResponse(_)));
    }

    #[test]
    fn missing_brackets_is_an_error() {
        assert_matches!(
            parse_qa_response("no json here"),
            Err(ExtractionError::BadResponse(_))
        );
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert_matches!(
            parse_qa_response("[{not json}]"),
            Err(ExtractionError::BadResponse(_))
        );
    }

    #[test]
    fn short_fields_are_dropped() {
        let pairs = parse_qa_response(
            r#"[
                {"question": "tiny?", "answer": "A perfectly good answer."},
                {"question": "A perfectly good question?", "answer": "no"},
                {"question": "A perfectly good question?", "answer": "A good answer."}
            ]"#,
        )
        .unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].answer, "A good answer.");
    }

    #[test]
    fn null_and_numeric_fields_are_coerced() {
        let pairs = parse_qa_response(
            r#"[
                {"question": "What is the answer to everything?", "answer": 4242424},
                {"question": null, "answer": "A good answer."}
            ]"#,
        )
        .unwrap();
        // null question coerces to "" and is filtered; numeric answer is
        // stringified and survives.
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0].answer, "4242424");
    }

    #[test]
    fn missing_api_key_fails_at_construction() {
        let config = lutspace_core::config::ExtractionConfig {
            api_key: None,
            model: "gpt-4o-mini".into(),
        };
        assert_matches!(
            ExtractionClient::new(&config),
            Err(ExtractionError::MissingApiKey)
        );
    }

    #[test]
    fn blank_api_key_fails_at_construction() {
        let config = lutspace_core::config::ExtractionConfig {
            api_key: Some("   ".into()),
            model: "gpt-4o-mini".into(),
        };
        assert_matches!(
            ExtractionClient::new(&config),
            Err(ExtractionError::MissingApiKey)
        );
    }

    #[tokio::test]
    async fn short_source_returns_empty_without_network() {
        let client = ExtractionClient::new(&lutspace_core::config::ExtractionConfig {
            api_key: Some("sk-test".into()),
            model: "gpt-4o-mini".into(),
        })
        .unwrap();
        // Returns before any request is issued, so this passes offline.
        let pairs = client.extract_qas("  hi  ").await.unwrap();
        assert!(pairs.is_empty());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let text = "é".repeat(10);
        assert_eq!(truncate_chars(&text, 4).chars().count(), 4);
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
