//! Environment-driven configuration.
//!
//! All configuration is supplied through environment variables — there are
//! no CLI flags. The backend project URL and anonymous key are required;
//! everything else has a development default.

/// Configuration loading errors.
///
/// A missing backend URL/key is fatal: the caller must refuse to continue
/// rather than construct a partially-initialized client stack.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingVar(&'static str),
}

/// Inference-service settings.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    /// Base URL of the GPU proxy hosting `/generate` and `/train_lut`.
    pub base_url: String,
    /// Model identifier forwarded verbatim in every request body.
    pub model: String,
}

/// Backend-as-a-service settings.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Project base URL (auth routes under `/auth/v1`, tables under `/rest/v1`).
    pub project_url: String,
    /// Anonymous API key sent with every request.
    pub anon_key: String,
}

/// Knowledge-extraction LLM settings.
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// API credential. Absence is tolerated here; the extraction client
    /// refuses to construct without it.
    pub api_key: Option<String>,
    /// Chat-completion model name.
    pub model: String,
}

/// Full application configuration.
///
/// | Env Var              | Default                          |
/// |----------------------|----------------------------------|
/// | `INFERENCE_BASE_URL` | `https://inference.lutspace.ai`  |
/// | `INFERENCE_MODEL`    | `mistral-7b-instruct`            |
/// | `BACKEND_URL`        | — (required)                     |
/// | `BACKEND_ANON_KEY`   | — (required)                     |
/// | `SITE_URL`           | `http://localhost:5173`          |
/// | `EXTRACTION_API_KEY` | — (optional)                     |
/// | `EXTRACTION_MODEL`   | `gpt-4o-mini`                    |
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub inference: InferenceConfig,
    pub backend: BackendConfig,
    pub extraction: ExtractionConfig,
    /// Public site base URL used to build the email-confirmation redirect.
    pub site_url: String,
}

impl AppConfig {
    /// Load configuration, reading a `.env` file first if one exists.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_env()
    }

    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let require = |key: &'static str| lookup(key).ok_or(ConfigError::MissingVar(key));

        Ok(Self {
            inference: InferenceConfig {
                base_url: get_or("INFERENCE_BASE_URL", "https://inference.lutspace.ai"),
                model: get_or("INFERENCE_MODEL", "mistral-7b-instruct"),
            },
            backend: BackendConfig {
                project_url: require("BACKEND_URL")?,
                anon_key: require("BACKEND_ANON_KEY")?,
            },
            extraction: ExtractionConfig {
                api_key: lookup("EXTRACTION_API_KEY"),
                model: get_or("EXTRACTION_MODEL", "gpt-4o-mini"),
            },
            site_url: get_or("SITE_URL", "http://localhost:5173"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn vars(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn missing_backend_url_is_fatal() {
        let env = vars(&[("BACKEND_ANON_KEY", "anon")]);
        let result = AppConfig::from_lookup(|k| env.get(k).cloned());
        assert_matches!(result, Err(ConfigError::MissingVar("BACKEND_URL")));
    }

    #[test]
    fn missing_anon_key_is_fatal() {
        let env = vars(&[("BACKEND_URL", "https://proj.example.co")]);
        let result = AppConfig::from_lookup(|k| env.get(k).cloned());
        assert_matches!(result, Err(ConfigError::MissingVar("BACKEND_ANON_KEY")));
    }

    #[test]
    fn defaults_applied() {
        let env = vars(&[
            ("BACKEND_URL", "https://proj.example.co"),
            ("BACKEND_ANON_KEY", "anon"),
        ]);
        let config = AppConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.inference.base_url, "https://inference.lutspace.ai");
        assert_eq!(config.inference.model, "mistral-7b-instruct");
        assert_eq!(config.site_url, "http://localhost:5173");
        assert!(config.extraction.api_key.is_none());
        assert_eq!(config.extraction.model, "gpt-4o-mini");
    }

    #[test]
    fn overrides_win() {
        let env = vars(&[
            ("BACKEND_URL", "https://proj.example.co"),
            ("BACKEND_ANON_KEY", "anon"),
            ("INFERENCE_BASE_URL", "http://localhost:8000"),
            ("EXTRACTION_API_KEY", "sk-test"),
        ]);
        let config = AppConfig::from_lookup(|k| env.get(k).cloned()).unwrap();
        assert_eq!(config.inference.base_url, "http://localhost:8000");
        assert_eq!(config.extraction.api_key.as_deref(), Some("sk-test"));
    }
}
