//! Configuration types for a product analysis.
//!
//! All behaviour is controlled through [`AnalysisConfig`], built via its
//! [`AnalysisConfigBuilder`]. The defaults reproduce the baseline tool: the
//! OpenRouter endpoint, one completion attempt, no timeout.
//!
//! # API key
//!
//! The key is read once when the config is built. When it is absent the
//! config falls back to a placeholder instead of failing: the submission is
//! rejected by the remote endpoint and that error is shown to the user. A
//! warning is logged at build time so the cause is visible in the logs.

use crate::client::CompletionClient;
use crate::error::AnalysisError;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Default OpenAI-compatible endpoint.
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";

/// Default model identifier on the endpoint.
pub const DEFAULT_MODEL: &str = "deepseek/deepseek-chat-v3.1:free";

/// Sent when no API key is configured. Always rejected by the endpoint.
pub const PLACEHOLDER_API_KEY: &str = "Your_api_key";

/// Default `HTTP-Referer` identifying header.
pub const DEFAULT_SITE_URL: &str = "http://localhost";

/// Default `X-Title` identifying header.
pub const DEFAULT_SITE_NAME: &str = "InvestGuard";

pub const ENV_API_KEY: &str = "OPENROUTER_API_KEY";
pub const ENV_MODEL: &str = "INVESTGUARD_MODEL";
pub const ENV_BASE_URL: &str = "INVESTGUARD_BASE_URL";
pub const ENV_PROVIDER: &str = "INVESTGUARD_PROVIDER";

/// Configuration for one or more analyses.
///
/// # Example
/// ```rust
/// use investguard::AnalysisConfig;
///
/// let config = AnalysisConfig::builder()
///     .model("openai/gpt-4o-mini")
///     .api_key("sk-or-...")
///     .max_retries(2)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct AnalysisConfig {
    /// Model identifier. Default: [`DEFAULT_MODEL`].
    pub model: String,

    /// Base URL of the OpenAI-compatible endpoint. Default: [`DEFAULT_BASE_URL`].
    pub base_url: String,

    /// Bearer key for the endpoint. Default: [`PLACEHOLDER_API_KEY`].
    pub api_key: String,

    /// `edgequake-llm` provider name (e.g. "openai", "anthropic", "ollama").
    ///
    /// When set, the completion goes through that provider instead of the
    /// OpenRouter endpoint; the provider reads its own key from the
    /// environment.
    pub provider_name: Option<String>,

    /// Pre-constructed completion client. Takes precedence over everything else.
    pub client: Option<Arc<dyn CompletionClient>>,

    /// Value of the `HTTP-Referer` header. Default: [`DEFAULT_SITE_URL`].
    pub site_url: String,

    /// Value of the `X-Title` header. Default: [`DEFAULT_SITE_NAME`].
    pub site_name: String,

    /// Sampling temperature. Default: None (endpoint default).
    pub temperature: Option<f32>,

    /// Maximum completion tokens. Default: None (endpoint default).
    pub max_tokens: Option<usize>,

    /// Extra attempts after a retryable failure. Default: 0.
    ///
    /// Authentication failures are never retried. However many attempts are
    /// made, exactly one error reaches the caller.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds, doubled per attempt. Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-call timeout in seconds. Default: None (wait indefinitely).
    pub api_timeout_secs: Option<u64>,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Custom system turn. If None, uses [`crate::prompts::SYSTEM_PROMPT`].
    pub system_prompt: Option<String>,

    /// Normalise document text before truncation. Default: true.
    pub clean_content: bool,

    /// pdfium shared library (file or directory). Falls back to `PDFIUM_LIB_PATH`.
    pub pdfium_library_path: Option<PathBuf>,

    /// Stage events for progress indicators.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: PLACEHOLDER_API_KEY.to_string(),
            provider_name: None,
            client: None,
            site_url: DEFAULT_SITE_URL.to_string(),
            site_name: DEFAULT_SITE_NAME.to_string(),
            temperature: None,
            max_tokens: None,
            max_retries: 0,
            retry_backoff_ms: 500,
            api_timeout_secs: None,
            password: None,
            system_prompt: None,
            clean_content: true,
            pdfium_library_path: None,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for AnalysisConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnalysisConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("provider_name", &self.provider_name)
            .field("client", &self.client.as_ref().map(|_| "<dyn CompletionClient>"))
            .field("site_url", &self.site_url)
            .field("site_name", &self.site_name)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("clean_content", &self.clean_content)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .finish()
    }
}

impl AnalysisConfig {
    /// Create a new builder for `AnalysisConfig`.
    pub fn builder() -> AnalysisConfigBuilder {
        AnalysisConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from the process environment.
    ///
    /// Reads `OPENROUTER_API_KEY`, `INVESTGUARD_MODEL`, `INVESTGUARD_BASE_URL`
    /// and `INVESTGUARD_PROVIDER`. Does not load `.env`; the binary does that.
    pub fn from_env() -> Result<Self, AnalysisError> {
        Self::builder().with_env().build()
    }

    /// Whether the bearer key is still the placeholder.
    pub fn uses_placeholder_key(&self) -> bool {
        self.api_key.trim().is_empty() || self.api_key == PLACEHOLDER_API_KEY
    }
}

/// Builder for [`AnalysisConfig`].
#[derive(Debug)]
pub struct AnalysisConfigBuilder {
    config: AnalysisConfig,
}

impl AnalysisConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn client(mut self, client: Arc<dyn CompletionClient>) -> Self {
        self.config.client = Some(client);
        self
    }

    pub fn site_url(mut self, url: impl Into<String>) -> Self {
        self.config.site_url = url.into();
        self
    }

    pub fn site_name(mut self, name: impl Into<String>) -> Self {
        self.config.site_name = name.into();
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = Some(t.clamp(0.0, 2.0));
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = Some(n);
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = Some(secs);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn clean_content(mut self, v: bool) -> Self {
        self.config.clean_content = v;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Apply the process environment (see [`AnalysisConfig::from_env`]).
    pub fn with_env(self) -> Self {
        self.apply_env(|key| std::env::var(key).ok())
    }

    fn apply_env(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(key) = var(ENV_API_KEY) {
            self.config.api_key = key;
        }
        if let Some(model) = var(ENV_MODEL) {
            self.config.model = model;
        }
        if let Some(url) = var(ENV_BASE_URL) {
            self = self.base_url(url);
        }
        if let Some(provider) = var(ENV_PROVIDER) {
            self.config.provider_name = Some(provider);
        }
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<AnalysisConfig, AnalysisError> {
        let c = &self.config;
        if c.model.trim().is_empty() {
            return Err(AnalysisError::InvalidConfig("model must not be empty".into()));
        }
        if !c.base_url.starts_with("http://") && !c.base_url.starts_with("https://") {
            return Err(AnalysisError::InvalidConfig(format!(
                "base URL must start with http:// or https://, got '{}'",
                c.base_url
            )));
        }
        if c.max_tokens == Some(0) {
            return Err(AnalysisError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.api_timeout_secs == Some(0) {
            return Err(AnalysisError::InvalidConfig(
                "API timeout must be ≥ 1 second".into(),
            ));
        }

        if c.client.is_none() && c.provider_name.is_none() && c.uses_placeholder_key() {
            warn!(
                "{} is not set; requests will be sent with a placeholder key and rejected",
                ENV_API_KEY
            );
        }
        debug!("Analysis config: {:?}", c);

        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_baseline() {
        let c = AnalysisConfig::default();
        assert_eq!(c.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(c.model, "deepseek/deepseek-chat-v3.1:free");
        assert_eq!(c.max_retries, 0);
        assert_eq!(c.api_timeout_secs, None);
        assert!(c.uses_placeholder_key());
        assert!(c.clean_content);
    }

    #[test]
    fn placeholder_key_still_builds() {
        let c = AnalysisConfig::builder().build().unwrap();
        assert_eq!(c.api_key, PLACEHOLDER_API_KEY);
    }

    #[test]
    fn builder_clamps_temperature_and_trims_url() {
        let c = AnalysisConfig::builder()
            .temperature(5.0)
            .base_url("https://example.test/v1/")
            .build()
            .unwrap();
        assert_eq!(c.temperature, Some(2.0));
        assert_eq!(c.base_url, "https://example.test/v1");
    }

    #[test]
    fn rejects_bad_base_url() {
        let err = AnalysisConfig::builder()
            .base_url("openrouter.ai")
            .build()
            .unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_empty_model_and_zero_limits() {
        assert!(AnalysisConfig::builder().model("  ").build().is_err());
        assert!(AnalysisConfig::builder().max_tokens(0).build().is_err());
        assert!(AnalysisConfig::builder().api_timeout_secs(0).build().is_err());
    }

    #[test]
    fn env_overrides_apply() {
        let env: HashMap<&str, &str> = [
            (ENV_API_KEY, "sk-or-test"),
            (ENV_MODEL, "openai/gpt-4o-mini"),
            (ENV_BASE_URL, "http://localhost:9999/v1/"),
            (ENV_PROVIDER, ""),
        ]
        .into_iter()
        .collect();

        let c = AnalysisConfig::builder()
            .apply_env(|k| env.get(k).map(|v| v.to_string()))
            .build()
            .unwrap();
        assert_eq!(c.api_key, "sk-or-test");
        assert_eq!(c.model, "openai/gpt-4o-mini");
        assert_eq!(c.base_url, "http://localhost:9999/v1");
        assert_eq!(c.provider_name, None);
        assert!(!c.uses_placeholder_key());
    }

    #[test]
    fn debug_redacts_key() {
        let c = AnalysisConfig::builder().api_key("sk-or-secret").build().unwrap();
        let dbg = format!("{:?}", c);
        assert!(!dbg.contains("sk-or-secret"));
        assert!(dbg.contains("<redacted>"));
    }
}
