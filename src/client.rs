//! Completion clients: one system turn plus one user turn in, text out.
//!
//! [`CompletionClient`] is the seam between the analysis pipeline and
//! whichever service answers the prompt. Two implementations ship:
//!
//! * [`OpenRouterClient`] posts to an OpenAI-compatible
//!   `/chat/completions` endpoint (OpenRouter by default) with bearer auth
//!   and the `HTTP-Referer` / `X-Title` identifying headers.
//! * [`ProviderClient`] wraps any `edgequake-llm` provider, for users who
//!   prefer OpenAI, Anthropic, Ollama etc. directly.
//!
//! Tests inject their own implementation through
//! [`crate::config::AnalysisConfigBuilder::client`].

use crate::config::AnalysisConfig;
use crate::error::AnalysisError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// The text of one completion plus token accounting when the service reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub input_tokens: usize,
    pub output_tokens: usize,
}

impl Completion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }
}

/// A service that answers a (system, user) prompt pair with free text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Short name used in logs and error messages.
    fn name(&self) -> &str;

    /// Make exactly one completion call.
    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, AnalysisError>;
}

// ── OpenRouter / OpenAI-compatible HTTP ──────────────────────────────────

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [WireMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: usize,
    #[serde(default)]
    completion_tokens: usize,
}

/// Client for an OpenAI-compatible chat completions endpoint.
#[derive(Clone)]
pub struct OpenRouterClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
    site_url: String,
    site_name: String,
    temperature: Option<f32>,
    max_tokens: Option<usize>,
}

impl OpenRouterClient {
    /// Build a client from the endpoint settings in `config`.
    pub fn from_config(config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.api_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let http = builder
            .build()
            .map_err(|e| AnalysisError::Internal(format!("HTTP client: {e}")))?;

        Ok(Self {
            http,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            site_url: config.site_url.clone(),
            site_name: config.site_name.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

#[async_trait]
impl CompletionClient for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, AnalysisError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                WireMessage {
                    role: "system",
                    content: system,
                },
                WireMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!("POST {} (model {})", self.endpoint, self.model);
        let start = Instant::now();

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .header("HTTP-Referer", &self.site_url)
            .header("X-Title", &self.site_name)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(e, start))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok());
            let detail = response.text().await.unwrap_or_default();
            return Err(status_error(self.name(), status, retry_after_secs, &detail));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                transport_error(e, start)
            } else {
                AnalysisError::LlmApiError {
                    message: format!("malformed response body: {e}"),
                }
            }
        })?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| AnalysisError::LlmApiError {
                message: "choices[0].message.content not found".to_string(),
            })?;

        let (input_tokens, output_tokens) = parsed
            .usage
            .map(|u| (u.prompt_tokens, u.completion_tokens))
            .unwrap_or_default();

        info!(
            "Completion received: {} bytes, {} in / {} out tokens, {}ms",
            text.len(),
            input_tokens,
            output_tokens,
            start.elapsed().as_millis()
        );

        Ok(Completion {
            text,
            input_tokens,
            output_tokens,
        })
    }
}

fn transport_error(e: reqwest::Error, start: Instant) -> AnalysisError {
    if e.is_timeout() {
        AnalysisError::ApiTimeout {
            elapsed_ms: start.elapsed().as_millis() as u64,
        }
    } else {
        AnalysisError::LlmApiError {
            message: e.to_string(),
        }
    }
}

/// Map a non-success HTTP status to the matching error.
fn status_error(
    provider: &str,
    status: reqwest::StatusCode,
    retry_after_secs: Option<u64>,
    body: &str,
) -> AnalysisError {
    let detail = error_detail(body).unwrap_or_else(|| body.trim().to_string());
    match status.as_u16() {
        401 | 403 => AnalysisError::AuthError {
            provider: provider.to_string(),
            detail: format!("HTTP {}: {}", status.as_u16(), detail),
        },
        429 => AnalysisError::RateLimitExceeded {
            provider: provider.to_string(),
            retry_after_secs,
        },
        code => AnalysisError::LlmApiError {
            message: format!("HTTP {}: {}", code, detail),
        },
    }
}

/// Pull `error.message` out of an OpenAI-style error body.
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value["error"]["message"].as_str().map(str::to_string)
}

// ── edgequake-llm provider ───────────────────────────────────────────────

/// Adapter over an `edgequake-llm` provider.
pub struct ProviderClient {
    provider: Arc<dyn LLMProvider>,
    name: String,
    options: CompletionOptions,
    timeout: Option<Duration>,
}

impl ProviderClient {
    /// Wrap an already-built provider under a display name.
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        name: impl Into<String>,
        config: &AnalysisConfig,
    ) -> Self {
        Self {
            name: name.into(),
            provider,
            options: CompletionOptions {
                temperature: config.temperature,
                max_tokens: config.max_tokens,
                ..Default::default()
            },
            timeout: config.api_timeout_secs.map(Duration::from_secs),
        }
    }

    /// Instantiate a named provider with the configured model.
    ///
    /// The factory reads the provider's own key (`OPENAI_API_KEY`, etc.)
    /// from the environment.
    pub fn from_name(provider_name: &str, config: &AnalysisConfig) -> Result<Self, AnalysisError> {
        let provider = ProviderFactory::create_llm_provider(provider_name, &config.model)
            .map_err(|e| AnalysisError::ProviderNotConfigured {
                provider: provider_name.to_string(),
                hint: format!("{e}"),
            })?;
        Ok(Self::new(provider, provider_name, config))
    }
}

#[async_trait]
impl CompletionClient for ProviderClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, AnalysisError> {
        let messages = vec![ChatMessage::system(system), ChatMessage::user(prompt)];
        let start = Instant::now();

        let call = self.provider.chat(&messages, Some(&self.options));
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| AnalysisError::ApiTimeout {
                    elapsed_ms: start.elapsed().as_millis() as u64,
                })?,
            None => call.await,
        };

        let response = result.map_err(|e| classify_provider_error(&self.name, &e.to_string()))?;
        debug!(
            "{}: {} input tokens, {} output tokens, {:?}",
            self.name,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        Ok(Completion {
            text: response.content,
            input_tokens: response.prompt_tokens,
            output_tokens: response.completion_tokens,
        })
    }
}

/// Provider errors arrive as text; recognise the auth and rate-limit cases.
fn classify_provider_error(provider: &str, message: &str) -> AnalysisError {
    let lower = message.to_lowercase();
    if lower.contains("401")
        || lower.contains("403")
        || lower.contains("unauthorized")
        || lower.contains("invalid api key")
    {
        AnalysisError::AuthError {
            provider: provider.to_string(),
            detail: message.to_string(),
        }
    } else if lower.contains("429") || lower.contains("rate limit") {
        AnalysisError::RateLimitExceeded {
            provider: provider.to_string(),
            retry_after_secs: None,
        }
    } else {
        AnalysisError::LlmApiError {
            message: message.to_string(),
        }
    }
}

/// Pick the completion client for a config.
///
/// 1. A pre-built client (`config.client`) is used as-is.
/// 2. A named provider (`config.provider_name`) goes through `edgequake-llm`.
/// 3. Otherwise the OpenAI-compatible endpoint at `config.base_url`.
pub fn resolve_client(config: &AnalysisConfig) -> Result<Arc<dyn CompletionClient>, AnalysisError> {
    if let Some(ref client) = config.client {
        return Ok(Arc::clone(client));
    }

    if let Some(ref name) = config.provider_name {
        info!("Using provider '{}' with model {}", name, config.model);
        return Ok(Arc::new(ProviderClient::from_name(name, config)?));
    }

    let client = OpenRouterClient::from_config(config)?;
    info!("Using {} with model {}", client.endpoint(), config.model);
    Ok(Arc::new(client))
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn endpoint_is_built_from_base_url() {
        let config = AnalysisConfig::builder()
            .base_url("http://127.0.0.1:8080/v1/")
            .build()
            .unwrap();
        let client = OpenRouterClient::from_config(&config).unwrap();
        assert_eq!(client.endpoint(), "http://127.0.0.1:8080/v1/chat/completions");
    }

    #[test]
    fn request_body_omits_unset_options() {
        let body = ChatRequest {
            model: "m",
            messages: [
                WireMessage {
                    role: "system",
                    content: "s",
                },
                WireMessage {
                    role: "user",
                    content: "u",
                },
            ],
            temperature: None,
            max_tokens: None,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][1]["role"], "user");
        assert!(json.get("temperature").is_none());
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn unauthorized_is_auth_error() {
        let err = status_error(
            "openrouter",
            StatusCode::UNAUTHORIZED,
            None,
            r#"{"error":{"message":"No auth credentials found","code":401}}"#,
        );
        match err {
            AnalysisError::AuthError { detail, .. } => {
                assert_eq!(detail, "HTTP 401: No auth credentials found")
            }
            other => panic!("expected AuthError, got {other:?}"),
        }
    }

    #[test]
    fn too_many_requests_keeps_retry_after() {
        let err = status_error("openrouter", StatusCode::TOO_MANY_REQUESTS, Some(30), "");
        assert!(matches!(
            err,
            AnalysisError::RateLimitExceeded {
                retry_after_secs: Some(30),
                ..
            }
        ));
    }

    #[test]
    fn server_error_uses_plain_body() {
        let err = status_error("openrouter", StatusCode::BAD_GATEWAY, None, "upstream down\n");
        assert_eq!(err.to_string(), "API call failed: HTTP 502: upstream down");
        assert!(err.is_retryable());
    }

    #[test]
    fn provider_errors_are_classified() {
        assert!(matches!(
            classify_provider_error("openai", "HTTP 401 Unauthorized"),
            AnalysisError::AuthError { .. }
        ));
        assert!(matches!(
            classify_provider_error("openai", "Rate limit reached"),
            AnalysisError::RateLimitExceeded { .. }
        ));
        assert!(matches!(
            classify_provider_error("openai", "connection reset"),
            AnalysisError::LlmApiError { .. }
        ));
    }

    #[test]
    fn configured_client_wins() {
        struct Fixed;

        #[async_trait]
        impl CompletionClient for Fixed {
            fn name(&self) -> &str {
                "fixed"
            }
            async fn complete(&self, _: &str, _: &str) -> Result<Completion, AnalysisError> {
                Ok(Completion::new("{}"))
            }
        }

        let config = AnalysisConfig::builder()
            .client(Arc::new(Fixed))
            .provider_name("openai")
            .build()
            .unwrap();
        assert_eq!(resolve_client(&config).unwrap().name(), "fixed");
    }
}
