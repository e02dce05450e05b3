//! Anthropic Messages API adapter with tool use.

use std::{fmt, time::Duration};

use async_trait::async_trait;
use hyper::header::{CONTENT_TYPE, HeaderValue};
use hyper::{Body, Request, StatusCode, Uri};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::http_client::{HyperClient, build_https_client, sanitize_base_url, send};
use crate::traits::{
    AdapterError, AdapterMetadata, AdapterResult, ContentBlock, InferenceRequest,
    InferenceResponse, ModelAdapter, PromptMessage, ToolChoice, ToolDefinition, Usage,
};

/// Model used when none is configured.
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Anthropic API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Configuration for the Anthropic adapter.
#[derive(Clone)]
pub struct AnthropicConfig {
    api_key: Option<String>,
    model: String,
    base_url: String,
    timeout: Duration,
    default_temperature: Option<f32>,
    default_max_tokens: u32,
}

impl fmt::Debug for AnthropicConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicConfig")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl AnthropicConfig {
    /// Creates a configuration using the supplied model identifier.
    #[must_use]
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            api_key: None,
            model: model.into(),
            base_url: "https://api.anthropic.com/".to_owned(),
            timeout: Duration::from_secs(120),
            default_temperature: None,
            default_max_tokens: 2048,
        }
    }

    /// Overrides the base URL used for API calls.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the supplied URL is invalid.
    pub fn with_base_url(mut self, base_url: impl AsRef<str>) -> AdapterResult<Self> {
        self.base_url = sanitize_base_url(base_url.as_ref())
            .map_err(|reason| AdapterError::configuration(format!("Anthropic {reason}")))?;
        Ok(self)
    }

    /// Sets the default sampling temperature used when requests omit it.
    #[must_use]
    pub fn with_default_temperature(mut self, temperature: f32) -> Self {
        self.default_temperature = Some(temperature);
        self
    }

    /// Sets the default max tokens for completions.
    #[must_use]
    pub fn with_default_max_tokens(mut self, max_tokens: u32) -> Self {
        self.default_max_tokens = max_tokens;
        self
    }

    /// Sets the HTTP request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Supplies an explicit API key.
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }
}

/// Anthropic Claude adapter that calls the Messages API over HTTPS.
pub struct AnthropicAdapter {
    client: HyperClient,
    endpoint: Uri,
    metadata: AdapterMetadata,
    api_key: String,
    timeout: Duration,
    default_temperature: Option<f32>,
    default_max_tokens: u32,
}

impl fmt::Debug for AnthropicAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnthropicAdapter")
            .field("model", &self.metadata.model())
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl AnthropicAdapter {
    /// Constructs a new adapter with the provided configuration.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Configuration`] if the API key is missing.
    pub fn new(config: AnthropicConfig) -> AdapterResult<Self> {
        let api_key = config
            .api_key
            .ok_or_else(|| AdapterError::configuration("Anthropic adapter requires an API key"))?;

        let metadata = AdapterMetadata::new("anthropic", config.model.clone());
        let endpoint = format!("{}v1/messages", config.base_url)
            .parse::<Uri>()
            .map_err(|err| {
                AdapterError::configuration(format!("invalid Anthropic endpoint: {err}"))
            })?;

        Ok(Self {
            client: build_https_client(),
            endpoint,
            metadata,
            api_key,
            timeout: config.timeout,
            default_temperature: config.default_temperature,
            default_max_tokens: config.default_max_tokens,
        })
    }

    fn build_request<'a>(&'a self, request: &'a InferenceRequest) -> MessagesRequest<'a> {
        MessagesRequest {
            model: self.metadata.model(),
            system: request.system_prompt(),
            messages: request.messages(),
            max_tokens: request
                .max_output_tokens()
                .unwrap_or(self.default_max_tokens),
            temperature: request.temperature().or(self.default_temperature),
            tools: request.tools(),
            tool_choice: if request.tools().is_empty() {
                None
            } else {
                request.tool_choice()
            },
        }
    }
}

#[async_trait]
impl ModelAdapter for AnthropicAdapter {
    fn metadata(&self) -> &AdapterMetadata {
        &self.metadata
    }

    async fn infer(&self, request: InferenceRequest) -> AdapterResult<InferenceResponse> {
        let payload = self.build_request(&request);
        let body = serde_json::to_vec(&payload).map_err(|err| {
            AdapterError::invalid_request(format!("failed to encode Anthropic request: {err}"))
        })?;

        let mut builder = Request::post(self.endpoint.clone());
        builder = builder.header(CONTENT_TYPE, "application/json");
        builder = builder.header("x-api-key", &self.api_key);
        builder = builder.header(
            "anthropic-version",
            HeaderValue::from_static(ANTHROPIC_VERSION),
        );

        let http_request = builder.body(Body::from(body)).map_err(|err| {
            AdapterError::transport(format!("failed to build Anthropic request: {err}"))
        })?;

        let reply = send(&self.client, http_request, self.timeout)
            .await
            .map_err(|err| AdapterError::transport(format!("Anthropic {err}")))?;

        if reply.status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AdapterError::RateLimited {
                retry_after: reply.retry_after,
            });
        }
        if !reply.status.is_success() {
            return Err(AdapterError::response(format!(
                "Anthropic returned {}: {}",
                reply.status,
                reply.body_text()
            )));
        }

        let response: MessagesResponse = serde_json::from_slice(&reply.body).map_err(|err| {
            AdapterError::response(format!("failed to decode Anthropic response: {err}"))
        })?;

        debug!(
            model = self.metadata.model(),
            stop_reason = response.stop_reason.as_deref().unwrap_or("none"),
            tokens_in = response.usage.input_tokens,
            tokens_out = response.usage.output_tokens,
            "anthropic response received"
        );

        Ok(response.into())
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: &'a [PromptMessage],
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "no_tools")]
    tools: &'a [ToolDefinition],
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ToolChoice>,
}

fn no_tools(tools: &&[ToolDefinition]) -> bool {
    tools.is_empty()
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ResponseBlock>,
    #[serde(default)]
    usage: Usage,
    #[serde(default)]
    stop_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Unsupported,
}

impl From<MessagesResponse> for InferenceResponse {
    fn from(response: MessagesResponse) -> Self {
        let content = response
            .content
            .into_iter()
            .filter_map(|block| match block {
                ResponseBlock::Text { text } => Some(ContentBlock::Text { text }),
                ResponseBlock::ToolUse { id, name, input } => {
                    Some(ContentBlock::ToolUse { id, name, input })
                }
                ResponseBlock::Unsupported => None,
            })
            .collect();

        Self {
            content,
            usage: response.usage,
            stop_reason: response.stop_reason,
        }
    }
}
