//! Anthropic Messages API gateway.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;

use super::{ContentBlock, Gateway, GatewayError, ModelResponse, StopReason, ToolDefinition, Turn};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// HTTP client for the `/v1/messages` endpoint.
pub struct AnthropicGateway {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicGateway {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        }
    }
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: &'a [Turn],
    #[serde(skip_serializing_if = "<[_]>::is_empty")]
    tools: &'a [ToolDefinition],
}

#[derive(Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    stop_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

#[async_trait::async_trait]
impl Gateway for AnthropicGateway {
    async fn complete(
        &self,
        system: &str,
        turns: &[Turn],
        tools: &[ToolDefinition],
    ) -> Result<ModelResponse, GatewayError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system,
            messages: turns,
            tools,
        };

        let url = format!("{}/v1/messages", self.base_url);
        tracing::debug!(model = %self.model, turns = turns.len(), "calling gateway");

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiErrorBody>(&body)
                .map(|parsed| parsed.error.message)
                .unwrap_or(body);
            return Err(match status.as_u16() {
                401 => GatewayError::Auth(message),
                code => GatewayError::Api {
                    status: code,
                    message,
                },
            });
        }

        let decoded: MessagesResponse =
            serde_json::from_str(&body).map_err(|e| GatewayError::Malformed(e.to_string()))?;

        Ok(ModelResponse {
            stop_reason: StopReason::from_wire(decoded.stop_reason.as_deref()),
            content: decoded.content,
        })
    }
}
