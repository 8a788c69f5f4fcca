//! OpenAI-compatible chat-completions provider
//!
//! Talks to any `/chat/completions` endpoint that accepts the OpenAI wire
//! shape (Fireworks AI, OpenAI, vLLM, and friends). The client is
//! single-shot: retry and backoff belong to the extraction pipeline, not
//! the transport.
//!
//! # Examples
//!
//! ```no_run
//! use chartex_llm::ChatCompletionsClient;
//!
//! let client = ChatCompletionsClient::new("fw-api-key").unwrap();
//! // The async generate lives on the struct; the sync CompletionClient
//! // impl bridges it for the pipeline's blocking call site.
//! ```

use crate::CompletionError;
use chartex_domain::{CompletionClient, CompletionRequest};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default API base URL (Fireworks AI inference endpoint)
pub const DEFAULT_BASE_URL: &str = "https://api.fireworks.ai/inference/v1";

/// Default timeout for completion requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Chat-completions API client
///
/// Credentials are validated at construction: an empty API key fails fast
/// before any batch work can start.
pub struct ChatCompletionsClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f64,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl ChatCompletionsClient {
    /// Create a new client for the default endpoint
    ///
    /// # Errors
    ///
    /// Returns `CompletionError::Config` if the API key is empty or
    /// whitespace-only.
    pub fn new(api_key: impl Into<String>) -> Result<Self, CompletionError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(CompletionError::Config(
                "API key cannot be empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| CompletionError::Other(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key,
            client,
        })
    }

    /// Point the client at a different OpenAI-compatible endpoint
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    /// Run one completion call against the API
    ///
    /// # Errors
    ///
    /// Returns error if the endpoint is unreachable, the model is unknown,
    /// the service rate-limits the call, or the response body does not
    /// carry a first-choice message.
    pub async fn generate(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
        let body = ChatRequest {
            model: &request.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &request.system,
                },
                ChatMessage {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_mode.then_some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let response = self
            .client
            .post(self.endpoint_url())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Communication(format!("Request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(classify_status(status, &request.model, &error_text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| CompletionError::InvalidResponse("Response carried no choices".to_string()))?;

        Ok(choice.message.content.unwrap_or_default())
    }
}

/// Map a non-success HTTP status onto a completion error
fn classify_status(
    status: reqwest::StatusCode,
    model: &str,
    error_text: &str,
) -> CompletionError {
    match status {
        reqwest::StatusCode::NOT_FOUND => CompletionError::ModelNotAvailable(model.to_string()),
        reqwest::StatusCode::TOO_MANY_REQUESTS => CompletionError::RateLimited,
        _ => CompletionError::Communication(format!("HTTP {}: {}", status, error_text)),
    }
}

impl CompletionClient for ChatCompletionsClient {
    type Error = CompletionError;

    fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        // Blocking wrapper for the async call; the pipeline invokes this
        // from a spawn_blocking context.
        let runtime = tokio::runtime::Runtime::new()
            .map_err(|e| CompletionError::Other(format!("Failed to start runtime: {}", e)))?;
        runtime.block_on(self.generate(request))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CompletionRequest {
        CompletionRequest {
            system: "system".to_string(),
            user: "user".to_string(),
            model: "test-model".to_string(),
            temperature: 0.0,
            max_tokens: 256,
            json_mode: true,
        }
    }

    #[test]
    fn test_rejects_empty_api_key() {
        let result = ChatCompletionsClient::new("   ");
        assert!(matches!(result, Err(CompletionError::Config(_))));
    }

    #[test]
    fn test_default_base_url() {
        let client = ChatCompletionsClient::new("key").unwrap();
        assert_eq!(
            client.endpoint_url(),
            "https://api.fireworks.ai/inference/v1/chat/completions"
        );
    }

    #[test]
    fn test_with_base_url_trims_trailing_slash() {
        let client = ChatCompletionsClient::new("key")
            .unwrap()
            .with_base_url("http://localhost:8000/v1/");
        assert_eq!(client.endpoint_url(), "http://localhost:8000/v1/chat/completions");
    }

    #[test]
    fn test_request_body_shape() {
        let req = request();
        let body = ChatRequest {
            model: &req.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &req.system,
                },
                ChatMessage {
                    role: "user",
                    content: &req.user,
                },
            ],
            temperature: req.temperature,
            max_tokens: req.max_tokens,
            response_format: Some(ResponseFormat {
                format_type: "json_object",
            }),
        };

        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["model"], "test-model");
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "user");
        assert_eq!(value["response_format"]["type"], "json_object");
    }

    #[test]
    fn test_request_body_omits_format_without_json_mode() {
        let req = request();
        let body = ChatRequest {
            model: &req.model,
            messages: vec![],
            temperature: 0.0,
            max_tokens: 16,
            response_format: None,
        };

        let value = serde_json::to_value(&body).unwrap();
        assert!(value.get("response_format").is_none());
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(reqwest::StatusCode::NOT_FOUND, "m", ""),
            CompletionError::ModelNotAvailable(_)
        ));
        assert!(matches!(
            classify_status(reqwest::StatusCode::TOO_MANY_REQUESTS, "m", ""),
            CompletionError::RateLimited
        ));
        assert!(matches!(
            classify_status(reqwest::StatusCode::UNAUTHORIZED, "m", "denied"),
            CompletionError::Communication(_)
        ));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_communication_error() {
        // Nothing listens on port 1; the connection is refused immediately
        let client = ChatCompletionsClient::new("key")
            .unwrap()
            .with_base_url("http://127.0.0.1:1");

        let result = client.generate(&request()).await;
        assert!(matches!(result, Err(CompletionError::Communication(_))));
    }

    #[test]
    fn test_response_parsing() {
        let raw = r#"{"choices": [{"message": {"content": "{\"results\": []}"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let content = parsed.choices[0].message.content.clone();
        assert_eq!(content.unwrap(), "{\"results\": []}");
    }

    #[test]
    fn test_response_parsing_null_content() {
        let raw = r#"{"choices": [{"message": {"content": null}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
