//! Chartex Completion Provider Layer
//!
//! Implementations of the `CompletionClient` trait from `chartex-domain`.
//!
//! # Providers
//!
//! - `MockClient`: deterministic mock for testing
//! - `ChatCompletionsClient`: OpenAI-compatible chat-completions HTTP API
//!
//! # Examples
//!
//! ```
//! use chartex_llm::MockClient;
//! use chartex_domain::{CompletionClient, CompletionRequest};
//!
//! let client = MockClient::new("{\"results\": []}");
//! let request = CompletionRequest {
//!     system: "extract fields".to_string(),
//!     user: "Note 1: ...".to_string(),
//!     model: "test-model".to_string(),
//!     temperature: 0.0,
//!     max_tokens: 4096,
//!     json_mode: true,
//! };
//! let text = client.complete(&request).unwrap();
//! assert_eq!(text, "{\"results\": []}");
//! ```

#![warn(missing_docs)]

pub mod chat;

use chartex_domain::{CompletionClient, CompletionRequest};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use chat::ChatCompletionsClient;

/// Errors that can occur during completion operations
#[derive(Error, Debug, Clone)]
pub enum CompletionError {
    /// Invalid client configuration (empty credentials, bad endpoint)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from the completion service
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("Completion error: {0}")]
    Other(String),
}

/// Mock completion client for deterministic testing
///
/// Returns pre-configured outcomes without making any network calls. A
/// scripted sequence of outcomes is consumed first, one per call; once the
/// script is exhausted every call returns the default response. This makes
/// fail-twice-then-succeed retry scenarios trivial to stage.
///
/// # Examples
///
/// ```
/// use chartex_llm::{CompletionError, MockClient};
/// use chartex_domain::{CompletionClient, CompletionRequest};
///
/// # fn request() -> CompletionRequest {
/// #     CompletionRequest {
/// #         system: String::new(), user: String::new(),
/// #         model: String::new(), temperature: 0.0,
/// #         max_tokens: 16, json_mode: false,
/// #     }
/// # }
/// let client = MockClient::new("[]").with_script(vec![
///     Err(CompletionError::Communication("boom".to_string())),
///     Ok("[{}]".to_string()),
/// ]);
///
/// assert!(client.complete(&request()).is_err());
/// assert_eq!(client.complete(&request()).unwrap(), "[{}]");
/// assert_eq!(client.complete(&request()).unwrap(), "[]");
/// assert_eq!(client.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockClient {
    default_response: String,
    script: Arc<Mutex<VecDeque<Result<String, CompletionError>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    call_count: Arc<Mutex<usize>>,
}

impl MockClient {
    /// Create a new MockClient with a fixed response for all calls
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            default_response: response.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
            call_count: Arc::new(Mutex::new(0)),
        }
    }

    /// Queue a sequence of outcomes consumed one per call before the
    /// default response kicks in
    pub fn with_script(self, outcomes: Vec<Result<String, CompletionError>>) -> Self {
        *self.script.lock().unwrap() = outcomes.into();
        self
    }

    /// Get the number of times complete was called
    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }

    /// All requests seen so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Default for MockClient {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl CompletionClient for MockClient {
    type Error = CompletionError;

    fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error> {
        *self.call_count.lock().unwrap() += 1;
        self.requests.lock().unwrap().push(request.clone());

        if let Some(outcome) = self.script.lock().unwrap().pop_front() {
            return outcome;
        }

        Ok(self.default_response.clone())
    }
}
