//! Trait definitions for external interactions
//!
//! These traits define the boundary between the extraction pipeline and the
//! completion service. Infrastructure implementations live in `chartex-llm`.

/// One chat-completion request to the external service.
///
/// Carries both halves of the prompt plus the generation parameters the
/// service recognizes. The pipeline builds one of these per batch attempt.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System instruction describing the schema and extraction rules
    pub system: String,

    /// User message embedding the numbered notes for this batch
    pub user: String,

    /// Model identifier
    pub model: String,

    /// Sampling temperature (0.0-1.0)
    pub temperature: f64,

    /// Output token budget
    pub max_tokens: u32,

    /// Ask the service for a JSON-object response when it supports the hint
    pub json_mode: bool,
}

/// Trait for chat-completion operations
///
/// Implemented by the infrastructure layer (chartex-llm). The pipeline
/// treats every failure uniformly as a retryable condition; it does not
/// inspect error subtypes.
pub trait CompletionClient {
    /// Error type for completion operations
    type Error;

    /// Run one completion call, returning the raw response text
    fn complete(&self, request: &CompletionRequest) -> Result<String, Self::Error>;
}
