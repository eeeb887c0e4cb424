pub mod gemini;

use async_trait::async_trait;
use thiserror::Error;

pub use gemini::GeminiClient;

/// Why a completion produced no reply text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    /// Network, DNS or timeout failure, or a non-success HTTP status.
    #[error("{0}")]
    TransportFailure(String),

    /// The endpoint answered, but without `candidates[0].content.parts[0].text`.
    #[error("Помилка формату API")]
    MalformedResponse,
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        // The request URL carries the API key as a query parameter.
        CompletionError::TransportFailure(err.without_url().to_string())
    }
}

/// Turns one user utterance into the model's reply.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, user_text: &str) -> Result<String, CompletionError>;
}
