use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CompletionClient, CompletionError};
use crate::config::Config;

/// Speaker label the user's text is introduced with inside the prompt.
pub const USER_LABEL: &str = "Користувач";

/// Longest slice of a raw error body carried into a failure message.
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Serialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
struct GeminiContent {
    role: String,
    parts: Vec<GeminiPart>,
}

#[derive(Serialize)]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
}

#[derive(Deserialize)]
struct GeminiResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct GeminiResponseContent {
    parts: Option<Vec<GeminiResponsePart>>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiResponseContent>,
}

#[derive(Deserialize)]
struct GeminiResponse {
    candidates: Option<Vec<GeminiCandidate>>,
}

#[derive(Deserialize)]
struct GeminiErrorDetail {
    message: Option<String>,
}

#[derive(Deserialize)]
struct GeminiErrorBody {
    error: Option<GeminiErrorDetail>,
}

/// Client for the `generateContent` endpoint. Each call is a single turn:
/// the configured system prompt followed by the user's text.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_url: String,
    api_key: String,
    system_prompt: String,
}

impl GeminiClient {
    pub fn new(api_url: &str, api_key: &str, system_prompt: &str) -> Self {
        Self {
            client: Client::new(),
            api_url: api_url.to_string(),
            api_key: api_key.to_string(),
            system_prompt: system_prompt.to_string(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            &config.api_url,
            config.api_key.as_deref().unwrap_or_default(),
            &config.system_prompt,
        )
    }

    pub async fn query(&self, user_text: &str) -> Result<String, CompletionError> {
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                role: "user".to_string(),
                parts: vec![GeminiPart {
                    text: build_prompt(&self.system_prompt, user_text),
                }],
            }],
        };

        debug!(url = %self.api_url, chars = user_text.chars().count(), "sending completion request");

        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CompletionError::TransportFailure(format!(
                "Gemini API error {}: {}",
                status,
                error_reason(&text)
            )));
        }

        let body = response.text().await?;
        extract_reply(&body)
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn complete(&self, user_text: &str) -> Result<String, CompletionError> {
        self.query(user_text).await
    }
}

/// Joins the instruction and the user's turn into the single prompt text.
pub fn build_prompt(system_prompt: &str, user_text: &str) -> String {
    format!("{}\n\n{}: {}", system_prompt, USER_LABEL, user_text)
}

/// Pulls `candidates[0].content.parts[0].text` out of a response body.
pub fn extract_reply(body: &str) -> Result<String, CompletionError> {
    let response: GeminiResponse =
        serde_json::from_str(body).map_err(|_| CompletionError::MalformedResponse)?;

    response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .and_then(|content| content.parts.unwrap_or_default().into_iter().next())
        .and_then(|part| part.text)
        .filter(|text| !text.is_empty())
        .ok_or(CompletionError::MalformedResponse)
}

/// Short reason for a non-2xx body: the API's `error.message` when present,
/// otherwise the body cut down to `ERROR_BODY_LIMIT` characters.
fn error_reason(body: &str) -> String {
    let message = serde_json::from_str::<GeminiErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.error)
        .and_then(|detail| detail.message)
        .filter(|message| !message.trim().is_empty());
    if let Some(message) = message {
        return message.trim().to_string();
    }

    let body = body.trim();
    if body.chars().count() <= ERROR_BODY_LIMIT {
        return body.to_string();
    }
    let mut cut: String = body.chars().take(ERROR_BODY_LIMIT).collect();
    cut.push('…');
    cut
}
