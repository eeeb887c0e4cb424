//! Chat controller: owns the transcript, prompt history, composer, completion
//! client and session state, and turns UI actions into changes to them.
//!
//! A submission is split in two so the caller decides where the network call
//! runs: `submit` does the synchronous part and hands back a
//! [`PendingRequest`]; the caller awaits [`PendingRequest::run`] (usually on a
//! spawned task) and feeds the [`Completed`] result to `finish`.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::ai::{CompletionClient, CompletionError};
use crate::composer::{Composer, CHAT_PLACEHOLDER, SIGNED_OUT_PLACEHOLDER};
use crate::config::LoaderStyle;
use crate::history::PromptHistory;
use crate::session::{SessionState, UserProfile};
use crate::state::ChatRole;
use crate::transcript::{LoadingHandle, Transcript};

/// Prepended to the failure reason in the transcript.
pub const ERROR_PREFIX: &str = "Вибачте, сталася помилка: ";

/// A submitted prompt whose reply hasn't been requested yet.
pub struct PendingRequest {
    loading: LoadingHandle,
    prompt: String,
    client: Arc<dyn CompletionClient>,
}

impl PendingRequest {
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub async fn run(self) -> Completed {
        let reply = self.client.complete(&self.prompt).await;
        Completed {
            loading: self.loading,
            prompt: self.prompt,
            reply,
        }
    }
}

/// Outcome of a [`PendingRequest`], ready to be applied with `finish`.
#[derive(Debug)]
pub struct Completed {
    loading: LoadingHandle,
    prompt: String,
    reply: Result<String, CompletionError>,
}

impl Completed {
    pub fn reply(&self) -> &Result<String, CompletionError> {
        &self.reply
    }
}

pub struct ChatController {
    transcript: Transcript,
    history: PromptHistory,
    composer: Composer,
    client: Arc<dyn CompletionClient>,
    // None when the chat isn't behind a sign-in gate
    session: Option<SessionState>,
    loader: LoaderStyle,
}

impl ChatController {
    pub fn new(client: Arc<dyn CompletionClient>, gated: bool, loader: LoaderStyle) -> Self {
        let mut composer = Composer::new();
        let session = if gated {
            composer.set_enabled(false, SIGNED_OUT_PLACEHOLDER);
            Some(SessionState::SignedOut)
        } else {
            None
        };

        Self {
            transcript: Transcript::new(),
            history: PromptHistory::new(),
            composer,
            client,
            session,
            loader,
        }
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn history(&self) -> &PromptHistory {
        &self.history
    }

    pub fn composer(&self) -> &Composer {
        &self.composer
    }

    /// Edits made through this must be followed by `input_changed`.
    pub fn composer_mut(&mut self) -> &mut Composer {
        &mut self.composer
    }

    pub fn loader(&self) -> LoaderStyle {
        self.loader
    }

    pub fn is_gated(&self) -> bool {
        self.session.is_some()
    }

    pub fn user(&self) -> Option<&UserProfile> {
        self.session.as_ref().and_then(SessionState::user)
    }

    pub fn input_changed(&mut self) {
        self.composer.refresh_send();
    }

    /// Submit whatever is in the composer.
    pub fn submit_input(&mut self) -> Option<PendingRequest> {
        let raw = self.composer.text().to_string();
        self.submit(&raw)
    }

    /// Returns `None` without touching anything when the input is blank or the
    /// gate is signed out.
    pub fn submit(&mut self, raw: &str) -> Option<PendingRequest> {
        if self.session.as_ref().is_some_and(|s| !s.is_signed_in()) {
            debug!("ignoring submit while signed out");
            return None;
        }

        let text = raw.trim();
        if text.is_empty() {
            return None;
        }

        self.transcript.dismiss_welcome();
        self.transcript.append(ChatRole::User, text);
        self.composer.clear();
        let loading = self.transcript.show_loading();

        info!(chars = text.chars().count(), "prompt submitted");

        Some(PendingRequest {
            loading,
            prompt: text.to_string(),
            client: Arc::clone(&self.client),
        })
    }

    pub fn finish(&mut self, done: Completed) {
        let Completed {
            loading,
            prompt,
            reply,
        } = done;

        if !self.transcript.remove_loading(loading) {
            debug!("transcript was reset, dropping reply");
            return;
        }

        match reply {
            Ok(text) => {
                self.transcript.append(ChatRole::Ai, text);
                self.history.record(prompt);
            }
            Err(err) => {
                warn!(error = %err, "completion failed");
                self.transcript.append_error(format!("{}{}", ERROR_PREFIX, err));
            }
        }
    }

    /// Apply a state emitted by the sign-in gate. Ignored when ungated.
    pub fn on_session(&mut self, state: SessionState) {
        if self.session.is_none() {
            return;
        }

        match &state {
            SessionState::SignedOut => {
                self.transcript.reset();
                self.composer.set_enabled(false, SIGNED_OUT_PLACEHOLDER);
            }
            SessionState::SignedIn(_) => {
                self.transcript.dismiss_welcome();
                self.composer.set_enabled(true, CHAT_PLACEHOLDER);
            }
        }

        self.session = Some(state);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Entry;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct MockClient {
        reply: Result<String, CompletionError>,
        prompts: Mutex<Vec<String>>,
    }

    impl MockClient {
        fn replying(reply: Result<&str, CompletionError>) -> Arc<Self> {
            Arc::new(Self {
                reply: reply.map(str::to_string),
                prompts: Mutex::new(Vec::new()),
            })
        }

        fn prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl CompletionClient for MockClient {
        async fn complete(&self, user_text: &str) -> Result<String, CompletionError> {
            self.prompts.lock().unwrap().push(user_text.to_string());
            self.reply.clone()
        }
    }

    fn controller(client: Arc<MockClient>) -> ChatController {
        ChatController::new(client, false, LoaderStyle::Dots)
    }

    fn olena() -> UserProfile {
        UserProfile {
            display_name: "Олена".to_string(),
            avatar_url: "https://example.com/olena.png".to_string(),
        }
    }

    #[tokio::test]
    async fn test_greeting_round_trip() {
        let client = MockClient::replying(Ok("Добрий день!"));
        let mut chat = controller(client.clone());

        let pending = chat.submit("Привіт").unwrap();
        assert!(!chat.transcript().is_welcome());
        assert!(chat.transcript().is_loading());
        assert_eq!(
            chat.transcript().entries()[0],
            Entry::Message(crate::ChatMessage::new(ChatRole::User, "Привіт"))
        );

        let done = pending.run().await;
        chat.finish(done);

        assert!(!chat.transcript().is_loading());
        let messages: Vec<(ChatRole, &str)> = chat
            .transcript()
            .messages()
            .map(|m| (m.role, m.content.as_str()))
            .collect();
        assert_eq!(
            messages,
            vec![(ChatRole::User, "Привіт"), (ChatRole::Ai, "Добрий день!")]
        );
        assert_eq!(chat.history().entries().collect::<Vec<_>>(), vec!["Привіт"]);
        assert_eq!(client.prompts(), vec!["Привіт"]);
    }

    #[tokio::test]
    async fn test_blank_input_is_a_no_op() {
        let client = MockClient::replying(Ok("unused"));
        let mut chat = controller(client.clone());

        for raw in ["", "   ", "\n\t "] {
            assert!(chat.submit(raw).is_none());
        }

        assert!(chat.transcript().is_welcome());
        assert!(chat.transcript().entries().is_empty());
        assert!(chat.history().is_empty());
        assert!(client.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_replaces_loader_with_error() {
        let client = MockClient::replying(Err(CompletionError::TransportFailure(
            "connection refused".to_string(),
        )));
        let mut chat = controller(client);

        let pending = chat.submit("Привіт").unwrap();
        chat.finish(pending.run().await);

        assert!(!chat.transcript().is_loading());
        assert_eq!(
            chat.transcript().errors().collect::<Vec<_>>(),
            vec!["Вибачте, сталася помилка: connection refused"]
        );
        assert_eq!(chat.transcript().messages().count(), 1);
        assert!(chat.history().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_response_shows_format_error() {
        let client = MockClient::replying(Err(CompletionError::MalformedResponse));
        let mut chat = controller(client);

        let pending = chat.submit("Привіт").unwrap();
        chat.finish(pending.run().await);

        assert!(!chat.transcript().is_loading());
        assert_eq!(
            chat.transcript().errors().collect::<Vec<_>>(),
            vec!["Вибачте, сталася помилка: Помилка формату API"]
        );
    }

    #[tokio::test]
    async fn test_history_is_newest_first() {
        let client = MockClient::replying(Ok("ok"));
        let mut chat = controller(client);

        for prompt in ["A", "B"] {
            let pending = chat.submit(prompt).unwrap();
            chat.finish(pending.run().await);
        }

        assert_eq!(chat.history().entries().collect::<Vec<_>>(), vec!["B", "A"]);
        assert_eq!(chat.transcript().messages().count(), 4);
    }

    #[tokio::test]
    async fn test_submit_input_trims_and_clears_composer() {
        let client = MockClient::replying(Ok("ok"));
        let mut chat = controller(client.clone());

        chat.composer_mut().set_text("  питання \n");
        chat.input_changed();
        assert!(chat.composer().can_send());

        let pending = chat.submit_input().unwrap();
        assert_eq!(pending.prompt(), "питання");
        assert_eq!(chat.composer().text(), "");
        assert!(!chat.composer().can_send());

        // Typing again re-enables send while the first request is in flight
        chat.composer_mut().insert('щ');
        chat.input_changed();
        assert!(chat.composer().can_send());

        chat.finish(pending.run().await);
        assert_eq!(client.prompts(), vec!["питання"]);
    }

    #[tokio::test]
    async fn test_overlapping_requests_each_get_one_reply() {
        let client = MockClient::replying(Ok("відповідь"));
        let mut chat = controller(client);

        let first = chat.submit("перше").unwrap();
        let second = chat.submit("друге").unwrap();

        let second_done = second.run().await;
        let first_done = first.run().await;
        chat.finish(second_done);
        assert!(chat.transcript().is_loading());
        chat.finish(first_done);
        assert!(!chat.transcript().is_loading());

        let ai_replies = chat
            .transcript()
            .messages()
            .filter(|m| m.role == ChatRole::Ai)
            .count();
        assert_eq!(ai_replies, 2);
        assert_eq!(chat.history().entries().collect::<Vec<_>>(), vec!["перше", "друге"]);
    }

    #[tokio::test]
    async fn test_gate_controls_input_and_welcome() {
        let client = MockClient::replying(Ok("ok"));
        let mut chat = ChatController::new(client.clone(), true, LoaderStyle::Text);

        assert!(!chat.composer().is_enabled());
        assert_eq!(chat.composer().placeholder(), SIGNED_OUT_PLACEHOLDER);
        assert!(chat.submit("Привіт").is_none());
        assert!(client.prompts().is_empty());

        chat.on_session(SessionState::SignedIn(olena()));
        assert!(chat.composer().is_enabled());
        assert_eq!(chat.composer().placeholder(), CHAT_PLACEHOLDER);
        assert!(!chat.transcript().is_welcome());
        assert_eq!(chat.user().map(|u| u.display_name.as_str()), Some("Олена"));

        let pending = chat.submit("Привіт").unwrap();
        chat.finish(pending.run().await);
        assert_eq!(chat.transcript().messages().count(), 2);

        chat.on_session(SessionState::SignedOut);
        assert!(chat.transcript().is_welcome());
        assert!(chat.transcript().entries().is_empty());
        assert!(!chat.composer().is_enabled());
        assert!(chat.user().is_none());
    }

    #[tokio::test]
    async fn test_reply_after_sign_out_is_dropped() {
        let client = MockClient::replying(Ok("запізно"));
        let mut chat = ChatController::new(client, true, LoaderStyle::Dots);
        chat.on_session(SessionState::SignedIn(olena()));

        let pending = chat.submit("Привіт").unwrap();
        chat.on_session(SessionState::SignedOut);
        chat.finish(pending.run().await);

        assert!(chat.transcript().is_welcome());
        assert!(chat.history().is_empty());
    }

    #[test]
    fn test_session_is_ignored_when_ungated() {
        let mut chat = controller(MockClient::replying(Ok("ok")));
        chat.on_session(SessionState::SignedOut);
        assert!(chat.composer().is_enabled());
        assert!(!chat.is_gated());
    }
}
