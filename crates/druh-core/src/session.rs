//! Sign-in gate. The identity provider is an external collaborator; the chat
//! only ever sees its state signal and asks it to sign in or out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::watch;
use tracing::info;

pub const SIGN_IN_UNAVAILABLE: &str = "Інтеграція з Google Sign-In скоро з'явиться!";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub display_name: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    SignedOut,
    SignedIn(UserProfile),
}

impl SessionState {
    pub fn is_signed_in(&self) -> bool {
        matches!(self, SessionState::SignedIn(_))
    }

    pub fn user(&self) -> Option<&UserProfile> {
        match self {
            SessionState::SignedIn(user) => Some(user),
            SessionState::SignedOut => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("{0}")]
    Rejected(String),
    #[error("Вхід скасовано")]
    Aborted,
}

#[async_trait]
pub trait SessionGate: Send + Sync {
    /// The current state plus every later transition.
    fn subscribe(&self) -> watch::Receiver<SessionState>;

    /// Resolves once the provider has answered; the state change itself
    /// arrives through `subscribe`. May never resolve if the user walks away.
    async fn sign_in(&self) -> Result<(), AuthError>;

    fn sign_out(&self);
}

/// Gate that signs in as the profile from the config file. Without a
/// profile there is nobody to sign in as and every attempt is rejected.
pub struct LocalSessionGate {
    profile: Option<UserProfile>,
    state: watch::Sender<SessionState>,
}

impl LocalSessionGate {
    pub fn new(profile: Option<UserProfile>) -> Self {
        let (state, _) = watch::channel(SessionState::SignedOut);
        Self { profile, state }
    }
}

#[async_trait]
impl SessionGate for LocalSessionGate {
    fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.subscribe()
    }

    async fn sign_in(&self) -> Result<(), AuthError> {
        let profile = self
            .profile
            .clone()
            .ok_or_else(|| AuthError::Rejected(SIGN_IN_UNAVAILABLE.to_string()))?;

        info!(user = %profile.display_name, "signed in");
        self.state.send_replace(SessionState::SignedIn(profile));
        Ok(())
    }

    fn sign_out(&self) {
        info!("signed out");
        self.state.send_replace(SessionState::SignedOut);
    }
}
