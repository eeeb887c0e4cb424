pub mod ai;
pub mod composer;
pub mod config;
pub mod controller;
pub mod history;
pub mod session;
pub mod state;
pub mod transcript;

// Re-export main types for convenience
pub use ai::{CompletionClient, CompletionError, GeminiClient};
pub use composer::Composer;
pub use config::{Config, LoaderStyle};
pub use controller::{ChatController, Completed, PendingRequest};
pub use history::PromptHistory;
pub use session::{AuthError, LocalSessionGate, SessionGate, SessionState, UserProfile};
pub use state::{ChatMessage, ChatRole};
pub use transcript::{Entry, LoadingHandle, Transcript};
