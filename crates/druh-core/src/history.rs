use std::collections::VecDeque;

/// Placeholder shown in the side panel before anything is recorded.
pub const EMPTY_STATE: &str = "Історія порожня";

/// Prompts the user sent this session, newest first.
#[derive(Debug, Default)]
pub struct PromptHistory {
    entries: VecDeque<String>,
}

impl PromptHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, text: impl Into<String>) {
        self.entries.push_front(text.into());
    }

    pub fn entries(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
