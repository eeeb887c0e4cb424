//! The chat transcript: an append-only list of rendered entries plus the
//! transient loading indicators and the welcome placeholder.

use crate::state::{ChatMessage, ChatRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LoadingId(u64);

/// Proof that a loading indicator was shown. Consumed on removal, so an
/// indicator can't be removed twice.
#[derive(Debug, PartialEq, Eq)]
pub struct LoadingHandle {
    id: LoadingId,
}

impl LoadingHandle {
    pub fn id(&self) -> LoadingId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Message(ChatMessage),
    /// Failure text shown on the AI's side of the conversation.
    Error(String),
    Loading(LoadingId),
}

#[derive(Debug)]
pub struct Transcript {
    entries: Vec<Entry>,
    welcome: bool,
    next_loading: u64,
    scroll: u16,
    stick_to_bottom: bool,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            welcome: true,
            next_loading: 0,
            scroll: 0,
            stick_to_bottom: true,
        }
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn messages(&self) -> impl Iterator<Item = &ChatMessage> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Message(msg) => Some(msg),
            _ => None,
        })
    }

    pub fn errors(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().filter_map(|entry| match entry {
            Entry::Error(text) => Some(text.as_str()),
            _ => None,
        })
    }

    /// The welcome placeholder only ever shows over an empty transcript.
    pub fn is_welcome(&self) -> bool {
        self.welcome && self.entries.is_empty()
    }

    pub fn dismiss_welcome(&mut self) {
        self.welcome = false;
    }

    /// Drop every entry and bring the welcome placeholder back.
    pub fn reset(&mut self) {
        self.entries.clear();
        self.welcome = true;
        self.scroll = 0;
        self.stick_to_bottom = true;
    }

    pub fn append(&mut self, role: ChatRole, text: impl Into<String>) {
        self.push(Entry::Message(ChatMessage::new(role, text)));
    }

    pub fn append_error(&mut self, text: impl Into<String>) {
        self.push(Entry::Error(text.into()));
    }

    pub fn show_loading(&mut self) -> LoadingHandle {
        let id = LoadingId(self.next_loading);
        self.next_loading += 1;
        self.push(Entry::Loading(id));
        LoadingHandle { id }
    }

    /// Returns false when the indicator is already gone (the transcript was
    /// reset while the request was in flight).
    pub fn remove_loading(&mut self, handle: LoadingHandle) -> bool {
        let before = self.entries.len();
        self.entries.retain(|entry| *entry != Entry::Loading(handle.id));
        self.entries.len() != before
    }

    pub fn is_loading(&self) -> bool {
        self.entries.iter().any(|entry| matches!(entry, Entry::Loading(_)))
    }

    fn push(&mut self, entry: Entry) {
        self.welcome = false;
        self.entries.push(entry);
        // Newest entry always comes into view
        self.stick_to_bottom = true;
    }

    // Scrolling

    pub fn scroll(&self) -> u16 {
        self.scroll
    }

    pub fn follows_tail(&self) -> bool {
        self.stick_to_bottom
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.stick_to_bottom = false;
        self.scroll = self.scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.scroll = self.scroll.saturating_add(lines);
    }

    /// Called by the renderer once it knows how far the view can scroll.
    pub fn sync_scroll(&mut self, max_scroll: u16) {
        if self.stick_to_bottom || self.scroll >= max_scroll {
            self.scroll = max_scroll;
            self.stick_to_bottom = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_with_welcome() {
        let transcript = Transcript::new();
        assert!(transcript.is_welcome());
        assert!(transcript.entries().is_empty());
    }

    #[test]
    fn test_append_keeps_order_and_hides_welcome() {
        let mut transcript = Transcript::new();
        transcript.append(ChatRole::User, "перше");
        transcript.append(ChatRole::Ai, "друге");

        assert!(!transcript.is_welcome());
        let texts: Vec<&str> = transcript.messages().map(|m| m.content.as_str()).collect();
        assert_eq!(texts, vec!["перше", "друге"]);
    }

    #[test]
    fn test_loading_handle_removes_only_its_indicator() {
        let mut transcript = Transcript::new();
        let first = transcript.show_loading();
        let second = transcript.show_loading();
        assert_ne!(first.id(), second.id());

        assert!(transcript.remove_loading(first));
        assert!(transcript.is_loading());
        assert!(transcript.remove_loading(second));
        assert!(!transcript.is_loading());
    }

    #[test]
    fn test_reset_brings_welcome_back_and_orphans_loading() {
        let mut transcript = Transcript::new();
        transcript.append(ChatRole::User, "текст");
        let loading = transcript.show_loading();

        transcript.reset();
        assert!(transcript.is_welcome());
        assert!(!transcript.remove_loading(loading));
    }

    #[test]
    fn test_scrolling_unpins_until_bottom_reached() {
        let mut transcript = Transcript::new();
        transcript.append(ChatRole::Ai, "довга відповідь");
        transcript.sync_scroll(10);
        assert_eq!(transcript.scroll(), 10);

        transcript.scroll_up(4);
        transcript.sync_scroll(10);
        assert_eq!(transcript.scroll(), 6);
        assert!(!transcript.follows_tail());

        transcript.scroll_down(4);
        transcript.sync_scroll(10);
        assert!(transcript.follows_tail());

        transcript.scroll_up(4);
        transcript.append(ChatRole::User, "ще");
        transcript.sync_scroll(12);
        assert_eq!(transcript.scroll(), 12);
    }
}
