//! Presentation port for a chat session.
//!
//! The session decides *what* is shown; implementations decide how. Rich
//! rendering (markdown, highlighting) belongs to the implementation.

use crate::history::HistoryEntry;
use crate::types::Message;

pub trait ChatView {
    /// Show one transcript message in the given `#rrggbb` color.
    fn show_message(&mut self, message: &Message, color: &str);

    /// Show the "composing" indicator while a reply is pending.
    fn show_composing(&mut self, color: &str);

    fn hide_composing(&mut self);

    /// Drop every message currently shown.
    fn clear(&mut self);

    /// Replace the history listing. Not called for guided sessions.
    fn show_history(&mut self, entries: &[HistoryEntry]);

    /// Interrupt the user with a short notice.
    fn alert(&mut self, message: &str);
}

/// A view that shows nothing, for one-shot or scripted use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl ChatView for NullView {
    fn show_message(&mut self, _message: &Message, _color: &str) {}
    fn show_composing(&mut self, _color: &str) {}
    fn hide_composing(&mut self) {}
    fn clear(&mut self) {}
    fn show_history(&mut self, _entries: &[HistoryEntry]) {}
    fn alert(&mut self, _message: &str) {}
}
