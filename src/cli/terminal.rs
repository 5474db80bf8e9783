//! Terminal rendering and stdin key prompt.

use std::io::{self, BufRead, Write};

use chrono::{Local, TimeZone};

use crate::credential::CredentialPrompt;
use crate::history::HistoryEntry;
use crate::session::ChatView;
use crate::types::{ConversationId, Message};

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

/// Parse `#rrggbb` (or `#rgb`) into an RGB triple.
pub fn parse_hex_color(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if !hex.is_ascii() {
        return None;
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    match hex.len() {
        6 => Some((channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?)),
        3 => {
            let short = |i: usize| channel(&hex[i..=i]).map(|v| v * 17);
            Some((short(0)?, short(1)?, short(2)?))
        }
        _ => None,
    }
}

/// Truecolor foreground escape, or nothing for an unreadable color.
pub fn ansi_fg(color: &str) -> String {
    parse_hex_color(color)
        .map(|(r, g, b)| format!("\x1b[38;2;{r};{g};{b}m"))
        .unwrap_or_default()
}

/// One history row as printed by the terminal.
pub fn format_entry(entry: &HistoryEntry) -> String {
    let marker = if entry.active { '*' } else { ' ' };
    format!("{marker} {}  {}  {}", entry.id, started_at(entry.id), entry.title)
}

fn started_at(id: ConversationId) -> String {
    i64::try_from(id.as_millis())
        .ok()
        .and_then(|ms| Local.timestamp_millis_opt(ms).single())
        .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Plain-text transcript line.
pub fn format_message(message: &Message, color: &str) -> String {
    let fg = ansi_fg(color);
    if fg.is_empty() {
        format!("{}: {}", message.name, message.text)
    } else {
        format!("{fg}{}{RESET}: {}", message.name, message.text)
    }
}

/// Writes the transcript to stdout.
///
/// The history listing is cached rather than printed on every refresh; the
/// `/history` command prints it.
#[derive(Debug, Default)]
pub struct TerminalView {
    entries: Vec<HistoryEntry>,
    composing: bool,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn print_history(&self) {
        if self.entries.is_empty() {
            println!("{DIM}(no saved conversations){RESET}");
        }
        for entry in &self.entries {
            println!("{}", format_entry(entry));
        }
    }
}

impl ChatView for TerminalView {
    fn show_message(&mut self, message: &Message, color: &str) {
        println!("{}", format_message(message, color));
    }

    fn show_composing(&mut self, color: &str) {
        self.composing = true;
        print!("{}...{RESET}", ansi_fg(color));
        let _ = io::stdout().flush();
    }

    fn hide_composing(&mut self) {
        if std::mem::take(&mut self.composing) {
            print!("\r\x1b[2K");
            let _ = io::stdout().flush();
        }
    }

    fn clear(&mut self) {
        println!("{DIM}----{RESET}");
    }

    fn show_history(&mut self, entries: &[HistoryEntry]) {
        self.entries = entries.to_vec();
    }

    fn alert(&mut self, message: &str) {
        eprintln!("! {message}");
    }
}

/// Reads one line from stdin after printing the question on stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdinPrompt;

impl CredentialPrompt for StdinPrompt {
    fn ask(&mut self, message: &str) -> Option<String> {
        eprint!("{message} ");
        let _ = io::stderr().flush();
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) => Some(line.trim().to_string()).filter(|l| !l.is_empty()),
        }
    }
}

/// Answers with a key given up front, and only asks `fallback` without one.
#[derive(Debug)]
pub struct PresetKey<P> {
    key: Option<String>,
    fallback: P,
}

impl<P: CredentialPrompt> PresetKey<P> {
    pub fn new(key: Option<String>, fallback: P) -> Self {
        let key = key.filter(|k| !k.trim().is_empty());
        Self { key, fallback }
    }
}

impl<P: CredentialPrompt> CredentialPrompt for PresetKey<P> {
    fn ask(&mut self, message: &str) -> Option<String> {
        match &self.key {
            Some(key) => Some(key.clone()),
            None => self.fallback.ask(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preset_key_answers_without_asking() {
        let never_asked = |message: &str| -> Option<String> { panic!("asked for a key: {message}") };
        let mut prompt = PresetKey::new(Some("gsk-preset".to_string()), never_asked);
        assert_eq!(prompt.ask("Enter your API key"), Some("gsk-preset".to_string()));
    }

    #[test]
    fn blank_preset_falls_back_to_asking() {
        let mut asked = Vec::new();
        let mut prompt = PresetKey::new(Some("  ".to_string()), |message: &str| {
            asked.push(message.to_string());
            Some("typed".to_string())
        });
        assert_eq!(prompt.ask("Enter your API key"), Some("typed".to_string()));
        drop(prompt);
        assert_eq!(asked, vec!["Enter your API key".to_string()]);
    }

    #[test]
    fn hex_colors_parse_long_and_short_forms() {
        assert_eq!(parse_hex_color("#007bff"), Some((0, 123, 255)));
        assert_eq!(parse_hex_color("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("red"), None);
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#zzzzzz"), None);
    }

    #[test]
    fn unreadable_color_renders_plain() {
        let message = Message::user("Hello", "You");
        assert_eq!(format_message(&message, "blue"), "You: Hello");
        assert_eq!(
            format_message(&message, "#333333"),
            "\x1b[38;2;51;51;51mYou\x1b[0m: Hello"
        );
    }

    #[test]
    fn active_entry_is_starred() {
        let entry = HistoryEntry {
            id: ConversationId::from_millis(1_700_000_000_000),
            title: "Hello...".to_string(),
            active: true,
        };
        let line = format_entry(&entry);
        assert!(line.starts_with("* 1700000000000  "));
        assert!(line.ends_with("  Hello..."));
    }
}
