//! Host-side control commands (`clear`, `history`, `exit`) and history
//! rendering. Hosts check for these before submitting a turn.

use crate::{Role, Turn};

/// Characters of each turn shown by `history`.
pub const HISTORY_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Clear,
    History,
    Exit,
}

impl ControlCommand {
    /// Recognise a command; matching is case-insensitive on the whole input.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "clear" => Some(Self::Clear),
            "history" => Some(Self::History),
            "exit" | "quit" | "q" => Some(Self::Exit),
            _ => None,
        }
    }
}

/// Numbered listing of a conversation, each turn cut to
/// [`HISTORY_PREVIEW_CHARS`].
pub fn format_history(turns: &[Turn]) -> String {
    if turns.is_empty() {
        return "📜 No conversation history yet.".to_string();
    }

    let mut out = String::from("📜 Conversation History:");
    for (i, turn) in turns.iter().enumerate() {
        let (icon, label) = match turn.role {
            Role::User => ("👤", "User"),
            Role::Assistant => ("🤖", "Assistant"),
        };
        out.push_str(&format!("\n{}. {icon} {label}: {}", i + 1, preview(&turn.text)));
    }
    out
}

fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(HISTORY_PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}...")
    } else {
        head
    }
}
