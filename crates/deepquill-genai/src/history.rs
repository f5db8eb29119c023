//! Conversation history adaptation to the provider's alternating role format.

use crate::types::{Author, ChatTurn};
use crate::wire::{Content, Part};

/// Convert prior turns into provider contents.
///
/// The provider requires the first content to be user-role, so a leading AI
/// turn is dropped. No other alternation validation is performed; malformed
/// ordering is passed through as supplied.
pub fn adapt_history(history: &[ChatTurn]) -> Vec<Content> {
    let turns = match history.first() {
        Some(turn) if turn.author == Author::Ai => &history[1..],
        _ => history,
    };

    turns
        .iter()
        .map(|turn| Content {
            role: Some(role_for(turn.author).to_string()),
            parts: vec![Part::text(&turn.text)],
        })
        .collect()
}

fn role_for(author: Author) -> &'static str {
    match author {
        Author::User => "user",
        Author::Ai => "model",
    }
}
