// Render view: a pure mapping from client state to what the terminal shows.
// The console line being typed is the chat draft, so the view carries no
// input field; `ClientState::chat_input` only lives between `/say` and submit.

use crate::domain::{ClientState, Position};
use std::fmt::Write;

pub const DEFAULT_RENDER_SCALE: i32 = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSprite {
    pub label: String,
    /// Pixel offsets derived from the grid position.
    pub left: i32,
    pub top: i32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct View {
    pub position: Position,
    pub players: Vec<PlayerSprite>,
    pub chat_lines: Vec<String>,
}

pub fn render(state: &ClientState, scale: i32) -> View {
    let players = state
        .players
        .iter()
        .enumerate()
        .map(|(index, player)| PlayerSprite {
            // Labels follow list order, not ids.
            label: format!("Player {}", index + 1),
            left: player.position.x.saturating_mul(scale),
            top: player.position.y.saturating_mul(scale),
        })
        .collect();

    View {
        position: state.position,
        players,
        chat_lines: state.chat_log.clone(),
    }
}

impl View {
    /// Plain-text frame for the terminal.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "== Game ==");
        let _ = writeln!(out, "you: ({}, {})", self.position.x, self.position.y);
        for sprite in &self.players {
            let _ = writeln!(
                out,
                "  {} @ left={} top={}",
                sprite.label, sprite.left, sprite.top
            );
        }
        let _ = write!(out, "== Chat ==");
        for line in &self.chat_lines {
            let _ = write!(out, "\n  {line}");
        }
        out
    }
}
