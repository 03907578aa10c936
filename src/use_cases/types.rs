// Use-case level message shapes exchanged with the server.

use crate::domain::{Player, Position};

/// Messages the client sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    Movement { position: Position },
    Chat { content: String },
}

/// Messages the client receives, already decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Movement(Player),
    Chat { content: String },
}
