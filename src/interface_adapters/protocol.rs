// Wire protocol DTOs and conversions for the game WebSocket.
// All frames are UTF-8 JSON objects tagged by a lowercase `type` field.

use crate::domain::{Player, Position};
use crate::use_cases::{InboundMessage, OutboundMessage};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Key shared by every movement that arrives without an id, so such
/// reports collapse into a single player entry.
pub const UNIDENTIFIED_PLAYER_ID: &str = "";

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientMessage {
    Movement { position: PositionDto },
    Chat { content: String },
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerMessage {
    // Position report for a player; `id` is the de-duplication key.
    // Bare broadcast servers leave it out.
    Movement {
        #[serde(default)]
        id: Option<PlayerIdDto>,
        position: PositionDto,
    },
    Chat {
        content: String,
    },
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionDto {
    pub x: i32,
    pub y: i32,
}

impl From<Position> for PositionDto {
    fn from(position: Position) -> Self {
        Self {
            x: position.x,
            y: position.y,
        }
    }
}

impl From<PositionDto> for Position {
    fn from(dto: PositionDto) -> Self {
        Position::new(dto.x, dto.y)
    }
}

/// Player ids show up as strings or numbers depending on the server build.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PlayerIdDto {
    Text(String),
    Number(serde_json::Number),
}

impl From<PlayerIdDto> for String {
    fn from(id: PlayerIdDto) -> Self {
        match id {
            PlayerIdDto::Text(text) => text,
            PlayerIdDto::Number(number) => number.to_string(),
        }
    }
}

impl From<&OutboundMessage> for ClientMessage {
    fn from(message: &OutboundMessage) -> Self {
        match message {
            OutboundMessage::Movement { position } => ClientMessage::Movement {
                position: (*position).into(),
            },
            OutboundMessage::Chat { content } => ClientMessage::Chat {
                content: content.clone(),
            },
        }
    }
}

impl From<ServerMessage> for InboundMessage {
    fn from(message: ServerMessage) -> Self {
        match message {
            ServerMessage::Movement { id, position } => InboundMessage::Movement(Player {
                id: id.map_or_else(|| UNIDENTIFIED_PLAYER_ID.to_string(), String::from),
                position: position.into(),
            }),
            ServerMessage::Chat { content } => InboundMessage::Chat { content },
        }
    }
}

#[derive(Debug)]
pub enum ProtocolError {
    Json(serde_json::Error),
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::Json(err) => write!(f, "invalid message: {err}"),
        }
    }
}

impl std::error::Error for ProtocolError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProtocolError::Json(err) => Some(err),
        }
    }
}

pub fn encode_outbound(message: &OutboundMessage) -> Result<String, ProtocolError> {
    serde_json::to_string(&ClientMessage::from(message)).map_err(ProtocolError::Json)
}

pub fn decode_inbound(text: &str) -> Result<InboundMessage, ProtocolError> {
    serde_json::from_str::<ServerMessage>(text)
        .map(InboundMessage::from)
        .map_err(ProtocolError::Json)
}
