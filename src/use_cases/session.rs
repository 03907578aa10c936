// Game session workflow: throttled input, chat submission and inbound dispatch.

use crate::domain::{ClientState, InputThrottle, Key, Position};
use crate::use_cases::ports::MessageSink;
use crate::use_cases::types::{InboundMessage, OutboundMessage};
use std::fmt;
use std::time::Instant;
use tracing::debug;

/// Errors returned by session operations.
#[derive(Debug)]
pub enum SessionError {
    /// The outbound sink rejected the message.
    Send(String),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Send(err) => write!(f, "failed to send message: {err}"),
        }
    }
}

impl std::error::Error for SessionError {}

/// Result of a single key-down event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Accepted; the new position was applied and sent.
    Moved(Position),
    /// Inside the throttle window; nothing changed.
    Throttled,
}

/// Owns the client state and the outbound half of the connection.
pub struct GameSession<S> {
    state: ClientState,
    throttle: InputThrottle,
    sink: S,
}

impl<S> GameSession<S>
where
    S: MessageSink,
{
    pub fn new(sink: S, throttle: InputThrottle) -> Self {
        Self {
            state: ClientState::new(),
            throttle,
            sink,
        }
    }

    pub fn state(&self) -> &ClientState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ClientState {
        &mut self.state
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_parts(self) -> (ClientState, S) {
        (self.state, self.sink)
    }

    pub async fn handle_key(&mut self, key: Key, now: Instant) -> Result<KeyOutcome, SessionError> {
        if !self.throttle.try_accept(now) {
            debug!(?key, "key throttled");
            return Ok(KeyOutcome::Throttled);
        }

        // Local state is updated first; the server echo (if any) arrives whenever it does.
        let position = self.state.apply_key(key);
        self.sink
            .send(OutboundMessage::Movement { position })
            .await
            .map_err(SessionError::Send)?;
        Ok(KeyOutcome::Moved(position))
    }

    /// Sends the chat input as-is (empty included) and clears the field.
    pub async fn submit_chat(&mut self) -> Result<(), SessionError> {
        let content = self.state.take_chat_input();
        self.sink
            .send(OutboundMessage::Chat { content })
            .await
            .map_err(SessionError::Send)
    }

    pub fn apply_inbound(&mut self, message: InboundMessage) {
        match message {
            InboundMessage::Chat { content } => self.state.push_chat(content),
            InboundMessage::Movement(player) => self.state.upsert_player(player),
        }
    }
}
