// Domain-level client state and the pure transitions that mutate it.

/// Grid position of a player. Screen coordinates: +Y points down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const ORIGIN: Position = Position { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn offset(self, (dx, dy): (i32, i32)) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// A remote player as last reported by the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: String,
    pub position: Position,
}

/// A single key-down event, already decoded from the input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Up,
    Left,
    Down,
    Right,
    // Anything else still yields a movement message, just without a delta.
    Other(char),
}

impl Key {
    pub fn from_char(c: char) -> Self {
        match c {
            'w' => Key::Up,
            'a' => Key::Left,
            's' => Key::Down,
            'd' => Key::Right,
            other => Key::Other(other),
        }
    }

    /// Unit delta on the grid for this key.
    pub fn delta(self) -> (i32, i32) {
        match self {
            Key::Up => (0, -1),
            Key::Down => (0, 1),
            Key::Left => (-1, 0),
            Key::Right => (1, 0),
            Key::Other(_) => (0, 0),
        }
    }
}

/// Everything the client knows about the game.
///
/// Mutated only through the transition methods below; rendering reads it.
#[derive(Debug, Clone, Default)]
pub struct ClientState {
    pub position: Position,
    pub players: Vec<Player>,
    pub chat_log: Vec<String>,
    pub chat_input: String,
}

impl ClientState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a key's delta to the local position and returns the new position.
    pub fn apply_key(&mut self, key: Key) -> Position {
        self.position = self.position.offset(key.delta());
        self.position
    }

    /// Filter-then-append: at most one entry per id, most recently updated last.
    pub fn upsert_player(&mut self, player: Player) {
        self.players.retain(|p| p.id != player.id);
        self.players.push(player);
    }

    pub fn push_chat(&mut self, content: String) {
        self.chat_log.push(content);
    }

    pub fn set_chat_input(&mut self, text: impl Into<String>) {
        self.chat_input = text.into();
    }

    /// Returns the chat input and clears the field.
    pub fn take_chat_input(&mut self) -> String {
        std::mem::take(&mut self.chat_input)
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }
}
