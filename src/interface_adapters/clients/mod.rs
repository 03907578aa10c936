// Outbound HTTP clients for services next to the game socket.

pub mod health;
