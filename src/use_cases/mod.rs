// Use cases layer: client workflows driven by input and server messages.

pub mod ports;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use ports::MessageSink;
pub use session::{GameSession, KeyOutcome, SessionError};
pub use types::{InboundMessage, OutboundMessage};
