use async_trait::async_trait;

use crate::use_cases::types::OutboundMessage;

// Port for the outbound half of the server connection.
#[async_trait]
pub trait MessageSink: Send {
    async fn send(&mut self, message: OutboundMessage) -> Result<(), String>;
}
