use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::use_cases::ports::MessageSink;
use crate::use_cases::types::OutboundMessage;

// Sink that records every outbound message for assertions.
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    sent: Arc<Mutex<Vec<OutboundMessage>>>,
    fail: bool,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub(crate) fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().expect("sent mutex poisoned").clone()
    }
}

#[async_trait]
impl MessageSink for RecordingSink {
    async fn send(&mut self, message: OutboundMessage) -> Result<(), String> {
        if self.fail {
            return Err("sink closed".to_string());
        }

        let mut guard = self.sent.lock().expect("sent mutex poisoned");
        guard.push(message);
        Ok(())
    }
}
