use shared::protocol::OutboundMessage;
use tokio::sync::mpsc;
use tracing::{trace, warn};

/// Fire-and-forget handle for messages headed to the host.
///
/// Sending never blocks; the transport drains the other end.
#[derive(Debug, Clone)]
pub struct OutboundSender {
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl OutboundSender {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundMessage>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn send(&self, message: OutboundMessage) {
        trace!(
            event = %message.event,
            context = message.context.as_deref().unwrap_or_default(),
            "outbound command"
        );
        if let Err(err) = self.tx.send(message) {
            warn!(event = %err.0.event, "host connection gone; dropping outbound command");
        }
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}
