use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] serde_json::Error),
    #[error("message is not a JSON object")]
    NotAnObject,
    #[error("message has no `event` tag")]
    MissingEvent,
    #[error("malformed payload field `{field}` in {event}: {reason}")]
    MalformedPayload {
        event: String,
        field: String,
        reason: String,
    },
}

impl ProtocolError {
    pub fn malformed_payload(
        event: impl Into<String>,
        field: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Self::MalformedPayload {
            event: event.into(),
            field: field.into(),
            reason: reason.to_string(),
        }
    }
}
