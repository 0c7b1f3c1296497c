use shared::{domain::ContextId, error::ProtocolError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// The host announced a context that is already live.
    #[error("context {0} is already registered")]
    DuplicateIdentifier(ContextId),
    #[error("no live action for context {0}")]
    UnknownTarget(ContextId),
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}
