use thiserror::Error;

#[derive(Error, Debug)]
pub enum FunnelError {
    #[error("Unknown event type: {0}")]
    UnknownEventType(String),

    #[error("Cannot derive document id: {0}")]
    MissingIdentity(String),

    #[error("Invalid message: {0}")]
    InvalidMessage(String),
}
