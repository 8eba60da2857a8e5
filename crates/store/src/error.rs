use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Store returned {status}: {reason}")]
    Status { status: u16, reason: String },

    #[error("Unexpected response shape: {0}")]
    InvalidResponse(String),
}
