use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    /// PostgREST answered with a non-2xx status.
    #[error("store rejected request (status {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("store network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A backlog row did not carry a usable identifier.
    #[error("invalid backlog row: {0}")]
    InvalidRow(String),
}
