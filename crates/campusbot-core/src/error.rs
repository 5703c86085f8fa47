use thiserror::Error;

/// Errors raised while talking to the CampusBot backend.
///
/// Controllers never surface these directly; each screen folds them into the
/// inline message the user sees (or swallows them, for the session lookup).
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("decode: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid url: {0}")]
    Url(#[from] url::ParseError),

    #[error("request task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, ApiError>;
