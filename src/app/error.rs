use thiserror::Error;

use crate::config::ConfigError;

#[derive(Error, Debug)]
pub enum FeedfsError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cache codec error: {0}")]
    CacheCodec(String),

    #[error("No such file or directory: {0}")]
    NotFound(String),

    #[error("Rebuild exceeded {0}s, keeping the previous tree")]
    RebuildTimedOut(u64),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, FeedfsError>;
