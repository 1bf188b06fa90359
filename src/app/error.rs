use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrawlerError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("Store lock poisoned")]
    LockPoisoned,

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, TrawlerError>;
