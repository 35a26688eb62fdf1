use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("not found")]
    NotFound,

    #[error("username has already been taken")]
    UsernameTaken,

    #[error("email address has already been used")]
    EmailTaken,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error("highlighting failed: {0}")]
    Highlight(String),
}

pub type Result<T> = std::result::Result<T, Error>;
