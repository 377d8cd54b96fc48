use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("{0} not found")]
    NotFound(String),

    #[error("a role cannot include itself")]
    SelfInclusion,

    #[error("adding this inclusion would create a cycle in the role hierarchy")]
    CycleViolation,

    #[error("this role inclusion already exists")]
    DuplicateEdge,

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("system roles cannot be modified")]
    SystemRole,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("crypto error: {0}")]
    Crypto(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error("forbidden")]
    Forbidden,

    #[error("invalid token")]
    InvalidToken,

    #[error("token expired")]
    TokenExpired,

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl Error {
    pub fn not_found(entity: impl Into<String>) -> Self {
        Self::NotFound(entity.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
