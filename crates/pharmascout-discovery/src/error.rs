use pharmascout_db::DatabaseError;
use thiserror::Error;

/// Errors that abort a discovery run without producing a result.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("source registry is empty")]
    EmptyRegistry,

    #[error("invalid API name: {0}")]
    InvalidApiName(String),

    #[error("store error: {0}")]
    Store(#[from] DatabaseError),
}

pub type Result<T> = std::result::Result<T, DiscoveryError>;
