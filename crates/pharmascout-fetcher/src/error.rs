use thiserror::Error;

pub type Result<T> = std::result::Result<T, FetchError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("timeout")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("HTTP {status}")]
    HttpStatus { status: u16 },

    #[error("rate limit exceeded for domain: {domain}")]
    RateLimited { domain: String },

    #[error("invalid search URL: {0}")]
    InvalidUrl(String),
}

impl FetchError {
    /// Whether trying the same request again could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Transport(_) | Self::RateLimited { .. } => true,
            Self::HttpStatus { status } => *status >= 500,
            Self::InvalidUrl(_) => false,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if let Some(status) = err.status() {
            Self::HttpStatus {
                status: status.as_u16(),
            }
        } else {
            Self::Transport(err.to_string())
        }
    }
}
