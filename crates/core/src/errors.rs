use thiserror::Error;

use crate::ports::CatalogError;

/// Domain-level failure category. The HTTP boundary maps a kind to a status
/// code with [`ErrorKind::status_code`] and nothing else.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Auth,
    UpstreamUnavailable,
    Internal,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::NotFound => "not_found",
            Self::Auth => "auth",
            Self::UpstreamUnavailable => "upstream_unavailable",
            Self::Internal => "internal",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn status_code(self) -> u16 {
        match self {
            Self::Validation => 400,
            Self::NotFound => 404,
            // a rejected internal token is our misconfiguration, not the caller's
            Self::Auth | Self::Internal => 500,
            Self::UpstreamUnavailable => 502,
            Self::Cancelled => 503,
        }
    }

    pub fn user_message(self) -> &'static str {
        match self {
            Self::Validation => "The request could not be processed. Check inputs and try again.",
            Self::NotFound => "The requested perfume is not in the catalog.",
            Self::Auth | Self::Internal => "An unexpected internal error occurred.",
            Self::UpstreamUnavailable => {
                "The catalog is temporarily unavailable. Please retry shortly."
            }
            Self::Cancelled => "The request was cancelled before it completed.",
        }
    }
}

/// Outermost error of the suggest operation. Cloneable so that one
/// singleflight result can be handed to every waiter.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SuggestError {
    #[error("{0}")]
    Validation(String),
    #[error("reference perfume `{brand} {name}` was not found")]
    NotFound { brand: String, name: String },
    #[error("catalog rejected the internal token: {0}")]
    Auth(String),
    #[error("catalog unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("internal failure: {0}")]
    Internal(String),
    #[error("request cancelled")]
    Cancelled,
}

impl SuggestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Auth(_) => ErrorKind::Auth,
            Self::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
            Self::Internal(_) => ErrorKind::Internal,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

impl From<CatalogError> for SuggestError {
    fn from(value: CatalogError) -> Self {
        match value {
            CatalogError::Timeout(_) | CatalogError::Transport(_) | CatalogError::Status(_) => {
                Self::UpstreamUnavailable(value.to_string())
            }
            CatalogError::Unauthorized(_) => Self::Auth(value.to_string()),
            CatalogError::Decode(_) => Self::Internal(value.to_string()),
        }
    }
}
