use reqwest::StatusCode;
use std::sync::Arc;

/// Failure to obtain a token from the auth endpoint.
///
/// `Clone` because the result of one coalesced refresh is handed to every caller that waited on it.
#[derive(thiserror::Error, Debug, Clone)]
pub enum AuthError {
    #[error("auth request failed: {0}")]
    Network(Arc<reqwest::Error>),
    #[error("auth endpoint responded with {0}")]
    Status(StatusCode),
    #[error("malformed auth response: {0}")]
    Malformed(String),
    #[error("token refresh was interrupted: {0}")]
    Interrupted(String),
}

#[derive(thiserror::Error, Debug)]
pub enum DiscoveryError {
    #[error("inventory request failed: {0}")]
    Request(#[source] Box<ApiError>),
    #[error("inventory payload could not be decoded: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("inventory returned no accounts")]
    Empty,
}

#[derive(thiserror::Error, Debug)]
pub enum NetworkError {
    #[error(transparent)]
    Request(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(StatusCode),
}

impl From<StatusCode> for NetworkError {
    fn from(status: StatusCode) -> Self {
        Self::Status(status)
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
    #[error("GET {path} failed: {source}")]
    Network {
        path: String,
        #[source]
        source: NetworkError,
    },
    #[error("reading response of {path} failed: {source}")]
    Read {
        path: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("decoding response of {path} failed: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to build the HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl ApiError {
    pub(crate) fn network(path: &str, source: impl Into<NetworkError>) -> Self {
        Self::Network {
            path: path.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn decode(path: &str, source: serde_json::Error) -> Self {
        Self::Decode {
            path: path.to_string(),
            source,
        }
    }

    /// Status code of a rejected request, if that is what failed.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Auth(AuthError::Status(status)) => Some(*status),
            Self::Network {
                source: NetworkError::Status(status),
                ..
            } => Some(*status),
            _ => None,
        }
    }
}
