use thiserror::Error;

/// EDU Track API errors
///
/// Every failure path of the client ends up as one of these variants. The
/// client never retries and never logs the user out on its own; callers
/// decide how each case is presented.
#[derive(Error, Debug)]
pub enum ApiError {
    /// No session record is stored, or the stored record is unreadable.
    #[error("not authenticated: no session record found")]
    NoSession,

    /// A session record exists but carries no usable access token.
    #[error("not authenticated: session has no access token")]
    NoToken,

    /// The server rejected the credentials (HTTP 401).
    #[error("unauthorized: session expired, please log in again")]
    Unauthorized,

    #[error("HTTP Error: {status} - {}", display_body(.body))]
    HttpError { status: u16, body: String },

    #[error("network error: {0}")]
    NetworkError(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("session storage error: {0}")]
    SessionStorage(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration Error: {0}")]
    ConfigError(String),
}

fn display_body(body: &str) -> &str {
    if body.trim().is_empty() {
        "request failed"
    } else {
        body
    }
}

impl ApiError {
    /// HTTP status associated with the failure, `0` when none was received.
    pub fn status(&self) -> u16 {
        match self {
            ApiError::Unauthorized => 401,
            ApiError::HttpError { status, .. } => *status,
            _ => 0,
        }
    }

    /// Message suitable for an inline error banner.
    ///
    /// For HTTP failures this is the raw response body, or a generic message
    /// when the server sent nothing.
    pub fn message(&self) -> String {
        match self {
            ApiError::HttpError { status, body } if body.trim().is_empty() => {
                format!("request failed with status {}", status)
            }
            ApiError::HttpError { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }

    /// True when the caller should send the user back to the login flow.
    pub fn is_auth_error(&self) -> bool {
        matches!(
            self,
            ApiError::NoSession | ApiError::NoToken | ApiError::Unauthorized
        )
    }

    pub fn is_network_error(&self) -> bool {
        matches!(self, ApiError::NetworkError(_))
    }
}

/// Result type for EDU Track API operations
pub type ApiResult<T> = Result<T, ApiError>;
