//! Error types for sf-client.

/// Result type alias for sf-client operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for sf-client operations.
#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    /// The kind of error that occurred.
    pub kind: ErrorKind,
    /// Optional source error.
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    /// Create a new error with the given kind.
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    /// Create a new error with the given kind and source.
    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this is an authentication error.
    pub fn is_auth_error(&self) -> bool {
        matches!(self.kind, ErrorKind::Authentication(_))
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// HTTP request failed.
    #[error("HTTP error: {status} {message}")]
    Http { status: u16, message: String },

    /// Authentication error (HTTP 401).
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Resource not found (HTTP 404).
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request timeout.
    #[error("Request timeout")]
    Timeout,

    /// Connection error.
    #[error("Connection error: {0}")]
    Connection(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(String),

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Salesforce API error response.
    #[error("Salesforce API error: {error_code} - {message}")]
    SalesforceApi { error_code: String, message: String },

    /// Other error.
    #[error("{0}")]
    Other(String),
}

/// Salesforce API error payload (`[{"errorCode": ..., "message": ...}]`).
#[derive(Debug, serde::Deserialize)]
struct SalesforceErrorResponse {
    #[serde(alias = "errorCode")]
    error_code: String,
    message: String,
}

/// Map a non-success response body onto an error kind.
pub(crate) fn parse_error_response(status: u16, body: &str) -> Error {
    const MAX_LENGTH: usize = 500;

    if let Ok(errors) = serde_json::from_str::<Vec<SalesforceErrorResponse>>(body) {
        if let Some(err) = errors.into_iter().next() {
            return Error::new(ErrorKind::SalesforceApi {
                error_code: err.error_code,
                message: err.message,
            });
        }
    }

    if let Ok(err) = serde_json::from_str::<SalesforceErrorResponse>(body) {
        return Error::new(ErrorKind::SalesforceApi {
            error_code: err.error_code,
            message: err.message,
        });
    }

    let mut message = body.to_string();
    if message.len() > MAX_LENGTH {
        let mut cut = MAX_LENGTH;
        while !message.is_char_boundary(cut) {
            cut -= 1;
        }
        message.truncate(cut);
        message.push_str("...[truncated]");
    }

    let kind = match status {
        401 => ErrorKind::Authentication(message),
        404 => ErrorKind::NotFound(message),
        _ => ErrorKind::Http { status, message },
    };
    Error::new(kind)
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            ErrorKind::Timeout
        } else if err.is_connect() {
            ErrorKind::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            ErrorKind::Http {
                status: status.as_u16(),
                message: err.to_string(),
            }
        } else {
            ErrorKind::Other(err.to_string())
        };

        Error::with_source(kind, err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Json(err.to_string()), err)
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::with_source(ErrorKind::Config(format!("Invalid URL: {}", err)), err)
    }
}
