//! Error types for sf-fetch.

use std::path::{Path, PathBuf};

/// Result type alias for fetch and export operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for fetch and export operations.
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

    /// A usage error detected before contacting the org.
    pub fn usage(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Usage(message.into()))
    }

    /// Prefix the message of a remote failure with what was being attempted.
    pub fn context(self, what: &str) -> Self {
        let message = match &self.kind {
            ErrorKind::Remote(message) => format!("{}: {}", what, message),
            other => format!("{}: {}", what, other),
        };
        Self {
            kind: ErrorKind::Remote(message),
            source: self.source,
        }
    }

    /// Wrap an I/O failure on `path`.
    pub fn io(path: &Path, err: std::io::Error) -> Self {
        Self::with_source(
            ErrorKind::Io {
                path: path.to_path_buf(),
                message: err.to_string(),
            },
            err,
        )
    }

    /// Returns true if this error was raised before any remote call.
    pub fn is_usage(&self) -> bool {
        matches!(self.kind, ErrorKind::Usage(_))
    }
}

/// The kind of error that occurred.
#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    /// Invalid combination of inputs.
    #[error("{0}")]
    Usage(String),

    /// The org (REST, Tooling or Metadata API) reported a failure.
    #[error("{0}")]
    Remote(String),

    /// The retrieve came back with nothing but the placeholder manifest.
    #[error("Could not find any objects for {types}. (Is the metadata type correct?)")]
    NoMatch { types: String },

    /// Filesystem failure.
    #[error("{}: {message}", path.display())]
    Io { path: PathBuf, message: String },

    /// A static resource archive could not be read.
    #[error("Archive error: {0}")]
    Archive(String),

    /// A `.manifest` or resource descriptor could not be (de)serialized.
    #[error("Descriptor error: {0}")]
    Descriptor(String),

    /// Missing or invalid org configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<busbar_sf_client::Error> for Error {
    fn from(err: busbar_sf_client::Error) -> Self {
        Error::with_source(ErrorKind::Remote(err.to_string()), err)
    }
}

impl From<busbar_sf_metadata::Error> for Error {
    fn from(err: busbar_sf_metadata::Error) -> Self {
        Error::with_source(ErrorKind::Remote(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(
            ErrorKind::Io {
                path: PathBuf::new(),
                message: err.to_string(),
            },
            err,
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::with_source(ErrorKind::Descriptor(err.to_string()), err)
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Error::with_source(ErrorKind::Descriptor(err.to_string()), err)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::with_source(ErrorKind::Archive(err.to_string()), err)
    }
}
