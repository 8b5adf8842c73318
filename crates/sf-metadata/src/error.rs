//! Error types for sf-metadata.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
#[error("{kind}")]
pub struct Error {
    pub kind: ErrorKind,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl Error {
    pub fn new(kind: ErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub fn with_source(
        kind: ErrorKind,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            source: Some(Box::new(source)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ErrorKind {
    #[error("Client error: {0}")]
    Client(String),
    #[error("Retrieve error: {0}")]
    Retrieve(String),
    #[error("Retrieve failed: {0}")]
    RetrieveFailed(String),
    #[error("SOAP fault: {0}")]
    SoapFault(String),
    #[error("HTTP error: {0}")]
    Http(String),
    #[error("XML parse error: {0}")]
    Parse(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    #[error("Invalid package manifest: {0}")]
    Manifest(String),
    #[error("Zip error: {0}")]
    Zip(String),
    #[error("Timeout")]
    Timeout,
    #[error("IO error: {0}")]
    Io(String),
    #[error("{0}")]
    Other(String),
}

impl From<busbar_sf_client::Error> for Error {
    fn from(err: busbar_sf_client::Error) -> Self {
        Error::with_source(ErrorKind::Client(err.to_string()), err)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::with_source(ErrorKind::Io(err.to_string()), err)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::with_source(ErrorKind::Http(err.to_string()), err)
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::with_source(ErrorKind::Zip(err.to_string()), err)
    }
}

impl From<base64::DecodeError> for Error {
    fn from(err: base64::DecodeError) -> Self {
        Error::with_source(
            ErrorKind::InvalidResponse(format!("zipFile is not valid base64: {}", err)),
            err,
        )
    }
}

impl From<quick_xml::DeError> for Error {
    fn from(err: quick_xml::DeError) -> Self {
        Error::with_source(ErrorKind::Manifest(err.to_string()), err)
    }
}
