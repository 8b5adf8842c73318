//! Common types for Metadata API.

/// Default Metadata API version.
pub const DEFAULT_API_VERSION: &str = busbar_sf_client::DEFAULT_API_VERSION;

/// SOAP Fault from the Metadata API.
#[derive(Debug, Clone)]
pub(crate) struct SoapFault {
    pub fault_code: String,
    pub fault_string: String,
}

impl std::fmt::Display for SoapFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SOAP Fault: {} - {}", self.fault_code, self.fault_string)
    }
}

impl std::error::Error for SoapFault {}
