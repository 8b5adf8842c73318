//! Metadata API client.

use busbar_sf_client::ClientConfig;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE};

use crate::error::{Error, ErrorKind, Result};
use crate::types::DEFAULT_API_VERSION;

mod list;
mod retrieve;
mod xml_helpers;

/// SOAP Action header name.
static SOAP_ACTION_HEADER: HeaderName = HeaderName::from_static("soapaction");

/// Salesforce Metadata API client.
#[derive(Clone)]
pub struct MetadataClient {
    instance_url: String,
    access_token: String,
    api_version: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for MetadataClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataClient")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl MetadataClient {
    /// Create a new Metadata API client from instance URL and access token.
    pub fn from_parts(instance_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            instance_url: instance_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Create a client whose HTTP stack honors a shared [`ClientConfig`].
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: &ClientConfig,
    ) -> Result<Self> {
        let http_client = config.build_http_client()?;
        Ok(Self::from_parts(instance_url, access_token).with_http_client(http_client))
    }

    /// Set the API version.
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Set a custom HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    /// The API version used for requests.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Get the Metadata API SOAP endpoint URL.
    pub(crate) fn metadata_url(&self) -> String {
        format!("{}/services/Soap/m/{}", self.instance_url, self.api_version)
    }

    /// Build common headers for SOAP requests.
    pub(crate) fn build_headers(&self, soap_action: &str) -> Result<HeaderMap> {
        let invalid = |e: reqwest::header::InvalidHeaderValue| {
            Error::with_source(
                ErrorKind::Other("value not allowed in an HTTP header".to_string()),
                e,
            )
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/xml;charset=UTF-8"),
        );
        headers.insert(
            SOAP_ACTION_HEADER.clone(),
            HeaderValue::from_str(soap_action).map_err(invalid)?,
        );
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.access_token)).map_err(invalid)?,
        );
        Ok(headers)
    }

    /// Wrap a SOAP body in the Metadata API envelope with the session header.
    pub(crate) fn envelope(&self, body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance" xmlns:xsd="http://www.w3.org/2001/XMLSchema">
  <soap:Header>
    <SessionHeader xmlns="http://soap.sforce.com/2006/04/metadata">
      <sessionId>{session_id}</sessionId>
    </SessionHeader>
  </soap:Header>
  <soap:Body>
    {body}
  </soap:Body>
</soap:Envelope>"#,
            session_id = busbar_sf_client::security::xml::escape(&self.access_token),
            body = body,
        )
    }

    /// POST a SOAP envelope and return the response text, mapping faults to errors.
    pub(crate) async fn call(&self, soap_action: &str, body: &str) -> Result<String> {
        let response = self
            .http_client
            .post(self.metadata_url())
            .headers(self.build_headers(soap_action)?)
            .body(self.envelope(body))
            .send()
            .await?;

        let response_text = response.text().await?;

        if let Some(fault) = self.parse_soap_fault(&response_text) {
            return Err(Error::with_source(
                ErrorKind::SoapFault(fault.to_string()),
                fault,
            ));
        }

        Ok(response_text)
    }
}
