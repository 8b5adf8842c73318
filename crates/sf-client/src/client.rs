//! Authenticated Salesforce client with typed JSON helpers.
//!
//! ## Security
//!
//! - Access tokens are redacted in Debug output
//! - Sensitive parameters are skipped in tracing spans

use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::ClientConfig;
use crate::error::{parse_error_response, Result};
use crate::types::{DescribeGlobalResult, QueryResult};
use crate::DEFAULT_API_VERSION;

/// Salesforce REST/Tooling API client.
///
/// # Example
///
/// ```rust,ignore
/// use busbar_sf_client::SalesforceClient;
///
/// let client = SalesforceClient::new("https://na1.salesforce.com", "token")?;
/// let bundles: Vec<serde_json::Value> = client
///     .tooling_query_all("SELECT Id, DeveloperName FROM AuraDefinitionBundle")
///     .await?;
/// ```
#[derive(Clone)]
pub struct SalesforceClient {
    http: reqwest::Client,
    instance_url: String,
    access_token: String,
    api_version: String,
}

impl std::fmt::Debug for SalesforceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesforceClient")
            .field("instance_url", &self.instance_url)
            .field("access_token", &"[REDACTED]")
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl SalesforceClient {
    /// Create a new Salesforce client with the given instance URL and access token.
    pub fn new(instance_url: impl Into<String>, access_token: impl Into<String>) -> Result<Self> {
        Self::with_config(instance_url, access_token, ClientConfig::default())
    }

    /// Create a new Salesforce client with custom configuration.
    pub fn with_config(
        instance_url: impl Into<String>,
        access_token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let instance_url = instance_url.into().trim_end_matches('/').to_string();
        url::Url::parse(&instance_url)?;

        Ok(Self {
            http: config.build_http_client()?,
            instance_url,
            access_token: access_token.into(),
            api_version: DEFAULT_API_VERSION.to_string(),
        })
    }

    /// Set the API version (e.g., "62.0").
    pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
        self.api_version = version.into();
        self
    }

    /// Get the instance URL.
    pub fn instance_url(&self) -> &str {
        &self.instance_url
    }

    /// Get the access token.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Get the API version.
    pub fn api_version(&self) -> &str {
        &self.api_version
    }

    /// Build the full URL for a path.
    ///
    /// Absolute URLs pass through; anything else is resolved against the
    /// instance URL.
    pub fn url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.instance_url, path)
        } else {
            format!("{}/{}", self.instance_url, path)
        }
    }

    /// Build the REST API URL for a path.
    ///
    /// Example: `rest_url("sobjects")` -> `/services/data/v62.0/sobjects`
    pub fn rest_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/services/data/v{}/{}",
            self.instance_url, self.api_version, path
        )
    }

    /// Build the Tooling API URL for a path.
    pub fn tooling_url(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        format!(
            "{}/services/data/v{}/tooling/{}",
            self.instance_url, self.api_version, path
        )
    }

    /// GET request with JSON response deserialization.
    #[instrument(skip(self), fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .http
            .get(self.url(url))
            .bearer_auth(&self.access_token)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(parse_error_response(status.as_u16(), &body));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(Into::into)
    }

    /// List every SObject visible to the session.
    #[instrument(skip(self))]
    pub async fn describe_global(&self) -> Result<DescribeGlobalResult> {
        self.get_json(&self.rest_url("sobjects")).await
    }

    /// Execute a SOQL query via REST API, first page only.
    pub async fn query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        let encoded = urlencoding::encode(soql);
        self.get_json(&self.rest_url(&format!("query?q={}", encoded)))
            .await
    }

    /// Execute a SOQL query via Tooling API, first page only.
    pub async fn tooling_query<T: DeserializeOwned>(&self, soql: &str) -> Result<QueryResult<T>> {
        let encoded = urlencoding::encode(soql);
        self.get_json(&self.tooling_url(&format!("query?q={}", encoded)))
            .await
    }

    /// Execute a SOQL query and automatically fetch all pages.
    #[instrument(skip(self))]
    pub async fn query_all<T: DeserializeOwned>(&self, soql: &str) -> Result<Vec<T>> {
        let first = self.query(soql).await?;
        self.drain_pages(first).await
    }

    /// Execute a Tooling API query and automatically fetch all pages.
    #[instrument(skip(self))]
    pub async fn tooling_query_all<T: DeserializeOwned>(&self, soql: &str) -> Result<Vec<T>> {
        let first = self.tooling_query(soql).await?;
        self.drain_pages(first).await
    }

    async fn drain_pages<T: DeserializeOwned>(&self, mut result: QueryResult<T>) -> Result<Vec<T>> {
        let mut all_records = Vec::with_capacity(result.total_size as usize);
        all_records.append(&mut result.records);

        while let Some(next_url) = result.next_records_url.take() {
            debug!(next_url = %next_url, "fetching next query page");
            result = self.get_json(&next_url).await?;
            all_records.append(&mut result.records);
        }

        Ok(all_records)
    }
}
