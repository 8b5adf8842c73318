use busbar_sf_client::security::xml;
use tokio::time::sleep;
use tracing::{debug, instrument};

use crate::error::{Error, ErrorKind, Result};
use crate::retrieve::{PackageManifest, RetrieveOptions, RetrieveResult};

impl super::MetadataClient {
    /// Start a retrieve operation for unpackaged metadata.
    ///
    /// Use a `PackageManifest` to safely specify what to retrieve.
    /// All values are properly XML-escaped to prevent injection attacks.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// use busbar_sf_metadata::{MetadataClient, PackageManifest, RetrieveOptions};
    ///
    /// let manifest = PackageManifest::new("62.0")
    ///     .add_type("ApexClass", vec!["*".to_string()]);
    ///
    /// let async_id = client
    ///     .retrieve_unpackaged(&manifest, &RetrieveOptions::default())
    ///     .await?;
    /// ```
    #[instrument(skip(self, manifest, options), fields(types = manifest.types.len()))]
    pub async fn retrieve_unpackaged(
        &self,
        manifest: &PackageManifest,
        options: &RetrieveOptions,
    ) -> Result<String> {
        let body = format!(
            r#"<retrieve xmlns="http://soap.sforce.com/2006/04/metadata">
      <retrieveRequest>
        <apiVersion>{api_version}</apiVersion>
        <singlePackage>{single_package}</singlePackage>
        <unpackaged>
        {package_xml}
        </unpackaged>
      </retrieveRequest>
    </retrieve>"#,
            api_version = xml::escape(&self.api_version),
            single_package = options.single_package,
            package_xml = manifest.to_xml(),
        );

        let response_text = self.call("retrieve", &body).await?;
        self.extract_element(&response_text, "id").ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse(
                "No async process ID in retrieve response".to_string(),
            ))
        })
    }

    /// Start a retrieve operation for a named package.
    #[instrument(skip(self))]
    pub async fn retrieve_packaged(&self, package_name: &str) -> Result<String> {
        let body = format!(
            r#"<retrieve xmlns="http://soap.sforce.com/2006/04/metadata">
      <retrieveRequest>
        <apiVersion>{api_version}</apiVersion>
        <packageNames>{package_name}</packageNames>
      </retrieveRequest>
    </retrieve>"#,
            api_version = xml::escape(&self.api_version),
            package_name = xml::escape(package_name),
        );

        let response_text = self.call("retrieve", &body).await?;
        self.extract_element(&response_text, "id").ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse(
                "No async process ID in retrieve response".to_string(),
            ))
        })
    }

    /// Check the status of a retrieve operation.
    pub async fn check_retrieve_status(
        &self,
        async_process_id: &str,
        include_zip: bool,
    ) -> Result<RetrieveResult> {
        let body = format!(
            r#"<checkRetrieveStatus xmlns="http://soap.sforce.com/2006/04/metadata">
      <asyncProcessId>{process_id}</asyncProcessId>
      <includeZip>{include_zip}</includeZip>
    </checkRetrieveStatus>"#,
            process_id = xml::escape(async_process_id),
            include_zip = include_zip,
        );

        let response_text = self.call("checkRetrieveStatus", &body).await?;
        self.parse_retrieve_result(&response_text)
    }

    /// Poll for retrieve completion with timeout.
    #[instrument(skip(self, options))]
    pub async fn poll_retrieve_status(
        &self,
        async_process_id: &str,
        options: &RetrieveOptions,
    ) -> Result<RetrieveResult> {
        let start = tokio::time::Instant::now();

        loop {
            if start.elapsed() > options.timeout {
                return Err(Error::new(ErrorKind::Timeout));
            }

            let result = self.check_retrieve_status(async_process_id, true).await?;
            debug!(status = ?result.status, done = result.done, "retrieve status");

            if result.done {
                if result.success {
                    return Ok(result);
                } else {
                    return Err(Error::new(ErrorKind::RetrieveFailed(
                        result
                            .error_message
                            .unwrap_or_else(|| "Unknown error".to_string()),
                    )));
                }
            }

            sleep(options.poll_interval).await;
        }
    }

    /// Retrieve unpackaged metadata and wait for completion.
    pub async fn retrieve_unpackaged_and_wait(
        &self,
        manifest: &PackageManifest,
        options: &RetrieveOptions,
    ) -> Result<RetrieveResult> {
        let async_id = self.retrieve_unpackaged(manifest, options).await?;
        self.poll_retrieve_status(&async_id, options).await
    }

    /// Retrieve a named package and wait for completion.
    pub async fn retrieve_packaged_and_wait(
        &self,
        package_name: &str,
        options: &RetrieveOptions,
    ) -> Result<RetrieveResult> {
        let async_id = self.retrieve_packaged(package_name).await?;
        self.poll_retrieve_status(&async_id, options).await
    }
}
