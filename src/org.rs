//! [`MetadataService`] backed by a live org.

use std::path::Path;

use busbar_sf_client::security::soql;
use busbar_sf_client::{ClientConfig, SObjectSummary, SalesforceClient};
use busbar_sf_metadata::{
    unpack_zip, MetadataClient, PackageManifest, RetrieveOptions, RetrieveResult,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::config::OrgConfig;
use crate::error::{Error, Result};
use crate::query::{to_manifest, QueryElement};
use crate::service::{
    AuraBundleSet, BundleRecord, DefinitionRecord, FolderType, FolderedMetadata,
    MetadataService, Retrieval,
};

const BUNDLE_FIELDS: &str = "Id, DeveloperName";
const DEFINITION_FIELDS: &str = "Id, AuraDefinitionBundleId, DefType, Source";

#[derive(Debug, Deserialize)]
struct FolderRecord {
    #[serde(rename = "Type")]
    folder_type: String,
    #[serde(rename = "NamespacePrefix", default)]
    namespace_prefix: Option<String>,
    #[serde(rename = "DeveloperName", default)]
    developer_name: Option<String>,
}

impl FolderRecord {
    /// `ns__Name` for namespaced folders.
    fn qualified_name(&self) -> Option<String> {
        let name = self.developer_name.as_deref().filter(|n| !n.is_empty())?;
        Some(match self.namespace_prefix.as_deref().filter(|p| !p.is_empty()) {
            Some(prefix) => format!("{}__{}", prefix, name),
            None => name.to_string(),
        })
    }
}

/// REST, Tooling and Metadata API access to one org.
#[derive(Debug, Clone)]
pub struct OrgService {
    rest: SalesforceClient,
    metadata: MetadataClient,
    options: RetrieveOptions,
}

impl OrgService {
    /// Connect with default HTTP settings.
    pub fn connect(config: &OrgConfig) -> Result<Self> {
        Self::with_client_config(config, ClientConfig::default())
    }

    pub fn with_client_config(config: &OrgConfig, client_config: ClientConfig) -> Result<Self> {
        let metadata =
            MetadataClient::with_config(&config.instance_url, &config.access_token, &client_config)?
                .with_api_version(&config.api_version);
        let rest = SalesforceClient::with_config(
            &config.instance_url,
            &config.access_token,
            client_config,
        )?
        .with_api_version(&config.api_version);

        Ok(Self {
            rest,
            metadata,
            options: RetrieveOptions::default(),
        })
    }

    /// Override polling timeout and interval.
    pub fn with_retrieve_options(mut self, options: RetrieveOptions) -> Self {
        self.options = options;
        self
    }

    pub fn api_version(&self) -> &str {
        self.metadata.api_version()
    }

    fn into_retrieval(result: RetrieveResult) -> Result<Retrieval> {
        let archive = result.zip_bytes()?;
        let files = unpack_zip(&archive)?;
        debug!(files = files.len(), problems = result.messages.len(), "retrieve finished");
        Ok(Retrieval {
            files,
            problems: result.problems(),
            archive,
        })
    }

    async fn retrieve_manifest(&self, manifest: &PackageManifest) -> Result<Retrieval> {
        let result = self
            .metadata
            .retrieve_unpackaged_and_wait(manifest, &self.options)
            .await?;
        Self::into_retrieval(result)
    }

    async fn bundle_set(&self, bundle_filter: &str, definition_filter: &str) -> Result<AuraBundleSet> {
        let bundles: Vec<BundleRecord> = self
            .rest
            .tooling_query_all(&format!(
                "SELECT {} FROM AuraDefinitionBundle{}",
                BUNDLE_FIELDS, bundle_filter
            ))
            .await?;
        let definitions: Vec<DefinitionRecord> = self
            .rest
            .tooling_query_all(&format!(
                "SELECT {} FROM AuraDefinition{}",
                DEFINITION_FIELDS, definition_filter
            ))
            .await?;
        Ok(AuraBundleSet {
            bundles,
            definitions,
        })
    }
}

impl MetadataService for OrgService {
    #[instrument(skip(self))]
    async fn list_sobjects(&self) -> Result<Vec<SObjectSummary>> {
        Ok(self.rest.describe_global().await?.sobjects)
    }

    #[instrument(skip(self))]
    async fn get_all_folders(&self) -> Result<FolderedMetadata> {
        let types = FolderType::ALL.map(FolderType::as_str);
        let records: Vec<FolderRecord> = self
            .rest
            .query_all(&format!(
                "SELECT Id, Type, NamespacePrefix, DeveloperName FROM Folder WHERE Type IN {}",
                soql::quoted_list(types)
            ))
            .await?;

        let mut folders = FolderedMetadata::new();
        for record in &records {
            let (Ok(folder_type), Some(name)) =
                (record.folder_type.parse::<FolderType>(), record.qualified_name())
            else {
                continue;
            };
            folders.entry(folder_type).or_default().push(name);
        }
        Ok(folders)
    }

    #[instrument(skip(self, folders), fields(folders = folders.len()))]
    async fn get_metadata_in_folders(
        &self,
        folder_type: FolderType,
        folders: &[String],
    ) -> Result<Vec<String>> {
        let mut members = folders.to_vec();
        for folder in folders {
            let components = self
                .metadata
                .list_metadata(folder_type.metadata_type(), Some(folder))
                .await?;
            members.extend(components.into_iter().map(|c| c.full_name));
        }
        Ok(members)
    }

    #[instrument(skip(self, query), fields(elements = query.len()))]
    async fn retrieve(&self, query: &[QueryElement]) -> Result<Retrieval> {
        let manifest = to_manifest(query, self.metadata.api_version());
        self.retrieve_manifest(&manifest).await
    }

    #[instrument(skip(self))]
    async fn retrieve_by_package_xml(&self, path: &Path) -> Result<Retrieval> {
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        let manifest = PackageManifest::from_package_xml(&contents)?;
        self.retrieve_manifest(&manifest).await
    }

    #[instrument(skip(self))]
    async fn retrieve_package(&self, name: &str) -> Result<Retrieval> {
        let result = self
            .metadata
            .retrieve_packaged_and_wait(name, &self.options)
            .await?;
        Self::into_retrieval(result)
    }

    #[instrument(skip(self))]
    async fn get_aura_bundles(&self) -> Result<AuraBundleSet> {
        self.bundle_set("", "").await
    }

    #[instrument(skip(self))]
    async fn get_aura_bundle(&self, name: &str) -> Result<AuraBundleSet> {
        let name = soql::escape_string(name);
        self.bundle_set(
            &format!(" WHERE DeveloperName = '{}'", name),
            &format!(" WHERE AuraDefinitionBundle.DeveloperName = '{}'", name),
        )
        .await
    }
}
