//! Building the list of types and members to retrieve.

use std::collections::BTreeSet;

use busbar_sf_client::SObjectSummary;
use busbar_sf_metadata::PackageManifest;
use tracing::debug;

use crate::error::{Error, Result};
use crate::folders::FolderResolver;
use crate::service::{FolderType, MetadataService};

/// Metadata types exported with a `*` wildcard by default.
pub static WILDCARD_TYPES: &[&str] = &[
    "AccountSettings",
    "ActivitiesSettings",
    "AddressSettings",
    "AnalyticSnapshot",
    "ApexClass",
    "ApexComponent",
    "ApexPage",
    "ApexTrigger",
    "ApprovalProcess",
    "AssignmentRules",
    "Audience",
    "AuraDefinitionBundle",
    "AuthProvider",
    "AutoResponseRules",
    "BusinessHoursSettings",
    "BusinessProcess",
    "CallCenter",
    "CaseSettings",
    "ChatterAnswersSettings",
    "CompanySettings",
    "Community",
    "CompactLayout",
    "ConnectedApp",
    "ContentAsset",
    "ContractSettings",
    "CustomApplication",
    "CustomApplicationComponent",
    "CustomField",
    "CustomLabels",
    "CustomMetadata",
    "CustomObject",
    "CustomObjectTranslation",
    "CustomPageWebLink",
    "CustomPermission",
    "CustomSite",
    "CustomTab",
    "DataCategoryGroup",
    "DuplicateRule",
    "EntitlementProcess",
    "EntitlementSettings",
    "EntitlementTemplate",
    "ExternalDataSource",
    "FieldSet",
    "FlexiPage",
    "Flow",
    "FlowDefinition",
    "Folder",
    "ForecastingSettings",
    "Group",
    "HomePageComponent",
    "HomePageLayout",
    "IdeasSettings",
    "KnowledgeSettings",
    "Layout",
    "Letterhead",
    "ListView",
    "LiveAgentSettings",
    "LiveChatAgentConfig",
    "LiveChatButton",
    "LiveChatDeployment",
    "MatchingRules",
    "MilestoneType",
    "MobileSettings",
    "NamedFilter",
    "Network",
    "OpportunitySettings",
    "PermissionSet",
    "Portal",
    "PostTemplate",
    "ProductSettings",
    "Profile",
    "ProfileSessionSetting",
    "Queue",
    "QuickAction",
    "QuoteSettings",
    "RecordType",
    "RemoteSiteSetting",
    "ReportType",
    "Role",
    "SamlSsoConfig",
    "Scontrol",
    "SecuritySettings",
    "SharingReason",
    "SharingRules",
    "Skill",
    "StaticResource",
    "Territory",
    "Translations",
    "ValidationRule",
    "Workflow",
];

const CUSTOM_OBJECT: &str = "CustomObject";
const WILDCARD: &str = "*";
const HIDDEN_SUFFIXES: [&str; 3] = ["__Tag", "__History", "__Share"];

/// One `<types>` entry of a retrieve request.
///
/// Several types may share one member list; each becomes its own
/// `<types>` block in the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryElement {
    pub types: Vec<String>,
    pub members: Vec<String>,
}

impl QueryElement {
    pub fn new(types: Vec<String>, members: Vec<String>) -> Self {
        Self { types, members }
    }

    /// `{[type], ["*"]}`
    pub fn wildcard(metadata_type: impl Into<String>) -> Self {
        Self::new(vec![metadata_type.into()], vec![WILDCARD.to_string()])
    }
}

/// Render a query as a package manifest for the given API version.
pub fn to_manifest(query: &[QueryElement], version: &str) -> PackageManifest {
    query
        .iter()
        .flat_map(|element| {
            element
                .types
                .iter()
                .map(move |name| (name.clone(), element.members.clone()))
        })
        .fold(PackageManifest::new(version), |manifest, (name, members)| {
            manifest.add_type(name, members)
        })
}

/// `"*"` plus every standard object that can be retrieved by name.
///
/// Custom objects are already covered by the wildcard; tag, history and
/// share objects cannot be retrieved.
pub fn standard_objects(sobjects: &[SObjectSummary]) -> Vec<String> {
    std::iter::once(WILDCARD.to_string())
        .chain(
            sobjects
                .iter()
                .filter(|s| !s.custom)
                .filter(|s| !HIDDEN_SUFFIXES.iter().any(|suffix| s.name.ends_with(suffix)))
                .map(|s| s.name.clone()),
        )
        .collect()
}

/// Whether the query covers the whole org or only the requested types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum QueryMode {
    /// The wildcard catalog plus every foldered type found in the org.
    Export,
    /// Exactly the requested types.
    Fetch,
}

/// Assembles a retrieve query from requested types, names and exclusions.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    mode: QueryMode,
    types: Vec<String>,
    names: Vec<String>,
    exclusions: BTreeSet<String>,
    catalog: Option<Vec<String>>,
}

impl QueryBuilder {
    /// Builder for `export`: the whole catalog.
    pub fn export() -> Self {
        Self {
            mode: QueryMode::Export,
            types: Vec::new(),
            names: Vec::new(),
            exclusions: BTreeSet::new(),
            catalog: None,
        }
    }

    /// Builder for `fetch`: only `types`, optionally narrowed to `names`.
    pub fn fetch(types: Vec<String>, names: Vec<String>) -> Self {
        Self {
            mode: QueryMode::Fetch,
            types,
            names,
            ..Self::export()
        }
    }

    /// Types left out of the query. Blank entries are ignored.
    pub fn exclude<I, T>(mut self, types: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.exclusions.extend(
            types
                .into_iter()
                .map(Into::into)
                .map(|t: String| t.trim().to_string())
                .filter(|t| !t.is_empty()),
        );
        self
    }

    /// Replace the default wildcard catalog used by `export`.
    pub fn with_catalog<I, T>(mut self, catalog: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.catalog = Some(catalog.into_iter().map(Into::into).collect());
        self
    }

    /// Reject input combinations that cannot form a query.
    pub fn validate(&self) -> Result<()> {
        if self.mode == QueryMode::Export {
            return Ok(());
        }
        if self.types.is_empty() {
            return Err(Error::usage(
                "must specify object type and/or object name or package xml path",
            ));
        }
        if self.types.len() > 1 && self.names.len() > 1 {
            return Err(Error::usage(
                "You cannot specify entity names if you specify more than one metadata type.",
            ));
        }
        Ok(())
    }

    fn is_excluded(&self, name: &str) -> bool {
        self.exclusions.contains(name)
    }

    /// Build the query, consulting the org for standard objects and folders as needed.
    pub async fn build<S: MetadataService>(&self, service: &S) -> Result<Vec<QueryElement>> {
        self.validate()?;

        let query = match self.mode {
            QueryMode::Export => self.build_export(service).await?,
            QueryMode::Fetch if !self.names.is_empty() => {
                vec![QueryElement::new(self.types.clone(), self.names.clone())]
            }
            QueryMode::Fetch => self.build_fetch(service).await?,
        };

        debug!(elements = query.len(), mode = ?self.mode, "built retrieve query");
        Ok(query)
    }

    async fn build_export<S: MetadataService>(&self, service: &S) -> Result<Vec<QueryElement>> {
        let catalog: Vec<&str> = match &self.catalog {
            Some(catalog) => catalog.iter().map(String::as_str).collect(),
            None => WILDCARD_TYPES.to_vec(),
        };

        let mut query: Vec<QueryElement> = catalog
            .into_iter()
            .filter(|t| *t != CUSTOM_OBJECT && !self.is_excluded(t))
            .map(QueryElement::wildcard)
            .collect();

        if !self.is_excluded(CUSTOM_OBJECT) {
            query.push(custom_object_element(service).await?);
        }

        let mut resolver = FolderResolver::new(service);
        let present: Vec<FolderType> = resolver.all_folders().await?.keys().copied().collect();
        for folder_type in present {
            if self.is_excluded(folder_type.as_str()) || self.is_excluded(folder_type.metadata_type())
            {
                continue;
            }
            let members = resolver.members_of(folder_type).await?;
            query.push(QueryElement::new(
                vec![folder_type.metadata_type().to_string()],
                members,
            ));
        }

        Ok(query)
    }

    async fn build_fetch<S: MetadataService>(&self, service: &S) -> Result<Vec<QueryElement>> {
        let mut resolver = FolderResolver::new(service);
        let mut query = Vec::with_capacity(self.types.len());

        for requested in &self.types {
            if self.is_excluded(requested) {
                continue;
            }
            match FolderType::from_metadata_type(requested) {
                Some(folder_type) => {
                    if self.is_excluded(folder_type.as_str())
                        || self.is_excluded(folder_type.metadata_type())
                    {
                        continue;
                    }
                    let members = resolver.members_of(folder_type).await?;
                    query.push(QueryElement::new(
                        vec![folder_type.metadata_type().to_string()],
                        members,
                    ));
                }
                None if requested == CUSTOM_OBJECT => {
                    query.push(custom_object_element(service).await?);
                }
                None => query.push(QueryElement::wildcard(requested.clone())),
            }
        }

        Ok(query)
    }
}

async fn custom_object_element<S: MetadataService>(service: &S) -> Result<QueryElement> {
    let sobjects = service.list_sobjects().await?;
    Ok(QueryElement::new(
        vec![CUSTOM_OBJECT.to_string()],
        standard_objects(&sobjects),
    ))
}
