//! The remote operations the fetch pipeline depends on.
//!
//! [`MetadataService`] is implemented against a live org by
//! [`OrgService`](crate::org::OrgService); tests substitute an in-memory
//! implementation.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use busbar_sf_client::SObjectSummary;
use busbar_sf_metadata::RetrievedFiles;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::query::QueryElement;

/// Folder kinds reported by the `Folder` sObject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FolderType {
    Email,
    Report,
    Document,
    Dashboard,
}

impl FolderType {
    pub const ALL: [FolderType; 4] = [
        FolderType::Email,
        FolderType::Report,
        FolderType::Document,
        FolderType::Dashboard,
    ];

    /// Name used by the `Folder.Type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            FolderType::Email => "Email",
            FolderType::Report => "Report",
            FolderType::Document => "Document",
            FolderType::Dashboard => "Dashboard",
        }
    }

    /// Name used by the Metadata API. Only `Email` differs.
    pub fn metadata_type(self) -> &'static str {
        match self {
            FolderType::Email => "EmailTemplate",
            other => other.as_str(),
        }
    }

    /// Map a requested metadata type to its folder kind, if it is foldered.
    pub fn from_metadata_type(name: &str) -> Option<Self> {
        match name {
            "EmailTemplate" | "Email" => Some(FolderType::Email),
            "Report" => Some(FolderType::Report),
            "Document" => Some(FolderType::Document),
            "Dashboard" => Some(FolderType::Dashboard),
            _ => None,
        }
    }
}

impl fmt::Display for FolderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FolderType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FolderType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("Unknown folder type: {}", s))
    }
}

/// Folder names per folder kind, in the order the org returned them.
pub type FolderedMetadata = BTreeMap<FolderType, Vec<String>>;

/// Outcome of one retrieve call.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub files: RetrievedFiles,
    /// `fileName: problem` warnings; never fatal.
    pub problems: Vec<String>,
    /// The zip exactly as the org returned it.
    pub archive: Vec<u8>,
}

/// An `AuraDefinitionBundle` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "DeveloperName")]
    pub developer_name: String,
}

/// An `AuraDefinition` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefinitionRecord {
    #[serde(rename = "Id")]
    pub id: String,
    #[serde(rename = "AuraDefinitionBundleId")]
    pub bundle_id: String,
    #[serde(rename = "DefType")]
    pub def_type: String,
    #[serde(rename = "Source", default)]
    pub source: String,
}

/// Bundle headers together with the definitions that belong to them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuraBundleSet {
    pub bundles: Vec<BundleRecord>,
    pub definitions: Vec<DefinitionRecord>,
}

/// Remote operations used by `export` and `fetch`.
///
/// Calls are awaited one at a time; implementations need not be `Sync`.
#[allow(async_fn_in_trait)]
pub trait MetadataService {
    /// Every sObject visible to the session.
    async fn list_sobjects(&self) -> Result<Vec<SObjectSummary>>;

    /// Email, Report, Document and Dashboard folders.
    async fn get_all_folders(&self) -> Result<FolderedMetadata>;

    /// The folder names followed by the full names of every component in them.
    async fn get_metadata_in_folders(
        &self,
        folder_type: FolderType,
        folders: &[String],
    ) -> Result<Vec<String>>;

    /// Retrieve the components named by `query`.
    async fn retrieve(&self, query: &[QueryElement]) -> Result<Retrieval>;

    /// Retrieve the components listed in a `package.xml` on disk.
    async fn retrieve_by_package_xml(&self, path: &Path) -> Result<Retrieval>;

    /// Retrieve an unmanaged package by name.
    async fn retrieve_package(&self, name: &str) -> Result<Retrieval>;

    /// All Aura bundles with their definitions.
    async fn get_aura_bundles(&self) -> Result<AuraBundleSet>;

    /// One Aura bundle, by developer name, with its definitions.
    async fn get_aura_bundle(&self, name: &str) -> Result<AuraBundleSet>;
}
