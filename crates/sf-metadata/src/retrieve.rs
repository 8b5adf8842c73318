//! Retrieve operations.

use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::time::Duration;

use base64::Engine;
use busbar_sf_client::security::xml;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};
use crate::types::DEFAULT_API_VERSION;

/// Files of a retrieve result keyed by their forward-slash relative path.
pub type RetrievedFiles = BTreeMap<String, Vec<u8>>;

/// Upper bound on the buffer reserved from an entry's declared size.
const MAX_RESERVE: u64 = 8 * 1024 * 1024;

/// Bytes to reserve for an entry declaring `declared` bytes.
fn reserve_hint(declared: u64) -> usize {
    declared.min(MAX_RESERVE) as usize
}

/// Options controlling how a retrieve is submitted and awaited.
#[derive(Debug, Clone)]
pub struct RetrieveOptions {
    /// Ask for a single-package layout (no `unpackaged/` prefix).
    pub single_package: bool,
    /// Give up polling after this long.
    pub timeout: Duration,
    /// Delay between `checkRetrieveStatus` calls.
    pub poll_interval: Duration,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            single_package: true,
            timeout: Duration::from_secs(600),
            poll_interval: Duration::from_secs(2),
        }
    }
}

/// Package manifest (package.xml).
///
/// Use this structured type to safely build package manifests without
/// risk of XML injection. All values are properly escaped when converted
/// to XML.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageManifest {
    pub types: Vec<PackageTypeMembers>,
    pub version: String,
}

impl PackageManifest {
    /// Create a new package manifest with the given API version.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            types: Vec::new(),
            version: version.into(),
        }
    }

    /// Add a metadata type with its members.
    pub fn add_type(mut self, name: impl Into<String>, members: Vec<String>) -> Self {
        self.types.push(PackageTypeMembers {
            name: name.into(),
            members,
        });
        self
    }

    /// Parse the contents of a `package.xml` file.
    ///
    /// A missing `<version>` falls back to [`DEFAULT_API_VERSION`].
    pub fn from_package_xml(contents: &str) -> Result<Self> {
        #[derive(Deserialize)]
        struct PackageXml {
            #[serde(default)]
            types: Vec<TypesXml>,
            version: Option<String>,
        }

        #[derive(Deserialize)]
        struct TypesXml {
            #[serde(default)]
            members: Vec<String>,
            name: String,
        }

        let parsed: PackageXml = quick_xml::de::from_str(contents)?;
        if parsed.types.is_empty() {
            return Err(Error::new(ErrorKind::Manifest(
                "package.xml declares no <types>".to_string(),
            )));
        }

        Ok(Self {
            types: parsed
                .types
                .into_iter()
                .map(|t| PackageTypeMembers {
                    name: t.name.trim().to_string(),
                    members: t.members.into_iter().map(|m| m.trim().to_string()).collect(),
                })
                .collect(),
            version: parsed
                .version
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
        })
    }

    /// Convert to XML elements for SOAP envelope.
    /// All values are properly XML-escaped to prevent injection.
    pub(crate) fn to_xml(&self) -> String {
        let mut xml_parts = Vec::new();

        for type_member in &self.types {
            let members_xml: String = type_member
                .members
                .iter()
                .map(|m| format!("<members>{}</members>", xml::escape(m)))
                .collect::<Vec<_>>()
                .join("\n          ");

            xml_parts.push(format!(
                "<types>\n          {}\n          <name>{}</name>\n        </types>",
                members_xml,
                xml::escape(&type_member.name)
            ));
        }

        xml_parts.push(format!("<version>{}</version>", xml::escape(&self.version)));

        xml_parts.join("\n        ")
    }
}

/// Type members in a package manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTypeMembers {
    pub name: String,
    pub members: Vec<String>,
}

/// Retrieve status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RetrieveStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
    Canceling,
    Canceled,
}

impl std::str::FromStr for RetrieveStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(RetrieveStatus::Pending),
            "InProgress" => Ok(RetrieveStatus::InProgress),
            "Succeeded" => Ok(RetrieveStatus::Succeeded),
            "Failed" => Ok(RetrieveStatus::Failed),
            "Canceling" => Ok(RetrieveStatus::Canceling),
            "Canceled" => Ok(RetrieveStatus::Canceled),
            _ => Err(format!("Unknown retrieve status: {}", s)),
        }
    }
}

/// Result of a retrieval.
#[derive(Debug, Clone)]
pub struct RetrieveResult {
    /// Async process ID.
    pub id: String,
    /// Whether the operation is complete.
    pub done: bool,
    /// Current status.
    pub status: RetrieveStatus,
    /// Whether the retrieve succeeded.
    pub success: bool,
    /// Error message if failed.
    pub error_message: Option<String>,
    /// Error status code if failed.
    pub error_status_code: Option<String>,
    /// Base64-encoded zip file contents.
    pub zip_file: Option<String>,
    /// Retrieve messages (warnings).
    pub messages: Vec<RetrieveMessage>,
}

impl RetrieveResult {
    /// Decode the base64 `zipFile` payload.
    pub fn zip_bytes(&self) -> Result<Vec<u8>> {
        let encoded = self.zip_file.as_deref().ok_or_else(|| {
            Error::new(ErrorKind::InvalidResponse(
                "Retrieve result has no zipFile".to_string(),
            ))
        })?;
        let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
        Ok(base64::engine::general_purpose::STANDARD.decode(compact)?)
    }

    /// Retrieve messages rendered as `fileName: problem`.
    pub fn problems(&self) -> Vec<String> {
        self.messages.iter().map(ToString::to_string).collect()
    }
}

/// A message from retrieval.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrieveMessage {
    pub file_name: String,
    pub problem: String,
}

impl std::fmt::Display for RetrieveMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.file_name, self.problem)
    }
}

/// Unpack a retrieve zip in memory.
///
/// Directory entries are dropped, backslashes are normalized to `/` and a
/// leading `unpackaged/` segment is removed.
pub fn unpack_zip(bytes: &[u8]) -> Result<RetrievedFiles> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut files = RetrievedFiles::new();

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().replace('\\', "/");
        let name = name
            .strip_prefix("unpackaged/")
            .map(str::to_string)
            .unwrap_or(name);

        // The declared size comes from the archive and is not trusted.
        let mut data = Vec::with_capacity(reserve_hint(entry.size()));
        entry.read_to_end(&mut data)?;
        files.insert(name, data);
    }

    Ok(files)
}
