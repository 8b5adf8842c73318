use std::cell::RefCell;
use std::collections::BTreeMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use busbar_sf_client::SObjectSummary;
use busbar_sf_fetch::{
    AuraBundleSet, BundleRecord, DefinitionRecord, Error, ErrorKind, FolderType,
    FolderedMetadata, MetadataService, QueryElement, Result, Retrieval,
};

/// An org held in memory. Every call is recorded by name.
#[derive(Default)]
pub struct FakeOrg {
    pub sobjects: Vec<SObjectSummary>,
    pub folders: FolderedMetadata,
    /// Components found inside the folders of each type.
    pub folder_contents: BTreeMap<FolderType, Vec<String>>,
    /// Files returned by every retrieve.
    pub files: BTreeMap<String, Vec<u8>>,
    pub problems: Vec<String>,
    pub packages: BTreeMap<String, Retrieval>,
    pub aura: AuraBundleSet,
    pub fail_folders: bool,
    pub calls: RefCell<Vec<String>>,
    pub queries: RefCell<Vec<Vec<QueryElement>>>,
    pub package_xml_paths: RefCell<Vec<PathBuf>>,
}

impl FakeOrg {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_files(mut self, files: &[(&str, &[u8])]) -> Self {
        self.files = files
            .iter()
            .map(|(path, data)| (path.to_string(), data.to_vec()))
            .collect();
        self
    }

    pub fn calls_to(&self, name: &str) -> usize {
        self.calls.borrow().iter().filter(|c| *c == name).count()
    }

    pub fn last_query(&self) -> Vec<QueryElement> {
        self.queries.borrow().last().cloned().unwrap_or_default()
    }

    fn record(&self, name: &str) {
        self.calls.borrow_mut().push(name.to_string());
    }

    fn retrieval(&self) -> Retrieval {
        Retrieval {
            files: self.files.clone(),
            problems: self.problems.clone(),
            archive: Vec::new(),
        }
    }
}

impl MetadataService for FakeOrg {
    async fn list_sobjects(&self) -> Result<Vec<SObjectSummary>> {
        self.record("list_sobjects");
        Ok(self.sobjects.clone())
    }

    async fn get_all_folders(&self) -> Result<FolderedMetadata> {
        self.record("get_all_folders");
        if self.fail_folders {
            return Err(Error::new(ErrorKind::Remote("INVALID_SESSION_ID".to_string())));
        }
        Ok(self.folders.clone())
    }

    async fn get_metadata_in_folders(
        &self,
        folder_type: FolderType,
        folders: &[String],
    ) -> Result<Vec<String>> {
        self.record("get_metadata_in_folders");
        let mut members = folders.to_vec();
        members.extend(
            self.folder_contents
                .get(&folder_type)
                .cloned()
                .unwrap_or_default(),
        );
        Ok(members)
    }

    async fn retrieve(&self, query: &[QueryElement]) -> Result<Retrieval> {
        self.record("retrieve");
        self.queries.borrow_mut().push(query.to_vec());
        Ok(self.retrieval())
    }

    async fn retrieve_by_package_xml(&self, path: &Path) -> Result<Retrieval> {
        self.record("retrieve_by_package_xml");
        self.package_xml_paths.borrow_mut().push(path.to_path_buf());
        Ok(self.retrieval())
    }

    async fn retrieve_package(&self, name: &str) -> Result<Retrieval> {
        self.record("retrieve_package");
        self.packages
            .get(name)
            .cloned()
            .ok_or_else(|| Error::new(ErrorKind::Remote(format!("No package named {}", name))))
    }

    async fn get_aura_bundles(&self) -> Result<AuraBundleSet> {
        self.record("get_aura_bundles");
        Ok(self.aura.clone())
    }

    async fn get_aura_bundle(&self, name: &str) -> Result<AuraBundleSet> {
        self.record("get_aura_bundle");
        let bundles: Vec<BundleRecord> = self
            .aura
            .bundles
            .iter()
            .filter(|b| b.developer_name == name)
            .cloned()
            .collect();
        let definitions = self
            .aura
            .definitions
            .iter()
            .filter(|d| bundles.iter().any(|b| b.id == d.bundle_id))
            .cloned()
            .collect();
        Ok(AuraBundleSet {
            bundles,
            definitions,
        })
    }
}

pub fn sobject(name: &str, custom: bool) -> SObjectSummary {
    SObjectSummary {
        name: name.to_string(),
        custom,
    }
}

pub fn bundle(id: &str, name: &str) -> BundleRecord {
    BundleRecord {
        id: id.to_string(),
        developer_name: name.to_string(),
    }
}

pub fn definition(id: &str, bundle_id: &str, def_type: &str, source: &str) -> DefinitionRecord {
    DefinitionRecord {
        id: id.to_string(),
        bundle_id: bundle_id.to_string(),
        def_type: def_type.to_string(),
        source: source.to_string(),
    }
}

pub fn zip_of(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buf = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
        let options = zip::write::SimpleFileOptions::default();
        for (name, data) in entries {
            zip.start_file(*name, options).unwrap();
            zip.write_all(data).unwrap();
        }
        zip.finish().unwrap();
    }
    buf
}

pub const PACKAGE_XML: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<Package xmlns="http://soap.sforce.com/2006/04/metadata"><version>62.0</version></Package>"#;

pub const ZIP_DESCRIPTOR: &[u8] = br#"<?xml version="1.0" encoding="UTF-8"?>
<StaticResource xmlns="http://soap.sforce.com/2006/04/metadata">
    <cacheControl>Public</cacheControl>
    <contentType>application/zip</contentType>
</StaticResource>"#;
