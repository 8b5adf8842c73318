//! Lazy lookup of foldered metadata (email templates, reports, documents, dashboards).

use tracing::debug;

use crate::error::Result;
use crate::service::{FolderType, FolderedMetadata, MetadataService};

/// Resolves the members of foldered types, fetching the folder directory at most once.
pub struct FolderResolver<'a, S> {
    service: &'a S,
    folders: Option<FolderedMetadata>,
}

impl<'a, S: MetadataService> FolderResolver<'a, S> {
    pub fn new(service: &'a S) -> Self {
        Self {
            service,
            folders: None,
        }
    }

    /// The folder directory of the org, fetched on first use.
    pub async fn all_folders(&mut self) -> Result<&FolderedMetadata> {
        if self.folders.is_none() {
            let folders = self
                .service
                .get_all_folders()
                .await
                .map_err(|e| e.context("Could not get folders"))?;
            debug!(kinds = folders.len(), "loaded folder directory");
            self.folders = Some(folders);
        }
        Ok(self.folders.get_or_insert_with(FolderedMetadata::new))
    }

    /// Every member found in every folder of `folder_type`.
    pub async fn members_of(&mut self, folder_type: FolderType) -> Result<Vec<String>> {
        let folders = self
            .all_folders()
            .await?
            .get(&folder_type)
            .cloned()
            .unwrap_or_default();

        self.service
            .get_metadata_in_folders(folder_type, &folders)
            .await
            .map_err(|e| e.context("Could not get metadata in folders"))
    }
}
