//! Writing retrieved files under an output root.

use std::fs;
use std::path::{Component, Path, PathBuf};

use busbar_sf_metadata::RetrievedFiles;
use tracing::{debug, info};

use crate::error::{Error, ErrorKind, Result};

/// Name of the manifest kept across repeated fetches.
pub const PACKAGE_XML: &str = "package.xml";

/// Writes a retrieved file set under `root`.
///
/// Whether `root/package.xml` exists is captured at construction time; if it
/// did, an incoming `package.xml` is never written over it.
#[derive(Debug, Clone)]
pub struct Materializer {
    root: PathBuf,
    keep_package_xml: bool,
}

impl Materializer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let keep_package_xml = root.join(PACKAGE_XML).is_file();
        Self {
            root,
            keep_package_xml,
        }
    }

    /// Destination for a relative service path. Absolute paths and `..` are rejected.
    pub fn destination(&self, relative: &str) -> Result<PathBuf> {
        let relative = Path::new(relative);
        let safe = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        if !safe || relative.as_os_str().is_empty() {
            return Err(Error::new(ErrorKind::Io {
                path: relative.to_path_buf(),
                message: "refusing to write outside the output directory".to_string(),
            }));
        }
        Ok(self.root.join(relative))
    }

    /// Write one file, creating its parent directories.
    pub fn write(&self, relative: &str, data: &[u8]) -> Result<PathBuf> {
        let destination = self.destination(relative)?;
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        fs::write(&destination, data).map_err(|e| Error::io(&destination, e))?;
        debug!(path = %destination.display(), bytes = data.len(), "wrote file");
        Ok(destination)
    }

    /// Write every file in path order, stopping at the first failure.
    ///
    /// Returns `(relative, destination)` for each file actually written.
    pub fn write_all(&self, files: &RetrievedFiles) -> Result<Vec<(String, PathBuf)>> {
        let mut written = Vec::with_capacity(files.len());
        for (relative, data) in files {
            if self.keep_package_xml && relative == PACKAGE_XML {
                debug!("keeping existing package.xml");
                continue;
            }
            written.push((relative.clone(), self.write(relative, data)?));
        }
        info!(count = written.len(), root = %self.root.display(), "materialized files");
        Ok(written)
    }
}
