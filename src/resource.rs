//! Expanding zipped static resources into directories.

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::error::{Error, ErrorKind, Result};

/// Suffix of the XML sidecar describing a static resource.
pub const DESCRIPTOR_SUFFIX: &str = ".resource-meta.xml";
const DESCRIPTOR_SEGMENT: &str = "resource-meta";
const ZIP_CONTENT_TYPE: &str = "application/zip";
/// Archive entries with this prefix are platform bookkeeping (`__MACOSX/`).
const RESERVED_PREFIX: &str = "__";

/// The parts of a `.resource-meta.xml` needed to recognize an archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ResourceDescriptor {
    #[serde(rename = "cacheControl", default)]
    pub cache_control: Option<String>,
    #[serde(rename = "contentType", default)]
    pub content_type: Option<String>,
}

impl ResourceDescriptor {
    pub fn parse(data: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(data)
            .map_err(|e| Error::with_source(ErrorKind::Descriptor(e.to_string()), e))?;
        Ok(quick_xml::de::from_str(text)?)
    }

    pub fn is_zip(&self) -> bool {
        self.content_type.as_deref().map(str::trim) == Some(ZIP_CONTENT_TYPE)
    }
}

/// Whether a written file should be inspected as a possible resource descriptor.
pub fn is_resource_candidate(first_type: Option<&str>, relative: &str) -> bool {
    first_type.is_some_and(|t| t.eq_ignore_ascii_case("StaticResource"))
        || relative.ends_with(DESCRIPTOR_SUFFIX)
}

/// Collects zipped resources while files are written, then expands them.
#[derive(Debug, Default)]
pub struct ResourceExpander {
    /// base name -> archive path
    pending: BTreeMap<String, PathBuf>,
}

impl ResourceExpander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look at a written file; queue its archive if it is a zip descriptor.
    pub fn inspect(&mut self, written: &Path, data: &[u8]) {
        let Some(file_name) = written.file_name().and_then(|n| n.to_str()) else {
            return;
        };
        let mut segments = file_name.split('.');
        let base = segments.next().unwrap_or_default();
        if base.is_empty() || segments.next() != Some(DESCRIPTOR_SEGMENT) {
            return;
        }

        let descriptor = match ResourceDescriptor::parse(data) {
            Ok(descriptor) => descriptor,
            Err(e) => {
                warn!(path = %written.display(), error = %e, "unreadable resource descriptor");
                return;
            }
        };
        if !descriptor.is_zip() {
            return;
        }

        let dir = written.parent().unwrap_or_else(|| Path::new(""));
        let archive = dir.join(format!("{}.resource", base));
        debug!(resource = base, archive = %archive.display(), "queued zipped resource");
        self.pending.insert(base.to_string(), archive);
    }

    /// Expand every queued archive next to itself.
    pub fn expand_all(&self) -> Result<Vec<PathBuf>> {
        let mut extracted = Vec::new();
        for (base, archive) in &self.pending {
            let dest = archive
                .parent()
                .unwrap_or_else(|| Path::new(""))
                .join(base);
            extracted.extend(expand_archive(archive, &dest)?);
        }
        Ok(extracted)
    }
}

/// Extract `archive` into `dest`, skipping `__` entries and unsafe paths.
///
/// Failing to open the archive is fatal; a failing entry is logged and skipped.
pub fn expand_archive(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    fs::create_dir_all(dest).map_err(|e| Error::io(dest, e))?;

    let file = File::open(archive).map_err(|e| Error::io(archive, e))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|e| {
        Error::with_source(
            ErrorKind::Archive(format!("{}: {}", archive.display(), e)),
            e,
        )
    })?;

    let mut extracted = Vec::new();
    for index in 0..zip.len() {
        let mut entry = match zip.by_index(index) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(archive = %archive.display(), index, error = %e, "unreadable archive entry");
                continue;
            }
        };

        if entry.name().starts_with(RESERVED_PREFIX) {
            continue;
        }
        let Some(relative) = entry.enclosed_name() else {
            warn!(entry = entry.name(), "skipping entry with unsafe path");
            continue;
        };
        let target = dest.join(relative);

        if entry.is_dir() {
            if let Err(e) = fs::create_dir_all(&target) {
                warn!(path = %target.display(), error = %e, "could not create directory");
            }
            continue;
        }

        let copied = target
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| File::create(&target))
            .and_then(|mut out| io::copy(&mut entry, &mut out));
        match copied {
            Ok(_) => extracted.push(target),
            Err(e) => warn!(path = %target.display(), error = %e, "could not extract entry"),
        }
    }

    info!(archive = %archive.display(), files = extracted.len(), "expanded static resource");
    Ok(extracted)
}
