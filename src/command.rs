//! The `export` and `fetch` operations.

use std::fs;
use std::path::{Path, PathBuf};

use busbar_sf_metadata::RetrievedFiles;
use tracing::{debug, info};

use crate::aura::{self, BundleManifest};
use crate::error::{Error, ErrorKind, Result};
use crate::materialize::{Materializer, PACKAGE_XML};
use crate::query::QueryBuilder;
use crate::resource::{is_resource_candidate, ResourceExpander};
use crate::service::{MetadataService, Retrieval};

const AURA_TYPE: &str = "aura";
const PACKAGE_TYPE: &str = "package";

/// Inputs of `export`.
#[derive(Debug, Clone, Default)]
pub struct ExportRequest {
    pub root: PathBuf,
    pub exclude: Vec<String>,
    pub show_warnings: bool,
}

/// Inputs of `fetch`.
#[derive(Debug, Clone, Default)]
pub struct FetchRequest {
    pub root: PathBuf,
    pub types: Vec<String>,
    pub names: Vec<String>,
    pub unpack: bool,
    pub preserve: bool,
    pub package_xml: Option<PathBuf>,
    pub show_warnings: bool,
}

impl FetchRequest {
    fn single_type(&self) -> Option<String> {
        match self.types.as_slice() {
            [only] => Some(only.to_lowercase()),
            _ => None,
        }
    }

    /// Reject flag combinations before anything is sent to the org.
    pub fn validate(&self) -> Result<()> {
        if self.types.is_empty() && self.package_xml.is_none() {
            return Err(Error::usage(
                "must specify object type and/or object name or package xml path",
            ));
        }
        if self.types.len() > 1 && self.names.len() > 1 {
            return Err(Error::usage(
                "You cannot specify entity names if you specify more than one metadata type.",
            ));
        }
        if self.single_type().as_deref() == Some(PACKAGE_TYPE) && self.names.is_empty() {
            return Err(Error::usage("must specify package name(s) with -n"));
        }
        Ok(())
    }
}

/// What a command produced.
#[derive(Debug, Clone, Default)]
pub struct Outcome {
    pub root: PathBuf,
    /// Files written under `root`.
    pub written: Vec<PathBuf>,
    /// Files extracted from zipped static resources.
    pub expanded: Vec<PathBuf>,
    /// Aura bundles laid out under `root/aura`.
    pub bundles: Vec<BundleManifest>,
    /// Retrieve warnings; only collected when warnings were requested.
    pub problems: Vec<String>,
}

/// True when a retrieve matched nothing.
///
/// The Metadata API answers an empty match with a lone `package.xml`.
pub fn is_empty_result(files: &RetrievedFiles) -> bool {
    files
        .keys()
        .all(|path| path.rsplit('/').next() == Some(PACKAGE_XML))
}

fn problems_if(show: bool, problems: Vec<String>) -> Vec<String> {
    debug!(count = problems.len(), shown = show, "retrieve warnings");
    if show {
        problems
    } else {
        Vec::new()
    }
}

/// Retrieve the catalog, foldered metadata and standard objects into `request.root`.
pub async fn run_export<S: MetadataService>(service: &S, request: &ExportRequest) -> Result<Outcome> {
    let materializer = Materializer::new(&request.root);

    let query = QueryBuilder::export()
        .exclude(request.exclude.iter().cloned())
        .build(service)
        .await?;
    let retrieval = service.retrieve(&query).await?;

    let written = materializer.write_all(&retrieval.files)?;
    info!(files = written.len(), "export complete");

    Ok(Outcome {
        root: request.root.clone(),
        written: written.into_iter().map(|(_, path)| path).collect(),
        problems: problems_if(request.show_warnings, retrieval.problems),
        ..Outcome::default()
    })
}

/// Retrieve the requested types (or names, package, package.xml) into `request.root`.
pub async fn run_fetch<S: MetadataService>(service: &S, request: &FetchRequest) -> Result<Outcome> {
    request.validate()?;
    let materializer = Materializer::new(&request.root);

    let retrieval = match request.single_type().as_deref() {
        Some(AURA_TYPE) => return fetch_aura(service, request).await,
        Some(PACKAGE_TYPE) => fetch_packages(service, request).await?,
        _ => match &request.package_xml {
            Some(path) => service.retrieve_by_package_xml(path).await?,
            None => {
                let query = QueryBuilder::fetch(request.types.clone(), request.names.clone())
                    .build(service)
                    .await?;
                service.retrieve(&query).await?
            }
        },
    };

    if is_empty_result(&retrieval.files) {
        let types = match (&request.package_xml, request.types.is_empty()) {
            (Some(path), true) => path.display().to_string(),
            _ => request.types.join(", "),
        };
        return Err(Error::new(ErrorKind::NoMatch { types }));
    }

    let written = materializer.write_all(&retrieval.files)?;

    let mut expanded = Vec::new();
    if request.unpack && request.package_xml.is_none() {
        let first_type = request.types.first().map(String::as_str);
        let mut expander = ResourceExpander::new();
        for (relative, path) in &written {
            if is_resource_candidate(first_type, relative) {
                if let Some(data) = retrieval.files.get(relative) {
                    expander.inspect(path, data);
                }
            }
        }
        expanded = expander.expand_all()?;
    }

    info!(files = written.len(), expanded = expanded.len(), "fetch complete");
    Ok(Outcome {
        root: request.root.clone(),
        written: written.into_iter().map(|(_, path)| path).collect(),
        expanded,
        problems: problems_if(request.show_warnings, retrieval.problems),
        ..Outcome::default()
    })
}

async fn fetch_aura<S: MetadataService>(service: &S, request: &FetchRequest) -> Result<Outcome> {
    let mut bundles = Vec::new();
    if request.names.is_empty() {
        bundles = aura::fetch_bundles(service, None, &request.root, true).await?;
    } else {
        for name in &request.names {
            bundles.extend(aura::fetch_bundles(service, Some(name), &request.root, true).await?);
        }
    }

    Ok(Outcome {
        root: request.root.clone(),
        bundles,
        ..Outcome::default()
    })
}

/// Retrieve each named package and merge the results.
async fn fetch_packages<S: MetadataService>(service: &S, request: &FetchRequest) -> Result<Retrieval> {
    let mut merged = Retrieval::default();
    for name in &request.names {
        let retrieval = service.retrieve_package(name).await?;
        if request.preserve {
            save_archive(&request.root, name, &retrieval.archive)?;
        }
        merged.files.extend(retrieval.files);
        merged.problems.extend(retrieval.problems);
    }
    Ok(merged)
}

fn save_archive(root: &Path, name: &str, archive: &[u8]) -> Result<PathBuf> {
    fs::create_dir_all(root).map_err(|e| Error::io(root, e))?;
    let path = root.join(format!("{}.zip", name));
    fs::write(&path, archive).map_err(|e| Error::io(&path, e))?;
    debug!(path = %path.display(), "preserved package archive");
    Ok(path)
}
