//! Decomposing Aura definition bundles into source files.
//!
//! Each bundle becomes `<root>/aura/<DeveloperName>/` holding one file per
//! definition and a `.manifest` describing them:
//!
//! ```json
//! {"Name":"MyCmp","Id":"0Ab...","Files":[{"FileName":"/src/aura/MyCmp/MyCmp.cmp","ComponentId":"0Ad..."}]}
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{Error, Result};
use crate::service::{AuraBundleSet, MetadataService};

/// Directory under the output root holding bundles.
pub const AURA_DIR: &str = "aura";
/// Manifest file written into each bundle directory.
pub const MANIFEST_FILE: &str = ".manifest";

/// File suffix per definition type. Types not listed get `<Type>.js`.
static EXTENSIONS: &[(&str, &str)] = &[
    ("COMPONENT", ".cmp"),
    ("APPLICATION", ".app"),
    ("EVENT", ".evt"),
    ("STYLE", "Style.css"),
    ("DOCUMENTATION", ".auradoc"),
    ("SVG", ".svg"),
    ("DESIGN", ".design"),
    ("INTERFACE", ".intf"),
];

/// One entry of a bundle manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ComponentFile {
    pub file_name: String,
    pub component_id: String,
}

/// Contents of a bundle's `.manifest`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BundleManifest {
    pub name: String,
    pub id: String,
    pub files: Vec<ComponentFile>,
}

/// `CONTROLLER` -> `Controller`
fn title_case(def_type: &str) -> String {
    let lower = def_type.to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// File name for a definition of `def_type` in bundle `bundle_name`.
pub fn file_name_for(bundle_name: &str, def_type: &str) -> String {
    let suffix = EXTENSIONS
        .iter()
        .find(|(t, _)| *t == def_type)
        .map(|(_, suffix)| suffix.to_string())
        .unwrap_or_else(|| format!("{}.js", title_case(def_type)));
    format!("{}{}", bundle_name, suffix)
}

/// Lay out every bundle of `set` under `root/aura`.
///
/// The `.manifest` is always written; definition sources only when
/// `write_sources` is set.
#[instrument(skip(set), fields(bundles = set.bundles.len()))]
pub fn persist_bundles(
    set: &AuraBundleSet,
    root: &Path,
    write_sources: bool,
) -> Result<Vec<BundleManifest>> {
    let aura_root = root.join(AURA_DIR);
    let mut manifests = Vec::with_capacity(set.bundles.len());

    for bundle in &set.bundles {
        let bundle_dir = aura_root.join(&bundle.developer_name);
        fs::create_dir_all(&bundle_dir).map_err(|e| Error::io(&bundle_dir, e))?;

        let mut files = Vec::new();
        for definition in set.definitions.iter().filter(|d| d.bundle_id == bundle.id) {
            let path = bundle_dir.join(file_name_for(&bundle.developer_name, &definition.def_type));
            if write_sources {
                fs::write(&path, definition.source.as_bytes()).map_err(|e| Error::io(&path, e))?;
            }
            files.push(ComponentFile {
                file_name: path.display().to_string(),
                component_id: definition.id.clone(),
            });
        }

        let manifest = BundleManifest {
            name: bundle.developer_name.clone(),
            id: bundle.id.clone(),
            files,
        };
        let manifest_path = bundle_dir.join(MANIFEST_FILE);
        fs::write(&manifest_path, serde_json::to_vec(&manifest)?)
            .map_err(|e| Error::io(&manifest_path, e))?;
        debug!(bundle = %manifest.name, files = manifest.files.len(), "wrote bundle");

        manifests.push(manifest);
    }

    Ok(manifests)
}

/// Fetch one bundle (or all when `name` is `None`) and write it out.
pub async fn fetch_bundles<S: MetadataService>(
    service: &S,
    name: Option<&str>,
    root: &Path,
    write_sources: bool,
) -> Result<Vec<BundleManifest>> {
    let set = match name {
        Some(name) => service.get_aura_bundle(name).await?,
        None => service.get_aura_bundles().await?,
    };
    persist_bundles(&set, root, write_sources)
}

/// Refresh bundle manifests without touching the source files.
pub async fn fetch_manifest<S: MetadataService>(
    service: &S,
    name: Option<&str>,
    root: &Path,
) -> Result<Vec<BundleManifest>> {
    fetch_bundles(service, name, root, false).await
}

/// Path of the `.manifest` for `bundle_name` under `root`.
pub fn manifest_path(root: &Path, bundle_name: &str) -> PathBuf {
    root.join(AURA_DIR).join(bundle_name).join(MANIFEST_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::{BundleRecord, DefinitionRecord};

    fn definition(id: &str, bundle_id: &str, def_type: &str, source: &str) -> DefinitionRecord {
        DefinitionRecord {
            id: id.to_string(),
            bundle_id: bundle_id.to_string(),
            def_type: def_type.to_string(),
            source: source.to_string(),
        }
    }

    fn sample_set() -> AuraBundleSet {
        AuraBundleSet {
            bundles: vec![
                BundleRecord {
                    id: "0Ab1".to_string(),
                    developer_name: "Greeting".to_string(),
                },
                BundleRecord {
                    id: "0Ab2".to_string(),
                    developer_name: "Empty".to_string(),
                },
            ],
            definitions: vec![
                definition("0Ad1", "0Ab1", "COMPONENT", "<aura:component/>"),
                definition("0Ad2", "0Ab1", "CONTROLLER", "({})"),
                definition("0Ad3", "0Ab1", "STYLE", ".THIS {}"),
                definition("0Ad4", "0Ab1", "RENDERER", "({})"),
                definition("0Ad9", "0Ab9", "COMPONENT", "<aura:component/>"),
            ],
        }
    }

    #[test]
    fn test_file_name_table() {
        assert_eq!(file_name_for("X", "COMPONENT"), "X.cmp");
        assert_eq!(file_name_for("X", "APPLICATION"), "X.app");
        assert_eq!(file_name_for("X", "EVENT"), "X.evt");
        assert_eq!(file_name_for("X", "STYLE"), "XStyle.css");
        assert_eq!(file_name_for("X", "DOCUMENTATION"), "X.auradoc");
        assert_eq!(file_name_for("X", "SVG"), "X.svg");
        assert_eq!(file_name_for("X", "DESIGN"), "X.design");
        assert_eq!(file_name_for("X", "INTERFACE"), "X.intf");
        assert_eq!(file_name_for("X", "CONTROLLER"), "XController.js");
        assert_eq!(file_name_for("X", "HELPER"), "XHelper.js");
    }

    #[test]
    fn test_persist_writes_sources_and_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let manifests = persist_bundles(&sample_set(), dir.path(), true).unwrap();

        assert_eq!(manifests.len(), 2);
        let greeting = &manifests[0];
        assert_eq!(greeting.files.len(), 4);

        let bundle_dir = dir.path().join("aura/Greeting");
        assert_eq!(
            fs::read_to_string(bundle_dir.join("Greeting.cmp")).unwrap(),
            "<aura:component/>"
        );
        assert!(bundle_dir.join("GreetingController.js").is_file());
        assert!(bundle_dir.join("GreetingStyle.css").is_file());
        assert!(bundle_dir.join("GreetingRenderer.js").is_file());

        let on_disk: BundleManifest =
            serde_json::from_slice(&fs::read(manifest_path(dir.path(), "Greeting")).unwrap())
                .unwrap();
        assert_eq!(&on_disk, greeting);
        assert_eq!(
            on_disk.files[0].file_name,
            bundle_dir.join("Greeting.cmp").display().to_string()
        );
        assert_eq!(on_disk.files[0].component_id, "0Ad1");

        assert!(manifests[1].files.is_empty());
        assert!(manifest_path(dir.path(), "Empty").is_file());
    }

    #[test]
    fn test_manifest_json_uses_pascal_case() {
        let manifest = BundleManifest {
            name: "A".to_string(),
            id: "0Ab".to_string(),
            files: vec![ComponentFile {
                file_name: "/x/A.cmp".to_string(),
                component_id: "0Ad".to_string(),
            }],
        };
        assert_eq!(
            serde_json::to_string(&manifest).unwrap(),
            r#"{"Name":"A","Id":"0Ab","Files":[{"FileName":"/x/A.cmp","ComponentId":"0Ad"}]}"#
        );
    }

    #[test]
    fn test_manifest_only_skips_sources() {
        let dir = tempfile::tempdir().unwrap();
        let manifests = persist_bundles(&sample_set(), dir.path(), false).unwrap();

        assert_eq!(manifests[0].files.len(), 4);
        assert!(manifest_path(dir.path(), "Greeting").is_file());
        assert!(!dir.path().join("aura/Greeting/Greeting.cmp").exists());
    }
}
