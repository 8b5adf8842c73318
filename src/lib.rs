//! # busbar-sf-fetch
//!
//! Retrieve metadata from a Salesforce org into a local source tree.
//!
//! The pipeline builds a retrieve query (expanding foldered types and
//! standard objects), runs it through a [`MetadataService`], writes the
//! returned files under an output root, and optionally lays out Aura
//! bundles or expands zipped static resources.
//!
//! ## Crates
//!
//! - **busbar-sf-client** - REST and Tooling API queries
//! - **busbar-sf-metadata** - Metadata API retrieve and listMetadata
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_fetch::{run_fetch, FetchRequest, OrgConfig, OrgService};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_sf_fetch::Error> {
//!     let config = OrgConfig::from_sf_cli("my-org").await?;
//!     let service = OrgService::connect(&config)?;
//!
//!     let outcome = run_fetch(
//!         &service,
//!         &FetchRequest {
//!             root: "src".into(),
//!             types: vec!["ApexClass".to_string()],
//!             ..FetchRequest::default()
//!         },
//!     )
//!     .await?;
//!     println!("Exported to {}", outcome.root.display());
//!     Ok(())
//! }
//! ```

pub mod aura;
pub mod command;
pub mod config;
mod error;
pub mod folders;
pub mod materialize;
pub mod org;
pub mod query;
pub mod resource;
pub mod service;

pub use command::{is_empty_result, run_export, run_fetch, ExportRequest, FetchRequest, Outcome};
pub use config::OrgConfig;
pub use error::{Error, ErrorKind, Result};
pub use org::OrgService;
pub use query::{QueryBuilder, QueryElement};
pub use service::{
    AuraBundleSet, BundleRecord, DefinitionRecord, FolderType, FolderedMetadata,
    MetadataService, Retrieval,
};
