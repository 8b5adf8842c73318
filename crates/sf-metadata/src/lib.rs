//! # busbar-sf-metadata
//!
//! Salesforce Metadata API client for retrieving and listing metadata.
//!
//! ## Features
//!
//! - **Retrieve** - Unpackaged (from a `PackageManifest` or a `package.xml`
//!   file) and packaged retrieves
//! - **Status Polling** - Automatic polling until the retrieve completes
//! - **Result Unpacking** - The returned zip is decoded into a path → bytes map
//! - **List Metadata** - List metadata components by type, optionally per folder
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_metadata::{MetadataClient, PackageManifest, RetrieveOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_sf_metadata::Error> {
//!     let client = MetadataClient::from_parts("https://na1.salesforce.com", "token");
//!
//!     // Retrieve metadata (with secure XML escaping)
//!     let manifest = PackageManifest::new("62.0")
//!         .add_type("ApexClass", vec!["*".to_string()])
//!         .add_type("ApexTrigger", vec!["*".to_string()]);
//!     let result = client
//!         .retrieve_unpackaged_and_wait(&manifest, &RetrieveOptions::default())
//!         .await?;
//!     let files = busbar_sf_metadata::unpack_zip(&result.zip_bytes()?)?;
//!     println!("retrieved {} files", files.len());
//!
//!     // List reports in a folder
//!     let reports = client.list_metadata("Report", Some("Sales")).await?;
//!     for report in reports {
//!         println!("  {}", report.full_name);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod client;
mod error;
mod list;
mod retrieve;
mod types;

pub use client::MetadataClient;
pub use error::{Error, ErrorKind, Result};
pub use list::MetadataComponent;
pub use retrieve::{
    unpack_zip, PackageManifest, PackageTypeMembers, RetrieveMessage, RetrieveOptions,
    RetrieveResult, RetrieveStatus, RetrievedFiles,
};
pub use types::DEFAULT_API_VERSION;
