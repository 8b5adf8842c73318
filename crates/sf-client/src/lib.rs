//! # busbar-sf-client
//!
//! Authenticated JSON client for the Salesforce REST and Tooling APIs.
//!
//! This crate provides the small slice of the REST surface that metadata
//! retrieval needs:
//! - Describe global (list of SObjects with their `custom` flag)
//! - SOQL queries with automatic pagination (REST and Tooling)
//! - Salesforce error payload mapping
//! - SOQL and XML escaping helpers shared with `busbar-sf-metadata`
//!
//! ## Example
//!
//! ```rust,ignore
//! use busbar_sf_client::SalesforceClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), busbar_sf_client::Error> {
//!     let client = SalesforceClient::new("https://myorg.my.salesforce.com", "token")?;
//!
//!     let global = client.describe_global().await?;
//!     for sobject in global.sobjects.iter().filter(|s| !s.custom) {
//!         println!("{}", sobject.name);
//!     }
//!
//!     let folders: Vec<serde_json::Value> = client
//!         .query_all("SELECT Id, DeveloperName FROM Folder")
//!         .await?;
//!     println!("{} folders", folders.len());
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod error;
pub mod security;
mod types;

pub use client::SalesforceClient;
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{Error, ErrorKind, Result};
pub use types::{DescribeGlobalResult, QueryResult, SObjectSummary};

/// Default Salesforce API version
pub const DEFAULT_API_VERSION: &str = "62.0";

/// User-Agent string for the client
pub const USER_AGENT: &str = concat!("busbar-sf-fetch/", env!("CARGO_PKG_VERSION"));
