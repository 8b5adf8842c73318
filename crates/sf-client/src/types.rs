//! Response payloads shared by the REST and Tooling endpoints.

use serde::{Deserialize, Serialize};

/// Result of a SOQL query.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QueryResult<T> {
    /// Total number of records matching the query.
    #[serde(rename = "totalSize")]
    pub total_size: u64,

    /// Whether all records are returned (no more pages).
    pub done: bool,

    /// URL to fetch next batch of results.
    #[serde(rename = "nextRecordsUrl")]
    pub next_records_url: Option<String>,

    /// The records.
    pub records: Vec<T>,
}

/// Response of `GET /services/data/vXX.X/sobjects`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DescribeGlobalResult {
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(rename = "maxBatchSize", default)]
    pub max_batch_size: Option<u32>,
    pub sobjects: Vec<SObjectSummary>,
}

/// The subset of an SObject's describe-global entry used here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SObjectSummary {
    pub name: String,
    #[serde(default)]
    pub custom: bool,
}
