//! Read access to Salesforce: entity schemas and SOQL queries.
use async_trait::async_trait;

use crate::error::QueryError;
use crate::record::SourceRecord;

pub mod client;
pub mod login;

pub use client::SalesforceClient;
pub use login::Session;

/// The source system records are re-fetched from.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// Names of every field of `entity` that can be selected, in the order the schema lists them.
    async fn describe_fields(&self, entity: &str) -> Result<Vec<String>, QueryError>;

    /// Run a SOQL query and return every matching record, across all result pages.
    async fn query_all(&self, soql: &str) -> Result<Vec<SourceRecord>, QueryError>;
}
