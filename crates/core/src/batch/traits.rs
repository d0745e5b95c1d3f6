//! Collaborator traits for the batch module.

use async_trait::async_trait;

use super::error::{EnumerationError, ItemError};
use super::types::{BatchConfig, WorkItem};

/// Expands a batch source (e.g. a playlist URL) into item identifiers.
#[async_trait]
pub trait Enumerator: Send + Sync {
    /// Returns the name of this enumerator implementation.
    fn name(&self) -> &str;

    /// Lists the identifiers of every item in `source`, in source order.
    async fn list_items(&self, source: &str) -> Result<Vec<String>, EnumerationError>;
}

/// Performs the transformation for a single work item.
#[async_trait]
pub trait ItemProcessor: Send + Sync {
    /// Returns the name of this processor implementation.
    fn name(&self) -> &str;

    /// Processes one item using the batch configuration.
    async fn process(&self, item: &WorkItem, config: &BatchConfig) -> Result<(), ItemError>;
}
