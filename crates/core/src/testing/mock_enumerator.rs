//! Mock enumerator for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::batch::{EnumerationError, Enumerator};

/// Mock implementation of the Enumerator trait.
///
/// Returns a configurable listing (empty by default) and records every
/// source it was asked to list.
#[derive(Debug, Clone, Default)]
pub struct MockEnumerator {
    items: Arc<RwLock<Vec<String>>>,
    sources: Arc<RwLock<Vec<String>>>,
    /// If set, the next listing will fail with this error.
    next_error: Arc<RwLock<Option<EnumerationError>>>,
}

impl MockEnumerator {
    /// Create a new mock enumerator returning an empty listing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mock enumerator returning `items`.
    pub fn with_items<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            items: Arc::new(RwLock::new(items.into_iter().map(Into::into).collect())),
            ..Self::default()
        }
    }

    /// Replace the listing.
    pub async fn set_items(&self, items: Vec<String>) {
        *self.items.write().await = items;
    }

    /// Configure the next listing to fail with the given error.
    pub async fn set_next_error(&self, error: EnumerationError) {
        *self.next_error.write().await = Some(error);
    }

    /// Sources passed to `list_items`, in call order.
    pub async fn recorded_sources(&self) -> Vec<String> {
        self.sources.read().await.clone()
    }
}

#[async_trait]
impl Enumerator for MockEnumerator {
    fn name(&self) -> &str {
        "mock"
    }

    async fn list_items(&self, source: &str) -> Result<Vec<String>, EnumerationError> {
        self.sources.write().await.push(source.to_string());

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        Ok(self.items.read().await.clone())
    }
}
