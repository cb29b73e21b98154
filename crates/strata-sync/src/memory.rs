//! In-process legacy mirror

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use strata_core::{LegacyMirror, Result};

type Records = BTreeMap<String, BTreeMap<String, bool>>;

/// Legacy mirror held in memory, keyed by collection then record id.
/// Clones share state.
#[derive(Debug, Clone, Default)]
pub struct MemoryLegacyMirror {
    collections: Arc<RwLock<BTreeMap<String, Records>>>,
}

impl MemoryLegacyMirror {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of a field, `None` if the record or field was never set
    pub async fn get_field(&self, collection: &str, id: &str, field: &str) -> Option<bool> {
        let collections = self.collections.read().await;
        collections.get(collection)?.get(id)?.get(field).copied()
    }
}

#[async_trait]
impl LegacyMirror for MemoryLegacyMirror {
    async fn set_field(&self, collection: &str, id: &str, field: &str, value: bool) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .entry(id.to_string())
            .or_default()
            .insert(field.to_string(), value);
        Ok(())
    }

    async fn find_flagged(&self, collection: &str, field: &str) -> Result<Vec<String>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(collection)
            .map(|records| {
                records
                    .iter()
                    .filter(|(_, fields)| fields.get(field).copied().unwrap_or(false))
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}
