//! Seams to external collaborators

use async_trait::async_trait;

use crate::error::Result;

/// Boolean flags kept in the primary store for code that predates role-based
/// authorization
#[async_trait]
pub trait LegacyMirror: Send + Sync {
    /// Set `field` on the record `id` in `collection`
    async fn set_field(&self, collection: &str, id: &str, field: &str, value: bool) -> Result<()>;

    /// Ids of every record in `collection` whose `field` is `true`
    async fn find_flagged(&self, collection: &str, field: &str) -> Result<Vec<String>>;
}

/// Location of the mirrored administrator flag
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
pub struct LegacyFlag {
    pub collection: String,
    pub field: String,
}

impl Default for LegacyFlag {
    fn default() -> Self {
        Self {
            collection: "users".to_string(),
            field: "administrator".to_string(),
        }
    }
}
