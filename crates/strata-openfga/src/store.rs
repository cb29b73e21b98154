//! Tuple store abstraction
//!
//! [`TupleStore`] mirrors the subset of the OpenFGA HTTP API Strata uses.
//! [`crate::OpenFgaHttpClient`] talks to a real server and
//! [`crate::MemoryTupleStore`] evaluates the same model in process.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use strata_core::{Result, TupleFilter, TupleKey};

use crate::model::AuthorizationModel;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Store {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A stored tuple with its write time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tuple {
    pub key: TupleKey,
    pub timestamp: DateTime<Utc>,
}

/// One page of a paginated listing. `continuation_token` is `None` on the
/// last page.
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub continuation_token: Option<String>,
}

/// The store answers with an empty string when there are no more pages
pub(crate) fn next_token(token: Option<String>) -> Option<String> {
    token.filter(|t| !t.is_empty())
}

#[async_trait]
pub trait TupleStore: Send + Sync {
    async fn list_stores(&self, continuation_token: Option<String>) -> Result<Page<Store>>;

    async fn create_store(&self, name: &str) -> Result<Store>;

    /// Models of a store, newest first
    async fn read_authorization_models(&self, store_id: &str) -> Result<Vec<AuthorizationModel>>;

    /// Returns the id of the new model version
    async fn write_authorization_model(
        &self,
        store_id: &str,
        model: &AuthorizationModel,
    ) -> Result<String>;

    async fn read(
        &self,
        store_id: &str,
        filter: &TupleFilter,
        continuation_token: Option<String>,
    ) -> Result<Page<Tuple>>;

    /// Apply `writes` and `deletes` as one transaction. Fails with
    /// `AlreadyExists` or `NotFound` when a key is already present or absent.
    async fn write(
        &self,
        store_id: &str,
        model_id: &str,
        writes: Vec<TupleKey>,
        deletes: Vec<TupleKey>,
    ) -> Result<()>;

    async fn check(&self, store_id: &str, model_id: &str, tuple_key: &TupleKey) -> Result<bool>;

    /// Every store, following continuation tokens
    async fn list_all_stores(&self) -> Result<Vec<Store>> {
        let mut stores = Vec::new();
        let mut token = None;
        loop {
            let page = self.list_stores(token).await?;
            stores.extend(page.items);
            match page.continuation_token {
                Some(next) => token = Some(next),
                None => return Ok(stores),
            }
        }
    }

    /// Every tuple matching `filter`, following continuation tokens
    async fn read_all(&self, store_id: &str, filter: &TupleFilter) -> Result<Vec<Tuple>> {
        let mut tuples = Vec::new();
        let mut token = None;
        loop {
            let page = self.read(store_id, filter, token).await?;
            tuples.extend(page.items);
            match page.continuation_token {
                Some(next) => token = Some(next),
                None => return Ok(tuples),
            }
        }
    }
}
