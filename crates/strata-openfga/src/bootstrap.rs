//! Store and model provisioning, run once per process

use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use strata_core::Result;

use crate::model::{authorization_model, AuthorizationModel};
use crate::service::{AuthorizationClient, ClientConfig};
use crate::store::TupleStore;

/// What to do when a store already has an authorization model
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelPolicy {
    /// Keep the latest stored model whatever it contains
    SkipIfPresent,
    /// Write a new model version when the latest stored model differs from
    /// the compiled one
    #[default]
    UpgradeIfStale,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapConfig {
    pub store_name: String,
    pub model_policy: ModelPolicy,
    pub client: ClientConfig,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            store_name: "strata".to_string(),
            model_policy: ModelPolicy::default(),
            client: ClientConfig::default(),
        }
    }
}

/// Id of the store named `name`, creating it when absent
#[instrument(skip(store))]
pub async fn ensure_store<S: TupleStore>(store: &S, name: &str) -> Result<String> {
    let stores = store.list_all_stores().await?;
    if let Some(existing) = stores.into_iter().find(|s| s.name == name) {
        info!(store_id = %existing.id, "Using existing store {}", name);
        return Ok(existing.id);
    }

    let created = store.create_store(name).await?;
    Ok(created.id)
}

/// Make sure the store has a usable model and return its id
#[instrument(skip(store, model))]
pub async fn write_model_if_absent<S: TupleStore>(
    store: &S,
    store_id: &str,
    model: &AuthorizationModel,
    policy: ModelPolicy,
) -> Result<String> {
    let models = store.read_authorization_models(store_id).await?;

    if let Some(latest) = models.into_iter().next() {
        let latest_id = latest.id.clone().unwrap_or_default();
        match policy {
            ModelPolicy::SkipIfPresent => {
                info!(model_id = %latest_id, "Authorization model already present");
                return Ok(latest_id);
            }
            ModelPolicy::UpgradeIfStale if latest.is_equivalent(model) => {
                info!(model_id = %latest_id, "Authorization model is up to date");
                return Ok(latest_id);
            }
            ModelPolicy::UpgradeIfStale => {
                warn!(model_id = %latest_id, "Stored authorization model is stale, writing a new version");
            }
        }
    }

    store.write_authorization_model(store_id, model).await
}

/// Provision the store and model and return a client pinned to both
#[instrument(skip(store, config), fields(store_name = %config.store_name))]
pub async fn bootstrap<S: TupleStore>(
    store: S,
    config: &BootstrapConfig,
) -> Result<AuthorizationClient<S>> {
    let store_id = ensure_store(&store, &config.store_name).await?;
    let model_id = write_model_if_absent(
        &store,
        &store_id,
        &authorization_model(),
        config.model_policy,
    )
    .await?;

    info!(%store_id, %model_id, "Authorization bootstrap complete");
    Ok(AuthorizationClient::new(
        store,
        store_id,
        model_id,
        config.client.clone(),
    ))
}
