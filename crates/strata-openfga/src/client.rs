//! OpenFGA HTTP client implementation

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, instrument};

use strata_core::{AuthzError, Result, TupleFilter, TupleKey};

use crate::model::AuthorizationModel;
use crate::store::{next_token, Page, Store, Tuple, TupleStore};

/// Tuples requested per read call
const READ_PAGE_SIZE: u32 = 100;

/// Configuration for the OpenFGA connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenFgaConfig {
    /// `http` or `https`
    pub scheme: String,
    /// Host and optional port, e.g. `localhost:8080`
    pub host: String,
    /// Pre-shared key sent as a bearer token
    pub api_token: Option<String>,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Request timeout in milliseconds
    pub request_timeout_ms: u64,
}

impl Default for OpenFgaConfig {
    fn default() -> Self {
        Self {
            scheme: "http".to_string(),
            host: "localhost:8080".to_string(),
            api_token: None,
            connect_timeout_ms: 5000,
            request_timeout_ms: 30000,
        }
    }
}

impl OpenFgaConfig {
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.host.trim_end_matches('/'))
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct CreateStoreRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ListStoresResponse {
    #[serde(default)]
    stores: Vec<Store>,
    #[serde(default)]
    continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReadAuthorizationModelsResponse {
    #[serde(default)]
    authorization_models: Vec<AuthorizationModel>,
}

#[derive(Debug, Serialize)]
struct WriteAuthorizationModelRequest<'a> {
    schema_version: &'a str,
    type_definitions: &'a [crate::model::TypeDefinition],
}

#[derive(Debug, Deserialize)]
struct WriteAuthorizationModelResponse {
    authorization_model_id: String,
}

#[derive(Debug, Serialize)]
struct ReadRequest<'a> {
    tuple_key: &'a TupleFilter,
    page_size: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    continuation_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ReadResponse {
    #[serde(default)]
    tuples: Vec<Tuple>,
    #[serde(default)]
    continuation_token: Option<String>,
}

#[derive(Debug, Serialize)]
struct TupleKeys {
    tuple_keys: Vec<TupleKey>,
}

#[derive(Debug, Serialize)]
struct WriteRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    writes: Option<TupleKeys>,
    #[serde(skip_serializing_if = "Option::is_none")]
    deletes: Option<TupleKeys>,
    authorization_model_id: &'a str,
}

#[derive(Debug, Serialize)]
struct CheckRequest<'a> {
    tuple_key: &'a TupleKey,
    authorization_model_id: &'a str,
}

#[derive(Debug, Deserialize)]
struct CheckResponse {
    allowed: bool,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

fn non_empty(keys: Vec<TupleKey>) -> Option<TupleKeys> {
    (!keys.is_empty()).then_some(TupleKeys { tuple_keys: keys })
}

/// Translate an OpenFGA error body into the matching [`AuthzError`]
fn map_error(status: reqwest::StatusCode, body: &str) -> AuthzError {
    let Ok(error) = serde_json::from_str::<ErrorResponse>(body) else {
        return AuthzError::protocol(status.as_str(), body);
    };

    if error.message.contains("cannot write a tuple which already exists") {
        AuthzError::already_exists(error.message)
    } else if error.message.contains("cannot delete a tuple which does not exist") {
        AuthzError::not_found(error.message)
    } else {
        AuthzError::protocol(error.code, error.message)
    }
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the OpenFGA API
#[derive(Clone)]
pub struct OpenFgaHttpClient {
    http: Client,
    base_url: Arc<str>,
    api_token: Option<Arc<str>>,
}

impl OpenFgaHttpClient {
    /// Create a new client. No request is made until the first call.
    #[instrument(skip(config), fields(scheme = %config.scheme, host = %config.host))]
    pub fn new(config: &OpenFgaConfig) -> Result<Self> {
        let http = Client::builder()
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|e| AuthzError::config_error(format!("Failed to create HTTP client: {}", e)))?;

        let base_url = config.base_url();
        info!("Using OpenFGA at {}", base_url);

        Ok(Self {
            http,
            base_url: base_url.into(),
            api_token: config.api_token.as_deref().filter(|t| !t.is_empty()).map(Arc::from),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{}", self.base_url, path));
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, builder: RequestBuilder) -> Result<Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| AuthzError::connection(e.to_string()))?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AuthzError::connection(e.to_string()))?;
        debug!(%status, %body, "OpenFGA request failed");
        Err(map_error(status, &body))
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T> {
        let response = self.send(builder).await?;
        response
            .json()
            .await
            .map_err(|e| AuthzError::serialization_error(e.to_string()))
    }
}

#[async_trait]
impl TupleStore for OpenFgaHttpClient {
    #[instrument(skip(self))]
    async fn list_stores(&self, continuation_token: Option<String>) -> Result<Page<Store>> {
        let mut builder = self.request(Method::GET, "/stores");
        if let Some(token) = &continuation_token {
            builder = builder.query(&[("continuation_token", token)]);
        }

        let response: ListStoresResponse = self.send_json(builder).await?;
        debug!("Listed {} stores", response.stores.len());
        Ok(Page {
            items: response.stores,
            continuation_token: next_token(response.continuation_token),
        })
    }

    #[instrument(skip(self))]
    async fn create_store(&self, name: &str) -> Result<Store> {
        let builder = self
            .request(Method::POST, "/stores")
            .json(&CreateStoreRequest { name });
        let store: Store = self.send_json(builder).await?;
        info!(store_id = %store.id, "Created OpenFGA store {}", name);
        Ok(store)
    }

    #[instrument(skip(self))]
    async fn read_authorization_models(&self, store_id: &str) -> Result<Vec<AuthorizationModel>> {
        let builder = self.request(
            Method::GET,
            &format!("/stores/{}/authorization-models", store_id),
        );
        let response: ReadAuthorizationModelsResponse = self.send_json(builder).await?;
        Ok(response.authorization_models)
    }

    #[instrument(skip(self, model))]
    async fn write_authorization_model(
        &self,
        store_id: &str,
        model: &AuthorizationModel,
    ) -> Result<String> {
        let builder = self
            .request(
                Method::POST,
                &format!("/stores/{}/authorization-models", store_id),
            )
            .json(&WriteAuthorizationModelRequest {
                schema_version: &model.schema_version,
                type_definitions: &model.type_definitions,
            });
        let response: WriteAuthorizationModelResponse = self.send_json(builder).await?;
        info!(
            model_id = %response.authorization_model_id,
            "Authorization model written"
        );
        Ok(response.authorization_model_id)
    }

    #[instrument(skip(self))]
    async fn read(
        &self,
        store_id: &str,
        filter: &TupleFilter,
        continuation_token: Option<String>,
    ) -> Result<Page<Tuple>> {
        let builder = self
            .request(Method::POST, &format!("/stores/{}/read", store_id))
            .json(&ReadRequest {
                tuple_key: filter,
                page_size: READ_PAGE_SIZE,
                continuation_token,
            });
        let response: ReadResponse = self.send_json(builder).await?;
        debug!("Read {} tuples", response.tuples.len());
        Ok(Page {
            items: response.tuples,
            continuation_token: next_token(response.continuation_token),
        })
    }

    #[instrument(skip(self))]
    async fn write(
        &self,
        store_id: &str,
        model_id: &str,
        writes: Vec<TupleKey>,
        deletes: Vec<TupleKey>,
    ) -> Result<()> {
        let builder = self
            .request(Method::POST, &format!("/stores/{}/write", store_id))
            .json(&WriteRequest {
                writes: non_empty(writes),
                deletes: non_empty(deletes),
                authorization_model_id: model_id,
            });
        self.send(builder).await?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn check(&self, store_id: &str, model_id: &str, tuple_key: &TupleKey) -> Result<bool> {
        let builder = self
            .request(Method::POST, &format!("/stores/{}/check", store_id))
            .json(&CheckRequest {
                tuple_key,
                authorization_model_id: model_id,
            });
        let response: CheckResponse = self.send_json(builder).await?;
        debug!("Check {} -> {}", tuple_key, response.allowed);
        Ok(response.allowed)
    }
}
