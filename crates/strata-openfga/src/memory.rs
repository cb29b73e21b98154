//! In-process tuple store
//!
//! Stores tuples in memory and resolves checks against the stored
//! authorization model the same way OpenFGA does: direct tuples (including
//! userset tuples such as `group:3#member`), computed usersets,
//! tuple-to-userset rewrites, union, intersection and difference. Writes are
//! validated against the model's directly related user types.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use strata_core::{AuthzError, ObjectRef, Result, TupleFilter, TupleKey};

use crate::model::{AuthorizationModel, Userset};
use crate::store::{Page, Store, Tuple, TupleStore};

/// Maximum rewrite depth before a check is rejected
const MAX_RESOLUTION_DEPTH: u32 = 25;

const DEFAULT_PAGE_SIZE: usize = 50;

#[derive(Debug, Default)]
struct StoreState {
    store: Option<Store>,
    /// Oldest first
    models: Vec<AuthorizationModel>,
    tuples: BTreeMap<TupleKey, DateTime<Utc>>,
}

#[derive(Debug, Default)]
struct State {
    /// Keyed by store id, in creation order
    stores: Vec<(String, StoreState)>,
}

impl State {
    fn store(&self, store_id: &str) -> Result<&StoreState> {
        self.stores
            .iter()
            .find(|(id, _)| id == store_id)
            .map(|(_, state)| state)
            .ok_or_else(|| store_not_found(store_id))
    }

    fn store_mut(&mut self, store_id: &str) -> Result<&mut StoreState> {
        self.stores
            .iter_mut()
            .find(|(id, _)| id == store_id)
            .map(|(_, state)| state)
            .ok_or_else(|| store_not_found(store_id))
    }
}

fn store_not_found(store_id: &str) -> AuthzError {
    AuthzError::protocol("store_id_not_found", format!("store {} not found", store_id))
}

fn validation_error(message: String) -> AuthzError {
    AuthzError::protocol("validation_error", message)
}

/// Parse a pagination token produced by this store
fn offset(token: Option<String>) -> Result<usize> {
    match token {
        Some(token) => token
            .parse()
            .map_err(|_| AuthzError::protocol("invalid_continuation_token", token)),
        None => Ok(0),
    }
}

fn paginate<T: Clone>(items: &[T], start: usize, page_size: usize) -> Page<T> {
    let end = (start + page_size).min(items.len());
    let items_page = items.get(start..end).map(<[T]>::to_vec).unwrap_or_default();
    Page {
        items: items_page,
        continuation_token: (end < items.len()).then(|| end.to_string()),
    }
}

/// Tuple store held entirely in memory. Clones share state.
#[derive(Debug, Clone)]
pub struct MemoryTupleStore {
    state: Arc<RwLock<State>>,
    page_size: usize,
}

impl Default for MemoryTupleStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryTupleStore {
    pub fn new() -> Self {
        Self::with_page_size(DEFAULT_PAGE_SIZE)
    }

    /// Store that returns at most `page_size` items per listing call
    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            state: Arc::new(RwLock::new(State::default())),
            page_size: page_size.max(1),
        }
    }

    /// Number of tuples currently held by a store
    pub async fn tuple_count(&self, store_id: &str) -> Result<usize> {
        let state = self.state.read().await;
        Ok(state.store(store_id)?.tuples.len())
    }
}

fn find_model<'a>(state: &'a StoreState, model_id: &str) -> Result<&'a AuthorizationModel> {
    state
        .models
        .iter()
        .find(|m| m.id.as_deref() == Some(model_id))
        .ok_or_else(|| {
            AuthzError::protocol(
                "authorization_model_not_found",
                format!("authorization model {} not found", model_id),
            )
        })
}

fn validate_tuple(model: &AuthorizationModel, key: &TupleKey) -> Result<()> {
    let object = key.object_ref()?;
    let user = key.user_ref()?;

    let type_def = model
        .type_definition(&object.object_type)
        .ok_or_else(|| validation_error(format!("type '{}' not found", object.object_type)))?;

    if !type_def.relations.contains_key(&key.relation) {
        return Err(validation_error(format!(
            "relation '{}#{}' not found",
            object.object_type, key.relation
        )));
    }

    let allowed = type_def
        .directly_related_user_types(&key.relation)
        .iter()
        .any(|r| {
            r.type_name == user.object_type
                && r.relation.as_deref().filter(|rel| !rel.is_empty()) == user.relation.as_deref()
        });

    if allowed {
        Ok(())
    } else {
        Err(validation_error(format!(
            "invalid user type for relation '{}#{}': {}",
            object.object_type, key.relation, key.user
        )))
    }
}

/// Resolves checks against one model and tuple set
struct Resolver<'a> {
    model: &'a AuthorizationModel,
    tuples: &'a BTreeMap<TupleKey, DateTime<Utc>>,
}

impl Resolver<'_> {
    fn check(&self, user: &str, relation: &str, object: &str, depth: u32) -> Result<bool> {
        if depth > MAX_RESOLUTION_DEPTH {
            return Err(AuthzError::protocol(
                "authorization_model_resolution_too_complex",
                "resolution depth exceeded",
            ));
        }

        let object_ref = ObjectRef::parse(object)?;
        let userset = self
            .model
            .type_definition(&object_ref.object_type)
            .and_then(|t| t.relations.get(relation))
            .ok_or_else(|| {
                validation_error(format!(
                    "relation '{}#{}' not found",
                    object_ref.object_type, relation
                ))
            })?;

        self.evaluate(userset, user, relation, object, depth)
    }

    fn related<'t>(
        &'t self,
        relation: &'t str,
        object: &'t str,
    ) -> impl Iterator<Item = &'t TupleKey> + 't {
        let tuples: &'t BTreeMap<TupleKey, DateTime<Utc>> = self.tuples;
        tuples
            .keys()
            .filter(move |k| k.relation == relation && k.object == object)
    }

    fn evaluate(
        &self,
        userset: &Userset,
        user: &str,
        relation: &str,
        object: &str,
        depth: u32,
    ) -> Result<bool> {
        match userset {
            Userset::This(_) => {
                for key in self.related(relation, object) {
                    if key.user == user {
                        return Ok(true);
                    }
                    if let Some((set_object, set_relation)) = key.user.split_once('#') {
                        if self.check(user, set_relation, set_object, depth + 1)? {
                            return Ok(true);
                        }
                    }
                }
                Ok(false)
            }
            Userset::ComputedUserset(computed) => {
                self.check(user, &computed.relation, object, depth + 1)
            }
            Userset::TupleToUserset(ttu) => {
                for key in self.related(&ttu.tupleset.relation, object) {
                    let parent = key.user_ref()?;
                    let defines_relation = self
                        .model
                        .type_definition(&parent.object_type)
                        .is_some_and(|t| t.relations.contains_key(&ttu.computed_userset.relation));
                    if defines_relation
                        && self.check(
                            user,
                            &ttu.computed_userset.relation,
                            &parent.object(),
                            depth + 1,
                        )?
                    {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Userset::Union(usersets) => {
                for child in &usersets.child {
                    if self.evaluate(child, user, relation, object, depth + 1)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Userset::Intersection(usersets) => {
                for child in &usersets.child {
                    if !self.evaluate(child, user, relation, object, depth + 1)? {
                        return Ok(false);
                    }
                }
                Ok(!usersets.child.is_empty())
            }
            Userset::Difference(difference) => Ok(self.evaluate(
                &difference.base,
                user,
                relation,
                object,
                depth + 1,
            )? && !self.evaluate(
                &difference.subtract,
                user,
                relation,
                object,
                depth + 1,
            )?),
        }
    }
}

#[async_trait]
impl TupleStore for MemoryTupleStore {
    async fn list_stores(&self, continuation_token: Option<String>) -> Result<Page<Store>> {
        let start = offset(continuation_token)?;
        let state = self.state.read().await;
        let stores: Vec<Store> = state
            .stores
            .iter()
            .filter_map(|(_, s)| s.store.clone())
            .collect();
        Ok(paginate(&stores, start, self.page_size))
    }

    async fn create_store(&self, name: &str) -> Result<Store> {
        let now = Utc::now();
        let store = Store {
            id: Uuid::new_v4().simple().to_string().to_uppercase(),
            name: name.to_string(),
            created_at: Some(now),
            updated_at: Some(now),
        };

        let mut state = self.state.write().await;
        state.stores.push((
            store.id.clone(),
            StoreState {
                store: Some(store.clone()),
                ..StoreState::default()
            },
        ));
        debug!(store_id = %store.id, "Created in-memory store {}", name);
        Ok(store)
    }

    async fn read_authorization_models(&self, store_id: &str) -> Result<Vec<AuthorizationModel>> {
        let state = self.state.read().await;
        Ok(state.store(store_id)?.models.iter().rev().cloned().collect())
    }

    async fn write_authorization_model(
        &self,
        store_id: &str,
        model: &AuthorizationModel,
    ) -> Result<String> {
        let mut state = self.state.write().await;
        let store = state.store_mut(store_id)?;

        let id = Uuid::new_v4().simple().to_string().to_uppercase();
        let mut stored = model.clone();
        stored.id = Some(id.clone());
        store.models.push(stored);
        Ok(id)
    }

    async fn read(
        &self,
        store_id: &str,
        filter: &TupleFilter,
        continuation_token: Option<String>,
    ) -> Result<Page<Tuple>> {
        if filter.user.is_none() && filter.object.ends_with(':') {
            return Err(validation_error(
                "the 'user' field must be set when 'object' is only a type".to_string(),
            ));
        }

        let start = offset(continuation_token)?;
        let state = self.state.read().await;
        let tuples: Vec<Tuple> = state
            .store(store_id)?
            .tuples
            .iter()
            .filter(|(key, _)| filter.matches(key))
            .map(|(key, timestamp)| Tuple {
                key: key.clone(),
                timestamp: *timestamp,
            })
            .collect();
        Ok(paginate(&tuples, start, self.page_size))
    }

    async fn write(
        &self,
        store_id: &str,
        model_id: &str,
        writes: Vec<TupleKey>,
        deletes: Vec<TupleKey>,
    ) -> Result<()> {
        let mut state = self.state.write().await;
        let store = state.store_mut(store_id)?;
        let model = find_model(store, model_id)?;

        for key in &writes {
            validate_tuple(model, key)?;
            if store.tuples.contains_key(key) {
                return Err(AuthzError::already_exists(format!(
                    "cannot write a tuple which already exists: {}",
                    key
                )));
            }
        }
        for key in &deletes {
            if !store.tuples.contains_key(key) {
                return Err(AuthzError::not_found(format!(
                    "cannot delete a tuple which does not exist: {}",
                    key
                )));
            }
        }

        for key in &deletes {
            store.tuples.remove(key);
        }
        let now = Utc::now();
        for key in writes {
            store.tuples.insert(key, now);
        }
        Ok(())
    }

    async fn check(&self, store_id: &str, model_id: &str, tuple_key: &TupleKey) -> Result<bool> {
        let state = self.state.read().await;
        let store = state.store(store_id)?;
        let resolver = Resolver {
            model: find_model(store, model_id)?,
            tuples: &store.tuples,
        };
        resolver.check(&tuple_key.user, &tuple_key.relation, &tuple_key.object, 0)
    }
}
