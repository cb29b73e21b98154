//! High-level authorization client
//!
//! [`AuthorizationClient`] is the only surface application code uses. It is
//! pinned to one store and one model version by bootstrap and translates
//! [`Relationship`] values into tuple store calls.

use futures::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, instrument};

use strata_core::{
    AdministratorRole, AdministratorRoleAssignment, AuthzError, GroupId, ObjectRef, Relation,
    Relationship, ResourceType, Result, SpaceGroup, SpaceGroupRoleAssignment, SpaceId,
    SpaceResourceRole, SpaceRole, TupleFilter, TupleKey, UserId, APP_OBJECT_ID, MEMBER_RELATION,
};

use crate::client::OpenFgaHttpClient;
use crate::store::{Tuple, TupleStore};

/// Which objects group and permission listings may target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingScope {
    /// Only the default space
    #[default]
    DefaultSpaceOnly,
    /// Any space
    AnySpace,
}

impl ListingScope {
    /// Fails with `UnsupportedResource` when the object is out of scope
    pub fn ensure_listable(&self, resource_type: ResourceType, resource_id: &str) -> Result<()> {
        let in_scope = resource_type == ResourceType::Space
            && match self {
                ListingScope::DefaultSpaceOnly => resource_id == SpaceId::DEFAULT.to_string(),
                ListingScope::AnySpace => resource_id.parse::<SpaceId>().is_ok(),
            };

        if in_scope {
            Ok(())
        } else {
            Err(AuthzError::unsupported_resource(
                resource_type.as_str(),
                resource_id,
            ))
        }
    }
}

/// Behaviour switches for [`AuthorizationClient`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub listing_scope: ListingScope,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddResult {
    pub added_count: usize,
    pub exists_count: usize,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveResult {
    pub not_found_count: usize,
    pub removed_count: usize,
}

/// One entry of a [`AuthorizationClient::check_many`] batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Check {
    pub subject_id: UserId,
    pub relation: String,
    pub resource_type: ResourceType,
    pub resource_id: String,
}

impl Check {
    pub fn new(
        subject_id: impl Into<UserId>,
        relation: impl Relation,
        resource_type: ResourceType,
        resource_id: impl fmt::Display,
    ) -> Self {
        Self {
            subject_id: subject_id.into(),
            relation: relation.relation_name().to_string(),
            resource_type,
            resource_id: resource_id.to_string(),
        }
    }
}

enum Outcome {
    Applied,
    Unchanged,
}

fn user_object(subject_id: &str) -> String {
    format!("{}:{}", ResourceType::User, subject_id)
}

fn group_userset(group_id: GroupId) -> String {
    format!("{}:{}#{}", ResourceType::Group, group_id, MEMBER_RELATION)
}

/// Sorted, deduplicated relation names of `tuples`
fn relation_names(tuples: Vec<Tuple>) -> Vec<String> {
    tuples
        .into_iter()
        .map(|t| t.key.relation)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn parse_id<T: std::str::FromStr>(object: &str, expected: ResourceType) -> Result<T> {
    let object = ObjectRef::parse(object)?;
    if object.object_type != expected.as_str() {
        return Err(AuthzError::protocol(
            "unexpected_object_type",
            format!("expected {} object, got {}", expected, object),
        ));
    }
    object.id.parse().map_err(|_| {
        AuthzError::protocol("invalid_object_id", format!("invalid {} id: {}", expected, object.id))
    })
}

/// Authorization client pinned to one store and model version
pub struct AuthorizationClient<S = OpenFgaHttpClient> {
    store: Arc<S>,
    store_id: Arc<str>,
    model_id: Arc<str>,
    config: ClientConfig,
}

impl<S> Clone for AuthorizationClient<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            store_id: Arc::clone(&self.store_id),
            model_id: Arc::clone(&self.model_id),
            config: self.config.clone(),
        }
    }
}

impl<S> fmt::Debug for AuthorizationClient<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizationClient")
            .field("store_id", &self.store_id)
            .field("model_id", &self.model_id)
            .field("config", &self.config)
            .finish()
    }
}

impl<S: TupleStore> AuthorizationClient<S> {
    pub fn new(
        store: S,
        store_id: impl Into<String>,
        model_id: impl Into<String>,
        config: ClientConfig,
    ) -> Self {
        Self {
            store: Arc::new(store),
            store_id: Arc::from(store_id.into()),
            model_id: Arc::from(model_id.into()),
            config,
        }
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The underlying tuple store
    pub fn tuple_store(&self) -> &S {
        &self.store
    }

    async fn read_all(&self, filter: TupleFilter) -> Result<Vec<Tuple>> {
        self.store.read_all(&self.store_id, &filter).await
    }

    async fn write(&self, writes: Vec<TupleKey>, deletes: Vec<TupleKey>) -> Result<()> {
        self.store
            .write(&self.store_id, &self.model_id, writes, deletes)
            .await
    }

    // =========================================================================
    // Checks
    // =========================================================================

    async fn check_tuple(
        &self,
        subject_id: &str,
        relation: &str,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> Result<bool> {
        let tuple_key = TupleKey::new(
            user_object(subject_id),
            relation,
            format!("{}:{}", resource_type, resource_id),
        );
        self.store
            .check(&self.store_id, &self.model_id, &tuple_key)
            .await
    }

    /// Whether the user holds `relation` on the object. Every call round-trips
    /// to the tuple store.
    #[instrument(
        skip(self, relation, resource_id),
        fields(relation = relation.relation_name(), resource_id = %resource_id)
    )]
    pub async fn check(
        &self,
        subject_id: &str,
        relation: impl Relation + Send,
        resource_type: ResourceType,
        resource_id: impl fmt::Display + Send,
    ) -> Result<bool> {
        self.check_tuple(
            subject_id,
            relation.relation_name(),
            resource_type,
            &resource_id.to_string(),
        )
        .await
    }

    /// Run independent checks concurrently. Results are in input order.
    #[instrument(skip(self, checks), fields(count = checks.len()))]
    pub async fn check_many(&self, checks: Vec<Check>) -> Result<Vec<bool>> {
        let results = join_all(checks.iter().map(|c| {
            self.check_tuple(
                c.subject_id.as_str(),
                &c.relation,
                c.resource_type,
                &c.resource_id,
            )
        }))
        .await;
        results.into_iter().collect()
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Write `key` alongside `deletes`, treating an existing tuple as unchanged
    async fn write_new(&self, key: TupleKey, deletes: Vec<TupleKey>) -> Result<Outcome> {
        match self.write(vec![key], deletes).await {
            Ok(()) => Ok(Outcome::Applied),
            Err(AuthzError::AlreadyExists { .. }) => Ok(Outcome::Unchanged),
            Err(e) => Err(e),
        }
    }

    /// Whether `key` is already held, and the tuples of its family it replaces
    async fn conflicts(
        &self,
        relationship: &Relationship,
        key: &TupleKey,
    ) -> Result<(bool, Vec<TupleKey>)> {
        let existing = self
            .read_all(TupleFilter {
                user: Some(key.user.clone()),
                relation: None,
                object: key.object.clone(),
            })
            .await?;

        let present = existing.iter().any(|t| &t.key == key);
        let conflicts = existing
            .into_iter()
            .map(|t| t.key)
            .filter(|k| relationship.conflicts_with(&k.relation))
            .collect();
        Ok((present, conflicts))
    }

    async fn add_one(&self, relationship: &Relationship) -> Result<Outcome> {
        let key = relationship.to_tuple_key();

        if !relationship.exclusive() {
            return self.write_new(key, vec![]).await;
        }

        // A concurrent writer may delete a conflicting tuple between our read
        // and our write. Re-read once, then write the key on its own.
        for attempt in 0..2 {
            let (present, conflicts) = self.conflicts(relationship, &key).await?;
            if !conflicts.is_empty() {
                debug!(
                    "Replacing {} conflicting relation(s) for {}",
                    conflicts.len(),
                    key
                );
            }

            let result = if present {
                if conflicts.is_empty() {
                    return Ok(Outcome::Unchanged);
                }
                self.write(vec![], conflicts)
                    .await
                    .map(|()| Outcome::Unchanged)
            } else {
                self.write_new(key.clone(), conflicts).await
            };

            match result {
                Err(AuthzError::NotFound { .. }) => {
                    debug!(attempt, "Conflicting relation for {} already removed", key);
                }
                other => return other,
            }
        }

        self.write_new(key, vec![]).await
    }

    /// Write every relationship. Writes run concurrently and independently;
    /// tuples that already exist are counted, not treated as errors.
    #[instrument(skip(self, relationships))]
    pub async fn add<I>(&self, relationships: I) -> Result<AddResult>
    where
        I: IntoIterator,
        I::Item: Into<Relationship>,
    {
        let relationships: Vec<Relationship> = relationships.into_iter().map(Into::into).collect();
        debug!("Adding {} relationships", relationships.len());

        let outcomes = join_all(relationships.iter().map(|r| self.add_one(r))).await;

        let mut result = AddResult::default();
        let mut first_error = None;
        for outcome in outcomes {
            match outcome {
                Ok(Outcome::Applied) => result.added_count += 1,
                Ok(Outcome::Unchanged) => result.exists_count += 1,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(result),
        }
    }

    async fn remove_one(&self, relationship: &Relationship) -> Result<Outcome> {
        match self.write(vec![], vec![relationship.to_tuple_key()]).await {
            Ok(()) => Ok(Outcome::Applied),
            Err(AuthzError::NotFound { .. }) => Ok(Outcome::Unchanged),
            Err(e) => Err(e),
        }
    }

    /// Delete every relationship. Deletes run concurrently and independently;
    /// tuples that do not exist are counted, not treated as errors.
    #[instrument(skip(self, relationships))]
    pub async fn remove<I>(&self, relationships: I) -> Result<RemoveResult>
    where
        I: IntoIterator,
        I::Item: Into<Relationship>,
    {
        let relationships: Vec<Relationship> = relationships.into_iter().map(Into::into).collect();
        debug!("Removing {} relationships", relationships.len());

        let outcomes = join_all(relationships.iter().map(|r| self.remove_one(r))).await;

        let mut result = RemoveResult::default();
        let mut first_error = None;
        for outcome in outcomes {
            match outcome {
                Ok(Outcome::Applied) => result.removed_count += 1,
                Ok(Outcome::Unchanged) => result.not_found_count += 1,
                Err(e) => {
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(result),
        }
    }

    // =========================================================================
    // Listings
    // =========================================================================

    /// Groups the user is a direct member of, sorted
    #[instrument(skip(self))]
    pub async fn list_groups(&self, subject_id: &str) -> Result<Vec<GroupId>> {
        let tuples = self
            .read_all(
                TupleFilter::user_on_type(user_object(subject_id), ResourceType::Group)
                    .with_relation(MEMBER_RELATION),
            )
            .await?;

        let groups = tuples
            .iter()
            .map(|t| parse_id(&t.key.object, ResourceType::Group))
            .collect::<Result<BTreeSet<GroupId>>>()?;
        Ok(groups.into_iter().collect())
    }

    /// Relations the group holds on the object, sorted
    #[instrument(skip(self))]
    pub async fn list_group_permissions(
        &self,
        group_id: GroupId,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> Result<Vec<String>> {
        self.config
            .listing_scope
            .ensure_listable(resource_type, resource_id)?;

        let tuples = self
            .read_all(TupleFilter::object(resource_type, resource_id).with_user(group_userset(group_id)))
            .await?;
        Ok(relation_names(tuples))
    }

    /// Relations the user holds on the object directly or through any of
    /// their groups, sorted and deduplicated
    #[instrument(skip(self))]
    pub async fn list_permissions(
        &self,
        subject_id: &str,
        resource_type: ResourceType,
        resource_id: &str,
    ) -> Result<Vec<String>> {
        self.config
            .listing_scope
            .ensure_listable(resource_type, resource_id)?;

        let groups = self.list_groups(subject_id).await?;
        let group_permissions = join_all(
            groups
                .into_iter()
                .map(|group| self.list_group_permissions(group, resource_type, resource_id)),
        )
        .await;

        let mut permissions = BTreeSet::new();
        for result in group_permissions {
            permissions.extend(result?);
        }

        let direct = self
            .read_all(
                TupleFilter::object(resource_type, resource_id).with_user(user_object(subject_id)),
            )
            .await?;
        permissions.extend(direct.into_iter().map(|t| t.key.relation));

        Ok(permissions.into_iter().collect())
    }

    /// Every user holding an administrator role, sorted by user id
    #[instrument(skip(self))]
    pub async fn list_administrators(&self) -> Result<Vec<(UserId, AdministratorRole)>> {
        let tuples = self
            .read_all(TupleFilter::object(ResourceType::App, APP_OBJECT_ID))
            .await?;

        let mut administrators = Vec::new();
        for tuple in tuples {
            let user = tuple.key.user_ref()?;
            if user.object_type != ResourceType::User.as_str() || user.relation.is_some() {
                continue;
            }
            if let Ok(role) = tuple.key.relation.parse::<AdministratorRole>() {
                administrators.push((UserId::new(user.id), role));
            }
        }

        administrators.sort_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)));
        Ok(administrators)
    }

    /// Relations held directly by the user on a space, sorted
    #[instrument(skip(self))]
    pub async fn list_user_roles(&self, subject_id: &str, space_id: SpaceId) -> Result<Vec<String>> {
        let tuples = self
            .read_all(TupleFilter::object(ResourceType::Space, space_id).with_user(user_object(subject_id)))
            .await?;
        Ok(relation_names(tuples))
    }

    /// Relations held directly by the user on a reference, sorted
    #[instrument(skip(self))]
    pub async fn list_reference_roles(
        &self,
        subject_id: &str,
        reference_id: &str,
    ) -> Result<Vec<String>> {
        let tuples = self
            .read_all(
                TupleFilter::object(ResourceType::Reference, reference_id)
                    .with_user(user_object(subject_id)),
            )
            .await?;
        Ok(relation_names(tuples))
    }

    /// Spaces the user is a direct member or owner of, sorted
    #[instrument(skip(self))]
    pub async fn list_user_spaces(&self, subject_id: &str) -> Result<Vec<SpaceId>> {
        let tuples = self
            .read_all(TupleFilter::user_on_type(user_object(subject_id), ResourceType::Space))
            .await?;

        let spaces = tuples
            .iter()
            .filter(|t| t.key.relation.parse::<SpaceRole>().is_ok())
            .map(|t| parse_id(&t.key.object, ResourceType::Space))
            .collect::<Result<BTreeSet<SpaceId>>>()?;
        Ok(spaces.into_iter().collect())
    }

    /// The user's administrator role, if any
    #[instrument(skip(self))]
    pub async fn get_administrator(
        &self,
        subject_id: &str,
    ) -> Result<(UserId, Option<AdministratorRole>)> {
        let tuples = self
            .read_all(
                TupleFilter::object(ResourceType::App, APP_OBJECT_ID)
                    .with_user(user_object(subject_id)),
            )
            .await?;

        let role = tuples
            .iter()
            .filter_map(|t| t.key.relation.parse::<AdministratorRole>().ok())
            .max();
        Ok((UserId::from(subject_id), role))
    }

    // =========================================================================
    // Compound Operations
    // =========================================================================

    /// Replace the user's administrator role, or revoke it with `None`
    #[instrument(skip(self))]
    pub async fn set_administrator_role(
        &self,
        subject_id: &str,
        role: Option<AdministratorRole>,
    ) -> Result<()> {
        match role {
            Some(role) => {
                self.add([AdministratorRoleAssignment::new(subject_id, role)])
                    .await?;
            }
            None => {
                let held: Vec<AdministratorRoleAssignment> = self
                    .read_all(
                        TupleFilter::object(ResourceType::App, APP_OBJECT_ID)
                            .with_user(user_object(subject_id)),
                    )
                    .await?
                    .iter()
                    .filter_map(|t| t.key.relation.parse::<AdministratorRole>().ok())
                    .map(|r| AdministratorRoleAssignment::new(subject_id, r))
                    .collect();
                self.remove(held).await?;
            }
        }
        Ok(())
    }

    /// Remove every role the group holds on the default space
    #[instrument(skip(self))]
    pub async fn delete_group(&self, group_id: GroupId) -> Result<RemoveResult> {
        let relations = self
            .list_group_permissions(
                group_id,
                ResourceType::Space,
                &SpaceId::DEFAULT.to_string(),
            )
            .await?;

        let mut relationships: Vec<Relationship> = Vec::with_capacity(relations.len());
        for relation in relations {
            if relation == MEMBER_RELATION {
                relationships.push(SpaceGroup::new(SpaceId::DEFAULT, group_id).into());
            } else {
                let role: SpaceResourceRole = relation.parse()?;
                relationships.push(SpaceGroupRoleAssignment::new(group_id, role).into());
            }
        }

        self.remove(relationships).await
    }
}
