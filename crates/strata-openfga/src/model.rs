//! OpenFGA authorization model for Strata
//!
//! The model is compiled from the role and permission vocabulary in
//! `strata-core` rather than kept as schema text, so a new role or permission
//! reaches the tuple store without a second edit. It serializes to the
//! schema 1.1 JSON document accepted by `POST /stores/{id}/authorization-models`.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use strata_core::{
    AdministratorRole, Permission, ReferenceRole, Relation, ResourceType, SpaceResourceRole,
    SpaceRole, MEMBER_RELATION, PARENT_RELATION,
};

pub const SCHEMA_VERSION: &str = "1.1";

/// A complete authorization model document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizationModel {
    /// Assigned by the store; absent on models that have not been written
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub schema_version: String,
    pub type_definitions: Vec<TypeDefinition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeDefinition {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub relations: BTreeMap<String, Userset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Metadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    #[serde(default)]
    pub relations: BTreeMap<String, RelationMetadata>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationMetadata {
    #[serde(default)]
    pub directly_related_user_types: Vec<RelationReference>,
}

/// A user type allowed in tuples written directly to a relation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RelationReference {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl RelationReference {
    pub fn direct(type_name: ResourceType) -> Self {
        Self {
            type_name: type_name.to_string(),
            relation: None,
        }
    }

    pub fn userset(type_name: ResourceType, relation: &str) -> Self {
        Self {
            type_name: type_name.to_string(),
            relation: Some(relation.to_string()),
        }
    }

    fn key(&self) -> (&str, Option<&str>) {
        (
            self.type_name.as_str(),
            self.relation.as_deref().filter(|r| !r.is_empty()),
        )
    }
}

/// Rewrite rule defining who holds a relation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Userset {
    /// Subjects named by tuples written to the relation itself
    #[serde(rename = "this")]
    This(DirectUserset),
    #[serde(rename = "computedUserset")]
    ComputedUserset(ObjectRelation),
    #[serde(rename = "tupleToUserset")]
    TupleToUserset(TupleToUserset),
    #[serde(rename = "union")]
    Union(Usersets),
    #[serde(rename = "intersection")]
    Intersection(Usersets),
    #[serde(rename = "difference")]
    Difference(Difference),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DirectUserset {}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectRelation {
    #[serde(default)]
    pub object: String,
    #[serde(default)]
    pub relation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleToUserset {
    pub tupleset: ObjectRelation,
    #[serde(rename = "computedUserset")]
    pub computed_userset: ObjectRelation,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usersets {
    pub child: Vec<Userset>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Difference {
    pub base: Box<Userset>,
    pub subtract: Box<Userset>,
}

impl Userset {
    pub fn this() -> Self {
        Userset::This(DirectUserset {})
    }

    pub fn computed(relation: &str) -> Self {
        Userset::ComputedUserset(ObjectRelation {
            object: String::new(),
            relation: relation.to_string(),
        })
    }

    /// `computed from tupleset`
    pub fn tuple_to_userset(tupleset: &str, computed: &str) -> Self {
        Userset::TupleToUserset(TupleToUserset {
            tupleset: ObjectRelation {
                object: String::new(),
                relation: tupleset.to_string(),
            },
            computed_userset: ObjectRelation {
                object: String::new(),
                relation: computed.to_string(),
            },
        })
    }

    /// Union of `children`, collapsed to the child itself when there is one
    pub fn any_of(mut children: Vec<Userset>) -> Self {
        if children.len() == 1 {
            return children.remove(0);
        }
        Userset::Union(Usersets { child: children })
    }

    pub fn all_of(children: Vec<Userset>) -> Self {
        Userset::Intersection(Usersets { child: children })
    }
}

impl TypeDefinition {
    pub fn new(type_name: ResourceType) -> Self {
        Self {
            type_name: type_name.to_string(),
            relations: BTreeMap::new(),
            metadata: None,
        }
    }

    /// Add a relation. `direct` lists the user types tuples on the relation
    /// may name and must be non-empty whenever `userset` contains `this`.
    pub fn relation(
        mut self,
        name: &str,
        userset: Userset,
        direct: Vec<RelationReference>,
    ) -> Self {
        self.relations.insert(name.to_string(), userset);
        if !direct.is_empty() {
            self.metadata.get_or_insert_with(Metadata::default).relations.insert(
                name.to_string(),
                RelationMetadata {
                    directly_related_user_types: direct,
                },
            );
        }
        self
    }

    /// User types allowed on `relation`; empty if it accepts no direct tuples
    pub fn directly_related_user_types(&self, relation: &str) -> &[RelationReference] {
        self.metadata
            .as_ref()
            .and_then(|m| m.relations.get(relation))
            .map(|m| m.directly_related_user_types.as_slice())
            .unwrap_or_default()
    }
}

type CanonicalRelations<'a> = BTreeMap<&'a str, (&'a Userset, BTreeSet<(&'a str, Option<&'a str>)>)>;

impl AuthorizationModel {
    pub fn new(type_definitions: Vec<TypeDefinition>) -> Self {
        Self {
            id: None,
            schema_version: SCHEMA_VERSION.to_string(),
            type_definitions,
        }
    }

    pub fn type_definition(&self, type_name: &str) -> Option<&TypeDefinition> {
        self.type_definitions
            .iter()
            .find(|t| t.type_name == type_name)
    }

    /// Whether both models define the same types, relations, rewrite rules
    /// and directly related user types, ignoring ids, ordering and fields the
    /// store adds when echoing a model back
    pub fn is_equivalent(&self, other: &AuthorizationModel) -> bool {
        self.schema_version == other.schema_version && self.canonical() == other.canonical()
    }

    fn canonical(&self) -> BTreeMap<&str, CanonicalRelations<'_>> {
        self.type_definitions
            .iter()
            .map(|t| {
                let relations = t
                    .relations
                    .iter()
                    .map(|(name, userset)| {
                        let direct = t
                            .directly_related_user_types(name)
                            .iter()
                            .map(RelationReference::key)
                            .collect();
                        (name.as_str(), (userset, direct))
                    })
                    .collect();
                (t.type_name.as_str(), relations)
            })
            .collect()
    }
}

fn permissions_on(resource_type: ResourceType) -> impl Iterator<Item = Permission> {
    Permission::ALL
        .into_iter()
        .filter(move |p| p.resource_type() == resource_type)
}

fn permission_rule(permission: Permission) -> Userset {
    Userset::any_of(
        permission
            .granted_by()
            .iter()
            .map(|relation| Userset::computed(relation))
            .collect(),
    )
}

fn app_type() -> TypeDefinition {
    AdministratorRole::ALL
        .into_iter()
        .fold(TypeDefinition::new(ResourceType::App), |def, role| {
            let userset = match role.next_higher() {
                Some(higher) => Userset::any_of(vec![
                    Userset::this(),
                    Userset::computed(higher.relation_name()),
                ]),
                None => Userset::this(),
            };
            def.relation(
                role.relation_name(),
                userset,
                vec![RelationReference::direct(ResourceType::User)],
            )
        })
}

fn space_type() -> TypeDefinition {
    let owner = SpaceRole::Owner.relation_name();
    let member = SpaceRole::Member.relation_name();

    let def = TypeDefinition::new(ResourceType::Space)
        .relation(
            owner,
            Userset::this(),
            vec![RelationReference::direct(ResourceType::User)],
        )
        .relation(
            member,
            Userset::any_of(vec![Userset::this(), Userset::computed(owner)]),
            vec![
                RelationReference::direct(ResourceType::User),
                RelationReference::userset(ResourceType::Group, MEMBER_RELATION),
            ],
        );

    let def = SpaceResourceRole::ALL.into_iter().fold(def, |def, role| {
        def.relation(
            role.relation_name(),
            Userset::all_of(vec![Userset::this(), Userset::computed(member)]),
            vec![
                RelationReference::direct(ResourceType::User),
                RelationReference::userset(ResourceType::Group, MEMBER_RELATION),
                RelationReference::userset(ResourceType::Space, MEMBER_RELATION),
            ],
        )
    });

    permissions_on(ResourceType::Space).fold(def, |def, permission| {
        def.relation(permission.relation_name(), permission_rule(permission), vec![])
    })
}

fn reference_type() -> TypeDefinition {
    let def = TypeDefinition::new(ResourceType::Reference).relation(
        PARENT_RELATION,
        Userset::this(),
        vec![RelationReference::direct(ResourceType::Space)],
    );

    let def = ReferenceRole::ALL.into_iter().fold(def, |def, role| {
        let mut children = vec![Userset::this()];
        if let Some(higher) = role.next_higher() {
            children.push(Userset::computed(higher.relation_name()));
        }
        children.push(Userset::tuple_to_userset(
            PARENT_RELATION,
            role.space_role().relation_name(),
        ));
        if role == ReferenceRole::Manager {
            children.push(Userset::tuple_to_userset(
                PARENT_RELATION,
                SpaceRole::Owner.relation_name(),
            ));
        }

        def.relation(
            role.relation_name(),
            Userset::any_of(children),
            vec![
                RelationReference::direct(ResourceType::User),
                RelationReference::userset(ResourceType::Group, MEMBER_RELATION),
            ],
        )
    });

    permissions_on(ResourceType::Reference).fold(def, |def, permission| {
        def.relation(permission.relation_name(), permission_rule(permission), vec![])
    })
}

/// The authorization model every Strata store is provisioned with
pub fn authorization_model() -> AuthorizationModel {
    AuthorizationModel::new(vec![
        TypeDefinition::new(ResourceType::User),
        TypeDefinition::new(ResourceType::Group).relation(
            MEMBER_RELATION,
            Userset::this(),
            vec![RelationReference::direct(ResourceType::User)],
        ),
        app_type(),
        space_type(),
        reference_type(),
    ])
}
