//! Relationship descriptors
//!
//! Each variant describes one authorization fact and knows how to render
//! itself as a [`TupleKey`]. Exclusive variants carry a [`RelationFamily`]:
//! writing one replaces any other relation of that family the subject holds on
//! the same object.

use serde::{Deserialize, Serialize};

use crate::ids::{GroupId, ReferenceId, SpaceId, UserId, APP_OBJECT_ID};
use crate::resource::ResourceType;
use crate::roles::{
    AdministratorRole, Relation, ReferenceRole, RoleFamily, SpaceResourceRole, SpaceRole,
};
use crate::tuple::TupleKey;

/// Relation name linking a reference to the space that contains it
pub const PARENT_RELATION: &str = "parent";

/// Relation name for group and space membership usersets
pub const MEMBER_RELATION: &str = "member";

/// Set of relations of which a subject may hold at most one per object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationFamily {
    Administrator,
    SpaceResource(RoleFamily),
    Reference,
}

impl RelationFamily {
    /// Whether `relation` names a member of this family
    pub fn contains(&self, relation: &str) -> bool {
        match self {
            RelationFamily::Administrator => relation.parse::<AdministratorRole>().is_ok(),
            RelationFamily::SpaceResource(family) => relation
                .parse::<SpaceResourceRole>()
                .is_ok_and(|role| role.family() == *family),
            RelationFamily::Reference => relation.parse::<ReferenceRole>().is_ok(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AdministratorRoleAssignment {
    pub user_id: UserId,
    pub role: AdministratorRole,
}

impl AdministratorRoleAssignment {
    pub fn new(user_id: impl Into<UserId>, role: AdministratorRole) -> Self {
        Self {
            user_id: user_id.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceMembership {
    pub user_id: UserId,
    pub space_id: SpaceId,
    pub role: SpaceRole,
}

impl SpaceMembership {
    pub fn new(user_id: impl Into<UserId>, space_id: SpaceId, role: SpaceRole) -> Self {
        Self {
            user_id: user_id.into(),
            space_id,
            role,
        }
    }
}

/// Role every member of a space receives on that space
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceBaseRoleAssignment {
    pub space_id: SpaceId,
    pub role: SpaceResourceRole,
}

impl SpaceBaseRoleAssignment {
    pub fn new(space_id: SpaceId, role: SpaceResourceRole) -> Self {
        Self { space_id, role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceUserRoleAssignment {
    pub space_id: SpaceId,
    pub user_id: UserId,
    pub role: SpaceResourceRole,
}

impl SpaceUserRoleAssignment {
    pub fn new(space_id: SpaceId, user_id: impl Into<UserId>, role: SpaceResourceRole) -> Self {
        Self {
            space_id,
            user_id: user_id.into(),
            role,
        }
    }
}

/// Role held by every member of a group on the default space
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceGroupRoleAssignment {
    pub group_id: GroupId,
    pub role: SpaceResourceRole,
}

impl SpaceGroupRoleAssignment {
    pub fn new(group_id: GroupId, role: SpaceResourceRole) -> Self {
        Self { group_id, role }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceUserRoleAssignment {
    pub reference_id: ReferenceId,
    pub user_id: UserId,
    pub role: ReferenceRole,
}

impl ReferenceUserRoleAssignment {
    pub fn new(
        reference_id: impl Into<ReferenceId>,
        user_id: impl Into<UserId>,
        role: ReferenceRole,
    ) -> Self {
        Self {
            reference_id: reference_id.into(),
            user_id: user_id.into(),
            role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceGroupRoleAssignment {
    pub reference_id: ReferenceId,
    pub group_id: GroupId,
    pub role: ReferenceRole,
}

impl ReferenceGroupRoleAssignment {
    pub fn new(reference_id: impl Into<ReferenceId>, group_id: GroupId, role: ReferenceRole) -> Self {
        Self {
            reference_id: reference_id.into(),
            group_id,
            role,
        }
    }
}

/// Places a reference inside a space
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReferenceSpace {
    pub reference_id: ReferenceId,
    pub space_id: SpaceId,
}

impl ReferenceSpace {
    pub fn new(reference_id: impl Into<ReferenceId>, space_id: SpaceId) -> Self {
        Self {
            reference_id: reference_id.into(),
            space_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GroupMembership {
    pub user_id: UserId,
    pub group_id: GroupId,
}

impl GroupMembership {
    pub fn new(user_id: impl Into<UserId>, group_id: GroupId) -> Self {
        Self {
            user_id: user_id.into(),
            group_id,
        }
    }
}

/// Makes every member of a group a member of a space
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SpaceGroup {
    pub space_id: SpaceId,
    pub group_id: GroupId,
}

impl SpaceGroup {
    pub fn new(space_id: SpaceId, group_id: GroupId) -> Self {
        Self { space_id, group_id }
    }
}

/// Any authorization fact the client can write or delete
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Relationship {
    AdministratorRoleAssignment(AdministratorRoleAssignment),
    SpaceMembership(SpaceMembership),
    SpaceBaseRoleAssignment(SpaceBaseRoleAssignment),
    SpaceUserRoleAssignment(SpaceUserRoleAssignment),
    SpaceGroupRoleAssignment(SpaceGroupRoleAssignment),
    ReferenceUserRoleAssignment(ReferenceUserRoleAssignment),
    ReferenceGroupRoleAssignment(ReferenceGroupRoleAssignment),
    ReferenceSpace(ReferenceSpace),
    GroupMembership(GroupMembership),
    SpaceGroup(SpaceGroup),
}

impl Relationship {
    pub fn subject_type(&self) -> ResourceType {
        match self {
            Relationship::AdministratorRoleAssignment(_)
            | Relationship::SpaceMembership(_)
            | Relationship::SpaceUserRoleAssignment(_)
            | Relationship::ReferenceUserRoleAssignment(_)
            | Relationship::GroupMembership(_) => ResourceType::User,
            Relationship::SpaceBaseRoleAssignment(_) | Relationship::ReferenceSpace(_) => {
                ResourceType::Space
            }
            Relationship::SpaceGroupRoleAssignment(_)
            | Relationship::ReferenceGroupRoleAssignment(_)
            | Relationship::SpaceGroup(_) => ResourceType::Group,
        }
    }

    pub fn subject_id(&self) -> String {
        match self {
            Relationship::AdministratorRoleAssignment(r) => r.user_id.to_string(),
            Relationship::SpaceMembership(r) => r.user_id.to_string(),
            Relationship::SpaceBaseRoleAssignment(r) => r.space_id.to_string(),
            Relationship::SpaceUserRoleAssignment(r) => r.user_id.to_string(),
            Relationship::SpaceGroupRoleAssignment(r) => r.group_id.to_string(),
            Relationship::ReferenceUserRoleAssignment(r) => r.user_id.to_string(),
            Relationship::ReferenceGroupRoleAssignment(r) => r.group_id.to_string(),
            Relationship::ReferenceSpace(r) => r.space_id.to_string(),
            Relationship::GroupMembership(r) => r.user_id.to_string(),
            Relationship::SpaceGroup(r) => r.group_id.to_string(),
        }
    }

    /// Relation on the subject when the subject is a userset
    pub fn subject_relation(&self) -> Option<&'static str> {
        match self {
            Relationship::SpaceBaseRoleAssignment(_)
            | Relationship::SpaceGroupRoleAssignment(_)
            | Relationship::ReferenceGroupRoleAssignment(_)
            | Relationship::SpaceGroup(_) => Some(MEMBER_RELATION),
            _ => None,
        }
    }

    pub fn relation(&self) -> &'static str {
        match self {
            Relationship::AdministratorRoleAssignment(r) => r.role.relation_name(),
            Relationship::SpaceMembership(r) => r.role.relation_name(),
            Relationship::SpaceBaseRoleAssignment(r) => r.role.relation_name(),
            Relationship::SpaceUserRoleAssignment(r) => r.role.relation_name(),
            Relationship::SpaceGroupRoleAssignment(r) => r.role.relation_name(),
            Relationship::ReferenceUserRoleAssignment(r) => r.role.relation_name(),
            Relationship::ReferenceGroupRoleAssignment(r) => r.role.relation_name(),
            Relationship::ReferenceSpace(_) => PARENT_RELATION,
            Relationship::GroupMembership(_) | Relationship::SpaceGroup(_) => MEMBER_RELATION,
        }
    }

    pub fn object_type(&self) -> ResourceType {
        match self {
            Relationship::AdministratorRoleAssignment(_) => ResourceType::App,
            Relationship::SpaceMembership(_)
            | Relationship::SpaceBaseRoleAssignment(_)
            | Relationship::SpaceUserRoleAssignment(_)
            | Relationship::SpaceGroupRoleAssignment(_)
            | Relationship::SpaceGroup(_) => ResourceType::Space,
            Relationship::ReferenceUserRoleAssignment(_)
            | Relationship::ReferenceGroupRoleAssignment(_)
            | Relationship::ReferenceSpace(_) => ResourceType::Reference,
            Relationship::GroupMembership(_) => ResourceType::Group,
        }
    }

    pub fn object_id(&self) -> String {
        match self {
            Relationship::AdministratorRoleAssignment(_) => APP_OBJECT_ID.to_string(),
            Relationship::SpaceMembership(r) => r.space_id.to_string(),
            Relationship::SpaceBaseRoleAssignment(r) => r.space_id.to_string(),
            Relationship::SpaceUserRoleAssignment(r) => r.space_id.to_string(),
            Relationship::SpaceGroupRoleAssignment(_) => SpaceId::DEFAULT.to_string(),
            Relationship::ReferenceUserRoleAssignment(r) => r.reference_id.to_string(),
            Relationship::ReferenceGroupRoleAssignment(r) => r.reference_id.to_string(),
            Relationship::ReferenceSpace(r) => r.reference_id.to_string(),
            Relationship::GroupMembership(r) => r.group_id.to_string(),
            Relationship::SpaceGroup(r) => r.space_id.to_string(),
        }
    }

    /// Family of mutually exclusive relations, `None` for additive facts
    pub fn family(&self) -> Option<RelationFamily> {
        match self {
            Relationship::AdministratorRoleAssignment(_) => Some(RelationFamily::Administrator),
            Relationship::SpaceBaseRoleAssignment(r) => {
                Some(RelationFamily::SpaceResource(r.role.family()))
            }
            Relationship::SpaceUserRoleAssignment(r) => {
                Some(RelationFamily::SpaceResource(r.role.family()))
            }
            Relationship::SpaceGroupRoleAssignment(r) => {
                Some(RelationFamily::SpaceResource(r.role.family()))
            }
            Relationship::ReferenceUserRoleAssignment(_)
            | Relationship::ReferenceGroupRoleAssignment(_) => Some(RelationFamily::Reference),
            Relationship::SpaceMembership(_)
            | Relationship::ReferenceSpace(_)
            | Relationship::GroupMembership(_)
            | Relationship::SpaceGroup(_) => None,
        }
    }

    pub fn exclusive(&self) -> bool {
        self.family().is_some()
    }

    /// Whether an existing tuple with `relation`, held by the same subject on
    /// the same object, must be removed before this one is written
    pub fn conflicts_with(&self, relation: &str) -> bool {
        relation != self.relation()
            && self
                .family()
                .is_some_and(|family| family.contains(relation))
    }

    /// Subject rendered as a tuple `user` string
    pub fn user(&self) -> String {
        match self.subject_relation() {
            Some(relation) => format!("{}:{}#{}", self.subject_type(), self.subject_id(), relation),
            None => format!("{}:{}", self.subject_type(), self.subject_id()),
        }
    }

    /// Object rendered as a tuple `object` string
    pub fn object(&self) -> String {
        format!("{}:{}", self.object_type(), self.object_id())
    }

    pub fn to_tuple_key(&self) -> TupleKey {
        TupleKey::new(self.user(), self.relation(), self.object())
    }
}

macro_rules! impl_from_relationship {
    ($($variant:ident),* $(,)?) => {
        $(
            impl From<$variant> for Relationship {
                fn from(value: $variant) -> Self {
                    Relationship::$variant(value)
                }
            }
        )*
    };
}

impl_from_relationship!(
    AdministratorRoleAssignment,
    SpaceMembership,
    SpaceBaseRoleAssignment,
    SpaceUserRoleAssignment,
    SpaceGroupRoleAssignment,
    ReferenceUserRoleAssignment,
    ReferenceGroupRoleAssignment,
    ReferenceSpace,
    GroupMembership,
    SpaceGroup,
);
