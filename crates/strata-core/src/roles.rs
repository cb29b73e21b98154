//! Assignable roles and their relation names
//!
//! Every role is written to the tuple store under the relation name returned by
//! [`Relation::relation_name`]. Roles on a space are grouped into families by
//! their shared name prefix (`sample_*`, `reference_*`, ...); assigning a role
//! replaces any other role of the same family held on the same object.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthzError;
use crate::resource::ResourceType;

/// Anything that names a relation on an authorization model type
pub trait Relation {
    fn relation_name(&self) -> &'static str;
}

// =============================================================================
// Administrator Roles
// =============================================================================

/// Application-wide administrator role. Variants are declared lowest first so
/// the derived ordering matches the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdministratorRole {
    Base,
    Users,
    Spaces,
    Settings,
    Full,
}

impl AdministratorRole {
    /// Highest first.
    pub const ALL: [AdministratorRole; 5] = [
        AdministratorRole::Full,
        AdministratorRole::Settings,
        AdministratorRole::Spaces,
        AdministratorRole::Users,
        AdministratorRole::Base,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AdministratorRole::Base => "base",
            AdministratorRole::Users => "users",
            AdministratorRole::Spaces => "spaces",
            AdministratorRole::Settings => "settings",
            AdministratorRole::Full => "full",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            AdministratorRole::Base => "Base",
            AdministratorRole::Users => "Users",
            AdministratorRole::Spaces => "Spaces",
            AdministratorRole::Settings => "Settings",
            AdministratorRole::Full => "Full",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AdministratorRole::Base => {
                "Provides access to administrative information and basic administrative tasks."
            }
            AdministratorRole::Users => "Manage users and user groups.",
            AdministratorRole::Spaces => "Manage spaces and their members.",
            AdministratorRole::Settings => "Manage instance settings and integrations.",
            AdministratorRole::Full => "Full control of the instance, including other administrators.",
        }
    }

    /// The role directly above this one, `None` for [`AdministratorRole::Full`].
    pub fn next_higher(&self) -> Option<AdministratorRole> {
        match self {
            AdministratorRole::Base => Some(AdministratorRole::Users),
            AdministratorRole::Users => Some(AdministratorRole::Spaces),
            AdministratorRole::Spaces => Some(AdministratorRole::Settings),
            AdministratorRole::Settings => Some(AdministratorRole::Full),
            AdministratorRole::Full => None,
        }
    }

    /// Whether holding `self` grants everything `other` grants.
    pub fn implies(&self, other: AdministratorRole) -> bool {
        *self >= other
    }
}

impl Relation for AdministratorRole {
    fn relation_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for AdministratorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AdministratorRole {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AuthzError::unknown_role(s))
    }
}

// =============================================================================
// Space Roles
// =============================================================================

/// Membership roles on a space
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceRole {
    Owner,
    Member,
}

impl SpaceRole {
    pub const ALL: [SpaceRole; 2] = [SpaceRole::Owner, SpaceRole::Member];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceRole::Owner => "owner",
            SpaceRole::Member => "member",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpaceRole::Owner => "Owner",
            SpaceRole::Member => "Member",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SpaceRole::Owner => "Full control over the space and all resources it contains.",
            SpaceRole::Member => "Belongs to the space. Required for any space resource role to apply.",
        }
    }
}

impl Relation for SpaceRole {
    fn relation_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for SpaceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpaceRole {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AuthzError::unknown_role(s))
    }
}

/// Resource family a space role belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleFamily {
    Label,
    Project,
    Reference,
    Sample,
    Subtraction,
    Upload,
}

impl RoleFamily {
    /// Shared relation-name prefix of every role in the family
    pub fn prefix(&self) -> &'static str {
        match self {
            RoleFamily::Label => "label",
            RoleFamily::Project => "project",
            RoleFamily::Reference => "reference",
            RoleFamily::Sample => "sample",
            RoleFamily::Subtraction => "subtraction",
            RoleFamily::Upload => "upload",
        }
    }
}

/// Roles scoped to one kind of resource inside a space. A holder must also be
/// a member of the space for the role to have any effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpaceResourceRole {
    LabelManager,
    LabelEditor,
    LabelViewer,
    ProjectManager,
    ProjectEditor,
    ProjectViewer,
    ReferenceManager,
    ReferenceBuilder,
    ReferenceEditor,
    ReferenceContributor,
    ReferenceViewer,
    SampleManager,
    SampleEditor,
    SampleAnalyzer,
    SampleViewer,
    SubtractionManager,
    SubtractionEditor,
    SubtractionViewer,
    UploadManager,
    Uploader,
    UploadViewer,
}

impl SpaceResourceRole {
    pub const ALL: [SpaceResourceRole; 21] = [
        SpaceResourceRole::LabelManager,
        SpaceResourceRole::LabelEditor,
        SpaceResourceRole::LabelViewer,
        SpaceResourceRole::ProjectManager,
        SpaceResourceRole::ProjectEditor,
        SpaceResourceRole::ProjectViewer,
        SpaceResourceRole::ReferenceManager,
        SpaceResourceRole::ReferenceBuilder,
        SpaceResourceRole::ReferenceEditor,
        SpaceResourceRole::ReferenceContributor,
        SpaceResourceRole::ReferenceViewer,
        SpaceResourceRole::SampleManager,
        SpaceResourceRole::SampleEditor,
        SpaceResourceRole::SampleAnalyzer,
        SpaceResourceRole::SampleViewer,
        SpaceResourceRole::SubtractionManager,
        SpaceResourceRole::SubtractionEditor,
        SpaceResourceRole::SubtractionViewer,
        SpaceResourceRole::UploadManager,
        SpaceResourceRole::Uploader,
        SpaceResourceRole::UploadViewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SpaceResourceRole::LabelManager => "label_manager",
            SpaceResourceRole::LabelEditor => "label_editor",
            SpaceResourceRole::LabelViewer => "label_viewer",
            SpaceResourceRole::ProjectManager => "project_manager",
            SpaceResourceRole::ProjectEditor => "project_editor",
            SpaceResourceRole::ProjectViewer => "project_viewer",
            SpaceResourceRole::ReferenceManager => "reference_manager",
            SpaceResourceRole::ReferenceBuilder => "reference_builder",
            SpaceResourceRole::ReferenceEditor => "reference_editor",
            SpaceResourceRole::ReferenceContributor => "reference_contributor",
            SpaceResourceRole::ReferenceViewer => "reference_viewer",
            SpaceResourceRole::SampleManager => "sample_manager",
            SpaceResourceRole::SampleEditor => "sample_editor",
            SpaceResourceRole::SampleAnalyzer => "sample_analyzer",
            SpaceResourceRole::SampleViewer => "sample_viewer",
            SpaceResourceRole::SubtractionManager => "subtraction_manager",
            SpaceResourceRole::SubtractionEditor => "subtraction_editor",
            SpaceResourceRole::SubtractionViewer => "subtraction_viewer",
            SpaceResourceRole::UploadManager => "upload_manager",
            SpaceResourceRole::Uploader => "uploader",
            SpaceResourceRole::UploadViewer => "upload_viewer",
        }
    }

    pub fn family(&self) -> RoleFamily {
        match self {
            SpaceResourceRole::LabelManager
            | SpaceResourceRole::LabelEditor
            | SpaceResourceRole::LabelViewer => RoleFamily::Label,
            SpaceResourceRole::ProjectManager
            | SpaceResourceRole::ProjectEditor
            | SpaceResourceRole::ProjectViewer => RoleFamily::Project,
            SpaceResourceRole::ReferenceManager
            | SpaceResourceRole::ReferenceBuilder
            | SpaceResourceRole::ReferenceEditor
            | SpaceResourceRole::ReferenceContributor
            | SpaceResourceRole::ReferenceViewer => RoleFamily::Reference,
            SpaceResourceRole::SampleManager
            | SpaceResourceRole::SampleEditor
            | SpaceResourceRole::SampleAnalyzer
            | SpaceResourceRole::SampleViewer => RoleFamily::Sample,
            SpaceResourceRole::SubtractionManager
            | SpaceResourceRole::SubtractionEditor
            | SpaceResourceRole::SubtractionViewer => RoleFamily::Subtraction,
            SpaceResourceRole::UploadManager
            | SpaceResourceRole::Uploader
            | SpaceResourceRole::UploadViewer => RoleFamily::Upload,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpaceResourceRole::LabelManager => "Label Manager",
            SpaceResourceRole::LabelEditor => "Label Editor",
            SpaceResourceRole::LabelViewer => "Label Viewer",
            SpaceResourceRole::ProjectManager => "Project Manager",
            SpaceResourceRole::ProjectEditor => "Project Editor",
            SpaceResourceRole::ProjectViewer => "Project Viewer",
            SpaceResourceRole::ReferenceManager => "Reference Manager",
            SpaceResourceRole::ReferenceBuilder => "Reference Builder",
            SpaceResourceRole::ReferenceEditor => "Reference Editor",
            SpaceResourceRole::ReferenceContributor => "Reference Contributor",
            SpaceResourceRole::ReferenceViewer => "Reference Viewer",
            SpaceResourceRole::SampleManager => "Sample Manager",
            SpaceResourceRole::SampleEditor => "Sample Editor",
            SpaceResourceRole::SampleAnalyzer => "Sample Analyzer",
            SpaceResourceRole::SampleViewer => "Sample Viewer",
            SpaceResourceRole::SubtractionManager => "Subtraction Manager",
            SpaceResourceRole::SubtractionEditor => "Subtraction Editor",
            SpaceResourceRole::SubtractionViewer => "Subtraction Viewer",
            SpaceResourceRole::UploadManager => "Upload Manager",
            SpaceResourceRole::Uploader => "Uploader",
            SpaceResourceRole::UploadViewer => "Upload Viewer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SpaceResourceRole::LabelManager => "Create, edit, and delete labels.",
            SpaceResourceRole::LabelEditor => "Create and edit labels.",
            SpaceResourceRole::LabelViewer => "View labels.",
            SpaceResourceRole::ProjectManager => "Create, edit, and delete projects.",
            SpaceResourceRole::ProjectEditor => "Create and edit projects.",
            SpaceResourceRole::ProjectViewer => "View projects.",
            SpaceResourceRole::ReferenceManager => {
                "Create, build, edit, and delete references and manage their members."
            }
            SpaceResourceRole::ReferenceBuilder => "Create, build, and edit references.",
            SpaceResourceRole::ReferenceEditor => "Edit references and their OTUs.",
            SpaceResourceRole::ReferenceContributor => "Contribute OTU changes to references.",
            SpaceResourceRole::ReferenceViewer => "View references.",
            SpaceResourceRole::SampleManager => {
                "Create, edit, analyze, and delete samples and their analyses."
            }
            SpaceResourceRole::SampleEditor => "Create, edit, and analyze samples.",
            SpaceResourceRole::SampleAnalyzer => "Analyze samples and cancel analyses.",
            SpaceResourceRole::SampleViewer => "View samples and analyses.",
            SpaceResourceRole::SubtractionManager => "Create, edit, and delete subtractions.",
            SpaceResourceRole::SubtractionEditor => "Create, edit, and delete subtractions.",
            SpaceResourceRole::SubtractionViewer => "View subtractions.",
            SpaceResourceRole::UploadManager => "Upload and delete files.",
            SpaceResourceRole::Uploader => "Upload files.",
            SpaceResourceRole::UploadViewer => "View uploaded files.",
        }
    }
}

impl Relation for SpaceResourceRole {
    fn relation_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for SpaceResourceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SpaceResourceRole {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AuthzError::unknown_role(s))
    }
}

// =============================================================================
// Reference Roles
// =============================================================================

/// Roles held directly on a single reference, highest first in [`ReferenceRole::ALL`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceRole {
    Manager,
    Builder,
    Editor,
    Contributor,
    Viewer,
}

impl ReferenceRole {
    pub const ALL: [ReferenceRole; 5] = [
        ReferenceRole::Manager,
        ReferenceRole::Builder,
        ReferenceRole::Editor,
        ReferenceRole::Contributor,
        ReferenceRole::Viewer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceRole::Manager => "manager",
            ReferenceRole::Builder => "builder",
            ReferenceRole::Editor => "editor",
            ReferenceRole::Contributor => "contributor",
            ReferenceRole::Viewer => "viewer",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ReferenceRole::Manager => "Manager",
            ReferenceRole::Builder => "Builder",
            ReferenceRole::Editor => "Editor",
            ReferenceRole::Contributor => "Contributor",
            ReferenceRole::Viewer => "Viewer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReferenceRole::Manager => "Full control of the reference, including its members.",
            ReferenceRole::Builder => "Build new indexes for the reference.",
            ReferenceRole::Editor => "Edit the reference and its OTUs.",
            ReferenceRole::Contributor => "Create and modify OTUs in the reference.",
            ReferenceRole::Viewer => "View the reference.",
        }
    }

    /// The role directly above this one, `None` for [`ReferenceRole::Manager`].
    pub fn next_higher(&self) -> Option<ReferenceRole> {
        match self {
            ReferenceRole::Manager => None,
            ReferenceRole::Builder => Some(ReferenceRole::Manager),
            ReferenceRole::Editor => Some(ReferenceRole::Builder),
            ReferenceRole::Contributor => Some(ReferenceRole::Editor),
            ReferenceRole::Viewer => Some(ReferenceRole::Contributor),
        }
    }

    /// Space role that grants this role on every reference inside the space
    pub fn space_role(&self) -> SpaceResourceRole {
        match self {
            ReferenceRole::Manager => SpaceResourceRole::ReferenceManager,
            ReferenceRole::Builder => SpaceResourceRole::ReferenceBuilder,
            ReferenceRole::Editor => SpaceResourceRole::ReferenceEditor,
            ReferenceRole::Contributor => SpaceResourceRole::ReferenceContributor,
            ReferenceRole::Viewer => SpaceResourceRole::ReferenceViewer,
        }
    }
}

impl Relation for ReferenceRole {
    fn relation_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for ReferenceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceRole {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AuthzError::unknown_role(s))
    }
}

// =============================================================================
// Role Sum Type
// =============================================================================

/// Any assignable role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    Administrator(AdministratorRole),
    Space(SpaceRole),
    SpaceResource(SpaceResourceRole),
    Reference(ReferenceRole),
}

/// Role names from the flat permission scheme, resolved to the role that now
/// grants the same ability. Consulted before exact matching.
pub const LEGACY_ROLE_ALIASES: [(&str, Role); 7] = [
    ("create_ref", Role::SpaceResource(SpaceResourceRole::ReferenceBuilder)),
    ("create_sample", Role::SpaceResource(SpaceResourceRole::SampleEditor)),
    ("modify_subtraction", Role::SpaceResource(SpaceResourceRole::SubtractionEditor)),
    ("upload_file", Role::SpaceResource(SpaceResourceRole::Uploader)),
    ("remove_file", Role::SpaceResource(SpaceResourceRole::UploadManager)),
    ("cancel_job", Role::SpaceResource(SpaceResourceRole::SampleAnalyzer)),
    ("remove_job", Role::SpaceResource(SpaceResourceRole::SampleManager)),
];

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Administrator(role) => role.as_str(),
            Role::Space(role) => role.as_str(),
            Role::SpaceResource(role) => role.as_str(),
            Role::Reference(role) => role.as_str(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Role::Administrator(role) => role.name(),
            Role::Space(role) => role.name(),
            Role::SpaceResource(role) => role.name(),
            Role::Reference(role) => role.name(),
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Role::Administrator(role) => role.description(),
            Role::Space(role) => role.description(),
            Role::SpaceResource(role) => role.description(),
            Role::Reference(role) => role.description(),
        }
    }

    /// Type of the object the role is held on
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Role::Administrator(_) => ResourceType::App,
            Role::Space(_) | Role::SpaceResource(_) => ResourceType::Space,
            Role::Reference(_) => ResourceType::Reference,
        }
    }

    /// Every role, administrator roles first
    pub fn all() -> impl Iterator<Item = Role> {
        AdministratorRole::ALL
            .into_iter()
            .map(Role::Administrator)
            .chain(SpaceRole::ALL.into_iter().map(Role::Space))
            .chain(SpaceResourceRole::ALL.into_iter().map(Role::SpaceResource))
            .chain(ReferenceRole::ALL.into_iter().map(Role::Reference))
    }
}

/// Parse a free-text role name, accepting legacy aliases
pub fn parse_role(s: &str) -> Result<Role, AuthzError> {
    s.parse()
}

impl Relation for Role {
    fn relation_name(&self) -> &'static str {
        self.as_str()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some((_, role)) = LEGACY_ROLE_ALIASES.iter().find(|(alias, _)| *alias == s) {
            return Ok(*role);
        }

        Role::all()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| AuthzError::unknown_role(s))
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}

impl TryFrom<String> for Role {
    type Error = AuthzError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AdministratorRole> for Role {
    fn from(role: AdministratorRole) -> Self {
        Role::Administrator(role)
    }
}

impl From<SpaceRole> for Role {
    fn from(role: SpaceRole) -> Self {
        Role::Space(role)
    }
}

impl From<SpaceResourceRole> for Role {
    fn from(role: SpaceResourceRole) -> Self {
        Role::SpaceResource(role)
    }
}

impl From<ReferenceRole> for Role {
    fn from(role: ReferenceRole) -> Self {
        Role::Reference(role)
    }
}

/// Presentation metadata for a role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub resource_type: ResourceType,
}

impl From<Role> for RoleInfo {
    fn from(role: Role) -> Self {
        Self {
            id: role.as_str().to_string(),
            name: role.name().to_string(),
            description: role.description().to_string(),
            resource_type: role.resource_type(),
        }
    }
}

/// Every role projected for presentation
pub fn list_roles() -> Vec<RoleInfo> {
    Role::all().map(RoleInfo::from).collect()
}
