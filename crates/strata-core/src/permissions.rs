//! Derived permissions
//!
//! Permissions are never written as tuples. The authorization model computes
//! each one as the union of the relations listed by
//! [`Permission::granted_by`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthzError;
use crate::resource::{Action, ResourceType};
use crate::roles::Relation;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    // -- Space: labels --
    CreateLabel,
    EditLabel,
    DeleteLabel,
    // -- Space: projects --
    CreateProject,
    EditProject,
    DeleteProject,
    ViewProject,
    // -- Space: references --
    CreateReference,
    // -- Space: samples --
    CreateSample,
    EditSample,
    AnalyzeSample,
    CancelAnalysis,
    DeleteAnalysis,
    DeleteSample,
    ViewSample,
    // -- Space: subtractions --
    CreateSubtraction,
    EditSubtraction,
    DeleteSubtraction,
    ViewSubtraction,
    // -- Space: uploads --
    CreateUpload,
    DeleteUpload,
    ViewUpload,
    // -- Reference --
    BuildReference,
    EditReference,
    ContributeReference,
    DeleteReference,
    ViewReference,
}

impl Permission {
    pub const ALL: [Permission; 27] = [
        Permission::CreateLabel,
        Permission::EditLabel,
        Permission::DeleteLabel,
        Permission::CreateProject,
        Permission::EditProject,
        Permission::DeleteProject,
        Permission::ViewProject,
        Permission::CreateReference,
        Permission::CreateSample,
        Permission::EditSample,
        Permission::AnalyzeSample,
        Permission::CancelAnalysis,
        Permission::DeleteAnalysis,
        Permission::DeleteSample,
        Permission::ViewSample,
        Permission::CreateSubtraction,
        Permission::EditSubtraction,
        Permission::DeleteSubtraction,
        Permission::ViewSubtraction,
        Permission::CreateUpload,
        Permission::DeleteUpload,
        Permission::ViewUpload,
        Permission::BuildReference,
        Permission::EditReference,
        Permission::ContributeReference,
        Permission::DeleteReference,
        Permission::ViewReference,
    ];

    pub fn id(&self) -> &'static str {
        match self {
            Permission::CreateLabel => "create_label",
            Permission::EditLabel => "edit_label",
            Permission::DeleteLabel => "delete_label",
            Permission::CreateProject => "create_project",
            Permission::EditProject => "edit_project",
            Permission::DeleteProject => "delete_project",
            Permission::ViewProject => "view_project",
            Permission::CreateReference => "create_reference",
            Permission::CreateSample => "create_sample",
            Permission::EditSample => "edit_sample",
            Permission::AnalyzeSample => "analyze_sample",
            Permission::CancelAnalysis => "cancel_analysis",
            Permission::DeleteAnalysis => "delete_analysis",
            Permission::DeleteSample => "delete_sample",
            Permission::ViewSample => "view_sample",
            Permission::CreateSubtraction => "create_subtraction",
            Permission::EditSubtraction => "edit_subtraction",
            Permission::DeleteSubtraction => "delete_subtraction",
            Permission::ViewSubtraction => "view_subtraction",
            Permission::CreateUpload => "create_upload",
            Permission::DeleteUpload => "delete_upload",
            Permission::ViewUpload => "view_upload",
            Permission::BuildReference => "build_reference",
            Permission::EditReference => "edit_reference",
            Permission::ContributeReference => "contribute_reference",
            Permission::DeleteReference => "delete_reference",
            Permission::ViewReference => "view_reference",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Permission::CreateLabel => "Create Label",
            Permission::EditLabel => "Edit Label",
            Permission::DeleteLabel => "Delete Label",
            Permission::CreateProject => "Create Project",
            Permission::EditProject => "Edit Project",
            Permission::DeleteProject => "Delete Project",
            Permission::ViewProject => "View Project",
            Permission::CreateReference => "Create Reference",
            Permission::CreateSample => "Create Sample",
            Permission::EditSample => "Edit Sample",
            Permission::AnalyzeSample => "Analyze Sample",
            Permission::CancelAnalysis => "Cancel Analysis",
            Permission::DeleteAnalysis => "Delete Analysis",
            Permission::DeleteSample => "Delete Sample",
            Permission::ViewSample => "View Sample",
            Permission::CreateSubtraction => "Create Subtraction",
            Permission::EditSubtraction => "Edit Subtraction",
            Permission::DeleteSubtraction => "Delete Subtraction",
            Permission::ViewSubtraction => "View Subtraction",
            Permission::CreateUpload => "Create Upload",
            Permission::DeleteUpload => "Delete Upload",
            Permission::ViewUpload => "View Upload",
            Permission::BuildReference => "Build Reference",
            Permission::EditReference => "Edit Reference",
            Permission::ContributeReference => "Contribute to Reference",
            Permission::DeleteReference => "Delete Reference",
            Permission::ViewReference => "View Reference",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Permission::CreateLabel => "Create new sample labels in the space.",
            Permission::EditLabel => "Change the name, color, or description of labels.",
            Permission::DeleteLabel => "Delete labels from the space.",
            Permission::CreateProject => "Create new projects in the space.",
            Permission::EditProject => "Edit projects in the space.",
            Permission::DeleteProject => "Delete projects from the space.",
            Permission::ViewProject => "View projects in the space.",
            Permission::CreateReference => "Create new references in the space.",
            Permission::CreateSample => "Create new samples in the space.",
            Permission::EditSample => "Edit sample details and rights.",
            Permission::AnalyzeSample => "Start new analyses of samples.",
            Permission::CancelAnalysis => "Cancel running analysis jobs.",
            Permission::DeleteAnalysis => "Delete completed analyses.",
            Permission::DeleteSample => "Delete samples from the space.",
            Permission::ViewSample => "View samples and their analyses.",
            Permission::CreateSubtraction => "Create new subtractions in the space.",
            Permission::EditSubtraction => "Edit subtraction names and nicknames.",
            Permission::DeleteSubtraction => "Delete subtractions from the space.",
            Permission::ViewSubtraction => "View subtractions in the space.",
            Permission::CreateUpload => "Upload files to the space.",
            Permission::DeleteUpload => "Delete uploaded files.",
            Permission::ViewUpload => "View and download uploaded files.",
            Permission::BuildReference => "Build new indexes for the reference.",
            Permission::EditReference => "Edit reference details and settings.",
            Permission::ContributeReference => "Create and modify OTUs in the reference.",
            Permission::DeleteReference => "Delete the reference.",
            Permission::ViewReference => "View the reference and its OTUs.",
        }
    }

    pub fn resource_type(&self) -> ResourceType {
        match self {
            Permission::BuildReference
            | Permission::EditReference
            | Permission::ContributeReference
            | Permission::DeleteReference
            | Permission::ViewReference => ResourceType::Reference,
            _ => ResourceType::Space,
        }
    }

    pub fn action(&self) -> Action {
        match self {
            Permission::CreateLabel
            | Permission::CreateProject
            | Permission::CreateReference
            | Permission::CreateSample
            | Permission::CreateSubtraction => Action::Create,
            Permission::EditLabel
            | Permission::EditProject
            | Permission::EditSample
            | Permission::EditSubtraction
            | Permission::EditReference => Action::Update,
            Permission::DeleteLabel
            | Permission::DeleteProject
            | Permission::DeleteSample
            | Permission::DeleteSubtraction
            | Permission::DeleteReference => Action::Delete,
            Permission::CancelAnalysis => Action::Cancel,
            Permission::CreateUpload => Action::Upload,
            Permission::AnalyzeSample
            | Permission::BuildReference
            | Permission::ContributeReference => Action::Modify,
            Permission::DeleteAnalysis | Permission::DeleteUpload => Action::Remove,
            Permission::ViewProject
            | Permission::ViewSample
            | Permission::ViewSubtraction
            | Permission::ViewUpload
            | Permission::ViewReference => Action::View,
        }
    }

    /// Relations on [`Permission::resource_type`] whose holders are granted
    /// this permission.
    pub fn granted_by(&self) -> &'static [&'static str] {
        match self {
            Permission::CreateLabel | Permission::EditLabel => {
                &["label_manager", "label_editor", "owner"]
            }
            Permission::DeleteLabel => &["label_manager", "owner"],
            Permission::CreateProject | Permission::EditProject => {
                &["project_manager", "project_editor", "owner"]
            }
            Permission::DeleteProject => &["project_manager", "owner"],
            Permission::ViewProject => {
                &["project_manager", "project_editor", "project_viewer", "owner"]
            }
            Permission::CreateReference => &["reference_manager", "reference_builder", "owner"],
            Permission::CreateSample | Permission::EditSample => {
                &["sample_manager", "sample_editor", "owner"]
            }
            Permission::AnalyzeSample | Permission::CancelAnalysis => {
                &["sample_manager", "sample_editor", "sample_analyzer", "owner"]
            }
            Permission::DeleteAnalysis | Permission::DeleteSample => &["sample_manager", "owner"],
            Permission::ViewSample => &[
                "sample_manager",
                "sample_editor",
                "sample_analyzer",
                "sample_viewer",
                "owner",
            ],
            Permission::CreateSubtraction
            | Permission::EditSubtraction
            | Permission::DeleteSubtraction => {
                &["subtraction_manager", "subtraction_editor", "owner"]
            }
            Permission::ViewSubtraction => &[
                "subtraction_manager",
                "subtraction_editor",
                "subtraction_viewer",
                "owner",
            ],
            Permission::CreateUpload => &["upload_manager", "uploader", "owner"],
            Permission::DeleteUpload => &["upload_manager", "owner"],
            Permission::ViewUpload => &["upload_manager", "uploader", "upload_viewer", "owner"],
            Permission::BuildReference => &["builder"],
            Permission::EditReference => &["editor"],
            Permission::ContributeReference => &["contributor"],
            Permission::DeleteReference => &["manager"],
            Permission::ViewReference => &["viewer"],
        }
    }

    /// Name of the equivalent permission in the flat, pre-role scheme. Returns
    /// [`Permission::id`] when there is none.
    pub fn legacy_name(&self) -> &'static str {
        match self {
            Permission::CreateSubtraction
            | Permission::EditSubtraction
            | Permission::DeleteSubtraction => "modify_subtraction",
            Permission::CreateUpload => "upload_file",
            Permission::DeleteUpload => "remove_file",
            Permission::BuildReference => "create_ref",
            Permission::CreateSample => "create_sample",
            Permission::CancelAnalysis => "cancel_job",
            Permission::DeleteAnalysis => "remove_job",
            _ => self.id(),
        }
    }
}

impl Relation for Permission {
    fn relation_name(&self) -> &'static str {
        self.id()
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for Permission {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|permission| permission.id() == s)
            .ok_or_else(|| AuthzError::UnknownPermission {
                permission: s.to_string(),
            })
    }
}

/// Legacy flat permission name for a permission
pub fn legacy_permission(permission: Permission) -> &'static str {
    permission.legacy_name()
}

/// Presentation metadata for a permission
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionInfo {
    pub id: String,
    pub name: String,
    pub description: String,
    pub resource_type: ResourceType,
    pub action: Action,
}

impl From<Permission> for PermissionInfo {
    fn from(permission: Permission) -> Self {
        Self {
            id: permission.id().to_string(),
            name: permission.name().to_string(),
            description: permission.description().to_string(),
            resource_type: permission.resource_type(),
            action: permission.action(),
        }
    }
}

/// Every permission projected for presentation
pub fn list_permissions() -> Vec<PermissionInfo> {
    Permission::ALL.into_iter().map(PermissionInfo::from).collect()
}
