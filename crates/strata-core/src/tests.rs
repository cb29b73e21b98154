//! Unit tests for strata-core

use super::*;
use std::collections::HashSet;

// =============================================================================
// Role Tests
// =============================================================================

#[cfg(test)]
mod role_tests {
    use super::*;

    #[test]
    fn test_administrator_hierarchy_order() {
        assert!(AdministratorRole::Full > AdministratorRole::Settings);
        assert!(AdministratorRole::Settings > AdministratorRole::Spaces);
        assert!(AdministratorRole::Spaces > AdministratorRole::Users);
        assert!(AdministratorRole::Users > AdministratorRole::Base);
        assert!(AdministratorRole::Spaces.implies(AdministratorRole::Base));
        assert!(!AdministratorRole::Users.implies(AdministratorRole::Settings));
    }

    #[test]
    fn test_administrator_next_higher_chain_ends_at_full() {
        let mut role = AdministratorRole::Base;
        let mut steps = 0;
        while let Some(next) = role.next_higher() {
            role = next;
            steps += 1;
        }
        assert_eq!(role, AdministratorRole::Full);
        assert_eq!(steps, 4);
    }

    #[test]
    fn test_parse_exact_role_names() {
        assert_eq!(parse_role("full").unwrap(), Role::Administrator(AdministratorRole::Full));
        assert_eq!(parse_role("owner").unwrap(), Role::Space(SpaceRole::Owner));
        assert_eq!(
            parse_role("sample_viewer").unwrap(),
            Role::SpaceResource(SpaceResourceRole::SampleViewer)
        );
        assert_eq!(parse_role("builder").unwrap(), Role::Reference(ReferenceRole::Builder));
    }

    #[test]
    fn test_parse_legacy_aliases() {
        assert_eq!(
            parse_role("create_ref").unwrap(),
            Role::SpaceResource(SpaceResourceRole::ReferenceBuilder)
        );
        assert_eq!(
            parse_role("modify_subtraction").unwrap(),
            Role::SpaceResource(SpaceResourceRole::SubtractionEditor)
        );
        assert_eq!(
            parse_role("remove_job").unwrap(),
            Role::SpaceResource(SpaceResourceRole::SampleManager)
        );
    }

    #[test]
    fn test_parse_unknown_role() {
        let err = parse_role("superuser").unwrap_err();
        assert!(matches!(err, AuthzError::UnknownRole { ref role } if role == "superuser"));
    }

    #[test]
    fn test_role_names_are_unique() {
        let names: Vec<&str> = Role::all().map(|r| r.as_str()).collect();
        let unique: HashSet<&str> = names.iter().copied().collect();
        assert_eq!(names.len(), unique.len());
    }

    #[test]
    fn test_role_serialization() {
        let role = Role::SpaceResource(SpaceResourceRole::Uploader);
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"uploader\"");
        let parsed: Role = serde_json::from_str("\"upload_file\"").unwrap();
        assert_eq!(parsed, role);
    }

    #[test]
    fn test_space_resource_role_families_match_prefixes() {
        for role in SpaceResourceRole::ALL {
            assert!(role.as_str().starts_with(role.family().prefix()));
        }
    }

    #[test]
    fn test_reference_role_maps_to_space_role() {
        assert_eq!(ReferenceRole::Manager.space_role(), SpaceResourceRole::ReferenceManager);
        assert_eq!(ReferenceRole::Viewer.next_higher(), Some(ReferenceRole::Contributor));
    }

    #[test]
    fn test_list_roles_covers_every_role() {
        let roles = list_roles();
        assert_eq!(roles.len(), 5 + 2 + 21 + 5);
        assert_eq!(roles[0].id, "full");
        assert_eq!(roles[0].resource_type, ResourceType::App);
    }
}

// =============================================================================
// Permission Tests
// =============================================================================

#[cfg(test)]
mod permission_tests {
    use super::*;

    #[test]
    fn test_legacy_permission_table() {
        assert_eq!(legacy_permission(Permission::CreateSubtraction), "modify_subtraction");
        assert_eq!(legacy_permission(Permission::EditSubtraction), "modify_subtraction");
        assert_eq!(legacy_permission(Permission::DeleteSubtraction), "modify_subtraction");
        assert_eq!(legacy_permission(Permission::CreateUpload), "upload_file");
        assert_eq!(legacy_permission(Permission::DeleteUpload), "remove_file");
        assert_eq!(legacy_permission(Permission::BuildReference), "create_ref");
        assert_eq!(legacy_permission(Permission::CreateSample), "create_sample");
        assert_eq!(legacy_permission(Permission::CancelAnalysis), "cancel_job");
        assert_eq!(legacy_permission(Permission::DeleteAnalysis), "remove_job");
    }

    #[test]
    fn test_unmapped_permission_passes_through() {
        assert_eq!(legacy_permission(Permission::EditLabel), "edit_label");
        assert_eq!(legacy_permission(Permission::ViewReference), "view_reference");
    }

    #[test]
    fn test_permission_parsing() {
        assert_eq!("analyze_sample".parse::<Permission>().unwrap(), Permission::AnalyzeSample);
        assert!(matches!(
            "launch_rocket".parse::<Permission>(),
            Err(AuthzError::UnknownPermission { .. })
        ));
    }

    #[test]
    fn test_granting_relations_exist_on_resource_type() {
        let space_relations: HashSet<&str> = SpaceResourceRole::ALL
            .iter()
            .map(|r| r.as_str())
            .chain(std::iter::once("owner"))
            .collect();
        let reference_relations: HashSet<&str> =
            ReferenceRole::ALL.iter().map(|r| r.as_str()).collect();

        for permission in Permission::ALL {
            let relations = match permission.resource_type() {
                ResourceType::Space => &space_relations,
                ResourceType::Reference => &reference_relations,
                other => panic!("unexpected resource type {other}"),
            };
            for relation in permission.granted_by() {
                assert!(relations.contains(relation), "{permission} granted by {relation}");
            }
        }
    }

    #[test]
    fn test_delete_subtraction_granted_to_editor() {
        assert!(Permission::DeleteSubtraction
            .granted_by()
            .contains(&"subtraction_editor"));
        assert!(!Permission::DeleteSample.granted_by().contains(&"sample_editor"));
    }

    #[test]
    fn test_list_permissions_projection() {
        let permissions = list_permissions();
        assert_eq!(permissions.len(), Permission::ALL.len());

        let cancel = permissions.iter().find(|p| p.id == "cancel_analysis").unwrap();
        assert_eq!(cancel.action, Action::Cancel);
        assert_eq!(cancel.resource_type, ResourceType::Space);

        let json = serde_json::to_value(cancel).unwrap();
        assert_eq!(json["action"], "cancel");
        assert_eq!(json["resource_type"], "space");
    }
}

// =============================================================================
// Relationship Tests
// =============================================================================

#[cfg(test)]
mod relationship_tests {
    use super::*;

    #[test]
    fn test_administrator_assignment_tuple() {
        let rel = Relationship::from(AdministratorRoleAssignment::new(
            "bob",
            AdministratorRole::Spaces,
        ));
        assert_eq!(rel.to_tuple_key(), TupleKey::new("user:bob", "spaces", "app:strata"));
        assert!(rel.exclusive());
        assert_eq!(rel.family(), Some(RelationFamily::Administrator));
    }

    #[test]
    fn test_space_base_role_is_userset() {
        let rel = Relationship::from(SpaceBaseRoleAssignment::new(
            SpaceId::new(0),
            SpaceResourceRole::LabelViewer,
        ));
        assert_eq!(rel.subject_relation(), Some("member"));
        assert_eq!(
            rel.to_tuple_key(),
            TupleKey::new("space:0#member", "label_viewer", "space:0")
        );
    }

    #[test]
    fn test_group_role_targets_default_space() {
        let rel = Relationship::from(SpaceGroupRoleAssignment::new(
            GroupId::new(3),
            SpaceResourceRole::SampleEditor,
        ));
        assert_eq!(
            rel.to_tuple_key(),
            TupleKey::new("group:3#member", "sample_editor", "space:0")
        );
    }

    #[test]
    fn test_reference_space_and_group_membership() {
        let parent = Relationship::from(ReferenceSpace::new("ref1", SpaceId::new(2)));
        assert_eq!(parent.to_tuple_key(), TupleKey::new("space:2", "parent", "reference:ref1"));
        assert!(!parent.exclusive());

        let member = Relationship::from(GroupMembership::new("bob", GroupId::new(4)));
        assert_eq!(member.to_tuple_key(), TupleKey::new("user:bob", "member", "group:4"));

        let space_group = Relationship::from(SpaceGroup::new(SpaceId::new(1), GroupId::new(4)));
        assert_eq!(
            space_group.to_tuple_key(),
            TupleKey::new("group:4#member", "member", "space:1")
        );
    }

    #[test]
    fn test_conflicts_stay_within_family() {
        let rel = Relationship::from(SpaceUserRoleAssignment::new(
            SpaceId::new(0),
            "bob",
            SpaceResourceRole::SampleAnalyzer,
        ));
        assert!(rel.conflicts_with("sample_manager"));
        assert!(rel.conflicts_with("sample_viewer"));
        assert!(!rel.conflicts_with("sample_analyzer"));
        assert!(!rel.conflicts_with("label_manager"));
        assert!(!rel.conflicts_with("member"));
    }

    #[test]
    fn test_space_membership_is_not_exclusive() {
        let rel = Relationship::from(SpaceMembership::new("olga", SpaceId::new(0), SpaceRole::Member));
        assert!(!rel.exclusive());
        assert!(!rel.conflicts_with("owner"));
    }

    #[test]
    fn test_upload_family_includes_uploader() {
        let rel = Relationship::from(SpaceUserRoleAssignment::new(
            SpaceId::new(0),
            "bob",
            SpaceResourceRole::UploadViewer,
        ));
        assert!(rel.conflicts_with("uploader"));
    }

    #[test]
    fn test_reference_user_role_accessors() {
        let rel = Relationship::from(ReferenceUserRoleAssignment::new(
            "ref9",
            "alice",
            ReferenceRole::Contributor,
        ));
        assert_eq!(rel.subject_type(), ResourceType::User);
        assert_eq!(rel.subject_id(), "alice");
        assert_eq!(rel.object_type(), ResourceType::Reference);
        assert_eq!(rel.object_id(), "ref9");
        assert!(rel.conflicts_with("viewer"));
        assert!(!rel.conflicts_with("parent"));
    }

    #[test]
    fn test_relationship_serialization_is_tagged() {
        let rel = Relationship::from(GroupMembership::new("bob", GroupId::new(4)));
        let json = serde_json::to_value(&rel).unwrap();
        assert_eq!(json["kind"], "group_membership");
        assert_eq!(json["group_id"], 4);

        let back: Relationship = serde_json::from_value(json).unwrap();
        assert_eq!(back, rel);
    }
}
