//! Integration tests for the Strata authorization core
//!
//! Tests in the first sections run against the in-memory tuple store, which
//! evaluates the same model document OpenFGA receives. The live tests need a
//! running OpenFGA instance. Set the following environment variables:
//! - OPENFGA_HOST: host and port of the OpenFGA HTTP API (e.g. localhost:8080)
//! - OPENFGA_API_TOKEN: optional pre-shared key
//!
//! Run with: cargo test --test integration_tests -- --ignored

use std::sync::Arc;

use strata::strata_core::{
    AdministratorRoleAssignment, GroupMembership, LegacyFlag, LegacyMirror,
    ReferenceGroupRoleAssignment, ReferenceSpace, SpaceBaseRoleAssignment, SpaceGroup,
    SpaceGroupRoleAssignment, SpaceMembership, SpaceUserRoleAssignment, APP_OBJECT_ID,
};
use strata::strata_openfga::{
    AddResult, Check, MemoryTupleStore, OpenFgaHttpClient, RemoveResult, TupleStore,
};
use strata::strata_sync::{LegacyFlagSync, MemoryLegacyMirror};
use strata::*;

// =============================================================================
// Test Fixtures
// =============================================================================

/// Creates a unique test ID to avoid conflicts between test runs
fn test_id() -> String {
    format!("test_{}", uuid::Uuid::new_v4().simple())
}

async fn memory_client() -> AuthorizationClient<MemoryTupleStore> {
    bootstrap(MemoryTupleStore::new(), &BootstrapConfig::default())
        .await
        .unwrap()
}

/// OpenFGA connection from the environment, if one is configured
fn openfga_config() -> Option<OpenFgaConfig> {
    let host = std::env::var("OPENFGA_HOST").ok()?;
    Some(OpenFgaConfig {
        host,
        api_token: std::env::var("OPENFGA_API_TOKEN").ok(),
        ..OpenFgaConfig::default()
    })
}

async fn live_client() -> Option<AuthorizationClient> {
    let Some(config) = openfga_config() else {
        eprintln!("Skipping: OPENFGA_HOST not set");
        return None;
    };

    let http = OpenFgaHttpClient::new(&config).unwrap();
    let bootstrap_config = BootstrapConfig {
        store_name: test_id(),
        ..BootstrapConfig::default()
    };
    Some(bootstrap(http, &bootstrap_config).await.unwrap())
}

// =============================================================================
// Authorization Flow Tests
// =============================================================================

#[tokio::test]
async fn test_space_lifecycle() {
    let client = memory_client().await;
    let space = SpaceId::new(8);

    client
        .add([
            Relationship::from(SpaceMembership::new("olga", space, SpaceRole::Owner)),
            SpaceMembership::new("bob", space, SpaceRole::Member).into(),
            SpaceUserRoleAssignment::new(space, "bob", SpaceResourceRole::SampleAnalyzer).into(),
        ])
        .await
        .unwrap();

    assert!(client
        .check("bob", Permission::AnalyzeSample, ResourceType::Space, space)
        .await
        .unwrap());
    assert!(!client
        .check("bob", Permission::EditSample, ResourceType::Space, space)
        .await
        .unwrap());
    assert!(client
        .check("olga", Permission::DeleteSample, ResourceType::Space, space)
        .await
        .unwrap());

    // Leaving the space revokes every resource role it gated
    client
        .remove([SpaceMembership::new("bob", space, SpaceRole::Member)])
        .await
        .unwrap();
    assert!(!client
        .check("bob", Permission::AnalyzeSample, ResourceType::Space, space)
        .await
        .unwrap());
    assert!(client.list_user_spaces("bob").await.unwrap().is_empty());
    assert_eq!(client.list_user_spaces("olga").await.unwrap(), vec![space]);
}

#[tokio::test]
async fn test_group_membership_grants_permissions() {
    let client = memory_client().await;
    let group = GroupId::new(11);

    client
        .add([
            Relationship::from(GroupMembership::new("bob", group)),
            SpaceGroup::new(SpaceId::DEFAULT, group).into(),
            SpaceGroupRoleAssignment::new(group, SpaceResourceRole::UploadManager).into(),
        ])
        .await
        .unwrap();

    assert!(client
        .check("bob", Permission::DeleteUpload, ResourceType::Space, 0)
        .await
        .unwrap());
    assert_eq!(
        client
            .list_permissions("bob", ResourceType::Space, "0")
            .await
            .unwrap(),
        vec!["member", "upload_manager"]
    );

    let removed = client.delete_group(group).await.unwrap();
    assert_eq!(
        removed,
        RemoveResult {
            not_found_count: 0,
            removed_count: 2
        }
    );
    assert!(!client
        .check("bob", Permission::DeleteUpload, ResourceType::Space, 0)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_base_role_applies_to_every_member() {
    let client = memory_client().await;
    let members: Vec<SpaceMembership> = (0..10)
        .map(|i| SpaceMembership::new(format!("user{i}"), SpaceId::DEFAULT, SpaceRole::Member))
        .collect();
    client.add(members).await.unwrap();

    client
        .add([SpaceBaseRoleAssignment::new(
            SpaceId::DEFAULT,
            SpaceResourceRole::LabelEditor,
        )])
        .await
        .unwrap();

    for i in 0..10 {
        assert!(client
            .check(&format!("user{i}"), Permission::EditLabel, ResourceType::Space, 0)
            .await
            .unwrap());
    }
    assert!(!client
        .check("outsider", Permission::EditLabel, ResourceType::Space, 0)
        .await
        .unwrap());
}

#[tokio::test]
async fn test_reference_inheritance() {
    let client = memory_client().await;
    client
        .add([
            Relationship::from(ReferenceSpace::new("plant-viruses", SpaceId::new(3))),
            SpaceMembership::new("maria", SpaceId::new(3), SpaceRole::Member).into(),
            SpaceUserRoleAssignment::new(
                SpaceId::new(3),
                "maria",
                SpaceResourceRole::ReferenceContributor,
            )
            .into(),
            GroupMembership::new("ivan", GroupId::new(5)).into(),
            ReferenceGroupRoleAssignment::new("plant-viruses", GroupId::new(5), ReferenceRole::Editor)
                .into(),
        ])
        .await
        .unwrap();

    let results = client
        .check_many(vec![
            Check::new(
                "maria",
                Permission::ContributeReference,
                ResourceType::Reference,
                "plant-viruses",
            ),
            Check::new(
                "maria",
                Permission::EditReference,
                ResourceType::Reference,
                "plant-viruses",
            ),
            Check::new(
                "ivan",
                Permission::EditReference,
                ResourceType::Reference,
                "plant-viruses",
            ),
            Check::new(
                "ivan",
                Permission::BuildReference,
                ResourceType::Reference,
                "plant-viruses",
            ),
        ])
        .await
        .unwrap();
    assert_eq!(results, vec![true, false, true, false]);
}

#[tokio::test]
async fn test_concurrent_relationship_writes() {
    let client = memory_client().await;
    let memberships: Vec<GroupMembership> = (0..50)
        .map(|i| GroupMembership::new(format!("user{i}"), GroupId::new(i % 5)))
        .collect();

    let result = client.add(memberships.clone()).await.unwrap();
    assert_eq!(
        result,
        AddResult {
            added_count: 50,
            exists_count: 0
        }
    );

    let again = client.add(memberships).await.unwrap();
    assert_eq!(again.exists_count, 50);
    assert_eq!(
        client
            .tuple_store()
            .tuple_count(client.store_id())
            .await
            .unwrap(),
        50
    );
}

#[tokio::test]
async fn test_bootstrap_reuses_store_and_model() {
    let store = MemoryTupleStore::new();
    let first = bootstrap(store.clone(), &BootstrapConfig::default())
        .await
        .unwrap();
    first
        .add([GroupMembership::new("bob", GroupId::new(1))])
        .await
        .unwrap();

    let second = bootstrap(store.clone(), &BootstrapConfig::default())
        .await
        .unwrap();
    assert_eq!(second.model_id(), first.model_id());
    assert_eq!(second.list_groups("bob").await.unwrap(), vec![GroupId::new(1)]);
    assert_eq!(
        store
            .read_authorization_models(second.store_id())
            .await
            .unwrap()
            .len(),
        1
    );
}

// =============================================================================
// Legacy Migration Tests
// =============================================================================

#[tokio::test]
async fn test_legacy_administrators_round_trip() {
    let client = memory_client().await;
    let mirror = MemoryLegacyMirror::new();
    let flag = LegacyFlag::default();
    mirror
        .set_field(&flag.collection, "root", &flag.field, true)
        .await
        .unwrap();

    let sync = LegacyFlagSync::new(client.clone(), Arc::new(mirror.clone()), flag);
    let summary = sync.migrate_legacy_administrators().await.unwrap();
    assert_eq!(summary.added, 1);

    assert!(client
        .check("root", AdministratorRole::Base, ResourceType::App, APP_OBJECT_ID)
        .await
        .unwrap());

    client
        .add([AdministratorRoleAssignment::new("root", AdministratorRole::Users)])
        .await
        .unwrap();
    sync.reconcile_legacy_flags().await.unwrap();
    assert_eq!(
        mirror.find_flagged("users", "administrator").await.unwrap(),
        Vec::<String>::new()
    );
}

// =============================================================================
// Live OpenFGA Tests
// =============================================================================

#[tokio::test]
#[ignore = "Requires running OpenFGA instance"]
async fn test_live_bootstrap_is_idempotent() {
    let Some(config) = openfga_config() else {
        eprintln!("Skipping: OPENFGA_HOST not set");
        return;
    };

    let store_name = test_id();
    let bootstrap_config = BootstrapConfig {
        store_name,
        ..BootstrapConfig::default()
    };
    let http = OpenFgaHttpClient::new(&config).unwrap();

    let first = bootstrap(http.clone(), &bootstrap_config).await.unwrap();
    let second = bootstrap(http.clone(), &bootstrap_config).await.unwrap();

    assert_eq!(first.store_id(), second.store_id());
    assert_eq!(first.model_id(), second.model_id());
    assert_eq!(
        http.read_authorization_models(first.store_id())
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
#[ignore = "Requires running OpenFGA instance"]
async fn test_live_basic_permission_check_flow() {
    let Some(client) = live_client().await else {
        return;
    };
    let user = test_id();

    client
        .add([
            Relationship::from(SpaceMembership::new(user.as_str(), SpaceId::DEFAULT, SpaceRole::Member)),
            SpaceUserRoleAssignment::new(
                SpaceId::DEFAULT,
                user.as_str(),
                SpaceResourceRole::SubtractionEditor,
            )
            .into(),
        ])
        .await
        .unwrap();

    assert!(client
        .check(&user, Permission::EditSubtraction, ResourceType::Space, 0)
        .await
        .unwrap());
    assert!(!client
        .check(&user, Permission::DeleteProject, ResourceType::Space, 0)
        .await
        .unwrap());

    client
        .add([SpaceUserRoleAssignment::new(
            SpaceId::DEFAULT,
            user.as_str(),
            SpaceResourceRole::ProjectManager,
        )])
        .await
        .unwrap();
    assert_eq!(
        client.list_user_roles(&user, SpaceId::DEFAULT).await.unwrap(),
        vec!["member", "project_manager", "subtraction_editor"]
    );
}

#[tokio::test]
#[ignore = "Requires running OpenFGA instance"]
async fn test_live_add_and_remove_are_idempotent() {
    let Some(client) = live_client().await else {
        return;
    };
    let user = test_id();
    let membership = GroupMembership::new(user.as_str(), GroupId::new(1));

    assert_eq!(client.add([membership.clone()]).await.unwrap().added_count, 1);
    assert_eq!(client.add([membership.clone()]).await.unwrap().exists_count, 1);
    assert_eq!(client.remove([membership.clone()]).await.unwrap().removed_count, 1);
    assert_eq!(client.remove([membership]).await.unwrap().not_found_count, 1);
}

#[tokio::test]
#[ignore = "Requires running OpenFGA instance"]
async fn test_live_administrator_hierarchy() {
    let Some(client) = live_client().await else {
        return;
    };
    let user = test_id();

    client
        .set_administrator_role(&user, Some(AdministratorRole::Settings))
        .await
        .unwrap();
    assert!(client
        .check(&user, AdministratorRole::Spaces, ResourceType::App, APP_OBJECT_ID)
        .await
        .unwrap());
    assert!(!client
        .check(&user, AdministratorRole::Full, ResourceType::App, APP_OBJECT_ID)
        .await
        .unwrap());

    client.set_administrator_role(&user, None).await.unwrap();
    assert_eq!(client.get_administrator(&user).await.unwrap().1, None);
}
