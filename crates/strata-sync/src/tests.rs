//! Unit tests for strata-sync

use super::*;
use std::sync::Arc;
use strata_core::*;
use strata_openfga::{bootstrap, BootstrapConfig, MemoryTupleStore};

async fn setup() -> (
    LegacyFlagSync<MemoryTupleStore, MemoryLegacyMirror>,
    strata_openfga::AuthorizationClient<MemoryTupleStore>,
    MemoryLegacyMirror,
) {
    let client = bootstrap(MemoryTupleStore::new(), &BootstrapConfig::default())
        .await
        .unwrap();
    let mirror = MemoryLegacyMirror::new();
    let sync = LegacyFlagSync::new(client.clone(), Arc::new(mirror.clone()), LegacyFlag::default());
    (sync, client, mirror)
}

async fn flag_of(mirror: &MemoryLegacyMirror, id: &str) -> Option<bool> {
    mirror.get_field("users", id, "administrator").await
}

// =============================================================================
// Memory Mirror Tests
// =============================================================================

#[cfg(test)]
mod mirror_tests {
    use super::*;

    #[tokio::test]
    async fn test_find_flagged_only_returns_true_fields() {
        let mirror = MemoryLegacyMirror::new();
        mirror.set_field("users", "bob", "administrator", true).await.unwrap();
        mirror.set_field("users", "alice", "administrator", false).await.unwrap();
        mirror.set_field("users", "carol", "active", true).await.unwrap();

        assert_eq!(
            mirror.find_flagged("users", "administrator").await.unwrap(),
            vec!["bob"]
        );
        assert!(mirror.find_flagged("groups", "administrator").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clones_share_records() {
        let mirror = MemoryLegacyMirror::new();
        let clone = mirror.clone();
        clone.set_field("users", "bob", "administrator", true).await.unwrap();
        assert_eq!(flag_of(&mirror, "bob").await, Some(true));
    }
}

// =============================================================================
// Sync Tests
// =============================================================================

#[cfg(test)]
mod sync_tests {
    use super::*;

    #[tokio::test]
    async fn test_flag_is_true_only_for_full() {
        let (sync, _, mirror) = setup().await;

        sync.sync_legacy_flag("bob", Some(AdministratorRole::Full)).await.unwrap();
        assert_eq!(flag_of(&mirror, "bob").await, Some(true));

        sync.sync_legacy_flag("bob", Some(AdministratorRole::Settings)).await.unwrap();
        assert_eq!(flag_of(&mirror, "bob").await, Some(false));

        sync.sync_legacy_flag("alice", None).await.unwrap();
        assert_eq!(flag_of(&mirror, "alice").await, Some(false));
    }

    #[tokio::test]
    async fn test_migrate_flagged_administrators() {
        let (sync, client, mirror) = setup().await;
        mirror.set_field("users", "bob", "administrator", true).await.unwrap();
        mirror.set_field("users", "alice", "administrator", true).await.unwrap();
        mirror.set_field("users", "carol", "administrator", false).await.unwrap();

        let summary = sync.migrate_legacy_administrators().await.unwrap();
        assert_eq!(
            summary,
            MigrationSummary {
                flagged: 2,
                added: 2,
                existing: 0
            }
        );

        assert_eq!(
            client.list_administrators().await.unwrap(),
            vec![
                (UserId::from("alice"), AdministratorRole::Full),
                (UserId::from("bob"), AdministratorRole::Full),
            ]
        );
        assert_eq!(flag_of(&mirror, "bob").await, Some(true));
    }

    #[tokio::test]
    async fn test_migration_is_repeatable() {
        let (sync, _, mirror) = setup().await;
        mirror.set_field("users", "bob", "administrator", true).await.unwrap();

        sync.migrate_legacy_administrators().await.unwrap();
        let summary = sync.migrate_legacy_administrators().await.unwrap();
        assert_eq!(
            summary,
            MigrationSummary {
                flagged: 1,
                added: 0,
                existing: 1
            }
        );
    }

    #[tokio::test]
    async fn test_migration_without_flagged_records() {
        let (sync, client, _) = setup().await;
        assert_eq!(
            sync.migrate_legacy_administrators().await.unwrap(),
            MigrationSummary::default()
        );
        assert!(client.list_administrators().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_reconcile_projects_roles_onto_flags() {
        let (sync, client, mirror) = setup().await;
        client
            .add([
                AdministratorRoleAssignment::new("dave", AdministratorRole::Full),
                AdministratorRoleAssignment::new("erin", AdministratorRole::Base),
                AdministratorRoleAssignment::new("gina", AdministratorRole::Full),
            ])
            .await
            .unwrap();
        mirror.set_field("users", "erin", "administrator", true).await.unwrap();
        mirror.set_field("users", "frank", "administrator", true).await.unwrap();
        mirror.set_field("users", "gina", "administrator", true).await.unwrap();

        let summary = sync.reconcile_legacy_flags().await.unwrap();
        assert_eq!(
            summary,
            ReconcileSummary {
                checked: 4,
                set: 1,
                cleared: 2
            }
        );

        assert_eq!(flag_of(&mirror, "dave").await, Some(true));
        assert_eq!(flag_of(&mirror, "erin").await, Some(false));
        assert_eq!(flag_of(&mirror, "frank").await, Some(false));
        assert_eq!(flag_of(&mirror, "gina").await, Some(true));
    }

    #[tokio::test]
    async fn test_assign_administrator_updates_both_stores() {
        let (sync, client, mirror) = setup().await;

        sync.assign_administrator("bob", Some(AdministratorRole::Full)).await.unwrap();
        assert_eq!(
            client.get_administrator("bob").await.unwrap().1,
            Some(AdministratorRole::Full)
        );
        assert_eq!(flag_of(&mirror, "bob").await, Some(true));

        sync.assign_administrator("bob", Some(AdministratorRole::Spaces)).await.unwrap();
        assert_eq!(
            client.get_administrator("bob").await.unwrap().1,
            Some(AdministratorRole::Spaces)
        );
        assert_eq!(flag_of(&mirror, "bob").await, Some(false));

        sync.assign_administrator("bob", None).await.unwrap();
        assert_eq!(client.get_administrator("bob").await.unwrap().1, None);
        assert_eq!(flag_of(&mirror, "bob").await, Some(false));
    }
}
