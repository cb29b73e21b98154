//! Legacy flag synchronization
//!
//! Code that predates role-based authorization reads a boolean administrator
//! flag from the primary store. The tuple store is the source of truth; the
//! flag is a projection of it that is `true` only for full administrators.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, instrument};

use strata_core::{
    AdministratorRole, AdministratorRoleAssignment, LegacyFlag, LegacyMirror, Result,
};
use strata_openfga::{AuthorizationClient, TupleStore};

/// Outcome of a one-time legacy administrator migration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    /// Records flagged in the mirror
    pub flagged: usize,
    /// Administrator tuples written
    pub added: usize,
    /// Records whose tuple was already present
    pub existing: usize,
}

/// Outcome of projecting tuple store roles back onto the mirror
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileSummary {
    /// Subjects that were flagged, held a role, or both
    pub checked: usize,
    /// Flags turned on
    pub set: usize,
    /// Flags turned off
    pub cleared: usize,
}

/// Keeps the legacy administrator flag consistent with administrator roles
pub struct LegacyFlagSync<S, M>
where
    S: TupleStore,
    M: LegacyMirror,
{
    client: AuthorizationClient<S>,
    mirror: Arc<M>,
    flag: LegacyFlag,
}

impl<S, M> LegacyFlagSync<S, M>
where
    S: TupleStore,
    M: LegacyMirror,
{
    pub fn new(client: AuthorizationClient<S>, mirror: Arc<M>, flag: LegacyFlag) -> Self {
        Self {
            client,
            mirror,
            flag,
        }
    }

    pub fn flag(&self) -> &LegacyFlag {
        &self.flag
    }

    /// Mirror `role` onto the subject's legacy flag
    #[instrument(skip(self))]
    pub async fn sync_legacy_flag(
        &self,
        subject_id: &str,
        role: Option<AdministratorRole>,
    ) -> Result<()> {
        let value = role == Some(AdministratorRole::Full);
        self.mirror
            .set_field(&self.flag.collection, subject_id, &self.flag.field, value)
            .await?;
        debug!("Legacy flag for {} set to {}", subject_id, value);
        Ok(())
    }

    /// Give every flagged subject the full administrator role. The legacy
    /// flag itself is left in place.
    #[instrument(skip(self))]
    pub async fn migrate_legacy_administrators(&self) -> Result<MigrationSummary> {
        let flagged = self
            .mirror
            .find_flagged(&self.flag.collection, &self.flag.field)
            .await?;

        if flagged.is_empty() {
            info!("No legacy administrators to migrate");
            return Ok(MigrationSummary::default());
        }

        info!("Migrating {} legacy administrators", flagged.len());
        let result = self
            .client
            .add(
                flagged
                    .iter()
                    .map(|id| AdministratorRoleAssignment::new(id.as_str(), AdministratorRole::Full)),
            )
            .await?;

        let summary = MigrationSummary {
            flagged: flagged.len(),
            added: result.added_count,
            existing: result.exists_count,
        };
        info!(?summary, "Legacy administrator migration complete");
        Ok(summary)
    }

    /// Rewrite the legacy flag of every flagged or role-holding subject from
    /// the roles held in the tuple store
    #[instrument(skip(self))]
    pub async fn reconcile_legacy_flags(&self) -> Result<ReconcileSummary> {
        let flagged: BTreeSet<String> = self
            .mirror
            .find_flagged(&self.flag.collection, &self.flag.field)
            .await?
            .into_iter()
            .collect();

        let mut roles: BTreeMap<String, AdministratorRole> = BTreeMap::new();
        for (user, role) in self.client.list_administrators().await? {
            let held = roles.entry(user.as_str().to_string()).or_insert(role);
            *held = (*held).max(role);
        }

        let subjects: BTreeSet<&String> = flagged.iter().chain(roles.keys()).collect();
        let mut summary = ReconcileSummary {
            checked: subjects.len(),
            ..ReconcileSummary::default()
        };

        for subject in subjects {
            let role = roles.get(subject).copied();
            let wanted = role == Some(AdministratorRole::Full);
            if wanted == flagged.contains(subject) {
                continue;
            }

            self.sync_legacy_flag(subject, role).await?;
            if wanted {
                summary.set += 1;
            } else {
                summary.cleared += 1;
            }
        }

        info!(?summary, "Legacy flags reconciled");
        Ok(summary)
    }

    /// Replace the subject's administrator role (`None` revokes it) and
    /// update the legacy flag to match
    #[instrument(skip(self))]
    pub async fn assign_administrator(
        &self,
        subject_id: &str,
        role: Option<AdministratorRole>,
    ) -> Result<()> {
        self.client.set_administrator_role(subject_id, role).await?;
        self.sync_legacy_flag(subject_id, role).await
    }
}
