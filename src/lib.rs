//! Strata - relationship-based authorization core
//!
//! Facade over the workspace crates:
//!
//! - [`strata_core`]: resource types, roles, permissions and relationship values
//! - [`strata_openfga`]: the OpenFGA model, tuple stores, bootstrap and the
//!   [`AuthorizationClient`]
//! - [`strata_sync`]: keeps the legacy administrator flag in step with roles

pub use strata_core;
pub use strata_openfga;
pub use strata_sync;

pub use strata_core::{
    AdministratorRole, AuthzError, GroupId, Permission, ReferenceRole, Relationship,
    ResourceType, Result, SpaceId, SpaceResourceRole, SpaceRole, UserId,
};
pub use strata_openfga::{bootstrap, AuthorizationClient, BootstrapConfig, OpenFgaConfig};
