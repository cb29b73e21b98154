//! PostgreSQL layer for Strata's legacy flag mirror

pub mod mirror;

pub use mirror::PgLegacyMirror;
