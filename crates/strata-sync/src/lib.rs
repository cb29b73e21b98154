//! Strata Sync - legacy administrator flag synchronization

pub mod memory;
pub mod service;

#[cfg(test)]
mod tests;

pub use memory::MemoryLegacyMirror;
pub use service::{LegacyFlagSync, MigrationSummary, ReconcileSummary};
