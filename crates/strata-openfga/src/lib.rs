//! OpenFGA authorization model, tuple stores and authorization client for Strata

pub mod bootstrap;
pub mod client;
pub mod memory;
pub mod model;
pub mod service;
pub mod store;


pub use bootstrap::{bootstrap, ensure_store, write_model_if_absent, BootstrapConfig, ModelPolicy};
pub use client::{OpenFgaConfig, OpenFgaHttpClient};
pub use memory::MemoryTupleStore;
pub use model::{authorization_model, AuthorizationModel};
pub use service::{AddResult, AuthorizationClient, Check, ClientConfig, ListingScope, RemoveResult};
pub use store::{Page, Store, Tuple, TupleStore};
