//! Strata Core - Authorization vocabulary and relationship model

pub mod error;
pub mod ids;
pub mod permissions;
pub mod relationship;
pub mod resource;
pub mod roles;
pub mod traits;
pub mod tuple;

#[cfg(test)]
mod tests;

pub use error::*;
pub use ids::*;
pub use permissions::*;
pub use relationship::*;
pub use resource::*;
pub use roles::*;
pub use traits::*;
pub use tuple::*;
