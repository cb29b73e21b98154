//! Error types for the Strata authorization core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthzError {
    #[error("Tuple store connection error: {message}")]
    Connection { message: String },

    #[error("Tuple already exists: {tuple}")]
    AlreadyExists { tuple: String },

    #[error("Tuple not found: {tuple}")]
    NotFound { tuple: String },

    #[error("Tuple store error ({code}): {message}")]
    Protocol { code: String, message: String },

    #[error("Unknown role: {role}")]
    UnknownRole { role: String },

    #[error("Unknown permission: {permission}")]
    UnknownPermission { permission: String },

    #[error("Unsupported resource: {resource_type}:{resource_id}")]
    UnsupportedResource {
        resource_type: String,
        resource_id: String,
    },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Database error: {message}")]
    Database { message: String },

    #[error("Serialization error: {message}")]
    Serialization { message: String },
}

impl AuthzError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn already_exists(tuple: impl Into<String>) -> Self {
        Self::AlreadyExists {
            tuple: tuple.into(),
        }
    }

    pub fn not_found(tuple: impl Into<String>) -> Self {
        Self::NotFound {
            tuple: tuple.into(),
        }
    }

    pub fn protocol(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Protocol {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn unknown_role(role: impl Into<String>) -> Self {
        Self::UnknownRole { role: role.into() }
    }

    pub fn unsupported_resource(
        resource_type: impl Into<String>,
        resource_id: impl Into<String>,
    ) -> Self {
        Self::UnsupportedResource {
            resource_type: resource_type.into(),
            resource_id: resource_id.into(),
        }
    }

    pub fn config_error(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn database_error(message: impl Into<String>) -> Self {
        Self::Database {
            message: message.into(),
        }
    }

    pub fn serialization_error(message: impl Into<String>) -> Self {
        Self::Serialization {
            message: message.into(),
        }
    }

    /// Transport-level failure reaching the tuple store.
    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }
}

impl From<serde_json::Error> for AuthzError {
    fn from(e: serde_json::Error) -> Self {
        Self::serialization_error(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AuthzError>;
