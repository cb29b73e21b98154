//! Object kinds and action tags shared by roles and permissions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthzError;

/// Kind of object a relationship can reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    /// The singleton application object
    App,
    Space,
    Reference,
    User,
    Group,
}

impl ResourceType {
    pub const ALL: [ResourceType; 5] = [
        ResourceType::App,
        ResourceType::Space,
        ResourceType::Reference,
        ResourceType::User,
        ResourceType::Group,
    ];

    /// Type name used in tuple-store object and user strings
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::App => "app",
            ResourceType::Space => "space",
            ResourceType::Reference => "reference",
            ResourceType::User => "user",
            ResourceType::Group => "group",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceType {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| AuthzError::unsupported_resource(s, ""))
    }
}

/// Action tag carried by every permission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
    Cancel,
    Upload,
    Modify,
    Remove,
    View,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Create => write!(f, "create"),
            Action::Update => write!(f, "update"),
            Action::Delete => write!(f, "delete"),
            Action::Cancel => write!(f, "cancel"),
            Action::Upload => write!(f, "upload"),
            Action::Modify => write!(f, "modify"),
            Action::Remove => write!(f, "remove"),
            Action::View => write!(f, "view"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_type_round_trips_through_wire_name() {
        for resource_type in ResourceType::ALL {
            assert_eq!(resource_type.as_str().parse::<ResourceType>().unwrap(), resource_type);
        }
    }

    #[test]
    fn test_unknown_resource_type() {
        let err = "project".parse::<ResourceType>().unwrap_err();
        assert!(matches!(err, AuthzError::UnsupportedResource { .. }));
    }

    #[test]
    fn test_action_serialization() {
        assert_eq!(serde_json::to_string(&Action::Upload).unwrap(), "\"upload\"");
        assert_eq!(Action::Remove.to_string(), "remove");
    }
}
