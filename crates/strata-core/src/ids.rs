//! Strongly-typed identifiers for authorization subjects and objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate strongly-typed ID wrappers
macro_rules! define_id {
    ($name:ident, numeric) => {
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }
    };
    ($name:ident, text) => {
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }
    };
}

define_id!(UserId, text);
define_id!(ReferenceId, text);
define_id!(SpaceId, numeric);
define_id!(GroupId, numeric);

impl SpaceId {
    /// The single space every deployment starts with.
    pub const DEFAULT: SpaceId = SpaceId::new(0);

    pub fn is_default(&self) -> bool {
        *self == Self::DEFAULT
    }
}

/// Id of the singleton application object administrator roles hang off.
pub const APP_OBJECT_ID: &str = "strata";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_id_parsing() {
        let id: SpaceId = "12".parse().unwrap();
        assert_eq!(id, SpaceId::new(12));
        assert!("twelve".parse::<SpaceId>().is_err());
    }

    #[test]
    fn test_default_space() {
        assert!(SpaceId::DEFAULT.is_default());
        assert!(!SpaceId::new(3).is_default());
    }

    #[test]
    fn test_text_id_display() {
        let id = UserId::from("ryanf");
        assert_eq!(id.to_string(), "ryanf");
        assert_eq!(id.as_str(), "ryanf");
    }

    #[test]
    fn test_id_serialization_is_transparent() {
        assert_eq!(serde_json::to_string(&GroupId::new(5)).unwrap(), "5");
        assert_eq!(serde_json::to_string(&UserId::from("bob")).unwrap(), "\"bob\"");
    }
}
