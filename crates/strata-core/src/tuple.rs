//! Wire-level tuple keys and read filters

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{AuthzError, Result};
use crate::resource::ResourceType;

/// One relation tuple as the tuple store sees it
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TupleKey {
    /// `type:id` or `type:id#relation` for usersets
    pub user: String,
    pub relation: String,
    /// `type:id`
    pub object: String,
}

impl TupleKey {
    pub fn new(
        user: impl Into<String>,
        relation: impl Into<String>,
        object: impl Into<String>,
    ) -> Self {
        Self {
            user: user.into(),
            relation: relation.into(),
            object: object.into(),
        }
    }

    pub fn user_ref(&self) -> Result<ObjectRef> {
        ObjectRef::parse(&self.user)
    }

    pub fn object_ref(&self) -> Result<ObjectRef> {
        ObjectRef::parse(&self.object)
    }
}

impl fmt::Display for TupleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}@{}", self.object, self.relation, self.user)
    }
}

/// Filter for reading tuples. `object` may be a bare `type:` prefix to match
/// every object of that type, which the store only accepts together with a
/// user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
    pub object: String,
}

impl TupleFilter {
    /// Every tuple on one object
    pub fn object(object_type: ResourceType, object_id: impl fmt::Display) -> Self {
        Self {
            user: None,
            relation: None,
            object: format!("{object_type}:{object_id}"),
        }
    }

    /// Every tuple of `user` on any object of `object_type`
    pub fn user_on_type(user: impl Into<String>, object_type: ResourceType) -> Self {
        Self {
            user: Some(user.into()),
            relation: None,
            object: format!("{object_type}:"),
        }
    }

    pub fn with_user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    pub fn with_relation(mut self, relation: impl Into<String>) -> Self {
        self.relation = Some(relation.into());
        self
    }

    /// Whether `key` is selected by this filter
    pub fn matches(&self, key: &TupleKey) -> bool {
        let object_matches = match self.object.strip_suffix(':') {
            Some(object_type) => key
                .object
                .split_once(':')
                .is_some_and(|(t, _)| t == object_type),
            None => key.object == self.object,
        };

        object_matches
            && self.user.as_deref().map_or(true, |u| u == key.user)
            && self.relation.as_deref().map_or(true, |r| r == key.relation)
    }
}

/// Parsed `type:id` or `type:id#relation` reference
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectRef {
    pub object_type: String,
    pub id: String,
    pub relation: Option<String>,
}

impl ObjectRef {
    pub fn parse(s: &str) -> Result<Self> {
        let (object, relation) = match s.split_once('#') {
            Some((object, relation)) => (object, Some(relation.to_string())),
            None => (s, None),
        };

        let (object_type, id) = object
            .split_once(':')
            .filter(|(t, id)| !t.is_empty() && !id.is_empty())
            .ok_or_else(|| AuthzError::protocol("invalid_object", format!("malformed object reference: {s}")))?;

        Ok(Self {
            object_type: object_type.to_string(),
            id: id.to_string(),
            relation,
        })
    }

    /// The `type:id` part without any relation
    pub fn object(&self) -> String {
        format!("{}:{}", self.object_type, self.id)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.relation {
            Some(relation) => write!(f, "{}:{}#{}", self.object_type, self.id, relation),
            None => write!(f, "{}:{}", self.object_type, self.id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_userset() {
        let parsed = ObjectRef::parse("group:3#member").unwrap();
        assert_eq!(parsed.object_type, "group");
        assert_eq!(parsed.id, "3");
        assert_eq!(parsed.relation.as_deref(), Some("member"));
        assert_eq!(parsed.object(), "group:3");
        assert_eq!(parsed.to_string(), "group:3#member");
    }

    #[test]
    fn test_parse_rejects_missing_id() {
        assert!(ObjectRef::parse("space:").is_err());
        assert!(ObjectRef::parse("bob").is_err());
    }

    #[test]
    fn test_type_prefix_filter() {
        let filter = TupleFilter::user_on_type("user:bob", ResourceType::Group);
        assert!(filter.matches(&TupleKey::new("user:bob", "member", "group:1")));
        assert!(!filter.matches(&TupleKey::new("user:bob", "member", "space:1")));
        assert!(!filter.matches(&TupleKey::new("user:alice", "member", "group:1")));
    }

    #[test]
    fn test_filter_serialization_omits_absent_fields() {
        let filter = TupleFilter::object(ResourceType::Space, 0).with_relation("owner");
        let json = serde_json::to_value(&filter).unwrap();
        assert_eq!(json, serde_json::json!({"relation": "owner", "object": "space:0"}));
    }
}
