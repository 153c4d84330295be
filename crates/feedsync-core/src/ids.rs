//! Feed identifiers
//!
//! A feed is addressed by a `(group, id)` pair, written `group:id` on the wire
//! and in logs. Every other entity id in feedsync is an opaque string.

use crate::errors::FeedsError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Composite feed identifier (`group:id`).
///
/// Equality, hashing and ordering are structural over both parts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeedId {
    group: String,
    id: String,
}

impl FeedId {
    /// Create a feed id from its two parts.
    pub fn new(group: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            id: id.into(),
        }
    }

    /// The feed group (e.g. `user`, `timeline`).
    pub fn group(&self) -> &str {
        &self.group
    }

    /// The feed id within its group.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// The `group:id` form.
    pub fn raw_value(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for FeedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.group, self.id)
    }
}

impl FromStr for FeedId {
    type Err = FeedsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((group, id)) if !group.is_empty() && !id.is_empty() => Ok(Self::new(group, id)),
            _ => Err(FeedsError::invalid_input(format!(
                "feed id must have the form group:id, got '{s}'"
            ))),
        }
    }
}

impl Serialize for FeedId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FeedId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display_round_trip() {
        let fid: FeedId = "user:alice".parse().unwrap();
        assert_eq!(fid.group(), "user");
        assert_eq!(fid.id(), "alice");
        assert_eq!(fid.to_string(), "user:alice");
    }

    #[test]
    fn id_part_may_contain_colons() {
        let fid: FeedId = "timeline:a:b".parse().unwrap();
        assert_eq!(fid.group(), "timeline");
        assert_eq!(fid.id(), "a:b");
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["user", ":alice", "user:", ""] {
            assert!(raw.parse::<FeedId>().is_err(), "{raw} should not parse");
        }
    }

    #[test]
    fn serializes_as_string() {
        let fid = FeedId::new("user", "bob");
        let json = serde_json::to_string(&fid).unwrap();
        assert_eq!(json, "\"user:bob\"");
        let back: FeedId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fid);
    }
}
