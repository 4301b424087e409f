//! Data structures for the remote media catalog.
//!
//! This module provides the series and episode records fetched from the remote
//! service, the classification of opaque identifiers, and the client that
//! retrieves them.
mod client;
mod resources;
mod scope;

pub use client::CatalogClient;
pub use scope::ClientScope;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A named collection of episodes on the remote service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Stable identifier, unique within an instance
    pub identifier: String,
    /// Display title
    pub title: String,
    /// Remaining fields as delivered by the remote service
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A single media item belonging to a series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Episode {
    /// Stable identifier, unique within an instance
    pub identifier: String,
    /// Display title
    pub title: String,
    /// Identifier of the series this episode belongs to
    #[serde(default, deserialize_with = "empty_as_none")]
    pub is_part_of: Option<String>,
    /// Remaining fields as delivered by the remote service
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// What kind of remote entity an identifier resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Classification {
    /// The identifier names an episode
    Episode,
    /// The identifier names a series
    Series,
    /// Neither probe succeeded
    Undefined,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Classification::Episode => "EPISODE",
            Classification::Series => "SERIES",
            Classification::Undefined => "UNDEFINED",
        };
        f.write_str(name)
    }
}

/// The remote service reports a missing series as an empty string.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_episode_keeps_unknown_fields() {
        let episode: Episode = serde_json::from_str(
            r#"{"identifier":"e1","title":"Intro","is_part_of":"s1","start":"2024-01-01T10:00:00Z"}"#,
        )
        .unwrap();

        assert_eq!(episode.is_part_of.as_deref(), Some("s1"));
        assert_eq!(
            episode.extra.get("start"),
            Some(&Value::String("2024-01-01T10:00:00Z".to_string()))
        );
    }

    #[test]
    fn test_episode_without_series() {
        let missing: Episode =
            serde_json::from_str(r#"{"identifier":"e1","title":"Intro"}"#).unwrap();
        let empty: Episode =
            serde_json::from_str(r#"{"identifier":"e1","title":"Intro","is_part_of":""}"#)
                .unwrap();

        assert_eq!(missing.is_part_of, None);
        assert_eq!(empty.is_part_of, None);
    }

    #[test]
    fn test_classification_display() {
        assert_eq!(Classification::Episode.to_string(), "EPISODE");
        assert_eq!(Classification::Series.to_string(), "SERIES");
        assert_eq!(Classification::Undefined.to_string(), "UNDEFINED");
        assert_eq!(
            serde_json::to_string(&Classification::Undefined).unwrap(),
            "\"UNDEFINED\""
        );
    }
}
