//! Tags: reference-counted labels owned by clusters and destinations.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The kinds of tag list a cluster or destination carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TagKind {
    Experience,
    InterestCenter,
    NoReplyGreeter,
    NoReplyVisitor,
    Notoriety,
    Place,
}

impl TagKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagKind::Experience => "Experience",
            TagKind::InterestCenter => "InterestCenter",
            TagKind::NoReplyGreeter => "NoReplyGreeter",
            TagKind::NoReplyVisitor => "NoReplyVisitor",
            TagKind::Notoriety => "Notoriety",
            TagKind::Place => "Place",
        }
    }

    pub fn parse(s: &str) -> Option<TagKind> {
        match s {
            "Experience" => Some(TagKind::Experience),
            "InterestCenter" => Some(TagKind::InterestCenter),
            "NoReplyGreeter" => Some(TagKind::NoReplyGreeter),
            "NoReplyVisitor" => Some(TagKind::NoReplyVisitor),
            "Notoriety" => Some(TagKind::Notoriety),
            "Place" => Some(TagKind::Place),
            _ => None,
        }
    }
}

/// A shared label. The label is unique per kind; rows are created on
/// first use and deleted when the last owner lets go.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tag {
    pub id: Uuid,
    pub kind: TagKind,
    pub label: String,
    /// Translated labels keyed by language code (`-` mapped to `_`).
    pub translations: BTreeMap<String, String>,
    pub created_at: DateTime<Utc>,
}

/// Split a legacy comma-separated list into trimmed, non-empty items.
///
/// Duplicates are preserved here; they collapse later through
/// get-or-create.
pub fn parse_tag_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Join items back into the comma-separated storage encoding.
pub fn join_tag_list(items: &[String]) -> String {
    items.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_trims_and_drops_empty_items() {
        assert_eq!(
            parse_tag_list(" castle , , harbour ,market,"),
            vec!["castle", "harbour", "market"]
        );
    }

    #[test]
    fn parse_empty_string_is_empty() {
        assert!(parse_tag_list("").is_empty());
        assert!(parse_tag_list(" , ,").is_empty());
    }

    #[test]
    fn join_round_trips_through_parse() {
        let items = vec!["castle".to_string(), "old town".to_string()];
        assert_eq!(parse_tag_list(&join_tag_list(&items)), items);
    }
}
