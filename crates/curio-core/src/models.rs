//! Domain models for curio collections and the activity trail.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

// =============================================================================
// ACTOR
// =============================================================================

/// The authenticated user performing a request.
///
/// Supplied by the upstream authentication layer and trusted as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub is_admin: bool,
}

impl Actor {
    /// A regular (non-admin) user.
    pub fn user(user_id: i64) -> Self {
        Self {
            user_id,
            is_admin: false,
        }
    }

    /// A curator with the admin capability.
    pub fn admin(user_id: i64) -> Self {
        Self {
            user_id,
            is_admin: true,
        }
    }
}

// =============================================================================
// AGGREGATES
// =============================================================================

/// The two kinds of parent aggregate that own a membership set of items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AggregateKind {
    /// A user-owned list, optionally private.
    ItemList,
    /// A curator-only list, visible to every authenticated user.
    Editorial,
}

impl AggregateKind {
    /// Human-readable resource name used in error messages.
    pub fn resource_name(self) -> &'static str {
        match self {
            AggregateKind::ItemList => "Item list",
            AggregateKind::Editorial => "Editorial list",
        }
    }

    /// Activity category recorded for mutations of this kind.
    pub fn activity_category(self) -> ActivityCategory {
        match self {
            AggregateKind::ItemList => ActivityCategory::ItemList,
            AggregateKind::Editorial => ActivityCategory::EditorialList,
        }
    }

    /// Whether every mutation of this kind requires the admin capability.
    pub fn requires_admin(self) -> bool {
        matches!(self, AggregateKind::Editorial)
    }

    /// Ownership predicate applied to update/delete for this actor.
    ///
    /// Item lists are scoped to their owner; editorial lists are gated by the
    /// admin check instead, so any row matches.
    pub fn owner_scope(self, actor: &Actor) -> OwnerScope {
        match self {
            AggregateKind::ItemList => OwnerScope::Owner(actor.user_id),
            AggregateKind::Editorial => OwnerScope::Any,
        }
    }
}

/// Ownership predicate for locating an aggregate row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerScope {
    /// Row must belong to this user id.
    Owner(i64),
    /// Any row with the id matches.
    Any,
}

impl OwnerScope {
    /// Bind value for `($n::bigint IS NULL OR owner_id = $n)` predicates.
    pub fn as_param(self) -> Option<i64> {
        match self {
            OwnerScope::Owner(id) => Some(id),
            OwnerScope::Any => None,
        }
    }
}

/// A parent aggregate (item list or editorial list) with its membership.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub id: i64,
    pub kind: AggregateKind,
    pub title: String,
    pub description: String,
    /// Required for item lists; the creating curator for editorial lists.
    pub owner_id: Option<i64>,
    /// Always false for editorial lists.
    pub is_private: bool,
    pub created_at: DateTime<Utc>,
    /// Incremented on every update.
    pub version: i32,
    /// Member item ids, ordered by the item's own `entered_on`.
    pub item_ids: Vec<i64>,
}

/// Request body for creating or replacing an aggregate.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregateInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub item_ids: Vec<i64>,
    /// Ignored for editorial lists.
    #[serde(default)]
    pub is_private: Option<bool>,
    /// When present on update, must match the stored version.
    #[serde(default)]
    pub version: Option<i32>,
}

/// A validated aggregate payload, ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateDraft {
    pub title: String,
    pub description: String,
    pub is_private: bool,
    /// Distinct ids in caller order.
    pub item_ids: Vec<i64>,
    pub expected_version: Option<i32>,
}

// =============================================================================
// ITEMS
// =============================================================================

/// The slice of an item the write pipeline needs to validate a reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    pub id: i64,
    pub owner_id: i64,
    pub is_private: bool,
}

impl ItemRef {
    /// Private items may only be referenced by their owner.
    pub fn visible_to(&self, actor: &Actor) -> bool {
        !self.is_private || self.owner_id == actor.user_id
    }
}

// =============================================================================
// ACTIVITY
// =============================================================================

/// What kind of element an activity row refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityCategory {
    Item,
    ItemList,
    EditorialList,
}

impl ActivityCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityCategory::Item => "ITEM",
            ActivityCategory::ItemList => "ITEM_LIST",
            ActivityCategory::EditorialList => "EDITORIAL_LIST",
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityCategory {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ITEM" => Ok(ActivityCategory::Item),
            "ITEM_LIST" => Ok(ActivityCategory::ItemList),
            "EDITORIAL_LIST" => Ok(ActivityCategory::EditorialList),
            other => Err(Error::Validation(format!(
                "unknown activity category '{}'",
                other
            ))),
        }
    }
}

/// The mutation an activity row records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActivityType {
    Create,
    Update,
    Delete,
}

impl ActivityType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActivityType::Create => "CREATE",
            ActivityType::Update => "UPDATE",
            ActivityType::Delete => "DELETE",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATE" => Ok(ActivityType::Create),
            "UPDATE" => Ok(ActivityType::Update),
            "DELETE" => Ok(ActivityType::Delete),
            other => Err(Error::Validation(format!("unknown activity type '{}'", other))),
        }
    }
}

/// An immutable audit record of a committed mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: Uuid,
    pub category: ActivityCategory,
    pub element_id: i64,
    #[serde(rename = "type")]
    pub kind: ActivityType,
    pub user_id: i64,
    pub entered_on: DateTime<Utc>,
}

/// An activity about to be recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewActivity {
    pub category: ActivityCategory,
    pub element_id: i64,
    pub kind: ActivityType,
    pub user_id: i64,
}

impl NewActivity {
    /// Reject missing (non-positive) element or actor ids.
    pub fn validate(&self) -> Result<()> {
        if self.element_id <= 0 {
            return Err(Error::Validation(
                "activity element_id is required".to_string(),
            ));
        }
        if self.user_id <= 0 {
            return Err(Error::Validation("activity user_id is required".to_string()));
        }
        Ok(())
    }
}

/// Filter for reading the activity feed.
#[derive(Debug, Clone, Default)]
pub struct ActivityFilter {
    pub category: Option<ActivityCategory>,
    pub element_id: Option<i64>,
    pub limit: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trips_through_str() {
        for category in [
            ActivityCategory::Item,
            ActivityCategory::ItemList,
            ActivityCategory::EditorialList,
        ] {
            assert_eq!(category.as_str().parse::<ActivityCategory>().unwrap(), category);
        }
    }

    #[test]
    fn test_category_parse_is_case_insensitive() {
        assert_eq!(
            "item_list".parse::<ActivityCategory>().unwrap(),
            ActivityCategory::ItemList
        );
        assert!("playlist".parse::<ActivityCategory>().is_err());
    }

    #[test]
    fn test_activity_serializes_type_field() {
        let activity = Activity {
            id: Uuid::nil(),
            category: ActivityCategory::ItemList,
            element_id: 12,
            kind: ActivityType::Update,
            user_id: 7,
            entered_on: Utc::now(),
        };
        let json = serde_json::to_value(&activity).unwrap();
        assert_eq!(json["type"], "UPDATE");
        assert_eq!(json["category"], "ITEM_LIST");
        assert_eq!(json["element_id"], 12);
    }

    #[test]
    fn test_new_activity_requires_ids() {
        let mut entry = NewActivity {
            category: ActivityCategory::EditorialList,
            element_id: 3,
            kind: ActivityType::Create,
            user_id: 1,
        };
        assert!(entry.validate().is_ok());

        entry.element_id = 0;
        assert!(matches!(entry.validate(), Err(Error::Validation(_))));

        entry.element_id = 3;
        entry.user_id = 0;
        assert!(matches!(entry.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn test_owner_scope_per_kind() {
        let actor = Actor::user(7);
        assert_eq!(
            AggregateKind::ItemList.owner_scope(&actor),
            OwnerScope::Owner(7)
        );
        assert_eq!(AggregateKind::Editorial.owner_scope(&actor), OwnerScope::Any);
        assert_eq!(OwnerScope::Owner(7).as_param(), Some(7));
        assert_eq!(OwnerScope::Any.as_param(), None);
    }

    #[test]
    fn test_item_ref_visibility() {
        let item = ItemRef {
            id: 4,
            owner_id: 2,
            is_private: true,
        };
        assert!(item.visible_to(&Actor::user(2)));
        assert!(!item.visible_to(&Actor::user(3)));
        assert!(ItemRef {
            is_private: false,
            ..item
        }
        .visible_to(&Actor::user(3)));
    }

    #[test]
    fn test_aggregate_input_defaults() {
        let input: AggregateInput =
            serde_json::from_str(r#"{"title":"Trip","item_ids":[1,2]}"#).unwrap();
        assert_eq!(input.description, None);
        assert_eq!(input.is_private, None);
        assert_eq!(input.version, None);
        assert_eq!(input.item_ids, vec![1, 2]);
    }
}
