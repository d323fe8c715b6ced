//! Payload validation for aggregate writes.
//!
//! Runs before any statement executes, so a rejected payload never opens a
//! transaction.

use std::collections::HashSet;

use crate::defaults::{MAX_DESCRIPTION_LEN, MAX_MEMBERS, MAX_TITLE_LEN};
use crate::error::{Error, Result};
use crate::models::{AggregateDraft, AggregateInput, AggregateKind};

impl AggregateInput {
    /// Validate the payload and normalize it into a draft.
    ///
    /// - title is trimmed and must be non-empty and at most
    ///   [`MAX_TITLE_LEN`] characters
    /// - description defaults to the empty string
    /// - `item_ids` must be non-empty, positive, and at most [`MAX_MEMBERS`]
    ///   distinct ids; repeats are dropped keeping the first occurrence
    /// - editorial lists are never private
    pub fn validate(self, kind: AggregateKind) -> Result<AggregateDraft> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(Error::Validation("title is required".to_string()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(Error::Validation(format!(
                "title exceeds maximum length of {} characters",
                MAX_TITLE_LEN
            )));
        }

        let description = self.description.unwrap_or_default();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(Error::Validation(format!(
                "description exceeds maximum length of {} characters",
                MAX_DESCRIPTION_LEN
            )));
        }

        let item_ids = distinct_in_order(&self.item_ids);
        if item_ids.is_empty() {
            return Err(Error::Validation(
                "at least one item is required".to_string(),
            ));
        }
        if let Some(bad) = item_ids.iter().find(|id| **id <= 0) {
            return Err(Error::Validation(format!("invalid item id {}", bad)));
        }
        if item_ids.len() > MAX_MEMBERS {
            return Err(Error::Validation(format!(
                "a list may contain at most {} items",
                MAX_MEMBERS
            )));
        }

        if let Some(version) = self.version {
            if version < 1 {
                return Err(Error::Validation(format!("invalid version {}", version)));
            }
        }

        let is_private = match kind {
            AggregateKind::ItemList => self.is_private.unwrap_or(false),
            AggregateKind::Editorial => false,
        };

        Ok(AggregateDraft {
            title: title.to_string(),
            description,
            is_private,
            item_ids,
            expected_version: self.version,
        })
    }
}

fn distinct_in_order(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(ids.len());
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str, item_ids: Vec<i64>) -> AggregateInput {
        AggregateInput {
            title: title.to_string(),
            item_ids,
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_item_list_draft() {
        let draft = AggregateInput {
            is_private: Some(true),
            description: Some("Summer".to_string()),
            ..input("  Trip ", vec![1, 2, 3])
        }
        .validate(AggregateKind::ItemList)
        .unwrap();

        assert_eq!(draft.title, "Trip");
        assert_eq!(draft.description, "Summer");
        assert!(draft.is_private);
        assert_eq!(draft.item_ids, vec![1, 2, 3]);
        assert_eq!(draft.expected_version, None);
    }

    #[test]
    fn test_missing_title_rejected() {
        let err = input("   ", vec![1]).validate(AggregateKind::ItemList).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("title")));
    }

    #[test]
    fn test_overlong_title_rejected() {
        let long = "x".repeat(MAX_TITLE_LEN + 1);
        assert!(input(&long, vec![1]).validate(AggregateKind::ItemList).is_err());
    }

    #[test]
    fn test_empty_membership_rejected() {
        let err = input("Trip", vec![]).validate(AggregateKind::Editorial).unwrap_err();
        assert!(matches!(err, Error::Validation(msg) if msg.contains("at least one item")));
    }

    #[test]
    fn test_non_positive_item_id_rejected() {
        assert!(input("Trip", vec![1, 0]).validate(AggregateKind::ItemList).is_err());
        assert!(input("Trip", vec![-4]).validate(AggregateKind::ItemList).is_err());
    }

    #[test]
    fn test_duplicates_dropped_keeping_first_occurrence() {
        let draft = input("Trip", vec![3, 1, 3, 2, 1])
            .validate(AggregateKind::ItemList)
            .unwrap();
        assert_eq!(draft.item_ids, vec![3, 1, 2]);
    }

    #[test]
    fn test_editorial_is_never_private() {
        let draft = AggregateInput {
            is_private: Some(true),
            ..input("Staff picks", vec![5])
        }
        .validate(AggregateKind::Editorial)
        .unwrap();
        assert!(!draft.is_private);
    }

    #[test]
    fn test_description_defaults_to_empty() {
        let draft = input("Trip", vec![1]).validate(AggregateKind::ItemList).unwrap();
        assert_eq!(draft.description, "");
    }

    #[test]
    fn test_version_must_be_positive() {
        let bad = AggregateInput {
            version: Some(0),
            ..input("Trip", vec![1])
        };
        assert!(bad.validate(AggregateKind::ItemList).is_err());

        let good = AggregateInput {
            version: Some(3),
            ..input("Trip", vec![1])
        };
        assert_eq!(
            good.validate(AggregateKind::ItemList).unwrap().expected_version,
            Some(3)
        );
    }

    #[test]
    fn test_membership_cap() {
        let ids: Vec<i64> = (1..=(MAX_MEMBERS as i64 + 1)).collect();
        assert!(input("Big", ids).validate(AggregateKind::ItemList).is_err());
    }
}
