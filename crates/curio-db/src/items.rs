//! Read-only access to the item catalog.
//!
//! Items are owned by another part of the system; the write pipeline only
//! checks that every referenced id exists and is visible to the actor.

use std::collections::HashSet;

use sqlx::{PgPool, Row};
use tracing::debug;

use curio_core::{Actor, Error, ItemRef, Result};

const SELECT_ITEM_REFS: &str = "SELECT id, owner_id, is_private FROM item WHERE id = ANY($1)";

/// PostgreSQL implementation of item lookups.
#[derive(Clone)]
pub struct PgItemRepository {
    pool: PgPool,
}

impl PgItemRepository {
    /// Create a new PgItemRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Literal SQL run while checking references.
    pub fn statements() -> Vec<&'static str> {
        vec![SELECT_ITEM_REFS]
    }

    /// Fetch the ownership slice of every existing item in `ids`.
    pub async fn find_refs(&self, ids: &[i64]) -> Result<Vec<ItemRef>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(SELECT_ITEM_REFS)
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .iter()
            .map(|r| ItemRef {
                id: r.get("id"),
                owner_id: r.get("owner_id"),
                is_private: r.get("is_private"),
            })
            .collect())
    }

    /// Fail with `Validation` unless every id names an item the actor may see.
    ///
    /// Missing and private-to-someone-else items are reported the same way,
    /// so the error never reveals that a private item exists.
    pub async fn ensure_referenceable(&self, actor: &Actor, ids: &[i64]) -> Result<()> {
        let refs = self.find_refs(ids).await?;
        let usable: HashSet<i64> = refs
            .iter()
            .filter(|item| item.visible_to(actor))
            .map(|item| item.id)
            .collect();

        let rejected = unusable_ids(ids, &usable);
        if rejected.is_empty() {
            return Ok(());
        }

        debug!(
            subsystem = "database",
            component = "items",
            op = "ensure_referenceable",
            rejected = rejected.len(),
            "Unknown or invisible item references"
        );
        Err(Error::Validation(format!(
            "unknown item ids: {}",
            rejected
                .iter()
                .map(i64::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        )))
    }
}

fn unusable_ids(requested: &[i64], usable: &HashSet<i64>) -> Vec<i64> {
    requested
        .iter()
        .copied()
        .filter(|id| !usable.contains(id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use curio_core::guard;

    #[test]
    fn test_unusable_ids_keeps_request_order() {
        let usable: HashSet<i64> = [2, 4].into_iter().collect();
        assert_eq!(unusable_ids(&[5, 2, 3, 4], &usable), vec![5, 3]);
        assert!(unusable_ids(&[2, 4], &usable).is_empty());
    }

    #[test]
    fn test_item_sql_passes_guard() {
        assert!(guard::check(PgItemRepository::statements()).is_ok());
    }
}
