//! Aggregate writer: item list and editorial list rows.
//!
//! Write methods take the caller's transaction and never touch the pool, so
//! the parent row, its membership and its activity row commit together.
//! Read methods use the pool directly.

use std::collections::HashMap;

use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;

use curio_core::{
    Actor, ActivityType, Aggregate, AggregateDraft, AggregateKind, Error, OwnerScope, Result,
};

use crate::members::PgMembershipStore;

/// Literal SQL for one aggregate table.
struct AggregateSql {
    insert: &'static str,
    lock: &'static str,
    update: &'static str,
    delete: &'static str,
    get_visible: &'static str,
    list_visible: &'static str,
}

const ITEM_LIST_SQL: AggregateSql = AggregateSql {
    insert: r#"
        INSERT INTO item_list (title, description, owner_id, is_private)
        VALUES ($1, $2, $3, $4)
        RETURNING id, title, description, owner_id, is_private, created_at, version
    "#,
    lock: r#"
        SELECT id, title, description, owner_id, is_private, created_at, version
        FROM item_list
        WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)
        FOR UPDATE
    "#,
    update: r#"
        UPDATE item_list
        SET title = $3, description = $4, is_private = $5, version = version + 1
        WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)
        RETURNING id, title, description, owner_id, is_private, created_at, version
    "#,
    delete: "DELETE FROM item_list WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)",
    get_visible: r#"
        SELECT id, title, description, owner_id, is_private, created_at, version
        FROM item_list
        WHERE id = $1 AND (owner_id = $2 OR is_private = FALSE)
    "#,
    list_visible: r#"
        SELECT id, title, description, owner_id, is_private, created_at, version
        FROM item_list
        WHERE owner_id = $1 OR is_private = FALSE
        ORDER BY created_at DESC, id DESC
        LIMIT $2 OFFSET $3
    "#,
};

const EDITORIAL_SQL: AggregateSql = AggregateSql {
    insert: r#"
        INSERT INTO editorial_list (title, description, owner_id)
        VALUES ($1, $2, $3)
        RETURNING id, title, description, owner_id, FALSE AS is_private, created_at, version
    "#,
    lock: r#"
        SELECT id, title, description, owner_id, FALSE AS is_private, created_at, version
        FROM editorial_list
        WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)
        FOR UPDATE
    "#,
    update: r#"
        UPDATE editorial_list
        SET title = $3, description = $4, version = version + 1
        WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)
        RETURNING id, title, description, owner_id, FALSE AS is_private, created_at, version
    "#,
    delete: "DELETE FROM editorial_list WHERE id = $1 AND ($2::bigint IS NULL OR owner_id = $2)",
    get_visible: r#"
        SELECT id, title, description, owner_id, FALSE AS is_private, created_at, version
        FROM editorial_list
        WHERE id = $1
    "#,
    list_visible: r#"
        SELECT id, title, description, owner_id, FALSE AS is_private, created_at, version
        FROM editorial_list
        ORDER BY created_at DESC, id DESC
        LIMIT $1 OFFSET $2
    "#,
};

fn sql_for(kind: AggregateKind) -> &'static AggregateSql {
    match kind {
        AggregateKind::ItemList => &ITEM_LIST_SQL,
        AggregateKind::Editorial => &EDITORIAL_SQL,
    }
}

fn not_found(kind: AggregateKind, id: i64) -> Error {
    Error::NotFound(format!("{} {} not found", kind.resource_name(), id))
}

fn row_to_aggregate(kind: AggregateKind, row: &PgRow) -> Aggregate {
    Aggregate {
        id: row.get("id"),
        kind,
        title: row.get("title"),
        description: row.get("description"),
        owner_id: row.get("owner_id"),
        is_private: row.get("is_private"),
        created_at: row.get("created_at"),
        version: row.get("version"),
        item_ids: Vec::new(),
    }
}

/// PostgreSQL implementation of the aggregate writer.
#[derive(Clone)]
pub struct PgAggregateWriter {
    pool: PgPool,
    members: PgMembershipStore,
}

impl PgAggregateWriter {
    /// Create a new PgAggregateWriter with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self {
            members: PgMembershipStore::new(pool.clone()),
            pool,
        }
    }

    /// Literal SQL this writer runs for one mutation.
    pub fn statements(kind: AggregateKind, op: ActivityType) -> Vec<&'static str> {
        let sql = sql_for(kind);
        match op {
            ActivityType::Create => vec![sql.insert],
            ActivityType::Update => vec![sql.lock, sql.update],
            ActivityType::Delete => vec![sql.lock, sql.delete],
        }
    }

    /// Insert the parent row. Returns it without members.
    pub async fn create_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: AggregateKind,
        owner_id: i64,
        draft: &AggregateDraft,
    ) -> Result<Aggregate> {
        let sql = sql_for(kind);
        let query = sqlx::query(sql.insert)
            .bind(&draft.title)
            .bind(&draft.description)
            .bind(owner_id);
        let query = match kind {
            AggregateKind::ItemList => query.bind(draft.is_private),
            AggregateKind::Editorial => query,
        };

        let row = query.fetch_one(&mut **tx).await?;
        let aggregate = row_to_aggregate(kind, &row);

        debug!(
            subsystem = "database",
            component = "aggregates",
            op = "create",
            aggregate_id = aggregate.id,
            "Aggregate row inserted"
        );
        Ok(aggregate)
    }

    /// Lock the row for the rest of the transaction.
    ///
    /// Concurrent writers to the same aggregate wait here, so membership
    /// replacement never interleaves.
    pub async fn lock_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: AggregateKind,
        id: i64,
        scope: OwnerScope,
    ) -> Result<Aggregate> {
        let row = sqlx::query(sql_for(kind).lock)
            .bind(id)
            .bind(scope.as_param())
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| not_found(kind, id))?;

        Ok(row_to_aggregate(kind, &row))
    }

    /// Update title, description and visibility, bumping the version.
    ///
    /// Fails with `NotFound` when no row matches the ownership predicate and
    /// with `Conflict` when `draft.expected_version` is stale.
    pub async fn update_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: AggregateKind,
        id: i64,
        scope: OwnerScope,
        draft: &AggregateDraft,
    ) -> Result<Aggregate> {
        let current = self.lock_tx(tx, kind, id, scope).await?;
        if let Some(expected) = draft.expected_version {
            if expected != current.version {
                return Err(Error::Conflict(format!(
                    "{} {} is at version {}, not {}",
                    kind.resource_name(),
                    id,
                    current.version,
                    expected
                )));
            }
        }

        let sql = sql_for(kind);
        let query = sqlx::query(sql.update)
            .bind(id)
            .bind(scope.as_param())
            .bind(&draft.title)
            .bind(&draft.description);
        let query = match kind {
            AggregateKind::ItemList => query.bind(draft.is_private),
            AggregateKind::Editorial => query,
        };

        let row = query
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| not_found(kind, id))?;

        Ok(row_to_aggregate(kind, &row))
    }

    /// Delete the parent row; membership rows cascade.
    pub async fn delete_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: AggregateKind,
        id: i64,
        scope: OwnerScope,
    ) -> Result<()> {
        let result = sqlx::query(sql_for(kind).delete)
            .bind(id)
            .bind(scope.as_param())
            .execute(&mut **tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(not_found(kind, id));
        }
        Ok(())
    }

    /// Fetch one aggregate with its members, if the actor may see it.
    pub async fn get(&self, kind: AggregateKind, id: i64, actor: &Actor) -> Result<Aggregate> {
        let sql = sql_for(kind);
        let query = sqlx::query(sql.get_visible).bind(id);
        let query = match kind {
            AggregateKind::ItemList => query.bind(actor.user_id),
            AggregateKind::Editorial => query,
        };

        let row = query
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| not_found(kind, id))?;

        let mut aggregate = row_to_aggregate(kind, &row);
        aggregate.item_ids = self.members.members(kind, id).await?;
        Ok(aggregate)
    }

    /// List aggregates visible to the actor, newest first, with members.
    ///
    /// Membership for the whole page is loaded in one query.
    pub async fn list(
        &self,
        kind: AggregateKind,
        actor: &Actor,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Aggregate>> {
        let sql = sql_for(kind);
        let query = sqlx::query(sql.list_visible);
        let query = match kind {
            AggregateKind::ItemList => query.bind(actor.user_id),
            AggregateKind::Editorial => query,
        };

        let rows = query
            .bind(limit)
            .bind(offset.max(0))
            .fetch_all(&self.pool)
            .await?;

        let mut aggregates: Vec<Aggregate> =
            rows.iter().map(|r| row_to_aggregate(kind, r)).collect();
        let ids: Vec<i64> = aggregates.iter().map(|a| a.id).collect();
        let mut members: HashMap<i64, Vec<i64>> = self.members.members_for(kind, &ids).await?;

        for aggregate in &mut aggregates {
            aggregate.item_ids = members.remove(&aggregate.id).unwrap_or_default();
        }
        Ok(aggregates)
    }
}
