//! Association store: membership rows linking an aggregate to its items.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;

use curio_core::{ActivityType, AggregateKind, Result};

/// Literal SQL for one join table.
struct MembershipSql {
    clear: &'static str,
    insert: &'static str,
    read: &'static str,
    read_many: &'static str,
}

const ITEM_LIST_MEMBERS: MembershipSql = MembershipSql {
    clear: "DELETE FROM item_list_item WHERE list_id = $1",
    insert: r#"
        INSERT INTO item_list_item (list_id, item_id, position)
        SELECT $1::bigint, t.item_id, t.ord::int
        FROM UNNEST($2::bigint[]) WITH ORDINALITY AS t(item_id, ord)
    "#,
    read: r#"
        SELECT m.item_id
        FROM item_list_item m
        JOIN item i ON i.id = m.item_id
        WHERE m.list_id = $1
        ORDER BY i.entered_on, i.id
    "#,
    read_many: r#"
        SELECT m.list_id, m.item_id
        FROM item_list_item m
        JOIN item i ON i.id = m.item_id
        WHERE m.list_id = ANY($1)
        ORDER BY m.list_id, i.entered_on, i.id
    "#,
};

const EDITORIAL_MEMBERS: MembershipSql = MembershipSql {
    clear: "DELETE FROM editorial_list_item WHERE list_id = $1",
    insert: r#"
        INSERT INTO editorial_list_item (list_id, item_id, position)
        SELECT $1::bigint, t.item_id, t.ord::int
        FROM UNNEST($2::bigint[]) WITH ORDINALITY AS t(item_id, ord)
    "#,
    read: r#"
        SELECT m.item_id
        FROM editorial_list_item m
        JOIN item i ON i.id = m.item_id
        WHERE m.list_id = $1
        ORDER BY i.entered_on, i.id
    "#,
    read_many: r#"
        SELECT m.list_id, m.item_id
        FROM editorial_list_item m
        JOIN item i ON i.id = m.item_id
        WHERE m.list_id = ANY($1)
        ORDER BY m.list_id, i.entered_on, i.id
    "#,
};

fn sql_for(kind: AggregateKind) -> &'static MembershipSql {
    match kind {
        AggregateKind::ItemList => &ITEM_LIST_MEMBERS,
        AggregateKind::Editorial => &EDITORIAL_MEMBERS,
    }
}

/// PostgreSQL implementation of the association store.
#[derive(Clone)]
pub struct PgMembershipStore {
    pool: PgPool,
}

impl PgMembershipStore {
    /// Create a new PgMembershipStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Literal SQL this store runs for one mutation.
    pub fn statements(kind: AggregateKind, op: ActivityType) -> Vec<&'static str> {
        let sql = sql_for(kind);
        match op {
            ActivityType::Create => vec![sql.insert, sql.read],
            ActivityType::Update => vec![sql.clear, sql.insert, sql.read],
            ActivityType::Delete => vec![sql.read],
        }
    }

    /// Insert memberships for `item_ids`, keeping caller order in `position`.
    ///
    /// Ids must already be distinct.
    pub async fn add_members_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: AggregateKind,
        list_id: i64,
        item_ids: &[i64],
    ) -> Result<u64> {
        if item_ids.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(sql_for(kind).insert)
            .bind(list_id)
            .bind(item_ids)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    /// Remove every membership of the aggregate.
    pub async fn clear_members_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: AggregateKind,
        list_id: i64,
    ) -> Result<u64> {
        let result = sqlx::query(sql_for(kind).clear)
            .bind(list_id)
            .execute(&mut **tx)
            .await?;

        Ok(result.rows_affected())
    }

    /// Make the membership set exactly `item_ids`.
    ///
    /// Ids omitted from the new set are removed; there is no merge.
    pub async fn replace_members_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: AggregateKind,
        list_id: i64,
        item_ids: &[i64],
    ) -> Result<()> {
        let removed = self.clear_members_tx(tx, kind, list_id).await?;
        let added = self.add_members_tx(tx, kind, list_id, item_ids).await?;

        debug!(
            subsystem = "database",
            component = "members",
            op = "replace",
            list_id,
            removed,
            added,
            "Membership replaced"
        );
        Ok(())
    }

    /// Member ids as seen inside the transaction, ordered by item entry time.
    pub async fn members_tx(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        kind: AggregateKind,
        list_id: i64,
    ) -> Result<Vec<i64>> {
        let rows = sqlx::query(sql_for(kind).read)
            .bind(list_id)
            .fetch_all(&mut **tx)
            .await?;

        Ok(rows.iter().map(|r| r.get("item_id")).collect())
    }

    /// Member ids of a committed aggregate, ordered by item entry time.
    pub async fn members(&self, kind: AggregateKind, list_id: i64) -> Result<Vec<i64>> {
        let rows = sqlx::query(sql_for(kind).read)
            .bind(list_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(|r| r.get("item_id")).collect())
    }

    /// Member ids for several aggregates in one round trip.
    pub async fn members_for(
        &self,
        kind: AggregateKind,
        list_ids: &[i64],
    ) -> Result<HashMap<i64, Vec<i64>>> {
        let mut members: HashMap<i64, Vec<i64>> = HashMap::new();
        if list_ids.is_empty() {
            return Ok(members);
        }

        let rows = sqlx::query(sql_for(kind).read_many)
            .bind(list_ids)
            .fetch_all(&self.pool)
            .await?;

        for row in rows {
            let list_id: i64 = row.get("list_id");
            members
                .entry(list_id)
                .or_default()
                .push(row.get("item_id"));
        }
        Ok(members)
    }
}
