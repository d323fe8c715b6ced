//! Activity trail: append on the mutation's transaction, read for the feed.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::debug;
use uuid::Uuid;

use curio_core::defaults::clamp_limit;
use curio_core::{Activity, ActivityFilter, AuditRecorder, Error, NewActivity, Result};

const INSERT_ACTIVITY: &str = r#"
    INSERT INTO activity (id, category, element_id, activity_type, user_id)
    VALUES ($1, $2, $3, $4, $5)
    RETURNING id, category, element_id, activity_type, user_id, entered_on
"#;

const LIST_ACTIVITY: &str = r#"
    SELECT id, category, element_id, activity_type, user_id, entered_on
    FROM activity
    WHERE ($1::text IS NULL OR category = $1)
      AND ($2::bigint IS NULL OR element_id = $2)
    ORDER BY entered_on DESC, id DESC
    LIMIT $3
"#;

fn row_to_activity(row: &PgRow) -> Result<Activity> {
    let category: String = row.get("category");
    let kind: String = row.get("activity_type");
    Ok(Activity {
        id: row.get("id"),
        category: category
            .parse()
            .map_err(|_| Error::Internal(format!("stored activity category '{}'", category)))?,
        element_id: row.get("element_id"),
        kind: kind
            .parse()
            .map_err(|_| Error::Internal(format!("stored activity type '{}'", kind)))?,
        user_id: row.get("user_id"),
        entered_on: row.get("entered_on"),
    })
}

/// Writes activity rows on the caller's transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct PgAuditRecorder;

#[async_trait]
impl AuditRecorder for PgAuditRecorder {
    async fn record(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        entry: NewActivity,
    ) -> Result<Activity> {
        entry.validate()?;

        let row = sqlx::query(INSERT_ACTIVITY)
            .bind(Uuid::now_v7())
            .bind(entry.category.as_str())
            .bind(entry.element_id)
            .bind(entry.kind.as_str())
            .bind(entry.user_id)
            .fetch_one(&mut **tx)
            .await?;
        let activity = row_to_activity(&row)?;

        debug!(
            subsystem = "audit",
            component = "activity",
            op = "record",
            activity_id = %activity.id,
            category = %activity.category,
            activity_type = %activity.kind,
            element_id = activity.element_id,
            "Activity recorded"
        );
        Ok(activity)
    }

    fn statements(&self) -> Vec<&'static str> {
        vec![INSERT_ACTIVITY]
    }
}

/// Read side of the activity trail.
#[derive(Clone)]
pub struct PgActivityRepository {
    pool: PgPool,
}

impl PgActivityRepository {
    /// Create a new PgActivityRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Newest-first activity matching the filter.
    pub async fn list(&self, filter: &ActivityFilter) -> Result<Vec<Activity>> {
        let rows = sqlx::query(LIST_ACTIVITY)
            .bind(filter.category.map(|c| c.as_str()))
            .bind(filter.element_id)
            .bind(clamp_limit(filter.limit))
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(row_to_activity).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use curio_core::guard;

    #[test]
    fn test_recorder_reports_its_statement() {
        let statements = PgAuditRecorder.statements();
        assert_eq!(statements.len(), 1);
        assert!(statements[0].contains("INSERT INTO activity"));
    }

    #[test]
    fn test_activity_sql_passes_guard() {
        assert_eq!(guard::detect(INSERT_ACTIVITY), None);
        assert_eq!(guard::detect(LIST_ACTIVITY), None);
    }
}
