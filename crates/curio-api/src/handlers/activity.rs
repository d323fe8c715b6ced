//! Activity feed handler (admin only).

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::Deserialize;

use curio_core::{Activity, ActivityCategory, ActivityFilter};

use crate::auth::RequireAdmin;
use crate::{ApiError, AppState};

/// Query parameters for the activity feed.
#[derive(Debug, Default, Deserialize)]
pub struct ActivityQuery {
    /// `ITEM`, `ITEM_LIST` or `EDITORIAL_LIST` (case-insensitive).
    pub category: Option<String>,
    pub element_id: Option<i64>,
    pub limit: Option<i64>,
}

impl ActivityQuery {
    fn into_filter(self) -> Result<ActivityFilter, ApiError> {
        let category = self
            .category
            .as_deref()
            .map(str::parse::<ActivityCategory>)
            .transpose()?;

        Ok(ActivityFilter {
            category,
            element_id: self.element_id,
            limit: self.limit,
        })
    }
}

/// List recorded activity, newest first.
pub async fn list_activity(
    State(state): State<AppState>,
    RequireAdmin { actor: _ }: RequireAdmin,
    query: Result<Query<ActivityQuery>, QueryRejection>,
) -> Result<Json<Vec<Activity>>, ApiError> {
    let Query(query) = query?;
    let filter = query.into_filter()?;
    let activity = state.db.activity.list(&filter).await?;
    Ok(Json(activity))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_filter_parsing() {
        let filter = ActivityQuery {
            category: Some("editorial_list".into()),
            element_id: Some(4),
            limit: None,
        }
        .into_filter()
        .unwrap();
        assert_eq!(filter.category, Some(ActivityCategory::EditorialList));
        assert_eq!(filter.element_id, Some(4));
    }

    #[test]
    fn test_unknown_category_is_bad_request() {
        let err = ActivityQuery {
            category: Some("playlist".into()),
            ..Default::default()
        }
        .into_filter()
        .unwrap_err();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }
}
