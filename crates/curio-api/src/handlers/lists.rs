//! Item list and editorial list HTTP handlers.
//!
//! Both resources share one set of handlers; the router attaches the
//! [`AggregateKind`] as a request extension when nesting them.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};

use curio_core::defaults::clamp_limit;
use curio_core::{Aggregate, AggregateInput, AggregateKind};

use crate::auth::RequireActor;
use crate::{ApiError, AppState};

/// Query parameters for listing aggregates.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Pagination details echoed back with list results.
#[derive(Debug, Serialize)]
pub struct PaginationMeta {
    pub limit: i64,
    pub offset: i64,
    pub count: usize,
}

/// Standard list response envelope.
#[derive(Debug, Serialize)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Routes for one aggregate kind, to be nested under its collection path.
pub fn routes(kind: AggregateKind) -> Router<AppState> {
    Router::new()
        .route("/", get(list_aggregates).post(create_aggregate))
        .route(
            "/:id",
            get(get_aggregate)
                .put(update_aggregate)
                .delete(delete_aggregate),
        )
        .layer(Extension(kind))
}

/// Create an aggregate with its membership.
///
/// # Returns
/// - 201 Created with the aggregate and its `item_ids`
/// - 400 Bad Request on invalid payload or unknown item ids
/// - 403 Forbidden for editorial lists without the admin capability
pub async fn create_aggregate(
    State(state): State<AppState>,
    Extension(kind): Extension<AggregateKind>,
    RequireActor { actor }: RequireActor,
    payload: Result<Json<AggregateInput>, JsonRejection>,
) -> Result<(StatusCode, Json<Aggregate>), ApiError> {
    let Json(input) = payload?;
    let aggregate = state.db.pipeline.create(kind, &actor, input).await?;
    Ok((StatusCode::CREATED, Json(aggregate)))
}

/// List aggregates visible to the actor, newest first.
pub async fn list_aggregates(
    State(state): State<AppState>,
    Extension(kind): Extension<AggregateKind>,
    RequireActor { actor }: RequireActor,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<ListResponse<Aggregate>>, ApiError> {
    let Query(query) = query?;
    let limit = clamp_limit(query.limit);
    let offset = query.offset.unwrap_or(0).max(0);

    let data = state.db.aggregates.list(kind, &actor, limit, offset).await?;
    Ok(Json(ListResponse {
        pagination: PaginationMeta {
            limit,
            offset,
            count: data.len(),
        },
        data,
    }))
}

/// Fetch one aggregate. Invisible aggregates are reported as 404.
pub async fn get_aggregate(
    State(state): State<AppState>,
    Extension(kind): Extension<AggregateKind>,
    RequireActor { actor }: RequireActor,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Aggregate>, ApiError> {
    let Path(id) = path?;
    let aggregate = state.db.aggregates.get(kind, id, &actor).await?;
    Ok(Json(aggregate))
}

/// Replace an aggregate's fields and entire membership set.
///
/// # Returns
/// - 200 OK with the updated aggregate
/// - 404 Not Found when absent or owned by someone else
/// - 409 Conflict when `version` is stale
pub async fn update_aggregate(
    State(state): State<AppState>,
    Extension(kind): Extension<AggregateKind>,
    RequireActor { actor }: RequireActor,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<AggregateInput>, JsonRejection>,
) -> Result<Json<Aggregate>, ApiError> {
    let Path(id) = path?;
    let Json(input) = payload?;
    let aggregate = state.db.pipeline.update(kind, &actor, id, input).await?;
    Ok(Json(aggregate))
}

/// Delete an aggregate and its membership. Returns the deleted aggregate.
pub async fn delete_aggregate(
    State(state): State<AppState>,
    Extension(kind): Extension<AggregateKind>,
    RequireActor { actor }: RequireActor,
    path: Result<Path<i64>, PathRejection>,
) -> Result<Json<Aggregate>, ApiError> {
    let Path(id) = path?;
    let aggregate = state.db.pipeline.delete(kind, &actor, id).await?;
    Ok(Json(aggregate))
}
