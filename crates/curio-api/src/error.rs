//! HTTP error mapping.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use curio_core::Error;

/// Error returned by every handler, rendered as `{"error": message}`.
#[derive(Debug)]
pub enum ApiError {
    /// Server-side failure; details are logged, never returned.
    Internal(Error),
    Unauthorized(String),
    Forbidden(String),
    NotFound(String),
    BadRequest(String),
    Conflict(String),
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Validation(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            Error::Forbidden(msg) => ApiError::Forbidden(msg),
            Error::Unauthorized(msg) => ApiError::Unauthorized(msg),
            Error::Conflict(msg) => ApiError::Conflict(msg),
            // signature names stay in the server log
            Error::GuardRejection(_) => ApiError::Unauthorized("Request rejected".to_string()),
            other => ApiError::Internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::Internal(err) => {
                error!(subsystem = "api", error = %err, "Request failed");
                "Internal server error".to_string()
            }
            ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::NotFound(msg)
            | ApiError::BadRequest(msg)
            | ApiError::Conflict(msg) => msg,
        };

        let body = Json(serde_json::json!({
            "error": message,
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: Error) -> StatusCode {
        ApiError::from(err).status()
    }

    #[test]
    fn test_client_errors_map_to_4xx() {
        assert_eq!(
            status_of(Error::Validation("title".into())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(Error::GuardRejection("tautology".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(Error::Unauthorized("no actor".into())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            status_of(Error::Forbidden("admin".into())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(Error::NotFound("list".into())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(Error::Conflict("version".into())),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_storage_failures_map_to_500() {
        for err in [
            Error::ConstraintViolation("fk".into()),
            Error::Connectivity("pool timed out".into()),
            Error::Database(sqlx::Error::RowNotFound),
            Error::Internal("boom".into()),
        ] {
            assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_guard_rejection_hides_signature() {
        match ApiError::from(Error::GuardRejection("union_select".into())) {
            ApiError::Unauthorized(msg) => assert!(!msg.contains("union")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_internal_error_body_is_generic() {
        let response =
            ApiError::from(Error::ConstraintViolation("item_list_item_pkey".into())).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
    }
}
