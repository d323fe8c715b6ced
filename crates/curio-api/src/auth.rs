//! Actor extraction.
//!
//! Authentication itself happens upstream. Whatever verified the caller
//! places an [`Actor`] in the request extensions; handlers read it through
//! [`RequireActor`] or [`RequireAdmin`].

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use tracing::debug;

use curio_core::Actor;

use crate::config::is_truthy;
use crate::error::ApiError;

/// Header carrying the verified user id.
pub const USER_ID_HEADER: &str = "x-curio-user-id";

/// Header carrying the admin capability flag.
pub const ADMIN_HEADER: &str = "x-curio-admin";

/// Extractor for requests with an authenticated actor.
///
/// Rejects with 401 when no actor was attached upstream.
#[derive(Debug, Clone, Copy)]
pub struct RequireActor {
    pub actor: Actor,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireActor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Actor>()
            .copied()
            .filter(|actor| actor.user_id > 0)
            .map(|actor| RequireActor { actor })
            .ok_or_else(|| ApiError::Unauthorized("Authentication required".to_string()))
    }
}

/// Extractor that additionally requires the admin capability.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin {
    pub actor: Actor,
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for RequireAdmin
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let RequireActor { actor } = RequireActor::from_request_parts(parts, state).await?;

        if !actor.is_admin {
            return Err(ApiError::Forbidden("Admin capability required".to_string()));
        }
        Ok(RequireAdmin { actor })
    }
}

/// Read an actor from the trusted identity headers.
pub fn actor_from_headers(headers: &HeaderMap) -> Option<Actor> {
    let user_id = headers
        .get(USER_ID_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()
        .filter(|id| *id > 0)?;

    let is_admin = headers
        .get(ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(is_truthy)
        .unwrap_or(false);

    Some(Actor { user_id, is_admin })
}

/// Middleware mapping identity headers set by a verifying proxy to an actor.
///
/// Only installed when `CURIO_TRUST_ACTOR_HEADERS` is enabled.
pub async fn trusted_actor_headers(mut request: Request, next: Next) -> Response {
    if let Some(actor) = actor_from_headers(request.headers()) {
        debug!(
            subsystem = "api",
            component = "auth",
            user_id = actor.user_id,
            is_admin = actor.is_admin,
            "Actor attached from trusted headers"
        );
        request.extensions_mut().insert(actor);
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn test_actor_from_headers() {
        let actor = actor_from_headers(&headers(&[(USER_ID_HEADER, "7")])).unwrap();
        assert_eq!(actor, Actor::user(7));

        let admin =
            actor_from_headers(&headers(&[(USER_ID_HEADER, "1"), (ADMIN_HEADER, "true")])).unwrap();
        assert_eq!(admin, Actor::admin(1));
    }

    #[test]
    fn test_missing_or_bad_user_id_yields_no_actor() {
        assert!(actor_from_headers(&headers(&[])).is_none());
        assert!(actor_from_headers(&headers(&[(USER_ID_HEADER, "seven")])).is_none());
        assert!(actor_from_headers(&headers(&[(USER_ID_HEADER, "0")])).is_none());
        assert!(actor_from_headers(&headers(&[(ADMIN_HEADER, "true")])).is_none());
    }
}
