//! Request actor resolution
//!
//! Every table operation runs on behalf of an actor named by the
//! `x-user-id` request header. Verifying who the actor is belongs to an
//! upstream gateway; this layer only carries the claimed identity to the
//! ownership checks in [`DbClient`](crate::db::DbClient).

use axum::{extract::FromRequestParts, http::request::Parts};
use tabula_core::UserId;

use crate::error::ApiError;

/// Header carrying the acting user id.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The actor a request runs on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthContext {
    pub user_id: UserId,
}

impl AuthContext {
    pub fn new(user_id: impl Into<UserId>) -> Self {
        Self {
            user_id: user_id.into(),
        }
    }

    fn from_parts(parts: &Parts) -> Result<Self, ApiError> {
        if let Some(context) = parts.extensions.get::<AuthContext>() {
            return Ok(context.clone());
        }

        let value = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or_else(|| ApiError::unauthorized("Missing x-user-id header"))?;
        let user_id = value
            .to_str()
            .map_err(|_| ApiError::unauthorized("x-user-id header is not valid text"))?
            .trim();
        if user_id.is_empty() {
            return Err(ApiError::unauthorized("x-user-id header is empty"));
        }
        Ok(Self::new(user_id))
    }
}

/// Axum extractor for the request actor.
///
/// Uses an `AuthContext` already placed in the request extensions when
/// present, otherwise reads the `x-user-id` header. Requests without an
/// actor are rejected with 401.
///
/// ```rust,no_run
/// use axum::Json;
/// use tabula_api::middleware::AuthExtractor;
///
/// async fn whoami(AuthExtractor(auth): AuthExtractor) -> Json<String> {
///     Json(auth.user_id)
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthExtractor(pub AuthContext);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthExtractor
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        AuthContext::from_parts(parts).map(AuthExtractor)
    }
}

impl std::ops::Deref for AuthExtractor {
    type Target = AuthContext;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use axum::http::Request;

    fn parts_with(header: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/api/v1/bases");
        if let Some(value) = header {
            builder = builder.header(USER_ID_HEADER, value);
        }
        let (parts, _) = builder
            .body(())
            .expect("request should build")
            .into_parts();
        parts
    }

    #[test]
    fn test_header_is_read_and_trimmed() {
        let parts = parts_with(Some("  user-a "));
        let context = AuthContext::from_parts(&parts).expect("actor should resolve");
        assert_eq!(context.user_id, "user-a");
    }

    #[test]
    fn test_missing_or_blank_header_is_unauthorized() {
        for header in [None, Some("   ")] {
            let parts = parts_with(header);
            let err = AuthContext::from_parts(&parts).expect_err("actor should be rejected");
            assert_eq!(err.code, ErrorCode::Unauthorized);
        }
    }

    #[test]
    fn test_extension_takes_precedence() {
        let mut parts = parts_with(Some("header-user"));
        parts.extensions.insert(AuthContext::new("extension-user"));
        let context = AuthContext::from_parts(&parts).expect("actor should resolve");
        assert_eq!(context.user_id, "extension-user");
    }
}
