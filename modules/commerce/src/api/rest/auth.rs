//! Bearer token extraction for protected routes.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};
use uuid::Uuid;

use crate::api::problem::ProblemResponse;
use crate::api::rest::error::auth_required;
use crate::api::rest::routes::ApiContext;

/// The authenticated caller, extracted from the `Authorization: Bearer`
/// header. Carries only the verified user id; handlers that need the full
/// account load it through the auth service.
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

impl FromRequestParts<()> for AuthUser {
    type Rejection = ProblemResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &()) -> Result<Self, Self::Rejection> {
        let instance = parts.uri.path().to_string();

        let ctx = parts
            .extensions
            .get::<Arc<ApiContext>>()
            .ok_or_else(|| auth_required(&instance))?;

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .ok_or_else(|| auth_required(&instance))?;

        let claims = ctx
            .tokens
            .verify(token)
            .map_err(|_| auth_required(&instance))?;

        Ok(AuthUser(claims.sub))
    }
}
