//! Caller identification for an internal, pre-authenticated deployment.
//!
//! The forum sits behind the company SSO proxy, which injects the numeric
//! user id as the `x-user-id` header. This extractor only reads that
//! header; it performs no authentication of its own.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error_handler::AppError;

/// Identity of the calling user, taken from the `x-user-id` header.
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub u64);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-user-id")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| AppError::BadRequest("missing x-user-id header".into()))?;

        let id = raw
            .trim()
            .parse::<u64>()
            .map_err(|_| AppError::BadRequest(format!("invalid x-user-id: {raw}")))?;

        Ok(CurrentUser(id))
    }
}
