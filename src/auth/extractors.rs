//! Axum extractors for the resolved caller.

use crate::error::TallywardError;
use crate::tenancy::Caller;
use axum::{extract::FromRequestParts, http::request::Parts};
use std::future::Future;

/// Axum extractor for the authenticated caller.
///
/// Only works on routes behind [`crate::auth::require_identity`], which
/// puts the resolved [`Caller`] into request extensions. Elsewhere the
/// request is rejected with 401.
///
/// # Example
///
/// ```rust,ignore
/// async fn summary_handler(
///     CurrentCaller(caller): CurrentCaller,
///     Path(tenant_id): Path<String>,
/// ) -> Result<Json<Summary>> {
///     // caller.role, caller.tenant_id(), ...
/// }
/// ```
pub struct CurrentCaller(pub Caller);

impl<S> FromRequestParts<S> for CurrentCaller
where
    S: Send + Sync,
{
    type Rejection = TallywardError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        Box::pin(async move {
            parts
                .extensions
                .get::<Caller>()
                .cloned()
                .map(CurrentCaller)
                .ok_or_else(|| TallywardError::unauthorized("Authentication required"))
        })
    }
}

/// Axum extractor for the caller when authentication is optional.
///
/// Yields `None` instead of rejecting when no caller was resolved.
pub struct OptionalCaller(pub Option<Caller>);

impl<S> FromRequestParts<S> for OptionalCaller
where
    S: Send + Sync,
{
    type Rejection = TallywardError;

    fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> impl Future<Output = Result<Self, Self::Rejection>> + Send {
        Box::pin(async move { Ok(OptionalCaller(parts.extensions.get::<Caller>().cloned())) })
    }
}
