//! Request authentication middleware.

use crate::auth::resolver::IdentityResolver;
use crate::auth::token::BearerToken;
use crate::error::TallywardError;
use crate::tenancy::TenantContext;
use axum::{extract::Request, middleware::Next, response::Response};
use std::sync::Arc;

/// Middleware that requires an authenticated caller for all routes it
/// wraps.
///
/// Opens a fresh [`TenantContext`] scope for the request, resolves the
/// bearer token into a [`crate::tenancy::Caller`] (which binds the
/// caller's own tenant into that scope), and stores the caller in
/// request extensions for downstream extractors. The scope ends with the
/// request, so nothing bound here can leak into another request.
///
/// The [`IdentityResolver`] must be added to request extensions first,
/// via `Extension(Arc<IdentityResolver>)` at router assembly.
///
/// # Example
///
/// ```rust,ignore
/// let protected = Router::new()
///     .route("/clients/{tenant_id}/summary", get(summary))
///     .route_layer(axum::middleware::from_fn(require_identity));
/// ```
pub async fn require_identity(
    request: Request,
    next: Next,
) -> Result<Response, TallywardError> {
    let resolver = request
        .extensions()
        .get::<Arc<IdentityResolver>>()
        .cloned()
        .ok_or_else(|| {
            TallywardError::internal("Identity resolver not found in request extensions")
        })?;

    let (parts, body) = request.into_parts();
    let token = BearerToken::from_parts(&parts)?;
    let mut request = Request::from_parts(parts, body);

    TenantContext::run(None, async move {
        let caller = resolver.resolve(&token).await?;
        tracing::debug!(user_id = %caller.user_id, role = %caller.role, "Caller resolved");

        request.extensions_mut().insert(caller);
        Ok(next.run(request).await)
    })
    .await
}
