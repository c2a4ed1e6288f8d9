use super::{StoreClientFactory, StoreHandle};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    RequestPartsExt,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use service_core::error::AppError;

/// Extractor yielding a store handle scoped to the caller's bearer token.
///
/// Missing or malformed `Authorization` headers are rejected with 401 before
/// the handler runs.
pub struct ScopedStore(pub StoreHandle);

#[async_trait]
impl<S> FromRequestParts<S> for ScopedStore
where
    S: Send + Sync,
    StoreClientFactory: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| AppError::Unauthorized("Missing or invalid authorization header".to_string()))?;

        let factory = StoreClientFactory::from_ref(state);
        let handle = factory
            .scoped(bearer.token())
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        Ok(ScopedStore(handle))
    }
}
