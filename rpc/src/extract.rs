//! Request extractors whose rejections keep the envelope shape.

use axum::async_trait;
use axum::extract::{FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;

use crate::RpcError;

/// A JSON body. A missing content type or a body that does not deserialize
/// becomes [`RpcError::BadJson`] instead of axum's plain-text rejection.
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = RpcError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| RpcError::BadJson(rejection.body_text()))?;
        Ok(Self(value))
    }
}
