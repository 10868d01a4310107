use std::ops::Deref;

use async_trait::async_trait;
use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use tokend_slo::errors::{self, WithBacktrace};

/// Deserializes then validates the wrapped extractor. Every failure is an
/// `InvalidValues` error.
pub struct Valid<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Valid<Json<T>>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = WithBacktrace;
    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let value = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| errors::invalid_values(&err.body_text()))?;
        value
            .deref()
            .validate()
            .map_err(|err| errors::invalid_values(&err))?;
        Ok(Self(value))
    }
}
