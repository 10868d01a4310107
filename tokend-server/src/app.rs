use std::{ops::Deref, sync::Arc};

use anyhow::{Context, Result};
use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::info;

use tokend_jwks::{signing_key, KeySet};
use tokend_slo::errors;
use tokend_storage::{revocation::Revocation, Interface};

use crate::{
    services::token::{AccessToken, TokenService},
    AppConfig,
};

/// Shared denylist handle, redis or in-memory.
pub type Denylist = Arc<dyn Interface<T = Revocation> + Send + Sync>;

pub struct App {
    pub config: AppConfig,
    pub token: TokenService<AccessToken, Denylist>,
}

impl App {
    pub fn new(config: AppConfig, denylist: Denylist) -> Result<Self> {
        info!("initializing token services...");

        let keys = KeySet::load(&config.jwks)
            .map_err(anyhow::Error::new)
            .context("could not load the JWKS document")?;
        signing_key(&keys)
            .map_err(anyhow::Error::new)
            .context("the JWKS document has no signature key")?;
        info!("loaded {} key(s)", keys.len());

        let token = TokenService::new(
            AccessToken::new(Arc::new(keys)),
            denylist,
            config.issuer.clone(),
            config.jwt_duration,
            config.denylist_ttl,
        );

        info!("token services successfully initialized!");
        Ok(Self { config, token })
    }
}

#[derive(Clone)]
pub struct AppState(pub Arc<App>);

// deref so you can still access the inner fields easily
impl Deref for AppState {
    type Target = App;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AppState
where
    Self: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = errors::WithBacktrace;
    async fn from_request_parts(
        _: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_ref(state))
    }
}
