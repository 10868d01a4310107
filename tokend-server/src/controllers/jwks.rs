use axum::{routing::get, Json, Router};
use tracing::info;

use tokend_jwks::KeySet;
use tokend_slo::Result;

use crate::AppState;

pub fn new_router(state: AppState) -> Router {
    Router::new()
        .route("/.well-known/jwks.json", get(jwks))
        .with_state(state)
}

async fn jwks(app: AppState) -> Result<Json<KeySet>> {
    info!("public key store");
    Ok(app.token.public_key_store()?.into())
}
