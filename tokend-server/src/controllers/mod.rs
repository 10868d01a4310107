pub mod jwks;
pub mod token;

use axum::{routing::get, Router};

use crate::version;

pub fn new_router() -> Router {
    Router::new().route("/", get(health))
}

async fn health() -> String {
    version()
}
