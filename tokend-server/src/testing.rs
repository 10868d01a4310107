use std::sync::Arc;

use lazy_static::lazy_static;

use tokend_jwks::{rotation, KeySet};
use tokend_storage::{revocation::Revocation, MemoryImpl};

use crate::{
    app::{App, Denylist},
    services::token::AccessToken,
    AppConfig, AppState,
};

pub const ISSUER: &str = "https://tokend.test";
pub const DURATION: i64 = 900;

lazy_static! {
    static ref KEYS: Arc<KeySet> =
        Arc::new(rotation::create().expect("key generation"));
}

/// A single-key set shared by every test of the crate.
pub fn keys() -> Arc<KeySet> {
    KEYS.clone()
}

pub fn access_token() -> AccessToken {
    AccessToken::new(keys())
}

pub fn config() -> AppConfig {
    AppConfig {
        config: None,
        jwks: serde_json::to_string(keys().as_ref()).expect("encode keys"),
        issuer: ISSUER.to_owned(),
        jwt_duration: DURATION,
        redis_addr: None,
        redis_db: 0,
        redis_password: None,
        denylist_ttl: 0,
        rust_log: String::from("tokend_server=debug"),
        port: 8080,
        cors_origin: None,
        metrics_enabled: false,
    }
}

pub fn denylist() -> Denylist {
    Arc::new(MemoryImpl::<Revocation>::new())
}

pub fn state(config: AppConfig) -> AppState {
    AppState(Arc::new(App::new(config, denylist()).expect("app")))
}
