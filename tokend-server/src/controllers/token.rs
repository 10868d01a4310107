use axum::{
    body::Bytes,
    extract::Path,
    routing::{get, post},
    Json, Router,
};
use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use tracing::info;
use validator::Validate;

use tokend_slo::{errors, Result};

use crate::{
    services::token::{TokenRequest, TokenResponse, TokenType},
    valid::Valid,
    AppState,
};

/// Header carrying the identifier for `POST /token/check`.
const AUTH_JTI_HEADER: &str = "x-auth-jti";

pub fn new_router(state: AppState) -> Router {
    Router::new()
        .route("/token", post(sign).delete(revoke))
        .route("/token/refresh", post(refresh))
        .route("/token/check", post(check))
        .route("/token/check/:jti", get(check_path))
        .with_state(state)
}

#[derive(Debug, Deserialize, Validate)]
struct RefreshRequest {
    #[serde(default)]
    refresh_token: Option<String>,
    /// legacy field name
    #[serde(default)]
    token: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
struct DenyRequest {
    jtis: Vec<serde_json::Value>,
}

#[derive(Debug, Default, Deserialize)]
struct CheckRequest {
    #[serde(default)]
    jti: Option<String>,
    #[serde(default)]
    token: Option<String>,
}

async fn sign(
    app: AppState,
    Valid(Json(input)): Valid<Json<TokenRequest>>,
) -> Result<Json<TokenResponse>> {
    info!("sign token for scope {:?}", input.scope);
    Ok(app.token.issue(&input)?.into())
}

async fn refresh(
    app: AppState,
    Valid(Json(input)): Valid<Json<RefreshRequest>>,
) -> Result<Json<TokenResponse>> {
    info!("refresh token");
    let raw = input.refresh_token.as_deref().or(input.token.as_deref());
    let decoded = app.token.decode(raw)?;
    if decoded.typ != TokenType::Refresh {
        return Err(errors::invalid_refresh_token());
    }
    app.token.check_revoked(&decoded.jti).await?;
    Ok(app.token.refresh(&decoded)?.into())
}

async fn revoke(
    app: AppState,
    Valid(Json(input)): Valid<Json<DenyRequest>>,
) -> Result<StatusCode> {
    let jtis = input
        .jtis
        .iter()
        .filter_map(serde_json::Value::as_str)
        .collect::<Vec<_>>();
    app.token.revoke(&jtis).await?;
    Ok(StatusCode::OK)
}

async fn check_path(
    app: AppState,
    Path(jti): Path<String>,
) -> Result<StatusCode> {
    app.token.check_revoked(&jti).await?;
    Ok(StatusCode::OK)
}

async fn check(
    app: AppState,
    headers: HeaderMap,
    body: Bytes,
) -> Result<StatusCode> {
    let input = if body.iter().all(u8::is_ascii_whitespace) {
        CheckRequest::default()
    } else {
        serde_json::from_slice::<CheckRequest>(&body)
            .map_err(|err| errors::invalid_values(&err))?
    };

    let jti = match (input.jti, input.token) {
        (Some(jti), _) => jti,
        (None, Some(token)) => app.token.decode(Some(&token))?.jti,
        (None, None) => headers
            .get(AUTH_JTI_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or_else(|| errors::invalid_values("jti is required"))?,
    };
    app.token.check_revoked(&jti).await?;
    Ok(StatusCode::OK)
}
