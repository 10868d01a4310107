mod deny;
mod refresh;
mod tokenx;

use chrono::Utc;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use tokend_jwks::KeySet;
use tokend_slo::{errors, next_jti, Result};

pub use tokenx::AccessToken;

/// Signs and verifies token payloads against the configured key set.
#[cfg_attr(test, automock)]
pub trait Token {
    fn sign(&self, claims: &Claims) -> Result<String>;
    fn verify(&self, token: &str) -> Result<Claims>;
    /// The key set without private parameters.
    fn public_keys(&self) -> Result<KeySet>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenType {
    #[default]
    #[serde(rename = "jwt")]
    Jwt,
    Refresh,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Audience {
    One(String),
    Many(Vec<String>),
}

/// Scope and audience a refresh token replays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub scope: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub iat: i64,
    #[serde(default)]
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<Audience>,
    #[serde(default)]
    pub typ: TokenType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claims: Option<Grant>,
}

/// Requested expiry, either a JSON number or a numeric string. An explicit
/// `null` counts as zero.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum Expiry {
    Null,
    Number(f64),
    Text(String),
}

impl Expiry {
    /// Whole seconds since the epoch, rounded. `None` when not numeric.
    pub fn timestamp(&self) -> Option<i64> {
        let value = match self {
            Self::Null => 0.0,
            Self::Number(v) => *v,
            Self::Text(v) => v.trim().parse::<f64>().ok()?,
        };
        value.is_finite().then(|| value.round() as i64)
    }
}

fn present<'de, D>(
    deserializer: D,
) -> std::result::Result<Option<Expiry>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Expiry::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct TokenRequest {
    #[validate(required, length(min = 1))]
    pub scope: Option<String>,
    #[serde(default)]
    pub aud: Option<Audience>,
    #[serde(default, deserialize_with = "present")]
    pub exp: Option<Expiry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub token: String,
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Issues, decodes, refreshes and revokes tokens.
///
/// Holds no per-request state: the key set behind `token_creator` is
/// immutable and the denylist is the only shared mutable resource.
#[derive(Debug)]
pub struct TokenService<T, D> {
    token_creator: T,
    denylist: D,
    issuer: String,
    duration: i64,
    denylist_ttl: u64,
}

impl<T, D> TokenService<T, D> {
    pub fn new(
        token_creator: T,
        denylist: D,
        issuer: String,
        duration: i64,
        denylist_ttl: u64,
    ) -> Self {
        Self {
            token_creator,
            denylist,
            issuer,
            duration,
            denylist_ttl,
        }
    }

    fn now() -> i64 {
        Utc::now().timestamp()
    }
}

impl<T: Token, D> TokenService<T, D> {
    /// Issues an access token. Without an explicit `exp` the token lives for
    /// the configured duration and comes with a refresh token sharing its
    /// `jti`.
    pub fn issue(&self, request: &TokenRequest) -> Result<TokenResponse> {
        info!("signing a token");
        request
            .validate()
            .map_err(|err| errors::invalid_values(&err))?;
        let scope = match &request.scope {
            Some(v) if !v.is_empty() => v.clone(),
            _ => return Err(errors::invalid_values("scope is required")),
        };

        let now = Self::now();
        let fixed_exp = match &request.exp {
            Some(exp) => match exp.timestamp() {
                Some(v) if v > now => Some(v),
                _ => {
                    return Err(errors::invalid_values(
                        "exp must be a timestamp in the future",
                    ))
                }
            },
            None => None,
        };

        let claims = Claims {
            iss: self.issuer.clone(),
            iat: now,
            jti: next_jti(),
            exp: Some(fixed_exp.unwrap_or(now + self.duration)),
            scope: Some(scope.clone()),
            aud: request.aud.clone(),
            typ: TokenType::Jwt,
            claims: None,
        };
        let token = self.token_creator.sign(&claims)?;

        let refresh_token = match fixed_exp {
            Some(_) => None,
            None => {
                let refresh_claims = Claims {
                    iss: claims.iss.clone(),
                    iat: claims.iat,
                    jti: claims.jti.clone(),
                    typ: TokenType::Refresh,
                    claims: Some(Grant {
                        scope,
                        aud: claims.aud.clone(),
                    }),
                    ..Default::default()
                };
                Some(self.token_creator.sign(&refresh_claims)?)
            }
        };

        Ok(TokenResponse {
            token,
            jti: claims.jti,
            refresh_token,
        })
    }

    /// Verifies a raw token and returns its claims. Expiry and revocation
    /// are not checked here.
    pub fn decode(&self, raw: Option<&str>) -> Result<Claims> {
        info!("decoding token");
        let raw = match raw {
            Some(v) if !v.is_empty() => v,
            _ => return Err(errors::invalid_values("token is required")),
        };
        let claims = self.token_creator.verify(raw)?;
        debug!("decoded payload {:?}", claims);
        Ok(claims)
    }

    pub fn public_key_store(&self) -> Result<KeySet> {
        debug!("reading the JWKS");
        self.token_creator.public_keys()
    }
}
