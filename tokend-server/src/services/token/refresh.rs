use tracing::info;

use tokend_slo::{errors, Result};

use super::{Claims, Token, TokenResponse, TokenService, TokenType};

impl<T: Token, D> TokenService<T, D> {
    /// Mints a new access token from decoded refresh-token claims. The
    /// access token keeps the refresh token's `iss` and `jti`; no new
    /// refresh token is issued.
    pub fn refresh(&self, decoded: &Claims) -> Result<TokenResponse> {
        info!("refreshing a token");
        if decoded.typ != TokenType::Refresh {
            return Err(errors::invalid_refresh_token());
        }
        let grant = decoded
            .claims
            .as_ref()
            .ok_or_else(errors::invalid_refresh_token)?;

        let now = Self::now();
        let claims = Claims {
            iss: decoded.iss.clone(),
            iat: now,
            jti: decoded.jti.clone(),
            exp: Some(now + self.duration),
            scope: Some(grant.scope.clone()),
            aud: grant.aud.clone(),
            typ: TokenType::Jwt,
            claims: None,
        };
        let token = self.token_creator.sign(&claims)?;
        Ok(TokenResponse {
            token,
            jti: claims.jti,
            refresh_token: None,
        })
    }
}
