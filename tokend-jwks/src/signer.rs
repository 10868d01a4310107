use jsonwebkey as jwk;
use jsonwebtoken::{self as jwt, errors::ErrorKind};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, warn};

use tokend_slo::{errors, Result};

use crate::KeySet;

/// Header `typ` stamped on every issued token.
pub const TOKEN_TYPE: &str = "jwt";

/// The first key of the set intended for signature use.
pub fn signing_key(set: &KeySet) -> Result<&jwk::JsonWebKey> {
    set.keys
        .iter()
        .find(|key| matches!(key.key_use, Some(jwk::KeyUse::Signing)))
        .ok_or_else(|| errors::no_usable_key("no signature key in key set"))
}

/// Signs `claims` into a compact token with `key`.
pub fn sign<C: Serialize>(claims: &C, key: &jwk::JsonWebKey) -> Result<String> {
    let mut header = jwt::Header::new(algorithm(key));
    header.typ = Some(TOKEN_TYPE.to_owned());
    header.kid = key.key_id.clone();

    let encoding_key = JwkKey(key.key.as_ref()).try_to_encoding_key()?;
    jwt::encode(&header, claims, &encoding_key).map_err(errors::any)
}

/// Verifies `token` against every verification-capable key of `set` whose
/// key id matches the token header, returning the parsed payload.
///
/// Expiry and audience are left to the caller.
pub fn verify<C: DeserializeOwned>(token: &str, set: &KeySet) -> Result<C> {
    let header = jwt::decode_header(token)
        .map_err(|err| errors::malformed_token(&err))?;

    let mut rejected = None;
    for key in set.keys.iter() {
        if matches!(key.key_use, Some(jwk::KeyUse::Encryption)) {
            continue;
        }
        if header.kid.is_some() && !key.key_id.eq(&header.kid) {
            continue;
        }
        let alg = algorithm(key);
        if alg != header.alg {
            continue;
        }
        let decoding_key = match JwkKey(key.key.as_ref()).try_to_decoding_key()
        {
            Ok(v) => v,
            Err(err) => {
                warn!("skipping key {:?}: {}", key.key_id, err);
                continue;
            }
        };

        let mut validation = jwt::Validation::new(alg);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        match jwt::decode::<C>(token, &decoding_key, &validation) {
            Ok(v) => return Ok(v.claims),
            Err(err) => match err.kind() {
                ErrorKind::InvalidSignature => {
                    debug!("key {:?} rejected signature", key.key_id);
                    rejected = Some(errors::invalid_signature(&err));
                }
                _ => return Err(errors::malformed_token(&err)),
            },
        }
    }
    Err(rejected.unwrap_or_else(|| {
        errors::invalid_signature("no key in key set matches the token")
    }))
}

fn algorithm(key: &jwk::JsonWebKey) -> jwt::Algorithm {
    match &key.algorithm {
        Some(jwk::Algorithm::HS256) => jwt::Algorithm::HS256,
        Some(jwk::Algorithm::ES256) => jwt::Algorithm::ES256,
        Some(jwk::Algorithm::RS256) => jwt::Algorithm::RS256,
        None => match key.key.as_ref() {
            jwk::Key::Symmetric { .. } => jwt::Algorithm::HS256,
            jwk::Key::EC { .. } => jwt::Algorithm::ES256,
            jwk::Key::RSA { .. } => jwt::Algorithm::RS256,
        },
    }
}

pub struct JwkKey<T>(pub T);

impl JwkKey<&jwk::Key> {
    /// Returns an `EncodingKey` if the key is private.
    pub fn try_to_encoding_key(&self) -> Result<jwt::EncodingKey> {
        if !self.0.is_private() {
            return Err(errors::no_usable_key("key is not private"));
        }
        Ok(match self.0 {
            jwk::Key::Symmetric { key } => {
                jwt::EncodingKey::from_secret(key.to_vec().as_slice())
            }
            jwk::Key::EC { .. } => jwt::EncodingKey::from_ec_pem(
                self.0.try_to_pem().map_err(errors::any)?.as_bytes(),
            )
            .map_err(errors::any)?,
            jwk::Key::RSA { .. } => {
                let pem = self.0.try_to_pem().map_err(errors::any)?;
                jwt::EncodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(errors::any)?
            }
        })
    }

    pub fn try_to_decoding_key(&self) -> Result<jwt::DecodingKey> {
        Ok(match self.0 {
            jwk::Key::Symmetric { key } => {
                jwt::DecodingKey::from_secret(key.to_vec().as_slice())
            }
            jwk::Key::EC { .. } => {
                let public = self.0.to_public().ok_or_else(|| {
                    errors::malformed_key_store("EC key has no public part")
                })?;
                jwt::DecodingKey::from_ec_pem(public.to_pem().as_bytes())
                    .map_err(errors::any)?
            }
            jwk::Key::RSA { .. } => {
                let public = self.0.to_public().ok_or_else(|| {
                    errors::malformed_key_store("RSA key has no public part")
                })?;
                let pem = public.try_to_pem().map_err(errors::any)?;
                jwt::DecodingKey::from_rsa_pem(pem.as_bytes())
                    .map_err(errors::any)?
            }
        })
    }
}
