//! Offline key-management commands. Every command reads and writes the
//! base64 transport form of a key set document, so the output of one can be
//! piped into the next and finally into the server's `JWKS` setting.

use std::process::ExitCode;

use serde::Serialize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use tokend_jwks::{rotation, sign, signing_key, KeySet, Rotation};
use tokend_slo::{errors, Result};

/// Exit status for a missing or unreadable document.
pub const EXIT_INVALID: u8 = 1;
/// Exit status of `rotate-jwks` when a rotation is already pending.
pub const EXIT_PENDING: u8 = 2;

/// Logs go to stderr so stdout carries only the document.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

/// Prints the result of a command, or logs its error and exits with
/// [`EXIT_INVALID`].
pub fn report(result: Result<String>) -> ExitCode {
    match result {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!("{}", err);
            ExitCode::from(EXIT_INVALID)
        }
    }
}

fn required(document: Option<&str>) -> Result<&str> {
    match document {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(errors::invalid_values("a key set document is required")),
    }
}

/// A fresh single-key document, private parameters included.
pub fn create_jwks() -> Result<String> {
    rotation::create()?.encode(true)
}

/// Puts a new signing key in front of the document's key. A document that
/// already holds two keys comes back unchanged as [`Rotation::Pending`].
pub fn rotate_jwks(document: Option<&str>) -> Result<Rotation> {
    let set = rotation::validate(required(document)?)?;
    rotation::rotate(set)
}

/// Drops the oldest key once the previous rotation has propagated.
pub fn clean_jwks(document: Option<&str>) -> Result<String> {
    let set = rotation::validate(required(document)?)?;
    rotation::clean(set).encode(true)
}

pub fn check_jwks(document: Option<&str>) -> Result<KeySet> {
    rotation::validate(required(document)?)
}

#[derive(Debug, Serialize)]
struct ScopeClaims<'a> {
    iss: &'a str,
    jti: &'a str,
    scp: &'a str,
}

/// Signs a `{iss, jti, scp}` token with the head signature key of `jwks`,
/// which may be raw JSON or base64.
pub fn sign_token(
    jwks: &str,
    issuer: &str,
    scope: &str,
    jti: &str,
) -> Result<String> {
    if scope.is_empty() {
        return Err(errors::invalid_values("scope needs to be provided"));
    }
    if jti.is_empty() {
        return Err(errors::invalid_values("jti needs to be provided"));
    }
    let keys = KeySet::load(jwks)?;
    let claims = ScopeClaims {
        iss: issuer,
        jti,
        scp: scope,
    };
    sign(&claims, signing_key(&keys)?)
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;

    #[test]
    fn rotation_cycle() {
        let created = create_jwks().unwrap();
        let original = KeySet::decode(&created).unwrap();
        assert_eq!(original.len(), 1);

        let rotated = rotate_jwks(Some(&created)).unwrap();
        assert!(rotated.is_rotated());
        let rotated = rotated.key_set().encode(true).unwrap();
        let two = check_jwks(Some(&rotated)).unwrap();
        assert_eq!(two.len(), 2);
        assert_ne!(two.keys[0].key_id, original.keys[0].key_id);

        let pending = rotate_jwks(Some(&rotated)).unwrap();
        assert!(!pending.is_rotated());
        assert_eq!(pending.key_set(), &two);

        let cleaned = clean_jwks(Some(&rotated)).unwrap();
        let cleaned = KeySet::decode(&cleaned).unwrap();
        assert_eq!(cleaned.keys, vec![two.keys[0].clone()]);
    }

    #[test]
    fn invalid_documents() {
        for document in [None, Some(""), Some("   "), Some("bm9wZQ==")] {
            assert!(check_jwks(document).is_err(), "{document:?}");
            assert!(clean_jwks(document).is_err(), "{document:?}");
            assert!(rotate_jwks(document).is_err(), "{document:?}");
        }
    }

    #[test]
    fn signed_token_carries_scope() {
        let document = create_jwks().unwrap();
        let keys = KeySet::decode(&document).unwrap();
        let json = serde_json::to_string(&keys).unwrap();

        for jwks in [document.as_str(), json.as_str()] {
            let token = sign_token(jwks, "tokend", "read", "jti-1").unwrap();
            let claims: Value = tokend_jwks::verify(&token, &keys).unwrap();
            assert_eq!(
                claims,
                serde_json::json!({
                    "iss": "tokend",
                    "jti": "jti-1",
                    "scp": "read",
                })
            );
        }

        assert!(sign_token(&document, "tokend", "", "jti-1").is_err());
        assert!(sign_token(&document, "tokend", "read", "").is_err());
        assert!(sign_token("{}", "tokend", "read", "jti-1").is_err());
    }
}
