//! Key rotation protocol.
//!
//! A persisted document holds one key in steady state and two keys while a
//! rotation is in flight: the new head signs, the old tail only verifies
//! tokens issued before the rotation. `clean` retires the tail once those
//! tokens have expired.

use jsonwebkey as jwk;
use rand::Rng;
use rsa::traits::{PrivateKeyParts, PublicKeyParts};
use tracing::{debug, info};

use tokend_slo::{errors, Result};

use crate::{KeySet, MAX_KEYS};

const KEY_BITS: usize = 2048;
const KEY_ID_LEN: usize = 40;

/// Outcome of [`rotate`].
#[derive(Debug, Clone, PartialEq)]
pub enum Rotation {
    /// A new signing key was generated and placed at the head.
    Rotated(KeySet),
    /// The document already carries a pending rotation and is returned
    /// unchanged.
    Pending(KeySet),
}

impl Rotation {
    pub fn is_rotated(&self) -> bool {
        matches!(self, Self::Rotated(_))
    }

    pub fn key_set(&self) -> &KeySet {
        match self {
            Self::Rotated(set) | Self::Pending(set) => set,
        }
    }

    pub fn into_key_set(self) -> KeySet {
        match self {
            Self::Rotated(set) | Self::Pending(set) => set,
        }
    }
}

/// Builds a fresh single-key document.
pub fn create() -> Result<KeySet> {
    info!("creating a new key set");
    Ok(KeySet::new(vec![generate_key()?]))
}

pub fn rotate(mut set: KeySet) -> Result<Rotation> {
    if set.len() >= MAX_KEYS {
        info!(
            "skipping key rotation, {} keys present: clean the pending rotation first",
            set.len()
        );
        return Ok(Rotation::Pending(set));
    }
    info!("rotating signing key");
    set.push_front(generate_key()?);
    Ok(Rotation::Rotated(set))
}

/// Drops the oldest key of a mid-rotation document.
pub fn clean(mut set: KeySet) -> KeySet {
    if set.len() > 1 {
        if let Some(key) = set.keys.pop() {
            info!("removed key {:?}", key.key_id);
        }
    }
    set
}

/// Checks that `document` decodes as a key set. Key count and algorithms are
/// not inspected.
pub fn validate(document: &str) -> Result<KeySet> {
    KeySet::decode(document)
}

/// Generates an RS256 signing key with its private parameters.
pub fn generate_key() -> Result<jwk::JsonWebKey> {
    let mut rng = rand::thread_rng();
    let private_key =
        rsa::RsaPrivateKey::new(&mut rng, KEY_BITS).map_err(errors::any)?;

    let mut p = None;
    let mut q = None;
    let primes = private_key.primes();
    match primes.len() {
        1 => {
            p = Some(primes[0].to_bytes_be().into());
        }
        2 => {
            p = Some(primes[0].to_bytes_be().into());
            q = Some(primes[1].to_bytes_be().into());
        }
        _ => {}
    }
    let key = jwk::Key::RSA {
        public: jwk::RsaPublic {
            e: jwk::PublicExponent,
            n: private_key.n().to_bytes_be().into(),
        },
        private: Some(jwk::RsaPrivate {
            d: private_key.d().to_bytes_be().into(),
            p,
            q,
            dp: private_key.dp().map(|v| v.to_bytes_be().into()),
            dq: private_key.dq().map(|v| v.to_bytes_be().into()),
            qi: private_key.qinv().map(|v| v.to_signed_bytes_be().into()),
        }),
    };

    let mut signing_key = jwk::JsonWebKey::new(key);
    signing_key
        .set_algorithm(jwk::Algorithm::RS256)
        .map_err(errors::any)?;
    signing_key.key_use = Some(jwk::KeyUse::Signing);
    signing_key.key_id = Some(key_id());
    debug!("generated key {:?}", signing_key.key_id);
    Ok(signing_key)
}

fn key_id() -> String {
    rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(KEY_ID_LEN)
        .map(char::from)
        .collect::<String>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_emits_one_private_signing_key() {
        let set = create().unwrap();
        assert_eq!(set.len(), 1);

        let key = &set.keys[0];
        assert!(key.key.is_private());
        assert!(matches!(key.key_use, Some(jwk::KeyUse::Signing)));
        assert!(matches!(key.algorithm, Some(jwk::Algorithm::RS256)));
        assert_eq!(key.key_id.as_ref().map(String::len), Some(KEY_ID_LEN));
    }

    #[test]
    fn rotate_then_clean() {
        let original = create().unwrap();

        let rotation = rotate(original.clone()).unwrap();
        assert!(rotation.is_rotated());
        let rotated = rotation.into_key_set();
        assert_eq!(rotated.len(), 2);
        assert_ne!(rotated.keys[0].key_id, original.keys[0].key_id);
        assert_eq!(rotated.keys[1], original.keys[0]);

        // a second rotation is blocked until the first is cleaned
        let again = rotate(rotated.clone()).unwrap();
        assert!(!again.is_rotated());
        assert_eq!(again.key_set(), &rotated);

        let cleaned = clean(rotated.clone());
        assert_eq!(cleaned.keys, vec![rotated.keys[0].clone()]);
    }

    #[test]
    fn clean_keeps_single_key() {
        let set = create().unwrap();
        assert_eq!(clean(set.clone()), set);
        assert_eq!(clean(KeySet::default()), KeySet::default());
    }

    #[test]
    fn rotate_survives_transport_encoding() {
        let set = create().unwrap();
        let document = set.encode(true).unwrap();

        let decoded = validate(&document).unwrap();
        let rotated = rotate(decoded).unwrap().into_key_set();
        let redecoded = validate(&rotated.encode(true).unwrap()).unwrap();
        assert_eq!(redecoded, rotated);
        assert_eq!(redecoded.keys[1], set.keys[0]);
    }

    #[test]
    fn validate_rejects_malformed_documents() {
        assert!(validate("bm90IGEga2V5IHNldA==").is_err());
        assert!(validate("").is_err());
    }
}
