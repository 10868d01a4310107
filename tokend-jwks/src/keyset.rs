use base64::engine::{general_purpose, Engine};
use jsonwebkey as jwk;
use serde::{Deserialize, Serialize};

use tokend_slo::{errors, Result};

/// Hard cap on the number of keys a persisted document may carry.
pub const MAX_KEYS: usize = 2;

/// Ordered JSON Web Key Set. The head entry is the active signer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeySet {
    pub keys: Vec<jwk::JsonWebKey>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Document {
    Set(KeySet),
    // emitted by older rotation tooling
    Keys(Vec<jwk::JsonWebKey>),
}

impl KeySet {
    pub fn new(keys: Vec<jwk::JsonWebKey>) -> Self {
        Self { keys }
    }

    /// Decodes the base64 transport form of a key set document.
    pub fn decode(document: &str) -> Result<Self> {
        let bytes = general_purpose::STANDARD
            .decode(document.trim())
            .map_err(|err| errors::malformed_key_store(&err))?;
        Self::from_slice(&bytes)
    }

    /// Parses a raw JSON key set document.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        match serde_json::from_slice::<Document>(bytes)
            .map_err(|err| errors::malformed_key_store(&err))?
        {
            Document::Set(set) => Ok(set),
            Document::Keys(keys) => Ok(Self { keys }),
        }
    }

    /// Accepts either raw JSON or the base64 transport form.
    pub fn load(value: &str) -> Result<Self> {
        let value = value.trim();
        if value.starts_with('{') || value.starts_with('[') {
            return Self::from_slice(value.as_bytes());
        }
        Self::decode(value)
    }

    /// Encodes the set in its base64 transport form. Private parameters are
    /// stripped unless `include_private` is set.
    pub fn encode(&self, include_private: bool) -> Result<String> {
        let json = if include_private {
            serde_json::to_vec(self)
        } else {
            serde_json::to_vec(&self.to_public()?)
        }
        .map_err(errors::any)?;
        Ok(general_purpose::STANDARD.encode(json))
    }

    /// Same identities, public parameters only.
    pub fn to_public(&self) -> Result<Self> {
        let mut keys = Vec::with_capacity(self.keys.len());
        for key in self.keys.iter() {
            let mut public_key = key.clone();
            public_key.key = to_public(key.key.clone())?;
            keys.push(public_key);
        }
        Ok(Self { keys })
    }

    /// Inserts `key` as the new head, evicting the oldest entries beyond
    /// [`MAX_KEYS`].
    pub fn push_front(&mut self, key: jwk::JsonWebKey) {
        self.keys.insert(0, key);
        self.keys.truncate(MAX_KEYS);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

pub fn to_public(key: Box<jwk::Key>) -> Result<Box<jwk::Key>> {
    if !key.is_private() {
        return Ok(key);
    }
    Ok(Box::new(match *key {
        jwk::Key::Symmetric { .. } => {
            return Err(errors::malformed_key_store(
                "symmetric keys have no public form",
            ))
        }
        jwk::Key::EC {
            curve: jwk::Curve::P256 { x, y, .. },
        } => jwk::Key::EC {
            curve: jwk::Curve::P256 { x, y, d: None },
        },
        jwk::Key::RSA { public, .. } => jwk::Key::RSA {
            public,
            private: None,
        },
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::generate_key;

    use lazy_static::lazy_static;
    use serde_json::Value;

    lazy_static! {
        static ref KEY: jwk::JsonWebKey = generate_key().unwrap();
    }

    const PRIVATE_FIELDS: [&str; 6] = ["d", "p", "q", "dp", "dq", "qi"];

    fn key_objects(document: &str) -> Vec<serde_json::Map<String, Value>> {
        let bytes = general_purpose::STANDARD.decode(document).unwrap();
        let value: Value = serde_json::from_slice(&bytes).unwrap();
        value["keys"]
            .as_array()
            .unwrap()
            .iter()
            .map(|key| key.as_object().unwrap().clone())
            .collect()
    }

    #[test]
    fn public_encoding_strips_private_parameters() {
        let set = KeySet::new(vec![KEY.clone()]);

        let full = key_objects(&set.encode(true).unwrap());
        for field in PRIVATE_FIELDS {
            assert!(full[0].contains_key(field), "missing {field}");
        }

        let public = key_objects(&set.encode(false).unwrap());
        for field in PRIVATE_FIELDS {
            assert!(!public[0].contains_key(field), "leaked {field}");
        }
        for field in ["kty", "kid", "use", "alg", "e", "n"] {
            assert!(public[0].contains_key(field), "missing {field}");
        }
    }

    #[test]
    fn decode_preserves_order() {
        let mut second = KEY.clone();
        second.key_id = Some("second".to_owned());
        let set = KeySet::new(vec![second, KEY.clone()]);

        let decoded = KeySet::decode(&set.encode(true).unwrap()).unwrap();
        assert_eq!(decoded, set);
        assert_eq!(decoded.keys[0].key_id.as_deref(), Some("second"));
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = KeySet::decode("%%% not base64 %%%").unwrap_err();
        assert_eq!(err, errors::malformed_key_store(""));

        let not_json = general_purpose::STANDARD.encode("hello");
        assert_eq!(
            KeySet::decode(&not_json).unwrap_err(),
            errors::malformed_key_store("")
        );

        let not_keys = general_purpose::STANDARD.encode(r#"{"keys": 3}"#);
        assert!(KeySet::decode(&not_keys).is_err());
    }

    #[test]
    fn load_accepts_raw_json_and_bare_arrays() {
        let set = KeySet::new(vec![KEY.clone()]);
        let json = serde_json::to_string(&set).unwrap();
        assert_eq!(KeySet::load(&json).unwrap(), set);

        let bare = serde_json::to_string(&set.keys).unwrap();
        assert_eq!(KeySet::load(&bare).unwrap(), set);

        let encoded = set.encode(true).unwrap();
        assert_eq!(KeySet::load(&format!("{encoded}\n")).unwrap(), set);
    }

    #[test]
    fn push_front_caps_at_two() {
        let mut set = KeySet::default();
        for kid in ["a", "b", "c"] {
            let mut key = KEY.clone();
            key.key_id = Some(kid.to_owned());
            set.push_front(key);
        }
        let kids: Vec<_> =
            set.keys.iter().map(|key| key.key_id.clone().unwrap()).collect();
        assert_eq!(kids, vec!["c", "b"]);
    }
}
