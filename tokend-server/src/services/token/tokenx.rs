use std::sync::Arc;

use tokend_jwks::{sign, signing_key, verify, KeySet};
use tokend_slo::Result;

use super::{Claims, Token};

/// [`Token`] backed by the key set loaded at start-up. The head signature
/// key signs; every key verifies.
#[derive(Debug, Clone)]
pub struct AccessToken {
    keys: Arc<KeySet>,
}

impl AccessToken {
    pub fn new(keys: Arc<KeySet>) -> Self {
        Self { keys }
    }
}

impl Token for AccessToken {
    fn sign(&self, claims: &Claims) -> Result<String> {
        sign(claims, signing_key(&self.keys)?)
    }

    fn verify(&self, token: &str) -> Result<Claims> {
        verify(token, &self.keys)
    }

    fn public_keys(&self) -> Result<KeySet> {
        self.keys.to_public()
    }
}
