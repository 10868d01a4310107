mod keyset;
pub mod rotation;
mod signer;

pub use keyset::{to_public, KeySet, MAX_KEYS};
pub use rotation::Rotation;
pub use signer::{sign, signing_key, verify, JwkKey, TOKEN_TYPE};
