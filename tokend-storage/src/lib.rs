mod memory;
mod pool;
mod redis_store;
pub mod revocation;

pub use memory::MemoryImpl;
pub use pool::{connection_manager, redis_url};
pub use redis_store::RedisImpl;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use tokend_slo::{errors, Result};

/// Key/value collaborator. No transactional guarantees beyond the backing
/// store's own.
#[async_trait]
pub trait Interface: Sync {
    type T: DeserializeOwned + Serialize + Send + Sync;

    /// Writes `input` under `id`. A `ttl` of zero never expires.
    async fn put(&self, id: &str, input: &Self::T, ttl: u64) -> Result<()>;
    /// `None` when nothing, or an empty value, is stored under `id`.
    async fn get(&self, id: &str) -> Result<Option<Self::T>>;
}

#[async_trait]
impl<I> Interface for Arc<I>
where
    I: Interface + Send + ?Sized,
{
    type T = I::T;

    async fn put(&self, id: &str, input: &Self::T, ttl: u64) -> Result<()> {
        (**self).put(id, input, ttl).await
    }

    async fn get(&self, id: &str) -> Result<Option<Self::T>> {
        (**self).get(id).await
    }
}

pub(crate) fn decode_record<T: DeserializeOwned>(
    value: Option<String>,
) -> Result<Option<T>> {
    let value = match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => return Ok(None),
    };
    let json: serde_json::Value =
        serde_json::from_str(&value).map_err(errors::any)?;
    let empty = match &json {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        return Ok(None);
    }
    serde_json::from_value(json).map(Some).map_err(errors::any)
}
