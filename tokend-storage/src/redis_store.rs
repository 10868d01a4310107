use std::{fmt, marker::PhantomData};

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use tokend_slo::{errors, Result};

use crate::{decode_record, Interface};

/// Redis backed store. Values are JSON documents keyed by the bare id.
pub struct RedisImpl<T> {
    conn: ConnectionManager,
    _marker: PhantomData<fn() -> T>,
}

impl<T> RedisImpl<T> {
    pub fn new(conn: ConnectionManager) -> Self {
        Self {
            conn,
            _marker: PhantomData,
        }
    }
}

impl<T> Clone for RedisImpl<T> {
    fn clone(&self) -> Self {
        Self::new(self.conn.clone())
    }
}

impl<T> fmt::Debug for RedisImpl<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisImpl").finish()
    }
}

#[async_trait]
impl<T> Interface for RedisImpl<T>
where
    T: DeserializeOwned + Serialize + Send + Sync,
{
    type T = T;

    #[tracing::instrument(skip(self, input))]
    async fn put(&self, id: &str, input: &Self::T, ttl: u64) -> Result<()> {
        let value = serde_json::to_string(input).map_err(errors::any)?;
        debug!("saving {} for {}", value, id);
        let mut conn = self.conn.clone();
        if ttl > 0 {
            conn.set_ex::<_, _, ()>(id, value, ttl)
                .await
                .map_err(errors::any)
        } else {
            conn.set::<_, _, ()>(id, value).await.map_err(errors::any)
        }
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<Self::T>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(id).await.map_err(errors::any)?;
        decode_record(value)
    }
}
