use std::{collections::HashMap, fmt, marker::PhantomData, sync::RwLock};

use async_trait::async_trait;
use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};

use tokend_slo::{errors, Result};

use crate::{decode_record, Interface};

struct Entry {
    value: String,
    expires_at: Option<i64>,
}

/// Process-local store, used when no Redis address is configured.
pub struct MemoryImpl<T> {
    entries: RwLock<HashMap<String, Entry>>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> MemoryImpl<T> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            _marker: PhantomData,
        }
    }

    fn now() -> i64 {
        Utc::now().timestamp_millis()
    }
}

impl<T> Default for MemoryImpl<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for MemoryImpl<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryImpl").finish()
    }
}

#[async_trait]
impl<T> Interface for MemoryImpl<T>
where
    T: DeserializeOwned + Serialize + Send + Sync,
{
    type T = T;

    async fn put(&self, id: &str, input: &Self::T, ttl: u64) -> Result<()> {
        let value = serde_json::to_string(input).map_err(errors::any)?;
        let now = Self::now();
        let expires_at = (ttl > 0).then(|| {
            i64::try_from(ttl)
                .ok()
                .and_then(|ttl| ttl.checked_mul(1000))
                .map_or(i64::MAX, |millis| now.saturating_add(millis))
        });
        let mut entries = self.entries.write().map_err(errors::any)?;
        entries
            .retain(|_, entry| entry.expires_at.map_or(true, |at| at > now));
        entries.insert(id.to_owned(), Entry { value, expires_at });
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<Self::T>> {
        let value = {
            let entries = self.entries.read().map_err(errors::any)?;
            entries
                .get(id)
                .filter(|entry| {
                    entry.expires_at.map_or(true, |at| at > Self::now())
                })
                .map(|entry| entry.value.clone())
        };
        decode_record(value)
    }
}
