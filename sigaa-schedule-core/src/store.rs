use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::sync::RwLock;

use crate::{Result, ScheduleEntry, UserIdentity};

const FILE_LOADED_KEY: &str = "is_file_loaded";
const FIRST_ACCESS_KEY: &str = "if_first_access";
const USER_DATA_KEY: &str = "user_data";
const SCHEDULES_KEY: &str = "schedules";

const ALL_KEYS: [&str; 4] = [FILE_LOADED_KEY, FIRST_ACCESS_KEY, USER_DATA_KEY, SCHEDULES_KEY];

/// Key-value storage supplied by the application
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn set_raw(&self, key: &str, value: &[u8]) -> Result<()>;
    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn delete(&self, key: &str) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

#[async_trait]
pub trait Store: KeyValueStore {
    async fn set<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + Send + Sync,
    {
        let value_bytes = serde_json::to_vec(value)?;
        self.set_raw(key, &value_bytes).await
    }

    async fn get<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: DeserializeOwned + Send,
    {
        if let Some(raw) = self.get_raw(key).await? {
            let value = serde_json::from_slice::<T>(&raw).map_err(|e| {
                crate::Error::Store(format!("Failed to deserialize '{}': {}", key, e))
            })?;

            Ok(Some(value))
        } else {
            Ok(None)
        }
    }
}

/// Every [`KeyValueStore`] gets typed access
impl<T: KeyValueStore> Store for T {}

/// In-process store, mostly for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn set_raw(&self, key: &str, value: &[u8]) -> Result<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), value.to_vec());
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.write().await.clear();
        Ok(())
    }
}

/// Typed data sink for parsed schedules and identity
#[derive(Clone)]
pub struct ScheduleStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ScheduleStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn save_schedules(&self, entries: &[ScheduleEntry]) -> Result<()> {
        tracing::debug!("Saving {} schedule entries", entries.len());
        self.store.set(SCHEDULES_KEY, &entries).await
    }

    pub async fn load_schedules(&self) -> Result<Option<Vec<ScheduleEntry>>> {
        self.store.get(SCHEDULES_KEY).await
    }

    pub async fn save_identity(&self, identity: &UserIdentity) -> Result<()> {
        self.store.set(USER_DATA_KEY, identity).await
    }

    pub async fn load_identity(&self) -> Result<Option<UserIdentity>> {
        self.store.get(USER_DATA_KEY).await
    }

    pub async fn is_file_loaded(&self) -> Result<bool> {
        Ok(self.store.get(FILE_LOADED_KEY).await?.unwrap_or(false))
    }

    pub async fn set_file_loaded(&self, loaded: bool) -> Result<()> {
        self.store.set(FILE_LOADED_KEY, &loaded).await
    }

    /// True until [`set_first_access(false)`](Self::set_first_access) is stored
    pub async fn is_first_access(&self) -> Result<bool> {
        Ok(self.store.get(FIRST_ACCESS_KEY).await?.unwrap_or(true))
    }

    pub async fn set_first_access(&self, first: bool) -> Result<()> {
        self.store.set(FIRST_ACCESS_KEY, &first).await
    }

    /// Remove every key this store writes
    pub async fn clear_all(&self) -> Result<()> {
        for key in ALL_KEYS {
            self.store.delete(key).await?;
        }
        Ok(())
    }

    pub fn inner(&self) -> &S {
        &self.store
    }
}
