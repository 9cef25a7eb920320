use std::path::{Path, PathBuf};

use async_trait::async_trait;

use sigaa_schedule_core::{Error, Result, store::KeyValueStore};

/// One JSON file per key under the data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    data_dir: PathBuf,
}

impl FileStore {
    pub fn new(data_dir: PathBuf) -> Result<Self> {
        if !data_dir.exists() {
            std::fs::create_dir_all(&data_dir).map_err(|e| {
                Error::Store(format!("Failed to create data directory: {}", e))
            })?;
        }

        Ok(Self { data_dir })
    }

    pub fn with_default_dir(app_name: &str) -> Result<Self> {
        let data_dir = Self::get_default_data_dir(app_name)?;
        Self::new(data_dir)
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn get_default_data_dir(app_name: &str) -> Result<PathBuf> {
        #[cfg(target_os = "macos")]
        {
            if let Some(home) = std::env::var_os("HOME") {
                Ok(PathBuf::from(home)
                    .join("Library")
                    .join("Application Support")
                    .join(app_name))
            } else {
                Err(Error::Store("Cannot determine data directory".to_string()))
            }
        }

        #[cfg(target_os = "linux")]
        {
            if let Some(data_dir) = std::env::var_os("XDG_DATA_HOME") {
                Ok(PathBuf::from(data_dir).join(app_name))
            } else if let Some(home) = std::env::var_os("HOME") {
                Ok(PathBuf::from(home)
                    .join(".local")
                    .join("share")
                    .join(app_name))
            } else {
                Err(Error::Store("Cannot determine data directory".to_string()))
            }
        }

        #[cfg(target_os = "windows")]
        {
            if let Some(local_app_data) = std::env::var_os("LOCALAPPDATA") {
                Ok(PathBuf::from(local_app_data).join(app_name))
            } else {
                Err(Error::Store("Cannot determine data directory".to_string()))
            }
        }

        #[cfg(not(any(target_os = "macos", target_os = "linux", target_os = "windows")))]
        {
            Err(Error::Store(
                "Unsupported operating system for data directory detection".to_string(),
            ))
        }
    }

    fn key_file_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();

        self.data_dir.join(format!("{}.json", name))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn set_raw(&self, key: &str, value: &[u8]) -> Result<()> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| Error::Store(format!("Failed to create data directory: {}", e)))?;

        let file_path = self.key_file_path(key);
        tokio::fs::write(file_path, value)
            .await
            .map_err(|e| Error::Store(format!("Failed to write '{}': {}", key, e)))?;
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let file_path = self.key_file_path(key);

        if !file_path.exists() {
            return Ok(None);
        }

        let content = tokio::fs::read(file_path)
            .await
            .map_err(|e| Error::Store(format!("Failed to read '{}': {}", key, e)))?;

        Ok(Some(content))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let file_path = self.key_file_path(key);
        if file_path.exists() {
            tokio::fs::remove_file(file_path)
                .await
                .map_err(|e| Error::Store(format!("Failed to delete '{}': {}", key, e)))?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        if !self.data_dir.exists() {
            return Ok(());
        }

        let mut entries = tokio::fs::read_dir(&self.data_dir)
            .await
            .map_err(|e| Error::Store(format!("Failed to read data directory: {}", e)))?;

        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| Error::Store(format!("Failed to read directory entry: {}", e)))?
        {
            let path = entry.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                tokio::fs::remove_file(&path).await.map_err(|e| {
                    Error::Store(format!("Failed to delete {}: {}", path.display(), e))
                })?;
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sigaa_schedule_core::store::ScheduleStore;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("sigaa-schedule-{}-{}", name, std::process::id()))
    }

    #[tokio::test]
    async fn test_file_roundtrip_and_clear() {
        let dir = temp_dir("roundtrip");
        let store = FileStore::new(dir.clone()).unwrap();

        assert!(store.get_raw("user_data").await.unwrap().is_none());
        store.set_raw("user_data", b"{\"nome\":\"ANA\"}").await.unwrap();
        assert!(dir.join("user_data.json").exists());
        assert_eq!(
            store.get_raw("user_data").await.unwrap().as_deref(),
            Some(&b"{\"nome\":\"ANA\"}"[..])
        );

        store.clear().await.unwrap();
        assert!(store.get_raw("user_data").await.unwrap().is_none());

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn test_clear_removes_only_json_files() {
        let dir = temp_dir("clear");
        let store = FileStore::new(dir.clone()).unwrap();
        store.set_raw("schedules", b"[]").await.unwrap();
        store.set_raw("is_file_loaded", b"true").await.unwrap();
        std::fs::write(dir.join("notes.txt"), "keep").unwrap();

        store.clear().await.unwrap();

        assert!(store.get_raw("schedules").await.unwrap().is_none());
        assert!(store.get_raw("is_file_loaded").await.unwrap().is_none());
        assert!(dir.join("notes.txt").exists());

        std::fs::remove_dir_all(&dir).unwrap();
        assert!(store.clear().await.is_ok());
    }

    #[tokio::test]
    async fn test_schedule_store_over_files() {
        let dir = temp_dir("flags");
        let store = ScheduleStore::new(FileStore::new(dir.clone()).unwrap());

        assert!(store.is_first_access().await.unwrap());
        store.set_first_access(false).await.unwrap();
        store.set_file_loaded(true).await.unwrap();
        assert!(!store.is_first_access().await.unwrap());
        assert!(store.is_file_loaded().await.unwrap());

        store.clear_all().await.unwrap();
        assert!(!store.is_file_loaded().await.unwrap());

        let _ = std::fs::remove_dir_all(dir);
    }
}
