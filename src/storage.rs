use crate::errors::TrackerError;
use serde::{Serialize, de::DeserializeOwned};
use std::{
    collections::HashMap,
    future::Future,
    io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};
use tokio::{fs, sync::Mutex};
use tracing::error;

/// Durable key/value storage holding one string value per collection key.
pub trait StorageBackend: Clone + Send + Sync + 'static {
    /// `Ok(None)` when nothing has been stored under `key` yet.
    fn read(&self, key: &str) -> impl Future<Output = io::Result<Option<String>>> + Send;

    fn write(&self, key: &str, value: String) -> impl Future<Output = io::Result<()>> + Send;
}

/// One `<key>.json` file per collection inside a data directory.
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub async fn open(dir: impl Into<PathBuf>) -> io::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl StorageBackend for FileBackend {
    async fn read(&self, key: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.path_for(key)).await {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn write(&self, key: &str, value: String) -> io::Result<()> {
        fs::write(self.path_for(key), value).await
    }
}

/// In-process storage for tests. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    values: Arc<Mutex<HashMap<String, String>>>,
    fail_writes: Arc<AtomicBool>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every write fails with `PermissionDenied`.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub async fn put_raw(&self, key: &str, value: impl Into<String>) {
        self.values.lock().await.insert(key.to_string(), value.into());
    }
}

impl StorageBackend for MemoryBackend {
    async fn read(&self, key: &str) -> io::Result<Option<String>> {
        Ok(self.values.lock().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: String) -> io::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                "memory backend is read-only",
            ));
        }
        self.values.lock().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// JSON codec for named collections on top of a backend.
#[derive(Debug, Clone)]
pub struct CollectionStore<B> {
    backend: B,
}

impl<B: StorageBackend> CollectionStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub async fn try_load<R: DeserializeOwned>(&self, name: &str) -> Result<Vec<R>, TrackerError> {
        let Some(contents) = self.backend.read(name).await? else {
            return Ok(Vec::new());
        };
        serde_json::from_str(&contents).map_err(|err| TrackerError::Decode {
            collection: name.to_string(),
            reason: err.to_string(),
        })
    }

    /// Unreadable or undecodable values load as an empty collection.
    pub async fn load<R: DeserializeOwned>(&self, name: &str) -> Vec<R> {
        match self.try_load(name).await {
            Ok(records) => records,
            Err(err) => {
                error!("failed to load collection {name}: {err}");
                Vec::new()
            }
        }
    }

    /// Rewrites the whole collection under `name`.
    pub async fn save<R: Serialize + Sync>(&self, name: &str, records: &[R]) -> Result<(), TrackerError> {
        let payload = serde_json::to_string_pretty(records)
            .map_err(|err| TrackerError::Invalid(err.to_string()))?;
        self.backend.write(name, payload).await?;
        Ok(())
    }
}
