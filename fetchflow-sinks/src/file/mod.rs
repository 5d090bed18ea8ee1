//! JSON file persistence

use crate::error::{Result, StoreError};
use crate::types::FileStoreConfig;
use fetchflow_core::{
    flow::types::FlowFuture, FlowComponent, FlowError, Payload, Persistence, StoreProvider,
};
use std::ffi::OsString;
use std::fmt;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

static TEMP_SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Keeps one JSON document of type `T` in a single file.
///
/// A missing file loads as [`FlowError::CacheMiss`]; an unreadable or
/// undecodable one as [`FlowError::Persistence`]. Saves write a temporary
/// sibling and rename it over the target, so readers never see a partial
/// document.
pub struct JsonFilePersistence<T> {
    path: PathBuf,
    config: FileStoreConfig,
    _phantom: PhantomData<T>,
}

impl<T> fmt::Debug for JsonFilePersistence<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonFilePersistence")
            .field("path", &self.path)
            .field("config", &self.config)
            .field("payload", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> JsonFilePersistence<T>
where
    T: Payload,
{
    /// Create a handler for the file at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, config: FileStoreConfig) -> Self {
        Self {
            path: path.into(),
            config,
            _phantom: PhantomData,
        }
    }

    /// The file this handler reads and writes
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn read(&self) -> Result<T> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| StoreError::io(&self.path, &e))?;

        serde_json::from_slice(&bytes).map_err(|e| {
            warn!(error = %e, "Stored document is corrupt");
            StoreError::serialization(&self.path, &e)
        })
    }

    #[instrument(skip(self, value), fields(path = %self.path.display()))]
    async fn write(&self, value: &T) -> Result<()> {
        let encoded = if self.config.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        }
        .map_err(|e| StoreError::serialization(&self.path, &e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StoreError::io(parent, &e))?;
        }

        let temp = self.temp_path();
        if let Err(e) = tokio::fs::write(&temp, &encoded).await {
            return Err(StoreError::io(&temp, &e));
        }
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(StoreError::io(&self.path, &e));
        }

        debug!(bytes = encoded.len(), "Stored document");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map_or_else(|| OsString::from("store"), ToOwned::to_owned);
        name.push(format!(
            ".{}.{}.tmp",
            std::process::id(),
            TEMP_SEQUENCE.fetch_add(1, Ordering::Relaxed)
        ));
        self.path.with_file_name(name)
    }
}

impl<T> FlowComponent for JsonFilePersistence<T>
where
    T: Payload,
{
    type Input = ();
    type Output = T;
    type Error = FlowError;
}

impl<T> Persistence for JsonFilePersistence<T>
where
    T: Payload,
{
    fn load(&self) -> FlowFuture<'_, Self::Output, Self::Error> {
        Box::pin(async move { self.read().await.map_err(FlowError::from) })
    }

    fn save(&self, value: Self::Output) -> FlowFuture<'_, Self::Output, Self::Error> {
        Box::pin(async move {
            self.write(&value).await?;
            Ok(value)
        })
    }
}

/// Hands out a [`JsonFilePersistence`] per storage location.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFileStore {
    config: FileStoreConfig,
}

impl JsonFileStore {
    /// Create a store whose handlers share `config`
    #[must_use]
    pub const fn new(config: FileStoreConfig) -> Self {
        Self { config }
    }
}

impl StoreProvider for JsonFileStore {
    fn handler<T>(&self, location: &Path) -> Arc<dyn Persistence<Output = T>>
    where
        T: Payload,
    {
        debug!(location = %location.display(), "Binding JSON file handler");
        Arc::new(JsonFilePersistence::<T>::new(location, self.config))
    }
}
