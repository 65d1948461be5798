//! Settings persistence
//!
//! A store publishes every change as a fresh [`Settings`] snapshot on a
//! `watch` channel and accepts fire-and-forget writes, one key at a time.

use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};
use thiserror::Error;
use tokio::sync::{watch, Mutex};
use tracing::{debug, info, warn};

use crate::state::{Settings, SettingsUpdate};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("settings file {path} is not valid JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable key-value settings consumed by the timer engine
pub trait SettingsStore: Send + Sync + fmt::Debug {
    /// Receiver that yields the current snapshot and every later one, in order
    fn subscribe(&self) -> watch::Receiver<Settings>;

    /// Persist several settings as one snapshot; returns before the write completes
    fn write_all(&self, updates: Vec<SettingsUpdate>);

    /// Persist one setting
    fn write(&self, update: SettingsUpdate) {
        self.write_all(vec![update]);
    }

    /// Latest snapshot
    fn current(&self) -> Settings {
        self.subscribe().borrow().clone()
    }
}

/// Volatile store, used in tests and when no settings file is wanted
#[derive(Debug)]
pub struct MemorySettingsStore {
    tx: watch::Sender<Settings>,
}

impl MemorySettingsStore {
    pub fn new(initial: Settings) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl SettingsStore for MemorySettingsStore {
    fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    fn write_all(&self, updates: Vec<SettingsUpdate>) {
        debug!("Settings write: {:?}", updates);
        self.tx.send_modify(|s| updates.iter().for_each(|u| s.apply(u)));
    }
}

/// Store backed by a JSON file
pub struct FileSettingsStore {
    path: PathBuf,
    tx: watch::Sender<Settings>,
    /// Serializes file writes so the newest snapshot always lands last
    write_lock: Arc<Mutex<()>>,
}

impl fmt::Debug for FileSettingsStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileSettingsStore")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl FileSettingsStore {
    /// Open the store, falling back to defaults if the file is missing or unreadable
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let settings = match load(&path).await {
            Ok(Some(settings)) => {
                info!("Loaded settings from {}", path.display());
                settings
            }
            Ok(None) => {
                info!("No settings file at {}, using defaults", path.display());
                Settings::default()
            }
            Err(e) => {
                warn!("{}; using defaults", e);
                Settings::default()
            }
        };

        let (tx, _) = watch::channel(settings);
        Self {
            path,
            tx,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SettingsStore for FileSettingsStore {
    fn subscribe(&self) -> watch::Receiver<Settings> {
        self.tx.subscribe()
    }

    fn write_all(&self, updates: Vec<SettingsUpdate>) {
        debug!("Settings write: {:?}", updates);
        self.tx.send_modify(|s| updates.iter().for_each(|u| s.apply(u)));

        let rx = self.tx.subscribe();
        let path = self.path.clone();
        let write_lock = Arc::clone(&self.write_lock);
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            let keys: Vec<_> = updates.iter().flat_map(SettingsUpdate::keys).collect();
            warn!("No async runtime; settings change to {:?} not persisted", keys);
            return;
        };
        runtime.spawn(async move {
            let _guard = write_lock.lock().await;
            let snapshot = rx.borrow().clone();
            if let Err(e) = save(&path, &snapshot).await {
                warn!("Failed to persist settings: {}", e);
            }
        });
    }
}

async fn load(path: &Path) -> Result<Option<Settings>, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StoreError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| StoreError::Json {
            path: path.to_path_buf(),
            source,
        })
}

async fn save(path: &Path, settings: &Settings) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(settings).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    // Write then rename so a crash never leaves a truncated file
    let tmp = path.with_extension("json.tmp");
    let io_err = |source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    tokio::fs::write(&tmp, json).await.map_err(io_err)?;
    tokio::fs::rename(&tmp, path).await.map_err(io_err)?;
    debug!("Settings saved to {}", path.display());
    Ok(())
}
