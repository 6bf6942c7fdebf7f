//! File-backed story store
//!
//! Every operation, reads included, runs inside one exclusive section: acquire
//! the lock, load the whole document, apply the change, write the whole
//! document back, release. Writes go to a hidden sibling file that is synced
//! and renamed over the target, then the directory is synced, so an
//! interrupted write leaves the previous document in place.
//!
//! A write runs on the blocking pool and owns the lock guard until it
//! finishes. A caller that gives up mid-write therefore cannot let the next
//! operation in before the rename has landed.
//!
//! A document that cannot be parsed is treated as an empty collection unless
//! the store runs in strict mode. That keeps the service answering after a
//! corrupted write, but the next create or like will overwrite whatever the
//! bad file held. I/O failures are never masked this way.

use std::fmt;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, error, info, warn};

use super::document::{NewStory, Story, StoryDocument, StoryId};
use super::observer::{StoreEvent, StoreObserver};
use super::StoryStore;
use crate::core::error::{Error, Result, StorageError};

/// Behavior switches for [`FileStore`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreOptions {
    /// Fail with [`StorageError::MalformedDocument`] instead of treating an
    /// unparseable document as empty
    pub strict: bool,
    /// Give up waiting for the exclusive section after this long.
    /// `None` waits indefinitely.
    pub lock_timeout: Option<Duration>,
}

/// Story collection kept in a single JSON file
pub struct FileStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
    options: StoreOptions,
    observer: Option<Arc<dyn StoreObserver>>,
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl FileStore {
    /// Open a lenient store at `path` with no observer
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open_with(path, StoreOptions::default(), None).await
    }

    /// Open a store at `path`
    ///
    /// Creates parent directories and an empty document when the file does
    /// not exist yet. An existing file is left untouched; whether it parses
    /// is only discovered by the first operation.
    ///
    /// # Errors
    ///
    /// * `Error::Config` - `path` is empty or does not name a file; nothing is created
    /// * `Error::Storage` - the file or its directories could not be created
    pub async fn open_with(
        path: impl Into<PathBuf>,
        options: StoreOptions,
        observer: Option<Arc<dyn StoreObserver>>,
    ) -> Result<Self> {
        let path = path.into();
        if path.to_string_lossy().trim().is_empty() {
            return Err(Error::config("storage path must not be empty"));
        }
        if path.file_name().is_none() {
            return Err(Error::config(format!(
                "storage path {} does not name a file",
                path.display()
            )));
        }

        let store = Self {
            path,
            lock: Arc::new(Mutex::new(())),
            options,
            observer,
        };
        let created = store.ensure_document().await?;
        info!(
            path = %store.path.display(),
            created,
            strict = options.strict,
            "Story store opened"
        );
        store.notify(StoreEvent::Opened {
            path: &store.path,
            created,
        });
        Ok(store)
    }

    /// Backing file of this store
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Options the store was opened with
    pub fn options(&self) -> StoreOptions {
        self.options
    }

    async fn ensure_document(&self) -> Result<bool> {
        let exists = fs::try_exists(&self.path)
            .await
            .map_err(|e| StorageError::unavailable(&self.path, e))?;
        if exists {
            return Ok(false);
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::unavailable(parent, e))?;
        }
        let guard = self.acquire().await?;
        self.write_document(guard, &StoryDocument::default()).await?;
        Ok(true)
    }

    async fn acquire(&self) -> Result<OwnedMutexGuard<()>> {
        let lock = Arc::clone(&self.lock);
        match self.options.lock_timeout {
            None => Ok(lock.lock_owned().await),
            Some(waited) => tokio::time::timeout(waited, lock.lock_owned())
                .await
                .map_err(|_| {
                    warn!(path = %self.path.display(), ?waited, "Timed out waiting for story store");
                    Error::from(StorageError::LockTimeout {
                        path: self.path.clone(),
                        waited,
                    })
                }),
        }
    }

    /// Read and parse the document. Caller must hold the lock.
    async fn load(&self) -> Result<StoryDocument> {
        let bytes = match fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Story document missing, treating as empty");
                return Ok(StoryDocument::default());
            }
            Err(e) => {
                error!(path = %self.path.display(), error = %e, "Failed to read story document");
                return Err(StorageError::unavailable(&self.path, e).into());
            }
        };

        match StoryDocument::decode(&bytes) {
            Ok(document) => {
                debug!(stories = document.len(), "Loaded story document");
                self.notify(StoreEvent::Loaded {
                    stories: document.len(),
                });
                Ok(document)
            }
            Err(source) if self.options.strict => {
                error!(path = %self.path.display(), error = %source, "Malformed story document");
                Err(StorageError::MalformedDocument {
                    path: self.path.clone(),
                    source,
                }
                .into())
            }
            Err(source) => {
                warn!(
                    path = %self.path.display(),
                    error = %source,
                    "Malformed story document, treating as empty"
                );
                self.notify(StoreEvent::Recovered { path: &self.path });
                Ok(StoryDocument::default())
            }
        }
    }

    /// Replace the document on disk. Takes the lock guard and hands it back
    /// once the write has finished, successfully or not.
    async fn write_document(
        &self,
        guard: OwnedMutexGuard<()>,
        document: &StoryDocument,
    ) -> Result<OwnedMutexGuard<()>> {
        let bytes = document.encode().map_err(StorageError::Encode)?;
        let path = self.path.clone();
        let temp_path = self.temp_path();

        let (guard, written) = tokio::task::spawn_blocking(move || {
            let written = replace_file(&path, &temp_path, &bytes);
            if written.is_err() {
                // The target is untouched; only the partial temp file needs to go.
                let _ = std::fs::remove_file(&temp_path);
            }
            (guard, written)
        })
        .await
        .map_err(|e| Error::internal(format!("story document write task failed: {}", e)))?;

        if let Err(source) = written {
            error!(path = %self.path.display(), error = %source, "Failed to persist story document");
            return Err(StorageError::unavailable(&self.path, source).into());
        }

        debug!(stories = document.len(), "Persisted story document");
        self.notify(StoreEvent::Persisted {
            stories: document.len(),
        });
        Ok(guard)
    }

    fn temp_path(&self) -> PathBuf {
        let name = self
            .path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.path.with_file_name(format!(".{name}.tmp"))
    }

    async fn read_locked(&self) -> Result<StoryDocument> {
        let _guard = self.acquire().await?;
        self.load().await
    }

    async fn like_locked(&self, id: StoryId) -> Result<Option<Story>> {
        let guard = self.acquire().await?;
        let mut document = self.load().await?;
        let Some(story) = document.like(id)? else {
            self.notify(StoreEvent::Missing {
                operation: "increment_likes",
                id,
            });
            return Ok(None);
        };

        let _guard = self.write_document(guard, &document).await?;
        debug!(id, likes = story.likes, "Story liked");
        self.notify(StoreEvent::Liked(&story));
        Ok(Some(story))
    }

    async fn create_locked(&self, new: NewStory) -> Result<Story> {
        let guard = self.acquire().await?;
        let mut document = self.load().await?;
        let story = document.append(new)?;

        let _guard = self.write_document(guard, &document).await?;
        info!(id = story.id, title = %story.title, "Story created");
        self.notify(StoreEvent::Created(&story));
        Ok(story)
    }

    fn track<T>(&self, operation: &'static str, result: Result<T>) -> Result<T> {
        if result.is_err() {
            self.notify(StoreEvent::Failed { operation });
        }
        result
    }

    fn notify(&self, event: StoreEvent<'_>) {
        if let Some(observer) = &self.observer {
            observer.observe(&event);
        }
    }
}

/// Write `bytes` to `temp_path`, sync it, rename it over `path` and sync the
/// directory so the rename itself survives a crash.
fn replace_file(path: &Path, temp_path: &Path, bytes: &[u8]) -> io::Result<()> {
    let mut file = std::fs::File::create(temp_path)?;
    file.write_all(bytes)?;
    file.sync_all()?;
    drop(file);
    std::fs::rename(temp_path, path)?;
    sync_dir(parent_dir(path))
}

fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    std::fs::File::open(dir)?.sync_all()
}

// Directories cannot be opened for syncing here; the rename is as durable as
// the platform makes it.
#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

impl StoryStore for FileStore {
    async fn list_all(&self) -> Result<Vec<Story>> {
        let result = self.read_locked().await;
        self.track("list_all", result).map(|document| document.stories)
    }

    async fn get_by_id(&self, id: StoryId) -> Result<Option<Story>> {
        let result = self.read_locked().await;
        let document = self.track("get_by_id", result)?;
        let story = document.find(id).cloned();
        if story.is_none() {
            self.notify(StoreEvent::Missing {
                operation: "get_by_id",
                id,
            });
        }
        Ok(story)
    }

    async fn increment_likes(&self, id: StoryId) -> Result<Option<Story>> {
        let result = self.like_locked(id).await;
        self.track("increment_likes", result)
    }

    async fn create(&self, new: NewStory) -> Result<Story> {
        let result = self.create_locked(new).await;
        self.track("create", result)
    }

    fn location(&self) -> &Path {
        &self.path
    }
}
