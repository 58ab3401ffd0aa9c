// ABOUTME: Cached, whole-document JSON store for one logical domain (config, resources, library).
// ABOUTME: Writes go through a FIFO queue per store and land on disk via atomic rename.

use std::convert::Infallible;
use std::fmt;
use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use atelier_core::Document;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Mutex;

use crate::atomic::write_atomic;

/// Errors that can occur during document store operations.
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The file exists but does not parse. Never replaced by the default.
    #[error("corrupt document at {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("json error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("update rejected: {0}")]
    Update(String),

    #[error("store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// A JSON document persisted whole at `path`, with a read-through cache.
///
/// Cloning is cheap and every clone shares the same cache and write queue,
/// so one instance per domain is constructed at startup and handed to
/// whoever needs it.
///
/// Lock order is write queue, then cache. Cache hits never touch the queue.
pub struct DocumentStore<T: Document> {
    inner: Arc<Inner<T>>,
}

impl<T: Document> Clone for DocumentStore<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct Inner<T> {
    path: PathBuf,
    default: T,
    cache: Mutex<Option<T>>,
    write_queue: Arc<Mutex<()>>,
}

impl<T: Document> DocumentStore<T> {
    /// Store for `T` at `<root>/<T::FILE_NAME>`, seeded with `T::default()`.
    pub fn open(root: &Path) -> Self {
        Self::with_default(root.join(T::FILE_NAME), T::default())
    }

    /// Store at an explicit path with a caller-supplied default document.
    pub fn with_default(path: PathBuf, default: T) -> Self {
        Self {
            inner: Arc::new(Inner {
                path,
                default,
                cache: Mutex::new(None),
                write_queue: Arc::new(Mutex::new(())),
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.inner.path
    }

    /// Return the current document. A missing file is seeded with the
    /// default and persisted before returning; a corrupt file is an error.
    pub async fn read(&self) -> Result<T, DocumentError> {
        {
            let cache = self.inner.cache.lock().await;
            if let Some(doc) = cache.as_ref() {
                return Ok(doc.clone());
            }
        }

        self.enqueue(|inner| async move { inner.load().await }).await
    }

    /// Replace the whole document.
    pub async fn write(&self, document: T) -> Result<(), DocumentError> {
        self.enqueue(move |inner| async move { inner.commit(document).await })
            .await
    }

    /// Read-modify-write under the write queue. Returns the document as written.
    pub async fn update<F>(&self, updater: F) -> Result<T, DocumentError>
    where
        F: FnOnce(T) -> T + Send + 'static,
    {
        self.try_update(move |doc| Ok::<_, Infallible>(updater(doc)))
            .await
    }

    /// Like [`DocumentStore::update`], but the updater may refuse the change.
    /// A refusal leaves the file and cache untouched.
    pub async fn try_update<F, E>(&self, updater: F) -> Result<T, DocumentError>
    where
        F: FnOnce(T) -> Result<T, E> + Send + 'static,
        E: fmt::Display,
    {
        self.enqueue(move |inner| async move {
            let current = inner.load().await?;
            let next = match updater(current) {
                Ok(next) => next,
                Err(e) => return Err(DocumentError::Update(e.to_string())),
            };
            inner.commit(next.clone()).await?;
            Ok::<_, DocumentError>(next)
        })
        .await
    }

    /// Drop the cached document so the next read goes to disk.
    pub async fn invalidate_cache(&self) {
        *self.inner.cache.lock().await = None;
        tracing::debug!("invalidated cache for {}", self.inner.path.display());
    }

    /// Take a place in the write queue, then run `job` on a spawned task
    /// holding that place. Once queued the job runs to completion even if
    /// the caller stops waiting.
    async fn enqueue<R, F, Fut>(&self, job: F) -> Result<R, DocumentError>
    where
        F: FnOnce(Arc<Inner<T>>) -> Fut,
        Fut: Future<Output = Result<R, DocumentError>> + Send + 'static,
        R: Send + 'static,
    {
        let ticket = Arc::clone(&self.inner.write_queue).lock_owned().await;
        let work = job(Arc::clone(&self.inner));
        tokio::spawn(async move {
            let _ticket = ticket;
            work.await
        })
        .await?
    }
}

impl<T: Document> Inner<T> {
    /// Cached document, or load it from disk. Caller holds the write queue.
    async fn load(&self) -> Result<T, DocumentError> {
        let mut cache = self.cache.lock().await;
        if let Some(doc) = cache.as_ref() {
            return Ok(doc.clone());
        }

        let doc = match fs::read(&self.path).await {
            Ok(bytes) => serde_json::from_slice::<T>(&bytes).map_err(|source| {
                DocumentError::Corrupt {
                    path: self.path.clone(),
                    source,
                }
            })?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(
                    "{} not found, seeding default document (schema {})",
                    self.path.display(),
                    self.default.schema_version()
                );
                self.persist(&self.default).await?;
                self.default.clone()
            }
            Err(e) => return Err(e.into()),
        };

        *cache = Some(doc.clone());
        Ok(doc)
    }

    /// Persist then cache. Caller holds the write queue.
    async fn commit(&self, document: T) -> Result<(), DocumentError> {
        self.persist(&document).await?;
        *self.cache.lock().await = Some(document);
        Ok(())
    }

    async fn persist(&self, document: &T) -> Result<(), DocumentError> {
        let json = serde_json::to_vec_pretty(document)?;
        write_atomic(&self.path, &json).await?;
        tracing::debug!("wrote {} ({} bytes)", self.path.display(), json.len());
        Ok(())
    }
}
