use std::path::Path;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};

use super::store::CacheStore;
use crate::error::SkipError;
use crate::model::CacheEntry;

/// Async handle to a `CacheStore` owned by a dedicated thread.
#[derive(Clone)]
pub struct CacheHandle {
    tx: mpsc::UnboundedSender<CacheCommand>,
}

enum CacheCommand {
    Get {
        key: String,
        reply: oneshot::Sender<Result<Option<CacheEntry>, SkipError>>,
    },
    Put {
        entry: Box<CacheEntry>,
        reply: oneshot::Sender<Result<(), SkipError>>,
    },
    Delete {
        key: String,
        reply: oneshot::Sender<Result<bool, SkipError>>,
    },
    Clear {
        reply: oneshot::Sender<Result<usize, SkipError>>,
    },
    PurgeBefore {
        cutoff: DateTime<Utc>,
        reply: oneshot::Sender<Result<usize, SkipError>>,
    },
    Count {
        reply: oneshot::Sender<Result<usize, SkipError>>,
    },
}

impl CacheHandle {
    pub fn open(path: &Path) -> Result<Self, SkipError> {
        let store = CacheStore::open(path)?;
        Self::spawn(store)
    }

    pub fn open_memory() -> Result<Self, SkipError> {
        Self::spawn(CacheStore::open_memory()?)
    }

    /// Move `store` onto its own thread and return a handle to it.
    pub fn spawn(store: CacheStore) -> Result<Self, SkipError> {
        let (tx, rx) = mpsc::unbounded_channel();

        std::thread::Builder::new()
            .name("cache-actor".into())
            .spawn(move || actor_loop(store, rx))?;

        Ok(Self { tx })
    }

    pub async fn get(&self, key: &str) -> Result<Option<CacheEntry>, SkipError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(CacheCommand::Get {
            key: key.to_string(),
            reply,
        });
        rx.await
            .unwrap_or_else(|_| Err(SkipError::CacheClosed))
    }

    pub async fn put(&self, entry: CacheEntry) -> Result<(), SkipError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(CacheCommand::Put {
            entry: Box::new(entry),
            reply,
        });
        rx.await
            .unwrap_or_else(|_| Err(SkipError::CacheClosed))
    }

    pub async fn delete(&self, key: &str) -> Result<bool, SkipError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(CacheCommand::Delete {
            key: key.to_string(),
            reply,
        });
        rx.await
            .unwrap_or_else(|_| Err(SkipError::CacheClosed))
    }

    pub async fn clear(&self) -> Result<usize, SkipError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(CacheCommand::Clear { reply });
        rx.await
            .unwrap_or_else(|_| Err(SkipError::CacheClosed))
    }

    pub async fn purge_before(&self, cutoff: DateTime<Utc>) -> Result<usize, SkipError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(CacheCommand::PurgeBefore { cutoff, reply });
        rx.await
            .unwrap_or_else(|_| Err(SkipError::CacheClosed))
    }

    pub async fn count(&self) -> Result<usize, SkipError> {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(CacheCommand::Count { reply });
        rx.await
            .unwrap_or_else(|_| Err(SkipError::CacheClosed))
    }
}

fn actor_loop(store: CacheStore, mut rx: mpsc::UnboundedReceiver<CacheCommand>) {
    while let Some(cmd) = rx.blocking_recv() {
        match cmd {
            CacheCommand::Get { key, reply } => {
                let _ = reply.send(store.get(&key));
            }
            CacheCommand::Put { entry, reply } => {
                let _ = reply.send(store.put(&entry));
            }
            CacheCommand::Delete { key, reply } => {
                let _ = reply.send(store.delete(&key));
            }
            CacheCommand::Clear { reply } => {
                let _ = reply.send(store.clear());
            }
            CacheCommand::PurgeBefore { cutoff, reply } => {
                let _ = reply.send(store.purge_before(cutoff));
            }
            CacheCommand::Count { reply } => {
                let _ = reply.send(store.count());
            }
        }
    }
    tracing::debug!("cache actor stopped");
}
