use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use tokio::runtime::Handle;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;

use crate::error::DetectError;
use crate::keywords::{KeywordDatabase, MarkerKind};

/// Default number of captured markers retained per session.
pub const DEFAULT_BUFFER_CAPACITY: usize = 32;

/// A chapter boundary announced by the playback pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterMarker {
    pub label: String,
    pub start_ms: i64,
    pub end_ms: i64,
}

/// Timed metadata delivered by a playback session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkerEvent {
    Chapter(ChapterMarker),
    /// Free-form timed text (ID3 and similar). Not used for classification.
    Text { id: String, value: String },
}

/// A classified marker, in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapturedMarker {
    pub kind: MarkerKind,
    pub label: String,
    pub start_secs: i64,
    pub end_secs: i64,
}

/// Source of live marker events for the asset currently playing.
pub trait PlaybackSession: Send + Sync {
    /// Stable id of the loaded asset, used for logging.
    fn session_id(&self) -> String;

    /// Subscribe to the session's marker stream.
    fn subscribe(&self) -> broadcast::Receiver<MarkerEvent>;
}

/// Bounded ring buffer of captured markers, tagged with the asset it belongs to.
#[derive(Debug)]
pub struct MarkerBuffer {
    entries: VecDeque<CapturedMarker>,
    capacity: usize,
    owner: Option<String>,
}

impl MarkerBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            owner: None,
        }
    }

    /// Push a marker, evicting the oldest if at capacity.
    pub fn push(&mut self, marker: CapturedMarker) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(marker);
    }

    pub fn snapshot(&self) -> Vec<CapturedMarker> {
        self.entries.iter().cloned().collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn owner(&self) -> Option<&str> {
        self.owner.as_deref()
    }
}

/// Classifies and buffers chapter markers from a bound playback session.
pub struct MarkerCapture {
    keywords: Arc<KeywordDatabase>,
    buffer: Arc<Mutex<MarkerBuffer>>,
    listener: Mutex<Option<JoinHandle<()>>>,
    session: Mutex<Option<String>>,
}

impl MarkerCapture {
    pub fn new(capacity: usize) -> Self {
        Self::with_keywords(capacity, KeywordDatabase::embedded())
    }

    pub fn with_keywords(capacity: usize, keywords: KeywordDatabase) -> Self {
        Self {
            keywords: Arc::new(keywords),
            buffer: Arc::new(Mutex::new(MarkerBuffer::new(capacity))),
            listener: Mutex::new(None),
            session: Mutex::new(None),
        }
    }

    pub fn keywords(&self) -> &KeywordDatabase {
        &self.keywords
    }

    /// Attach to a session's marker stream, replacing any previous binding.
    ///
    /// Must be called from within a tokio runtime; the listener runs as a task.
    pub fn bind(&self, session: &dyn PlaybackSession) -> Result<(), DetectError> {
        let handle = Handle::try_current().map_err(|_| DetectError::NoRuntime)?;
        self.stop_listener();
        {
            let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
            buffer.clear();
            buffer.owner = None;
        }

        let session_id = session.session_id();
        let mut rx = session.subscribe();
        let keywords = Arc::clone(&self.keywords);
        let buffer = Arc::clone(&self.buffer);
        let id = session_id.clone();

        let task = handle.spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(MarkerEvent::Chapter(chapter)) => {
                        if let Some(captured) = classify(&keywords, &chapter) {
                            tracing::debug!(
                                session = %id,
                                kind = ?captured.kind,
                                start = captured.start_secs,
                                end = captured.end_secs,
                                "chapter marker captured"
                            );
                            buffer
                                .lock()
                                .unwrap_or_else(|e| e.into_inner())
                                .push(captured);
                        }
                    }
                    Ok(MarkerEvent::Text { .. }) => {}
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!(session = %id, skipped, "marker listener lagged");
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!(session = %id, "marker stream closed");
                        break;
                    }
                }
            }
        });

        *self.listener.lock().unwrap_or_else(|e| e.into_inner()) = Some(task);
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = Some(session_id.clone());
        tracing::info!(session = %session_id, "marker capture bound");
        Ok(())
    }

    /// Detach from the current session. Buffered markers are kept.
    pub fn unbind(&self) {
        self.stop_listener();
        if let Some(id) = self
            .session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            tracing::info!(session = %id, "marker capture unbound");
        }
    }

    pub fn is_bound(&self) -> bool {
        self.session
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }

    pub fn session_id(&self) -> Option<String> {
        self.session.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Classify and buffer a chapter directly. Returns the captured marker,
    /// or `None` if the label is unknown or the range is invalid.
    pub fn record(&self, chapter: &ChapterMarker) -> Option<CapturedMarker> {
        let captured = classify(&self.keywords, chapter)?;
        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(captured.clone());
        Some(captured)
    }

    /// Buffered markers, provided a session is bound.
    pub fn markers(&self) -> Result<Vec<CapturedMarker>, DetectError> {
        if !self.is_bound() {
            return Err(DetectError::NotBound);
        }
        Ok(self.snapshot())
    }

    pub fn snapshot(&self) -> Vec<CapturedMarker> {
        self.buffer
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .snapshot()
    }

    pub fn clear(&self) {
        self.buffer.lock().unwrap_or_else(|e| e.into_inner()).clear();
    }

    /// Claim the buffer for `key`, clearing it if it was collected for another asset.
    /// An unclaimed buffer holds markers from the current session and is kept.
    /// Returns `true` if the buffer was cleared.
    pub fn reset_for(&self, key: &str) -> bool {
        let mut buffer = self.buffer.lock().unwrap_or_else(|e| e.into_inner());
        if buffer.owner.as_deref() == Some(key) {
            return false;
        }
        let cleared = buffer.owner.is_some();
        if cleared {
            buffer.clear();
        }
        buffer.owner = Some(key.to_string());
        cleared
    }

    fn stop_listener(&self) {
        if let Some(task) = self
            .listener
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            task.abort();
        }
    }
}

impl Drop for MarkerCapture {
    fn drop(&mut self) {
        self.stop_listener();
    }
}

fn classify(keywords: &KeywordDatabase, chapter: &ChapterMarker) -> Option<CapturedMarker> {
    let kind = keywords.classify(&chapter.label)?;
    let start_secs = chapter.start_ms / 1000;
    let end_secs = chapter.end_ms / 1000;
    if start_secs < 0 || end_secs <= start_secs {
        return None;
    }
    Some(CapturedMarker {
        kind,
        label: chapter.label.clone(),
        start_secs,
        end_secs,
    })
}
