use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::model::DetectionSource;

/// Maximum number of events retained in the ring buffer.
const EVENT_LOG_CAPACITY: usize = 200;

/// Where a detection run is, or where it ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    CacheCheck,
    CacheHit,
    CacheMiss,
    Fanout,
    Reducing,
    AllDone,
    DeadlineExceeded,
    CacheWrite,
    Done,
}

/// Summary of one detection run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub key: String,
    /// `CacheHit`, `AllDone` or `DeadlineExceeded`.
    pub outcome: RunPhase,
    pub attempted: Vec<&'static str>,
    pub skipped: Vec<&'static str>,
    pub succeeded: Vec<&'static str>,
    pub timed_out: Vec<&'static str>,
    pub winner: Option<DetectionSource>,
    pub elapsed: Duration,
}

impl RunReport {
    pub(crate) fn new(key: String) -> Self {
        Self {
            key,
            outcome: RunPhase::Idle,
            attempted: Vec::new(),
            skipped: Vec::new(),
            succeeded: Vec::new(),
            timed_out: Vec::new(),
            winner: None,
            elapsed: Duration::ZERO,
        }
    }
}

/// A typed event from the detection pipeline.
#[derive(Debug, Clone)]
pub enum DetectionEvent {
    PhaseChanged {
        key: String,
        phase: RunPhase,
    },
    StrategySkipped {
        strategy: &'static str,
    },
    StrategyFinished {
        strategy: &'static str,
        source: DetectionSource,
        success: bool,
        confidence: f32,
        error: Option<String>,
    },
    StrategyTimedOut {
        strategy: &'static str,
    },
    RunFinished(RunReport),
    Error {
        source: String,
        message: String,
    },
}

/// A timestamped event entry.
pub type EventEntry = (DateTime<Utc>, DetectionEvent);

/// Bounded ring buffer of detection events.
#[derive(Debug)]
pub struct EventLog {
    entries: VecDeque<EventEntry>,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl EventLog {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(EVENT_LOG_CAPACITY),
        }
    }

    /// Push a new event, evicting the oldest if at capacity.
    pub fn push(&mut self, event: DetectionEvent) {
        if self.entries.len() >= EVENT_LOG_CAPACITY {
            self.entries.pop_front();
        }
        self.entries.push_back((Utc::now(), event));
    }

    /// Return a snapshot of all entries (newest last).
    pub fn snapshot(&self) -> Vec<EventEntry> {
        self.entries.iter().cloned().collect()
    }

    /// The most recent run report, if any.
    pub fn last_report(&self) -> Option<RunReport> {
        self.entries.iter().rev().find_map(|(_, e)| match e {
            DetectionEvent::RunFinished(report) => Some(report.clone()),
            _ => None,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Thread-safe handle to the event log.
pub type SharedEventLog = Arc<Mutex<EventLog>>;

/// Create a new shared event log.
pub fn shared_event_log() -> SharedEventLog {
    Arc::new(Mutex::new(EventLog::new()))
}

/// Push onto a shared log, ignoring poisoning.
pub fn record(log: &SharedEventLog, event: DetectionEvent) {
    log.lock().unwrap_or_else(|e| e.into_inner()).push(event);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_evicts() {
        let mut log = EventLog::new();
        for _ in 0..EVENT_LOG_CAPACITY + 5 {
            log.push(DetectionEvent::StrategySkipped { strategy: "x" });
        }
        assert_eq!(log.len(), EVENT_LOG_CAPACITY);
    }

    #[test]
    fn test_last_report() {
        let log = shared_event_log();
        assert!(log.lock().unwrap().last_report().is_none());

        let mut first = RunReport::new("a".into());
        first.outcome = RunPhase::AllDone;
        record(&log, DetectionEvent::RunFinished(first));
        record(&log, DetectionEvent::RunFinished(RunReport::new("b".into())));
        record(&log, DetectionEvent::StrategyTimedOut { strategy: "slow" });

        let report = log.lock().unwrap().last_report().unwrap();
        assert_eq!(report.key, "b");
    }
}
