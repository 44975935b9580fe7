use std::cmp::Ordering;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use skipwise_api::ApiError;
use skipwise_detect::{DetectError, MarkerCapture, PlaybackSession};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::cache::ResultCache;
use crate::config::{AppConfig, DetectionConfig};
use crate::error::SkipError;
use crate::event_log::{self, DetectionEvent, RunPhase, RunReport, SharedEventLog};
use crate::identity::ContentIdentity;
use crate::model::{DetectionResult, DetectionSource};
use crate::preferences::PreferenceStore;
use crate::strategies::{
    AudioFingerprintStrategy, CacheStrategy, ChapterMarkerStrategy, IntroHaterStrategy,
    IntroSkipperStrategy, ManualPreferenceStrategy, MetadataHeuristicStrategy,
};
use crate::strategy::Strategy;

/// Error message of the terminal result when every strategy failed.
pub const NO_SEGMENTS_FOUND: &str = "No skip segments found by any strategy.";

/// Timing and concurrency limits for a detection run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionSettings {
    /// Global deadline for the fan-out phase.
    pub deadline: Duration,
    /// Strategies allowed to run at once.
    pub max_concurrent: usize,
    pub poll_interval: Duration,
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            deadline: Duration::from_secs(10),
            max_concurrent: 4,
            poll_interval: Duration::from_millis(100),
        }
    }
}

impl From<&DetectionConfig> for DetectionSettings {
    fn from(config: &DetectionConfig) -> Self {
        Self {
            deadline: Duration::from_millis(config.deadline_ms),
            max_concurrent: config.max_concurrent.max(1),
            poll_interval: Duration::from_millis(config.poll_interval_ms.max(1)),
        }
    }
}

/// Receives the outcome of a run started with `Orchestrator::spawn_detection`.
pub trait DetectionCallback: Send + Sync {
    fn on_detection_complete(&self, result: DetectionResult);

    fn on_detection_failed(&self, message: String);
}

struct Registered {
    order: usize,
    strategy: Arc<dyn Strategy>,
}

/// A successful strategy result competing for the terminal slot.
struct Candidate {
    tier: u8,
    order: usize,
    result: DetectionResult,
}

impl Candidate {
    /// Higher tier, then higher confidence, then earlier registration.
    fn outranks(&self, other: &Candidate) -> bool {
        self.tier
            .cmp(&other.tier)
            .then_with(|| self.result.confidence().total_cmp(&other.result.confidence()))
            .then_with(|| other.order.cmp(&self.order))
            == Ordering::Greater
    }
}

type BestSlot = Arc<Mutex<Option<Candidate>>>;

/// Strategy tasks of one run. Any still running are aborted on drop.
#[derive(Default)]
struct RunTasks(Vec<(&'static str, JoinHandle<bool>)>);

impl Drop for RunTasks {
    fn drop(&mut self) {
        for (_, task) in &self.0 {
            task.abort();
        }
    }
}

fn offer(slot: &BestSlot, candidate: Candidate) {
    let mut best = slot.lock().unwrap_or_else(|e| e.into_inner());
    if best.as_ref().map_or(true, |b| candidate.outranks(b)) {
        *best = Some(candidate);
    }
}

pub struct OrchestratorBuilder {
    cache: ResultCache,
    strategies: Vec<Arc<dyn Strategy>>,
    chapters: Option<Arc<ChapterMarkerStrategy>>,
    settings: DetectionSettings,
    event_log: Option<SharedEventLog>,
}

impl OrchestratorBuilder {
    pub fn with_strategy(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.strategies.push(strategy);
        self
    }

    /// Register the chapter strategy and route session binding to it.
    pub fn with_chapter_markers(mut self, chapters: Arc<ChapterMarkerStrategy>) -> Self {
        let strategy: Arc<dyn Strategy> = chapters.clone();
        self.strategies.push(strategy);
        self.chapters = Some(chapters);
        self
    }

    pub fn with_settings(mut self, settings: DetectionSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_event_log(mut self, event_log: SharedEventLog) -> Self {
        self.event_log = Some(event_log);
        self
    }

    pub fn build(self) -> Orchestrator {
        let mut strategies: Vec<Registered> = self
            .strategies
            .into_iter()
            .enumerate()
            .map(|(order, strategy)| Registered { order, strategy })
            .collect();
        // Stable: equal tiers keep registration order.
        strategies.sort_by(|a, b| b.strategy.tier().cmp(&a.strategy.tier()));

        Orchestrator {
            cache_probe: CacheStrategy::new(self.cache.clone()),
            cache: self.cache,
            strategies,
            chapters: self.chapters,
            settings: self.settings,
            event_log: self.event_log.unwrap_or_else(event_log::shared_event_log),
            shutdown: CancellationToken::new(),
            last_report: Mutex::new(None),
        }
    }
}

/// Runs the registered strategies for an asset and picks one terminal result.
pub struct Orchestrator {
    cache: ResultCache,
    cache_probe: CacheStrategy,
    strategies: Vec<Registered>,
    chapters: Option<Arc<ChapterMarkerStrategy>>,
    settings: DetectionSettings,
    event_log: SharedEventLog,
    shutdown: CancellationToken,
    last_report: Mutex<Option<RunReport>>,
}

impl Orchestrator {
    pub fn builder(cache: ResultCache) -> OrchestratorBuilder {
        OrchestratorBuilder {
            cache,
            strategies: Vec::new(),
            chapters: None,
            settings: DetectionSettings::default(),
            event_log: None,
        }
    }

    /// The full strategy set, configured from `config`.
    pub fn from_config(
        config: &AppConfig,
        cache: ResultCache,
        prefs: Arc<dyn PreferenceStore>,
    ) -> Result<Self, SkipError> {
        let api_err = |e: ApiError| SkipError::Config(e.to_string());
        let keywords = config.keyword_database();
        let capture =
            MarkerCapture::with_keywords(config.chapters.buffer_capacity, keywords.clone());
        let keywords = Arc::new(keywords);

        let heuristic = MetadataHeuristicStrategy::new(&config.catalog).map_err(api_err)?;
        let introhater = IntroHaterStrategy::new(&config.providers.introhater, keywords.clone())
            .map_err(api_err)?;
        let introskipper = IntroSkipperStrategy::new(&config.providers.introskipper, keywords)
            .map_err(api_err)?;

        Ok(Self::builder(cache)
            .with_settings(DetectionSettings::from(&config.detection))
            .with_chapter_markers(Arc::new(ChapterMarkerStrategy::with_capture(capture)))
            .with_strategy(Arc::new(heuristic))
            .with_strategy(Arc::new(introhater))
            .with_strategy(Arc::new(introskipper))
            .with_strategy(Arc::new(AudioFingerprintStrategy::new()))
            .with_strategy(Arc::new(ManualPreferenceStrategy::new(prefs)))
            .build())
    }

    pub fn settings(&self) -> &DetectionSettings {
        &self.settings
    }

    pub fn event_log(&self) -> &SharedEventLog {
        &self.event_log
    }

    /// Strategy names in execution order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|r| r.strategy.name()).collect()
    }

    pub fn last_report(&self) -> Option<RunReport> {
        self.last_report
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Attach the chapter strategy to a playback session.
    pub fn bind_session(&self, session: &dyn PlaybackSession) -> Result<(), DetectError> {
        match &self.chapters {
            Some(chapters) => chapters.bind(session),
            None => {
                debug!("no chapter strategy registered, ignoring session bind");
                Ok(())
            }
        }
    }

    pub fn unbind_session(&self) {
        if let Some(chapters) = &self.chapters {
            chapters.unbind();
        }
    }

    pub async fn invalidate_cache(&self, identity: &ContentIdentity) -> Result<bool, SkipError> {
        self.cache.invalidate(identity).await
    }

    pub async fn clear_cache(&self) -> Result<usize, SkipError> {
        self.cache.clear().await
    }

    /// Cancel in-flight and future runs. Runs started afterwards find nothing.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
    }

    /// Run detection on a background task and report through `callback`.
    pub fn spawn_detection(
        self: &Arc<Self>,
        identity: ContentIdentity,
        callback: Arc<dyn DetectionCallback>,
    ) -> JoinHandle<()> {
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let result = this.run_detection(&identity).await;
            if result.is_success() {
                callback.on_detection_complete(result);
            } else {
                let message = result.error().unwrap_or(NO_SEGMENTS_FOUND).to_string();
                callback.on_detection_failed(message);
            }
        })
    }

    /// Produce the terminal result for `identity`: a cache hit, the best
    /// strategy result, or a `None` failure.
    #[tracing::instrument(skip_all, fields(key = %identity.cache_key()))]
    pub async fn run_detection(&self, identity: &ContentIdentity) -> DetectionResult {
        let started = Instant::now();
        let key = identity.cache_key();
        let mut report = RunReport::new(key.clone());

        self.phase(&key, RunPhase::CacheCheck);
        let cached = self.cache_probe.detect(identity, &self.shutdown).await;
        if cached.is_success() {
            info!(segments = cached.segments().len(), "served from cache");
            self.phase(&key, RunPhase::CacheHit);
            report.outcome = RunPhase::CacheHit;
            report.winner = Some(DetectionSource::Cache);
            self.finish(report, started);
            return cached;
        }
        debug!(reason = cached.error().unwrap_or_default(), "cache miss");
        self.phase(&key, RunPhase::CacheMiss);

        for registered in &self.strategies {
            registered.strategy.prepare(identity);
        }

        self.phase(&key, RunPhase::Fanout);
        let cancel = self.shutdown.child_token();
        let semaphore = Arc::new(Semaphore::new(self.settings.max_concurrent.max(1)));
        let best: BestSlot = Arc::new(Mutex::new(None));
        let shared_identity = Arc::new(identity.clone());
        // Dropping the run future cancels and aborts everything it started.
        let _cancel_on_drop = cancel.clone().drop_guard();
        let mut tasks = RunTasks::default();

        for registered in &self.strategies {
            let strategy = Arc::clone(&registered.strategy);
            let name = strategy.name();
            if !strategy.is_available() {
                debug!(strategy = name, "strategy unavailable, skipping");
                report.skipped.push(name);
                event_log::record(
                    &self.event_log,
                    DetectionEvent::StrategySkipped { strategy: name },
                );
                continue;
            }
            report.attempted.push(name);
            let task = tokio::spawn(run_strategy(
                strategy,
                registered.order,
                Arc::clone(&shared_identity),
                cancel.clone(),
                Arc::clone(&semaphore),
                Arc::clone(&best),
                self.event_log.clone(),
            ));
            tasks.0.push((name, task));
        }

        self.phase(&key, RunPhase::Reducing);
        let deadline = Instant::now() + self.settings.deadline;
        let all_done = loop {
            if tasks.0.iter().all(|(_, task)| task.is_finished()) {
                break true;
            }
            let now = Instant::now();
            if now >= deadline {
                break false;
            }
            tokio::time::sleep(self.settings.poll_interval.min(deadline - now)).await;
        };

        if all_done {
            self.phase(&key, RunPhase::AllDone);
            report.outcome = RunPhase::AllDone;
        } else {
            warn!(
                deadline_ms = self.settings.deadline.as_millis() as u64,
                "detection deadline exceeded, cancelling remaining strategies"
            );
            cancel.cancel();
            self.phase(&key, RunPhase::DeadlineExceeded);
            report.outcome = RunPhase::DeadlineExceeded;
        }

        for (name, task) in std::mem::take(&mut tasks.0) {
            if task.is_finished() {
                if let Ok(true) = task.await {
                    report.succeeded.push(name);
                }
            } else {
                task.abort();
                warn!(strategy = name, "strategy timed out");
                report.timed_out.push(name);
                event_log::record(
                    &self.event_log,
                    DetectionEvent::StrategyTimedOut { strategy: name },
                );
            }
        }

        let winner = best.lock().unwrap_or_else(|e| e.into_inner()).take();
        let terminal = match winner {
            Some(candidate) => {
                info!(
                    source = %candidate.result.source(),
                    tier = candidate.tier,
                    confidence = candidate.result.confidence(),
                    segments = candidate.result.segments().len(),
                    "winner selected"
                );
                candidate.result
            }
            None => {
                info!("no strategy produced segments");
                DetectionResult::failed(DetectionSource::None, NO_SEGMENTS_FOUND)
            }
        };
        report.winner = terminal.is_success().then(|| terminal.source());

        self.phase(&key, RunPhase::CacheWrite);
        if let Err(e) = self.cache.store(identity, &terminal).await {
            warn!(error = %e, "failed to cache detection result");
            event_log::record(
                &self.event_log,
                DetectionEvent::Error {
                    source: "cache".into(),
                    message: e.to_string(),
                },
            );
        }

        self.phase(&key, RunPhase::Done);
        self.finish(report, started);
        terminal
    }

    fn phase(&self, key: &str, phase: RunPhase) {
        event_log::record(
            &self.event_log,
            DetectionEvent::PhaseChanged {
                key: key.to_string(),
                phase,
            },
        );
    }

    fn finish(&self, mut report: RunReport, started: Instant) {
        report.elapsed = started.elapsed();
        info!(
            outcome = ?report.outcome,
            winner = ?report.winner,
            attempted = report.attempted.len(),
            skipped = report.skipped.len(),
            timed_out = report.timed_out.len(),
            elapsed_ms = report.elapsed.as_millis() as u64,
            "detection run finished"
        );
        event_log::record(&self.event_log, DetectionEvent::RunFinished(report.clone()));
        *self.last_report.lock().unwrap_or_else(|e| e.into_inner()) = Some(report);
    }
}

/// One strategy's task. Returns whether it produced a success.
async fn run_strategy(
    strategy: Arc<dyn Strategy>,
    order: usize,
    identity: Arc<ContentIdentity>,
    cancel: CancellationToken,
    semaphore: Arc<Semaphore>,
    best: BestSlot,
    event_log: SharedEventLog,
) -> bool {
    let Ok(_permit) = semaphore.acquire_owned().await else {
        return false;
    };
    let tier = strategy.tier();

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => return false,
        result = strategy.detect(&identity, &cancel) => result,
    };

    debug!(
        strategy = strategy.name(),
        tier,
        success = result.is_success(),
        confidence = result.confidence(),
        error = result.error().unwrap_or_default(),
        "strategy finished"
    );
    event_log::record(
        &event_log,
        DetectionEvent::StrategyFinished {
            strategy: strategy.name(),
            source: result.source(),
            success: result.is_success(),
            confidence: result.confidence(),
            error: result.error().map(str::to_string),
        },
    );

    if !result.is_success() {
        return false;
    }
    offer(
        &best,
        Candidate {
            tier,
            order,
            result,
        },
    );
    true
}
