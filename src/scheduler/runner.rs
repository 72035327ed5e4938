//! Per-persona scheduling loop
//!
//! Posts at least once per interval until the duration has elapsed or a
//! shutdown is requested.

use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::content::PostAssembler;
use crate::error::Result;
use crate::persona::Persona;
use crate::storage::{PersistedPost, PostStore};

use super::{ConversationHistory, Outcome, SchedulerState, SimulationStats};

// ─────────────────────────────────────────────────────────────────
// Scheduler Configuration
// ─────────────────────────────────────────────────────────────────

/// Loop timings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    /// Total run time
    pub duration: Duration,

    /// Minimum gap between posts
    pub interval: Duration,

    /// Idle time between checks
    pub poll_interval: Duration,
}

impl SchedulerConfig {
    pub fn new(duration: Duration, interval: Duration, poll_interval: Duration) -> Self {
        Self {
            duration,
            interval,
            poll_interval,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::new(
            Duration::from_secs(24 * 3600),
            Duration::from_secs(3600),
            Duration::from_secs(10),
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Shutdown Signal
// ─────────────────────────────────────────────────────────────────

/// Receiving side of a shutdown request, cloned into every scheduler.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Signal plus the sender that triggers it (send `true`)
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (tx, rx) = watch::channel(false);
        (tx, Self { rx })
    }

    /// A signal that never fires
    pub fn never() -> Self {
        Self::channel().1
    }

    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once shutdown is requested. Pends forever if the sender is
    /// dropped without requesting it.
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────

/// Drives one persona's posting loop
pub struct Scheduler {
    persona_id: String,
    persona: Persona,
    assembler: Arc<PostAssembler>,
    store: Arc<dyn PostStore>,
    config: SchedulerConfig,
    rng: StdRng,
    history: ConversationHistory,
    state: SchedulerState,
}

impl Scheduler {
    pub fn new(
        persona_id: impl Into<String>,
        persona: Persona,
        assembler: Arc<PostAssembler>,
        store: Arc<dyn PostStore>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            persona_id: persona_id.into(),
            persona,
            assembler,
            store,
            config,
            rng: StdRng::from_entropy(),
            history: ConversationHistory::default(),
            state: SchedulerState::Waiting,
        }
    }

    /// Make content ideas reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_history_size(mut self, size: usize) -> Self {
        self.history = ConversationHistory::new(size);
        self
    }

    pub fn persona_id(&self) -> &str {
        &self.persona_id
    }

    pub fn persona(&self) -> &Persona {
        &self.persona
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Run until the duration elapses or `shutdown` fires.
    ///
    /// Generation and persistence failures are logged and counted; any other
    /// error ends the run.
    pub async fn run(&mut self, mut shutdown: ShutdownSignal) -> Result<SimulationStats> {
        let start = Instant::now();
        let mut last_post = start;
        let mut stats = SimulationStats::new(&self.persona_id);

        info!(
            persona = %self.persona_id,
            name = %self.persona.name,
            duration_secs = self.config.duration.as_secs_f64(),
            interval_secs = self.config.interval.as_secs_f64(),
            "Starting simulation"
        );

        let outcome = loop {
            let elapsed = start.elapsed();
            if elapsed >= self.config.duration {
                break Outcome::Completed;
            }
            if shutdown.is_triggered() {
                break Outcome::Interrupted;
            }

            if last_post.elapsed() >= self.config.interval {
                self.state = SchedulerState::Posting;
                let result = tokio::select! {
                    r = self.run_cycle() => Some(r),
                    _ = shutdown.triggered() => None,
                };
                self.state = SchedulerState::Waiting;
                last_post = Instant::now();

                match result {
                    None => break Outcome::Interrupted,
                    Some(Ok(_)) => stats.posts_created += 1,
                    Some(Err(e)) if e.is_recoverable() => {
                        stats.failed_cycles += 1;
                        warn!(
                            persona = %self.persona_id,
                            error = %e,
                            "Post cycle failed, will retry next interval"
                        );
                    }
                    Some(Err(e)) => {
                        error!(
                            persona = %self.persona_id,
                            error = %e.format_for_log(),
                            "Simulation aborted"
                        );
                        return Err(e);
                    }
                }
                continue;
            }

            let remaining = self.config.duration.saturating_sub(start.elapsed());
            let nap = self.config.poll_interval.min(remaining);
            tokio::select! {
                _ = tokio::time::sleep(nap) => {}
                _ = shutdown.triggered() => break Outcome::Interrupted,
            }
        };

        stats.outcome = outcome;
        stats.elapsed = start.elapsed();
        info!(
            persona = %self.persona_id,
            posts = stats.posts_created,
            failed = stats.failed_cycles,
            outcome = %stats.outcome,
            "Simulation finished"
        );
        Ok(stats)
    }

    /// Assemble and persist one post.
    async fn run_cycle(&mut self) -> Result<PersistedPost> {
        let post = self
            .assembler
            .generate_post(&self.persona, &mut self.rng, self.history.as_slice())
            .await?;
        let persisted = self.store.persist(&post).await?;
        self.history.push(post.text());

        info!(
            persona = %self.persona_id,
            post_id = %post.id(),
            topic = %post.idea().topic,
            mood = %post.mood(),
            media = persisted.media.len(),
            hashtags = post.hashtags().len(),
            "New post"
        );
        debug!(
            persona = %self.persona_id,
            record = %persisted.record_path.display(),
            "Record written"
        );
        Ok(persisted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{Modality, MockConfig, MockService, ServiceRegistry, StylePreset};
    use crate::content::Post;
    use crate::error::Error;
    use crate::persona::{ContentPreferences, DailyRoutine};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Keeps post texts in memory; optionally fails every persist.
    #[derive(Default)]
    struct RecordingStore {
        texts: Mutex<Vec<String>>,
        fail_with: Option<fn() -> Error>,
    }

    #[async_trait]
    impl PostStore for RecordingStore {
        async fn persist(&self, post: &Post) -> Result<PersistedPost> {
            if let Some(make) = self.fail_with {
                return Err(make());
            }
            self.texts.lock().push(post.text().to_string());
            Ok(PersistedPost {
                record_path: PathBuf::from(format!("{}.json", post.short_id())),
                media: BTreeMap::new(),
            })
        }
    }

    fn persona() -> Persona {
        Persona {
            name: "Ji-woo Park".into(),
            age: 27,
            location: "Seoul, South Korea".into(),
            occupation: "Digital Artist".into(),
            interests: vec!["K-pop".into()],
            personality_traits: vec!["Creative".into(), "Friendly".into()],
            daily_routine: DailyRoutine {
                morning: vec!["7:00: sketching".into()],
                evening: vec!["19:00: gallery visit".into()],
            },
            content_preferences: ContentPreferences {
                topics: vec!["digital art tips".into(), "K-pop tips".into()],
                formats: vec!["Photo stories".into()],
            },
        }
    }

    fn config(duration_h: f64, interval_h: f64) -> SchedulerConfig {
        SchedulerConfig::new(
            Duration::from_secs_f64(duration_h * 3600.0),
            Duration::from_secs_f64(interval_h * 3600.0),
            Duration::from_secs(10),
        )
    }

    fn text_only(dir: &TempDir) -> Arc<PostAssembler> {
        let text = Arc::new(MockService::with_config(
            Modality::Text,
            MockConfig {
                staging_dir: dir.path().to_path_buf(),
                ..Default::default()
            },
        ));
        let registry = ServiceRegistry::new(text);
        Arc::new(PostAssembler::new(registry, StylePreset::Professional))
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_run_posts_at_least_once() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RecordingStore::default());
        let assembler = text_only(&dir);
        let mut scheduler =
            Scheduler::new("korean", persona(), assembler, store.clone(), config(0.1, 0.05))
                .with_seed(7);

        let stats = scheduler.run(ShutdownSignal::never()).await.unwrap();

        assert_eq!(stats.outcome, Outcome::Completed);
        assert!(stats.posts_created >= 1);
        assert_eq!(stats.failed_cycles, 0);
        assert_eq!(store.texts.lock().len() as u32, stats.posts_created);
        assert_eq!(scheduler.history().len() as u32, stats.posts_created);
        assert_eq!(scheduler.state(), SchedulerState::Waiting);
    }

    #[tokio::test(start_paused = true)]
    async fn test_image_failure_does_not_stop_next_cycle() {
        let dir = TempDir::new().unwrap();
        let mock = |modality, fail_first| {
            Arc::new(MockService::with_config(
                modality,
                MockConfig {
                    fail_first,
                    staging_dir: dir.path().to_path_buf(),
                    ..Default::default()
                },
            ))
        };
        let registry = ServiceRegistry::new(mock(Modality::Text, 0))
            .with_service(Modality::Image, mock(Modality::Image, 1));
        let assembler = Arc::new(PostAssembler::new(registry, StylePreset::Professional));
        let store = Arc::new(RecordingStore::default());

        // Three intervals fit in the duration.
        let mut scheduler =
            Scheduler::new("korean", persona(), assembler, store, config(0.2, 0.05));
        let stats = scheduler.run(ShutdownSignal::never()).await.unwrap();

        assert_eq!(stats.failed_cycles, 1);
        assert!(stats.posts_created >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unsupported_image_style_is_skipped() {
        let dir = TempDir::new().unwrap();
        let mock = |modality| {
            Arc::new(MockService::with_config(
                modality,
                MockConfig {
                    staging_dir: dir.path().to_path_buf(),
                    ..Default::default()
                },
            ))
        };
        // Text accepts "energetic", image does not.
        let registry = ServiceRegistry::new(mock(Modality::Text))
            .with_service(Modality::Image, mock(Modality::Image));
        let assembler = Arc::new(PostAssembler::new(registry, StylePreset::Energetic));
        let store = Arc::new(RecordingStore::default());

        let mut scheduler =
            Scheduler::new("korean", persona(), assembler, store, config(0.2, 0.05));
        let stats = scheduler.run(ShutdownSignal::never()).await.unwrap();

        assert_eq!(stats.outcome, Outcome::Completed);
        assert_eq!(stats.posts_created, 0);
        assert!(stats.failed_cycles >= 1);
        assert!(scheduler.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_persistence_failure_is_skipped() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RecordingStore {
            fail_with: Some(|| {
                let cause = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
                Error::persistence("/nope", cause)
            }),
            ..Default::default()
        });
        let mut scheduler =
            Scheduler::new("korean", persona(), text_only(&dir), store, config(0.1, 0.05));

        let stats = scheduler.run(ShutdownSignal::never()).await.unwrap();
        assert_eq!(stats.posts_created, 0);
        assert!(stats.failed_cycles >= 1);
        assert!(scheduler.history().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_non_recoverable_error_aborts() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RecordingStore {
            fail_with: Some(|| Error::Internal("broken".into())),
            ..Default::default()
        });
        let mut scheduler =
            Scheduler::new("korean", persona(), text_only(&dir), store, config(0.1, 0.05));

        let err = scheduler.run(ShutdownSignal::never()).await.unwrap_err();
        assert!(matches!(err, Error::Internal(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_idle_wait() {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(RecordingStore::default());
        let mut scheduler =
            Scheduler::new("korean", persona(), text_only(&dir), store, config(24.0, 1.0));
        let (tx, signal) = ShutdownSignal::channel();

        let handle = tokio::spawn(async move { scheduler.run(signal).await });
        tokio::time::sleep(Duration::from_secs(30)).await;
        tx.send(true).unwrap();

        let stats = handle.await.unwrap().unwrap();
        assert_eq!(stats.outcome, Outcome::Interrupted);
        assert_eq!(stats.posts_created, 0);
        assert!(stats.elapsed < Duration::from_secs(3600));
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_interrupts_generation() {
        let dir = TempDir::new().unwrap();
        let slow = Arc::new(MockService::with_config(
            Modality::Text,
            MockConfig {
                latency_ms: 600_000,
                staging_dir: dir.path().to_path_buf(),
                ..Default::default()
            },
        ));
        let registry = ServiceRegistry::new(slow);
        let assembler = Arc::new(PostAssembler::new(registry, StylePreset::Professional));
        let store = Arc::new(RecordingStore::default());
        let mut scheduler =
            Scheduler::new("korean", persona(), assembler, store, config(1.0, 0.01));
        let (tx, signal) = ShutdownSignal::channel();

        let handle = tokio::spawn(async move { scheduler.run(signal).await });
        // The first cycle starts on the 40s check and is still generating at 60s.
        tokio::time::sleep(Duration::from_secs(60)).await;
        tx.send(true).unwrap();

        let stats = handle.await.unwrap().unwrap();
        assert_eq!(stats.outcome, Outcome::Interrupted);
        assert_eq!(stats.cycles(), 0);
    }

    #[tokio::test]
    async fn test_never_signal_stays_pending() {
        let mut signal = ShutdownSignal::never();
        assert!(!signal.is_triggered());
        let fired =
            tokio::time::timeout(Duration::from_millis(20), signal.triggered()).await;
        assert!(fired.is_err());
    }
}
