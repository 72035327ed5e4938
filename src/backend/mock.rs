//! Mock generation service
//!
//! Stands in for real model backends. Text mocks shape a short sentence with
//! the mood templates; media mocks write placeholder files into a staging
//! directory the way a real renderer would.

use async_trait::async_trait;
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, trace};

use crate::error::{Error, Result};

use super::style::{enhance_image_prompt, format_with_mood, Culture};
use super::{Artifact, ContentParams, GenerationService, Modality, StyleParams};

// ─────────────────────────────────────────────────────────────────
// Mock Configuration
// ─────────────────────────────────────────────────────────────────

/// Configuration for mock service behavior
#[derive(Debug, Clone)]
pub struct MockConfig {
    /// Simulated latency per call (ms)
    pub latency_ms: u64,

    /// Fail this many calls before succeeding
    pub fail_first: u32,

    /// Fail every call
    pub always_fail: bool,

    /// Report "no artifact" instead of producing one
    pub no_artifact: bool,

    /// Fixed response text (for deterministic testing)
    pub fixed_response: Option<String>,

    /// Directory placeholder media files are written to
    pub staging_dir: PathBuf,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            latency_ms: 0,
            fail_first: 0,
            always_fail: false,
            no_artifact: false,
            fixed_response: None,
            staging_dir: std::env::temp_dir().join("persona-sim-staging"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Mock Service
// ─────────────────────────────────────────────────────────────────

/// Mock implementation of [`GenerationService`] for one modality
pub struct MockService {
    modality: Modality,
    config: MockConfig,
    ready: OnceCell<()>,
    call_counts: RwLock<CallCounts>,
}

/// Track method call counts for verification
#[derive(Debug, Default)]
struct CallCounts {
    initialize: u32,
    generate: u32,
    failed: u32,
}

impl MockService {
    /// Create a mock with default configuration
    pub fn new(modality: Modality) -> Self {
        Self::with_config(modality, MockConfig::default())
    }

    pub fn with_config(modality: Modality, config: MockConfig) -> Self {
        Self {
            modality,
            config,
            ready: OnceCell::new(),
            call_counts: RwLock::new(CallCounts::default()),
        }
    }

    /// Get the number of times a method was called
    pub fn call_count(&self, method: &str) -> u32 {
        let counts = self.call_counts.read();
        match method {
            "initialize" => counts.initialize,
            "generate" => counts.generate,
            "failed" => counts.failed,
            _ => 0,
        }
    }

    /// Reset all call counts
    pub fn reset_counts(&self) {
        *self.call_counts.write() = CallCounts::default();
    }

    async fn simulate_latency(&self) {
        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }
    }

    fn should_fail(&self, attempt: u32) -> bool {
        self.config.always_fail || attempt <= self.config.fail_first
    }

    fn check_request(
        &self,
        content: &ContentParams,
        style: &StyleParams,
    ) -> Result<Option<Culture>> {
        if content.prompt.trim().is_empty() {
            return Err(Error::validation("prompt", "cannot be empty"));
        }
        style.preset.check(self.modality)?;
        style.culture.as_deref().map(str::parse::<Culture>).transpose()
    }

    fn compose_text(&self, content: &ContentParams, style: &StyleParams) -> String {
        if let Some(ref fixed) = self.config.fixed_response {
            return fixed.clone();
        }

        let subject = content.topic.as_deref().unwrap_or(content.prompt.as_str());
        let mut text = format!("Sharing a few thoughts on {}.", subject.trim());
        if let Some(first) = style.traits.first() {
            text.push_str(&format!(" Staying {} about it.", first.to_lowercase()));
        }
        if !content.history.is_empty() {
            text.push_str(" Picking up from my last post.");
        }
        let mut rng = StdRng::seed_from_u64(style.variant);
        format_with_mood(&text, style.mood.as_deref().unwrap_or_default(), &mut rng)
    }

    /// Body of the placeholder file for a media modality
    fn placeholder(
        &self,
        content: &ContentParams,
        style: &StyleParams,
        culture: Option<Culture>,
    ) -> String {
        match self.modality {
            Modality::Image => enhance_image_prompt(&content.prompt, style.preset, culture),
            Modality::Audio => match style.preset.voice() {
                Some(voice) => format!(
                    "speed={} pitch={}\n{}",
                    voice.speed, voice.pitch, content.prompt
                ),
                None => content.prompt.clone(),
            },
            Modality::Video => match style.preset.video() {
                Some(v) => format!(
                    "frames={} size={}x{}\n{}",
                    v.num_frames, v.width, v.height, content.prompt
                ),
                None => content.prompt.clone(),
            },
            Modality::Text => content.prompt.clone(),
        }
    }

    async fn write_placeholder(&self, body: String) -> Result<PathBuf> {
        let path = self.config.staging_dir.join(format!(
            "{}_{}.{}",
            self.modality,
            uuid::Uuid::new_v4().simple(),
            self.modality.extension()
        ));
        tokio::fs::write(&path, body).await.map_err(|e| {
            Error::generation(
                self.modality.name(),
                format!("could not write {}: {}", path.display(), e),
            )
        })?;
        Ok(path)
    }
}

#[async_trait]
impl GenerationService for MockService {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn modality(&self) -> Modality {
        self.modality
    }

    async fn initialize(&self) -> Result<()> {
        self.ready
            .get_or_try_init(|| async {
                self.call_counts.write().initialize += 1;
                if self.modality != Modality::Text {
                    tokio::fs::create_dir_all(&self.config.staging_dir)
                        .await
                        .map_err(|e| {
                            Error::generation(
                                self.modality.name(),
                                format!(
                                    "could not create staging dir {}: {}",
                                    self.config.staging_dir.display(),
                                    e
                                ),
                            )
                        })?;
                }
                debug!(modality = %self.modality, "Mock service ready");
                Ok::<(), Error>(())
            })
            .await?;
        Ok(())
    }

    async fn generate(
        &self,
        content: &ContentParams,
        style: &StyleParams,
    ) -> Result<Option<Artifact>> {
        let attempt = {
            let mut counts = self.call_counts.write();
            counts.generate += 1;
            counts.generate
        };

        let culture = self
            .check_request(content, style)
            .map_err(|e| e.rejected_by(self.modality.name()))?;
        self.initialize().await?;
        self.simulate_latency().await;

        if self.should_fail(attempt) {
            self.call_counts.write().failed += 1;
            return Err(Error::generation(self.modality.name(), "mock failure"));
        }
        if self.config.no_artifact {
            trace!(modality = %self.modality, "Mock reporting no artifact");
            return Ok(None);
        }

        let artifact = match self.modality {
            Modality::Text => Artifact::Text(self.compose_text(content, style)),
            _ => {
                let body = self.placeholder(content, style, culture);
                Artifact::File(self.write_placeholder(body).await?)
            }
        };
        Ok(Some(artifact))
    }
}
