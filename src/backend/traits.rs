//! Generation service trait definitions
//!
//! Every modality (text, image, audio, video) is served through the same
//! object-safe [`GenerationService`] trait so the assembler can hold them as
//! `Arc<dyn GenerationService>` and call them concurrently.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::style::StylePreset;
use crate::error::Result;

// ─────────────────────────────────────────────────────────────────
// Modality
// ─────────────────────────────────────────────────────────────────

/// Kind of artifact a service produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modality {
    Text,
    Image,
    Audio,
    Video,
}

impl Modality {
    pub fn name(&self) -> &'static str {
        match self {
            Modality::Text => "text",
            Modality::Image => "image",
            Modality::Audio => "audio",
            Modality::Video => "video",
        }
    }

    /// File extension used for stored artifacts.
    pub fn extension(&self) -> &'static str {
        match self {
            Modality::Text => "txt",
            Modality::Image => "png",
            Modality::Audio => "wav",
            Modality::Video => "mp4",
        }
    }

    pub fn all() -> &'static [Modality] {
        &[Modality::Text, Modality::Image, Modality::Audio, Modality::Video]
    }

    /// Modalities produced as files rather than inline.
    pub fn media() -> &'static [Modality] {
        &[Modality::Image, Modality::Audio, Modality::Video]
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" => Ok(Modality::Text),
            "image" => Ok(Modality::Image),
            "audio" => Ok(Modality::Audio),
            "video" => Ok(Modality::Video),
            _ => Err(format!("Unknown modality: {}", s)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Requests & Artifacts
// ─────────────────────────────────────────────────────────────────

/// What to generate.
#[derive(Debug, Clone, Default)]
pub struct ContentParams {
    /// Topic for text, generated text for media
    pub prompt: String,

    /// Content idea topic, when known
    pub topic: Option<String>,

    /// Recent texts by the same persona, oldest first
    pub history: Vec<String>,
}

/// How to generate it.
#[derive(Debug, Clone, Default)]
pub struct StyleParams {
    pub preset: StylePreset,
    pub mood: Option<String>,
    pub traits: Vec<String>,
    /// Culture key derived from the persona's region
    pub culture: Option<String>,
    /// Seed for any template choice the service makes
    pub variant: u64,
}

/// Output of a generation call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum Artifact {
    /// Inline text
    Text(String),
    /// File written by the service
    File(PathBuf),
}

impl Artifact {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Artifact::Text(text) => Some(text),
            Artifact::File(_) => None,
        }
    }

    pub fn as_path(&self) -> Option<&std::path::Path> {
        match self {
            Artifact::File(path) => Some(path),
            Artifact::Text(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// GenerationService Trait
// ─────────────────────────────────────────────────────────────────

/// A backend producing one modality's artifact.
///
/// Implementations must be safe to call repeatedly with the same parameters;
/// the scheduler retries a failed post on its next cycle.
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Backend name for logs (e.g. "mock", "openai")
    fn name(&self) -> &'static str;

    /// Modality this service produces
    fn modality(&self) -> Modality;

    /// Acquire model handles/clients. Called once before the first
    /// `generate`; repeated calls are no-ops.
    async fn initialize(&self) -> Result<()> {
        Ok(())
    }

    /// Produce an artifact, or `None` when this service has nothing to offer.
    async fn generate(
        &self,
        content: &ContentParams,
        style: &StyleParams,
    ) -> Result<Option<Artifact>>;
}

/// Type alias for a shared service reference
pub type SharedService = Arc<dyn GenerationService>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_modality_roundtrip() {
        for m in Modality::all() {
            assert_eq!(m.name().parse::<Modality>(), Ok(*m));
        }
        assert!("smell".parse::<Modality>().is_err());
    }

    #[test]
    fn test_media_excludes_text() {
        assert!(!Modality::media().contains(&Modality::Text));
        assert_eq!(Modality::media().len(), 3);
    }

    #[test]
    fn test_artifact_accessors() {
        let text = Artifact::Text("hello".into());
        assert_eq!(text.as_text(), Some("hello"));
        assert!(text.as_path().is_none());

        let file = Artifact::File(PathBuf::from("/tmp/a.png"));
        assert!(file.as_text().is_none());
        assert_eq!(file.as_path().unwrap().to_str(), Some("/tmp/a.png"));
    }
}
