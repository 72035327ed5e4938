//! Assembled post and its serialized record.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::backend::{Artifact, Modality};
use crate::persona::ContentIdea;

/// Content type tag carried by every post.
pub const CONTENT_TYPE: &str = "multimodal";

// ─────────────────────────────────────────────────────────────────
// Post
// ─────────────────────────────────────────────────────────────────

/// One generated post. Immutable once assembled.
///
/// Text is always present inline. Image, audio and video are file references
/// that may be absent.
#[derive(Debug, Clone, PartialEq)]
pub struct Post {
    id: Uuid,
    author: String,
    created_at: DateTime<Local>,
    idea: ContentIdea,
    artifacts: BTreeMap<Modality, Artifact>,
    hashtags: BTreeSet<String>,
}

impl Post {
    pub fn new(
        author: impl Into<String>,
        idea: ContentIdea,
        text: String,
        media: BTreeMap<Modality, PathBuf>,
        hashtags: BTreeSet<String>,
        created_at: DateTime<Local>,
    ) -> Self {
        let mut artifacts: BTreeMap<Modality, Artifact> = media
            .into_iter()
            .filter(|(modality, _)| *modality != Modality::Text)
            .map(|(modality, path)| (modality, Artifact::File(path)))
            .collect();
        artifacts.insert(Modality::Text, Artifact::Text(text));

        Self {
            id: Uuid::new_v4(),
            author: author.into(),
            created_at,
            idea,
            artifacts,
            hashtags,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// First eight hex digits of the id
    pub fn short_id(&self) -> String {
        self.id.simple().to_string()[..8].to_string()
    }

    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub fn content_type(&self) -> &'static str {
        CONTENT_TYPE
    }

    pub fn text(&self) -> &str {
        self.artifacts
            .get(&Modality::Text)
            .and_then(Artifact::as_text)
            .unwrap_or_default()
    }

    pub fn mood(&self) -> &str {
        &self.idea.mood
    }

    /// Rendered content idea
    pub fn context(&self) -> String {
        self.idea.to_string()
    }

    pub fn idea(&self) -> &ContentIdea {
        &self.idea
    }

    pub fn artifact(&self, modality: Modality) -> Option<&Artifact> {
        self.artifacts.get(&modality)
    }

    /// Media files attached to this post, in modality order
    pub fn media(&self) -> impl Iterator<Item = (Modality, &Path)> {
        self.artifacts
            .iter()
            .filter_map(|(modality, artifact)| artifact.as_path().map(|p| (*modality, p)))
    }

    pub fn hashtags(&self) -> &BTreeSet<String> {
        &self.hashtags
    }

    /// Serialized form, with media paths replaced by their final locations.
    pub fn to_record(&self, stored_media: &BTreeMap<Modality, PathBuf>) -> PostRecord {
        let path_of = |modality: Modality| {
            stored_media
                .get(&modality)
                .map(|p| p.to_string_lossy().into_owned())
        };

        PostRecord {
            id: self.id.to_string(),
            author: self.author.clone(),
            timestamp: self.created_at.to_rfc3339(),
            content_type: CONTENT_TYPE.to_string(),
            content: self.text().to_string(),
            mood: self.idea.mood.clone(),
            hashtags: self.hashtags.iter().cloned().collect(),
            metadata: PostMetadata {
                image_path: path_of(Modality::Image),
                audio_path: path_of(Modality::Audio),
                video_path: path_of(Modality::Video),
                generation_context: self.context(),
                topic: self.idea.topic.clone(),
                format: self.idea.format.clone(),
                activity: self.idea.context.clone(),
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Record
// ─────────────────────────────────────────────────────────────────

/// Post as written to `posts/*.json`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub author: String,
    /// ISO-8601 creation time
    pub timestamp: String,
    pub content_type: String,
    pub content: String,
    pub mood: String,
    pub hashtags: Vec<String>,
    pub metadata: PostMetadata,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMetadata {
    pub image_path: Option<String>,
    pub audio_path: Option<String>,
    pub video_path: Option<String>,
    pub generation_context: String,
    pub topic: String,
    pub format: String,
    pub activity: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn idea() -> ContentIdea {
        ContentIdea {
            topic: "yoga tips".into(),
            format: "Quick tips".into(),
            mood: "calm".into(),
            context: "yoga".into(),
        }
    }

    #[test]
    fn test_text_always_present() {
        let mut media = BTreeMap::new();
        media.insert(Modality::Image, PathBuf::from("/tmp/a.png"));
        let now = Local::now();
        let post = Post::new("Diya", idea(), "Namaste".into(), media, BTreeSet::new(), now);

        assert_eq!(post.text(), "Namaste");
        assert_eq!(post.content_type(), "multimodal");
        assert!(post.artifact(Modality::Audio).is_none());
        assert_eq!(post.media().count(), 1);
        assert_eq!(post.short_id().len(), 8);
    }

    #[test]
    fn test_text_path_ignored_in_media() {
        let mut media = BTreeMap::new();
        media.insert(Modality::Text, PathBuf::from("/tmp/t.txt"));
        let post = Post::new("Diya", idea(), "hi".into(), media, BTreeSet::new(), Local::now());
        assert_eq!(post.text(), "hi");
        assert_eq!(post.media().count(), 0);
    }

    #[test]
    fn test_record_fields() {
        let mut tags = BTreeSet::new();
        tags.insert("#PuneLife".to_string());
        let post = Post::new("Diya", idea(), "Namaste".into(), BTreeMap::new(), tags, Local::now());

        let mut stored = BTreeMap::new();
        stored.insert(Modality::Video, PathBuf::from("out/media/x_video.mp4"));
        let record = post.to_record(&stored);

        assert_eq!(record.author, "Diya");
        assert_eq!(record.content, "Namaste");
        assert_eq!(record.hashtags, vec!["#PuneLife".to_string()]);
        assert_eq!(record.metadata.video_path.as_deref(), Some("out/media/x_video.mp4"));
        assert!(record.metadata.image_path.is_none());
        assert_eq!(
            record.metadata.generation_context,
            "topic: yoga tips, format: Quick tips, mood: calm, context: yoga"
        );
        assert!(DateTime::parse_from_rfc3339(&record.timestamp).is_ok());
    }
}
