//! Post assembly: idea, text, media and hashtags combined into one [`Post`].

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::Local;
use rand::Rng;
use tracing::{debug, instrument, warn};

use crate::backend::{
    Artifact, ContentParams, Culture, Modality, ServiceRegistry, StyleParams, StylePreset,
};
use crate::error::{Error, Result};
use crate::persona::{ContentIdea, Persona};

use super::hashtags::derive_hashtags;
use super::post::Post;

/// History entries passed along with a text request.
const HISTORY_CONTEXT: usize = 3;

/// Builds posts by calling the configured generation services.
#[derive(Debug, Clone)]
pub struct PostAssembler {
    services: ServiceRegistry,
    style: StylePreset,
}

impl PostAssembler {
    pub fn new(services: ServiceRegistry, style: StylePreset) -> Self {
        Self { services, style }
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    /// Derive a content idea for the current hour and assemble a post from it.
    ///
    /// `history` holds the persona's recent post texts, oldest first.
    pub async fn generate_post<R>(
        &self,
        persona: &Persona,
        rng: &mut R,
        history: &[String],
    ) -> Result<Post>
    where
        R: Rng + Send + ?Sized,
    {
        let idea = persona.content_idea(rng)?;
        let variant = rng.gen();
        self.assemble(persona, idea, history, variant).await
    }

    /// Assemble a post for a given idea.
    ///
    /// Text is generated first; image, audio and video then run concurrently.
    /// Any failing call fails the whole post, and media already staged by the
    /// other calls is removed. `variant` seeds the services' template choices.
    #[instrument(
        skip_all,
        fields(persona = %persona.name, topic = %idea.topic, mood = %idea.mood)
    )]
    pub async fn assemble(
        &self,
        persona: &Persona,
        idea: ContentIdea,
        history: &[String],
        variant: u64,
    ) -> Result<Post> {
        let style = StyleParams {
            preset: self.style,
            mood: Some(idea.mood.clone()),
            traits: persona.personality_traits.clone(),
            culture: Culture::from_region(persona.region()).map(|c| c.key().to_string()),
            variant,
        };

        let recent = &history[history.len().saturating_sub(HISTORY_CONTEXT)..];
        let text_request = ContentParams {
            prompt: idea.topic.clone(),
            topic: Some(idea.topic.clone()),
            history: recent.to_vec(),
        };
        let text = self.generate_text(&text_request, &style).await?;
        debug!(chars = text.len(), "Text generated");

        let media_request = ContentParams {
            prompt: text.clone(),
            topic: Some(idea.topic.clone()),
            history: Vec::new(),
        };
        let (image, audio, video) = tokio::join!(
            self.generate_media(Modality::Image, &media_request, &style),
            self.generate_media(Modality::Audio, &media_request, &style),
            self.generate_media(Modality::Video, &media_request, &style),
        );
        let media = collect_media([
            (Modality::Image, image),
            (Modality::Audio, audio),
            (Modality::Video, video),
        ])
        .await?;

        let created_at = Local::now();
        let hashtags = derive_hashtags(&idea, &persona.location, created_at);
        let post = Post::new(persona.name.clone(), idea, text, media, hashtags, created_at);
        debug!(post_id = %post.id(), media = post.media().count(), "Post assembled");
        Ok(post)
    }

    async fn generate_text(&self, request: &ContentParams, style: &StyleParams) -> Result<String> {
        let service = self.services.text();
        match service.generate(request, style).await? {
            Some(Artifact::Text(text)) if !text.trim().is_empty() => Ok(text),
            Some(Artifact::Text(_)) | None => Err(Error::generation(
                Modality::Text.name(),
                format!("{} produced no text", service.name()),
            )),
            Some(Artifact::File(path)) => Err(Error::generation(
                Modality::Text.name(),
                format!("{} returned a file ({}) instead of text", service.name(), path.display()),
            )),
        }
    }

    async fn generate_media(
        &self,
        modality: Modality,
        request: &ContentParams,
        style: &StyleParams,
    ) -> Result<Option<PathBuf>> {
        let Some(service) = self.services.get(modality) else {
            return Ok(None);
        };
        match service.generate(request, style).await? {
            Some(Artifact::File(path)) => Ok(Some(path)),
            Some(Artifact::Text(_)) => Err(Error::generation(
                modality.name(),
                format!("{} returned text instead of a file", service.name()),
            )),
            None => {
                debug!(%modality, "No artifact");
                Ok(None)
            }
        }
    }
}

/// Gather the media results of one cycle. If any call failed, the files the
/// others staged are deleted and the first error is returned.
async fn collect_media(
    results: [(Modality, Result<Option<PathBuf>>); 3],
) -> Result<BTreeMap<Modality, PathBuf>> {
    let mut media = BTreeMap::new();
    let mut failure = None;
    for (modality, result) in results {
        match result {
            Ok(Some(path)) => {
                media.insert(modality, path);
            }
            Ok(None) => {}
            Err(e) => {
                failure.get_or_insert(e);
            }
        }
    }

    let Some(err) = failure else {
        return Ok(media);
    };
    for (modality, path) in media {
        if let Err(e) = tokio::fs::remove_file(&path).await {
            warn!(%modality, path = %path.display(), error = %e, "Could not remove staged media");
        }
    }
    Err(err)
}
