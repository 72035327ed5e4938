//! Service Registry
//!
//! Builds the configured generation service for each modality and hands out
//! shared references to them.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::{OpenAiSettings, ServiceKind, ServiceSettings};
use crate::error::{Error, Result};

use super::mock::{MockConfig, MockService};
use super::openai::OpenAiTextService;
use super::{Modality, SharedService};

// ─────────────────────────────────────────────────────────────────
// Service Factory
// ─────────────────────────────────────────────────────────────────

/// Factory for creating services
pub struct ServiceFactory;

impl ServiceFactory {
    /// Create the service of the given kind for a modality.
    ///
    /// Returns `None` for [`ServiceKind::Disabled`].
    pub fn create(
        modality: Modality,
        kind: ServiceKind,
        settings: &ServiceSettings,
        openai: &OpenAiSettings,
        staging_dir: &std::path::Path,
    ) -> Result<Option<SharedService>> {
        match kind {
            ServiceKind::Disabled => Ok(None),
            ServiceKind::Mock => {
                let config = MockConfig {
                    latency_ms: settings.mock_latency_ms,
                    staging_dir: staging_dir.to_path_buf(),
                    ..Default::default()
                };
                Ok(Some(Arc::new(MockService::with_config(modality, config))))
            }
            ServiceKind::OpenAi if modality == Modality::Text => {
                Ok(Some(Arc::new(OpenAiTextService::new(openai.clone()))))
            }
            ServiceKind::OpenAi => Err(Error::NotSupported(format!(
                "openai backend cannot generate {}",
                modality
            ))),
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Service Registry
// ─────────────────────────────────────────────────────────────────

/// The four generation services used by the post assembler
#[derive(Clone)]
pub struct ServiceRegistry {
    text: SharedService,
    image: Option<SharedService>,
    audio: Option<SharedService>,
    video: Option<SharedService>,
}

impl ServiceRegistry {
    /// Registry with a text service and no media services
    pub fn new(text: SharedService) -> Self {
        Self {
            text,
            image: None,
            audio: None,
            video: None,
        }
    }

    /// Replace the service for a media modality
    pub fn with_service(mut self, modality: Modality, service: SharedService) -> Self {
        match modality {
            Modality::Text => self.text = service,
            Modality::Image => self.image = Some(service),
            Modality::Audio => self.audio = Some(service),
            Modality::Video => self.video = Some(service),
        }
        self
    }

    /// Build every service named in `[services]`
    pub fn from_settings(
        settings: &ServiceSettings,
        openai: &OpenAiSettings,
        staging_dir: &std::path::Path,
    ) -> Result<Self> {
        let build = |modality: Modality| {
            let kind = settings.kind_for(modality);
            ServiceFactory::create(modality, kind, settings, openai, staging_dir)
        };

        let text = build(Modality::Text)?.ok_or_else(|| {
            Error::config_field_invalid("services.text", "text generation cannot be disabled")
        })?;

        let registry = Self {
            text,
            image: build(Modality::Image)?,
            audio: build(Modality::Audio)?,
            video: build(Modality::Video)?,
        };

        for (modality, service) in registry.services() {
            debug!(%modality, backend = service.name(), "Service registered");
        }
        Ok(registry)
    }

    /// Initialize every configured service
    pub async fn initialize_all(&self) -> Result<()> {
        let start = Instant::now();
        for (modality, service) in self.services() {
            service.initialize().await?;
            debug!(%modality, backend = service.name(), "Service initialized");
        }
        info!(
            services = self.services().len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generation services ready"
        );
        Ok(())
    }

    pub fn text(&self) -> &SharedService {
        &self.text
    }

    /// Service for a modality, if one is configured
    pub fn get(&self, modality: Modality) -> Option<&SharedService> {
        match modality {
            Modality::Text => Some(&self.text),
            Modality::Image => self.image.as_ref(),
            Modality::Audio => self.audio.as_ref(),
            Modality::Video => self.video.as_ref(),
        }
    }

    /// Configured services in modality order
    pub fn services(&self) -> Vec<(Modality, &SharedService)> {
        Modality::all()
            .iter()
            .filter_map(|m| self.get(*m).map(|s| (*m, s)))
            .collect()
    }
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut map = f.debug_map();
        for (modality, service) in self.services() {
            map.entry(&modality.name(), &service.name());
        }
        map.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_factory_disabled() {
        let dir = TempDir::new().unwrap();
        let service = ServiceFactory::create(
            Modality::Image,
            ServiceKind::Disabled,
            &ServiceSettings::default(),
            &OpenAiSettings::default(),
            dir.path(),
        )
        .unwrap();
        assert!(service.is_none());
    }

    #[test]
    fn test_factory_openai_media_not_supported() {
        let dir = TempDir::new().unwrap();
        let result = ServiceFactory::create(
            Modality::Video,
            ServiceKind::OpenAi,
            &ServiceSettings::default(),
            &OpenAiSettings::default(),
            dir.path(),
        );
        assert!(matches!(result, Err(Error::NotSupported(_))));
    }

    #[test]
    fn test_registry_from_settings() {
        let dir = TempDir::new().unwrap();
        let settings = ServiceSettings {
            audio: ServiceKind::Disabled,
            text: ServiceKind::OpenAi,
            ..Default::default()
        };
        let openai = OpenAiSettings::default();
        let registry = ServiceRegistry::from_settings(&settings, &openai, dir.path()).unwrap();

        assert_eq!(registry.text().name(), "openai");
        assert!(registry.get(Modality::Audio).is_none());
        let names: Vec<_> = registry.services().iter().map(|(m, _)| *m).collect();
        assert_eq!(names, vec![Modality::Text, Modality::Image, Modality::Video]);
    }

    #[test]
    fn test_registry_requires_text() {
        let dir = TempDir::new().unwrap();
        let settings = ServiceSettings {
            text: ServiceKind::Disabled,
            ..Default::default()
        };
        let openai = OpenAiSettings::default();
        assert!(ServiceRegistry::from_settings(&settings, &openai, dir.path()).is_err());
    }

    #[tokio::test]
    async fn test_initialize_all_creates_staging() {
        let dir = TempDir::new().unwrap();
        let staging = dir.path().join("staging");
        let settings = ServiceSettings::default();
        let openai = OpenAiSettings::default();
        let registry = ServiceRegistry::from_settings(&settings, &openai, &staging).unwrap();
        registry.initialize_all().await.unwrap();
        assert!(staging.is_dir());
    }
}
