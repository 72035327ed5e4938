//! Simulation wiring
//!
//! Turns a [`SimConfig`] into personas, generation services and one
//! scheduler per persona, then runs them one after another or side by side.

use std::path::Path;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{info, warn};

use crate::backend::ServiceRegistry;
use crate::config::SimConfig;
use crate::content::PostAssembler;
use crate::error::{Error, Result};
use crate::persona::{Persona, PersonaCache, PersonaGenerator, PersonaRequest, RegionCatalog};
use crate::scheduler::{Scheduler, ShutdownSignal, SimulationStats};
use crate::storage::{FileStore, PostStore};

/// A persona together with the id its output is filed under
#[derive(Debug, Clone)]
pub struct SimulatedPersona {
    pub id: String,
    pub persona: Persona,
}

/// Build every configured persona.
///
/// Explicit profiles are validated and used as-is; the rest are generated
/// through `cache`, so identical requests share one persona.
pub fn build_personas(
    config: &SimConfig,
    cache: &mut PersonaCache,
    rng: &mut StdRng,
) -> Result<Vec<SimulatedPersona>> {
    let catalog = match config.catalog.data_path {
        Some(ref path) => RegionCatalog::from_file(Path::new(path))?,
        None => RegionCatalog::builtin(),
    };
    let generator = PersonaGenerator::new(catalog);

    config
        .personas
        .iter()
        .map(|spec| {
            let persona = match spec.profile {
                Some(ref profile) => {
                    profile.validate(&spec.id)?;
                    profile.clone()
                }
                None => {
                    let request = PersonaRequest::new(
                        &spec.region,
                        (spec.age_range[0], spec.age_range[1]),
                        &spec.occupation_category,
                    );
                    cache.get_or_generate(&generator, &request, rng)?
                }
            };
            info!(
                persona = %spec.id,
                name = %persona.name,
                location = %persona.location,
                "Persona ready"
            );
            Ok(SimulatedPersona {
                id: spec.id.clone(),
                persona,
            })
        })
        .collect()
}

// ─────────────────────────────────────────────────────────────────
// Simulation
// ─────────────────────────────────────────────────────────────────

/// Everything needed to run the configured personas
pub struct Simulation {
    config: SimConfig,
    assembler: Arc<PostAssembler>,
    personas: Vec<SimulatedPersona>,
}

impl Simulation {
    /// Build services from `[services]` and personas from `[[personas]]`
    pub fn from_config(config: SimConfig) -> Result<Self> {
        let staging = config.staging_dir();
        let services = ServiceRegistry::from_settings(&config.services, &config.openai, &staging)?;
        Self::with_services(config, services)
    }

    /// Build personas from the config but use the given services
    pub fn with_services(config: SimConfig, services: ServiceRegistry) -> Result<Self> {
        let mut rng = match config.simulation.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut cache = PersonaCache::new();
        let personas = build_personas(&config, &mut cache, &mut rng)?;
        let assembler = Arc::new(PostAssembler::new(services, config.services.style));

        Ok(Self {
            config,
            assembler,
            personas,
        })
    }

    pub fn personas(&self) -> &[SimulatedPersona] {
        &self.personas
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    /// Initialize every generation service once
    pub async fn initialize(&self) -> Result<()> {
        self.assembler.services().initialize_all().await
    }

    fn scheduler_for(&self, index: usize, entry: &SimulatedPersona) -> Result<Scheduler> {
        let settings = &self.config.simulation;
        let store: Arc<dyn PostStore> =
            Arc::new(FileStore::for_persona(&self.config.output_dir(), &entry.id));
        let mut scheduler = Scheduler::new(
            entry.id.clone(),
            entry.persona.clone(),
            self.assembler.clone(),
            store,
            settings.scheduler_config()?,
        )
        .with_history_size(settings.history_size);
        if let Some(seed) = settings.seed {
            scheduler = scheduler.with_seed(seed.wrapping_add(index as u64 + 1));
        }
        Ok(scheduler)
    }

    /// Run every persona to completion or until `shutdown` fires.
    pub async fn run(&self, shutdown: ShutdownSignal) -> Result<Vec<SimulationStats>> {
        let parallel = self.config.simulation.parallel && self.personas.len() > 1;
        info!(personas = self.personas.len(), parallel, "Simulation starting");

        let mut schedulers = self
            .personas
            .iter()
            .enumerate()
            .map(|(i, entry)| self.scheduler_for(i, entry))
            .collect::<Result<Vec<_>>>()?;

        if !parallel {
            let mut all = Vec::with_capacity(schedulers.len());
            for scheduler in schedulers.iter_mut() {
                if shutdown.is_triggered() {
                    warn!(persona = %scheduler.persona_id(), "Skipping persona after shutdown");
                    continue;
                }
                all.push(scheduler.run(shutdown.clone()).await?);
            }
            return Ok(all);
        }

        let handles: Vec<_> = schedulers
            .into_iter()
            .map(|mut scheduler| {
                let signal = shutdown.clone();
                tokio::spawn(async move { scheduler.run(signal).await })
            })
            .collect();

        let mut all = Vec::with_capacity(handles.len());
        for handle in handles {
            let stats = handle
                .await
                .map_err(|e| Error::Internal(format!("scheduler task failed: {}", e)))??;
            all.push(stats);
        }
        Ok(all)
    }
}
