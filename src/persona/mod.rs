//! Persona model: static profile, clock-driven state and generation.
//!
//! A [`Persona`] is built once (from config or the [`PersonaGenerator`]) and
//! then only read. Activity, mood and content ideas are derived on demand
//! from the hour of day and a caller-supplied RNG.

pub mod cache;
pub mod generator;
pub mod mood;
pub mod selection;
pub mod state;
pub mod types;

pub use cache::PersonaCache;
pub use generator::{PersonaGenerator, PersonaRequest, RegionCatalog};
pub use mood::{DayPhase, EnergyBucket};
pub use selection::{pick_weighted, WeightedPick};
pub use state::current_hour;
pub use types::{
    ContentIdea, ContentPreferences, DailyRoutine, Persona, PersonalityTrait, RoutineEntry,
    FREE_TIME,
};
