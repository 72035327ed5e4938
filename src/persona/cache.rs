//! Caller-owned cache of generated personas.

use std::collections::HashMap;

use rand::Rng;
use tracing::debug;

use super::generator::{PersonaGenerator, PersonaRequest};
use super::types::Persona;
use crate::error::Result;

/// Maps generation parameters to the persona first built for them.
///
/// Keys are case-insensitive on region and occupation category.
#[derive(Debug, Default)]
pub struct PersonaCache {
    entries: HashMap<PersonaRequest, Persona>,
}

impl PersonaCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached persona for `request`, generating and storing one on a miss.
    pub fn get_or_generate<R: Rng + ?Sized>(
        &mut self,
        generator: &PersonaGenerator,
        request: &PersonaRequest,
        rng: &mut R,
    ) -> Result<Persona> {
        let key = request.normalized();
        if let Some(persona) = self.entries.get(&key) {
            debug!(request = %request, name = %persona.name, "Persona cache hit");
            return Ok(persona.clone());
        }

        let persona = generator.generate(request, rng)?;
        self.entries.insert(key, persona.clone());
        Ok(persona)
    }

    pub fn get(&self, request: &PersonaRequest) -> Option<&Persona> {
        self.entries.get(&request.normalized())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every cached persona.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
