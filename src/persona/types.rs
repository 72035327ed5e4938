//! Core types for the persona model.
//!
//! A persona's static attributes are fixed at creation; everything that varies
//! with the clock (activity, mood, next idea) is derived in [`super::state`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Activity label reported when no routine entry has started yet.
pub const FREE_TIME: &str = "free time";

// ─────────────────────────────────────────────────────────────────
// Persona
// ─────────────────────────────────────────────────────────────────

/// A simulated identity. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub age: u8,
    /// "City, Region"
    pub location: String,
    pub occupation: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub personality_traits: Vec<String>,
    #[serde(default)]
    pub daily_routine: DailyRoutine,
    pub content_preferences: ContentPreferences,
}

impl Persona {
    /// City part of the location ("Mumbai" for "Mumbai, India").
    pub fn city(&self) -> &str {
        self.location.split(',').next().unwrap_or("").trim()
    }

    /// Region part of the location ("India" for "Mumbai, India").
    pub fn region(&self) -> &str {
        self.location.rsplit(',').next().unwrap_or("").trim()
    }

    /// Traits from the fixed table this persona carries, in declared order.
    pub fn known_traits(&self) -> Vec<PersonalityTrait> {
        self.personality_traits
            .iter()
            .filter_map(|t| t.parse().ok())
            .collect()
    }

    pub fn has_trait(&self, personality_trait: PersonalityTrait) -> bool {
        self.personality_traits
            .iter()
            .any(|t| t.parse::<PersonalityTrait>().ok() == Some(personality_trait))
    }

    /// Check the persona can drive a simulation. `id` names it in the error.
    pub fn validate(&self, id: &str) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::persona_invalid(id, "name cannot be empty"));
        }
        if self.content_preferences.topics.is_empty() {
            return Err(Error::persona_invalid(id, "at least one content topic is required"));
        }
        if self.content_preferences.formats.is_empty() {
            return Err(Error::persona_invalid(id, "at least one content format is required"));
        }
        if self.region().is_empty() {
            return Err(Error::persona_invalid(
                id,
                format!("location '{}' has no region", self.location),
            ));
        }
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────
// Routine
// ─────────────────────────────────────────────────────────────────

/// Morning and evening schedules, each a list of "time: activity" entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyRoutine {
    #[serde(default)]
    pub morning: Vec<String>,
    #[serde(default)]
    pub evening: Vec<String>,
}

impl DailyRoutine {
    /// Parsed entries, morning first, malformed ones dropped.
    pub fn entries(&self) -> impl Iterator<Item = RoutineEntry<'_>> {
        self.morning
            .iter()
            .chain(self.evening.iter())
            .filter_map(|raw| RoutineEntry::parse(raw))
    }
}

/// One parsed routine line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutineEntry<'a> {
    pub hour: u32,
    pub activity: &'a str,
}

impl<'a> RoutineEntry<'a> {
    /// Parse "6:00: yoga", "18:30: hobby" or "6:00 PM: Evening walk".
    ///
    /// Returns `None` when the ": " separator is missing or the hour is not in 0..24.
    pub fn parse(raw: &'a str) -> Option<Self> {
        let (time, activity) = raw.split_once(": ")?;
        let hour = parse_hour(time)?;
        Some(Self {
            hour,
            activity: activity.trim(),
        })
    }
}

fn parse_hour(time: &str) -> Option<u32> {
    let time = time.trim();
    let upper = time.to_ascii_uppercase();
    let (clock, meridiem) = if let Some(rest) = upper.strip_suffix("AM") {
        (rest.trim_end(), Some(false))
    } else if let Some(rest) = upper.strip_suffix("PM") {
        (rest.trim_end(), Some(true))
    } else {
        (upper.as_str(), None)
    };

    let hour: u32 = clock.split(':').next()?.trim().parse().ok()?;
    let hour = match meridiem {
        None => hour,
        Some(_) if hour == 0 || hour > 12 => return None,
        Some(false) => hour % 12,
        Some(true) => hour % 12 + 12,
    };
    (hour < 24).then_some(hour)
}

// ─────────────────────────────────────────────────────────────────
// Content Preferences & Ideas
// ─────────────────────────────────────────────────────────────────

/// Candidate topics and formats, in preference order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentPreferences {
    pub topics: Vec<String>,
    pub formats: Vec<String>,
}

/// What the next post is about. Derived fresh for every post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentIdea {
    pub topic: String,
    pub format: String,
    pub mood: String,
    /// Current activity label
    pub context: String,
}

impl fmt::Display for ContentIdea {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "topic: {}, format: {}, mood: {}, context: {}",
            self.topic, self.format, self.mood, self.context
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Personality Traits
// ─────────────────────────────────────────────────────────────────

/// Trait tags that mood and persona tables know about.
///
/// Persona trait lists are free text; tags outside this set are kept but play
/// no part in mood selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PersonalityTrait {
    Creative,
    Analytical,
    Ambitious,
    Empathetic,
    DetailOriented,
    Innovative,
    Social,
    Introspective,
    Professional,
    Energetic,
    Logical,
    Curious,
    ProblemSolver,
    Expressive,
    Imaginative,
    FreeSpirited,
    Organized,
    Strategic,
    LeadershipOriented,
}

impl PersonalityTrait {
    /// Display label as it appears in persona data.
    pub fn label(&self) -> &'static str {
        match self {
            PersonalityTrait::Creative => "Creative",
            PersonalityTrait::Analytical => "Analytical",
            PersonalityTrait::Ambitious => "Ambitious",
            PersonalityTrait::Empathetic => "Empathetic",
            PersonalityTrait::DetailOriented => "Detail-oriented",
            PersonalityTrait::Innovative => "Innovative",
            PersonalityTrait::Social => "Social",
            PersonalityTrait::Introspective => "Introspective",
            PersonalityTrait::Professional => "Professional",
            PersonalityTrait::Energetic => "Energetic",
            PersonalityTrait::Logical => "Logical",
            PersonalityTrait::Curious => "Curious",
            PersonalityTrait::ProblemSolver => "Problem-solver",
            PersonalityTrait::Expressive => "Expressive",
            PersonalityTrait::Imaginative => "Imaginative",
            PersonalityTrait::FreeSpirited => "Free-spirited",
            PersonalityTrait::Organized => "Organized",
            PersonalityTrait::Strategic => "Strategic",
            PersonalityTrait::LeadershipOriented => "Leadership-oriented",
        }
    }

    /// Traits every generated persona may draw from.
    pub fn base() -> &'static [PersonalityTrait] {
        &[
            PersonalityTrait::Creative,
            PersonalityTrait::Analytical,
            PersonalityTrait::Ambitious,
            PersonalityTrait::Empathetic,
            PersonalityTrait::DetailOriented,
            PersonalityTrait::Innovative,
            PersonalityTrait::Social,
            PersonalityTrait::Introspective,
        ]
    }

    /// Shift applied to the base energy level.
    pub fn energy_offset(&self) -> f64 {
        match self {
            PersonalityTrait::Energetic => 0.1,
            PersonalityTrait::Introspective => -0.1,
            _ => 0.0,
        }
    }

    fn all() -> &'static [PersonalityTrait] {
        &[
            PersonalityTrait::Creative,
            PersonalityTrait::Analytical,
            PersonalityTrait::Ambitious,
            PersonalityTrait::Empathetic,
            PersonalityTrait::DetailOriented,
            PersonalityTrait::Innovative,
            PersonalityTrait::Social,
            PersonalityTrait::Introspective,
            PersonalityTrait::Professional,
            PersonalityTrait::Energetic,
            PersonalityTrait::Logical,
            PersonalityTrait::Curious,
            PersonalityTrait::ProblemSolver,
            PersonalityTrait::Expressive,
            PersonalityTrait::Imaginative,
            PersonalityTrait::FreeSpirited,
            PersonalityTrait::Organized,
            PersonalityTrait::Strategic,
            PersonalityTrait::LeadershipOriented,
        ]
    }
}

impl fmt::Display for PersonalityTrait {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for PersonalityTrait {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let wanted = normalize(s);
        PersonalityTrait::all()
            .iter()
            .copied()
            .find(|t| normalize(t.label()) == wanted)
            .ok_or_else(|| format!("unknown personality trait '{}'", s))
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

// ─────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────
