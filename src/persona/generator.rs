//! Persona generation from regional and occupational data.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::types::{ContentPreferences, DailyRoutine, Persona, PersonalityTrait};
use crate::error::{Error, Result};

const INTERESTS_FROM_REGION: usize = 3;
const INTERESTS_FROM_OCCUPATION: usize = 2;
const TRAIT_COUNT: usize = 4;
const MAX_TOPICS: usize = 4;
const MAX_FORMATS: usize = 4;

// ─────────────────────────────────────────────────────────────────
// Catalog
// ─────────────────────────────────────────────────────────────────

/// Data for one supported region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionData {
    pub locations: Vec<String>,
    pub names: Vec<String>,
    pub interests: Vec<String>,
    /// Routine templates; `{occupation}` is replaced with the persona's occupation
    pub morning_routine: Vec<String>,
    pub evening_routine: Vec<String>,
}

/// Occupations and traits shared by a category (tech, creative, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OccupationCategory {
    pub occupations: Vec<String>,
    pub traits: Vec<String>,
}

/// Everything the generator draws from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionCatalog {
    pub regions: BTreeMap<String, RegionData>,
    pub categories: BTreeMap<String, OccupationCategory>,
    /// Extra interests keyed by occupation
    #[serde(default)]
    pub occupation_interests: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub default_occupation_interests: Vec<String>,
    /// Topics keyed by occupation; others get "<occupation> insights"
    #[serde(default)]
    pub occupation_topics: BTreeMap<String, Vec<String>>,
    pub formats: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl RegionCatalog {
    /// Built-in data for India and South Korea.
    pub fn builtin() -> Self {
        let mut regions = BTreeMap::new();
        regions.insert(
            "India".to_string(),
            RegionData {
                locations: strings(&["Mumbai", "Bangalore", "Delhi", "Pune", "Chennai"]),
                names: strings(&[
                    "Aanya Sharma", "Arjun Patel", "Diya Reddy", "Advait Kumar",
                    "Zara Menon", "Vihaan Singh", "Ishaan Kapoor", "Anaya Gupta",
                ]),
                interests: strings(&[
                    "Classical dance", "Cricket", "Bollywood movies", "Street food",
                    "Yoga", "Tech startups", "Classical music", "Photography",
                ]),
                morning_routine: strings(&[
                    "6:00 AM: Yoga/Meditation",
                    "7:30 AM: Breakfast with family",
                    "9:00 AM: Start {occupation} work",
                ]),
                evening_routine: strings(&[
                    "6:00 PM: Evening activities/hobby",
                    "8:00 PM: Family dinner",
                    "10:00 PM: Content creation/relaxation",
                ]),
            },
        );
        regions.insert(
            "South Korea".to_string(),
            RegionData {
                locations: strings(&["Seoul", "Busan", "Incheon", "Daegu", "Daejeon"]),
                names: strings(&[
                    "Min-ji Kim", "Jun-ho Park", "Seo-yeon Lee", "Ji-woo Choi",
                    "Hae-won Jung", "Tae-hyung Kang", "Yoo-jin Hwang", "Soo-min Yang",
                ]),
                interests: strings(&[
                    "K-pop", "Gaming", "Cafe culture", "Street fashion",
                    "Food vlogs", "Urban photography", "Electronic music", "Webtoons",
                ]),
                morning_routine: strings(&[
                    "7:00 AM: Morning exercise",
                    "8:30 AM: Breakfast at local cafe",
                    "9:30 AM: Start {occupation} work",
                ]),
                evening_routine: strings(&[
                    "6:30 PM: After-work hobby activities",
                    "8:30 PM: Personal projects",
                    "11:00 PM: Late night content creation",
                ]),
            },
        );

        let mut categories = BTreeMap::new();
        categories.insert(
            "tech".to_string(),
            OccupationCategory {
                occupations: strings(&[
                    "Software Developer", "UX Designer", "Data Scientist", "Game Developer",
                ]),
                traits: strings(&["Logical", "Curious", "Problem-solver"]),
            },
        );
        categories.insert(
            "creative".to_string(),
            OccupationCategory {
                occupations: strings(&[
                    "Content Creator", "Digital Artist", "Music Producer", "Food Blogger",
                ]),
                traits: strings(&["Expressive", "Imaginative", "Free-spirited"]),
            },
        );
        categories.insert(
            "professional".to_string(),
            OccupationCategory {
                occupations: strings(&[
                    "Marketing Specialist",
                    "Startup Founder",
                    "Product Manager",
                ]),
                traits: strings(&["Organized", "Strategic", "Leadership-oriented"]),
            },
        );

        let mut occupation_interests = BTreeMap::new();
        occupation_interests.insert(
            "Software Developer".to_string(),
            strings(&["Open source projects", "AI/ML", "Hackathons", "Tech meetups"]),
        );
        occupation_interests.insert(
            "Content Creator".to_string(),
            strings(&["Video editing", "Social media trends", "Digital marketing", "Storytelling"]),
        );
        occupation_interests.insert(
            "Game Developer".to_string(),
            strings(&["Game design", "Pixel art", "Game jams", "Gaming communities"]),
        );

        let mut occupation_topics = BTreeMap::new();
        occupation_topics.insert(
            "Software Developer".to_string(),
            strings(&["Technology tutorials", "Coding tips"]),
        );
        occupation_topics.insert(
            "Content Creator".to_string(),
            strings(&["Content strategy", "Creative process"]),
        );
        occupation_topics.insert(
            "Game Developer".to_string(),
            strings(&["Game development", "Gaming industry insights"]),
        );

        Self {
            regions,
            categories,
            occupation_interests,
            default_occupation_interests: strings(&["Professional networking", "Industry events"]),
            occupation_topics,
            formats: strings(&[
                "Tutorial videos", "Day-in-life vlogs", "Behind-the-scenes",
                "Quick tips", "Story time", "Project showcases",
            ]),
        }
    }

    /// Load a catalog from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| Error::IoRead {
            path: path.to_path_buf(),
            source: e,
        })?;
        let catalog: RegionCatalog = serde_json::from_str(&content).map_err(|e| {
            Error::config_field_invalid(
                "catalog.data_path",
                format!("{}: {}", path.display(), e),
            )
        })?;
        info!(
            path = %path.display(),
            regions = catalog.regions.len(),
            "Region catalog loaded"
        );
        Ok(catalog)
    }

    /// Region entry and its canonical name, matched case-insensitively.
    pub fn region(&self, name: &str) -> Option<(&str, &RegionData)> {
        let wanted = name.trim();
        self.regions
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
            .map(|(key, data)| (key.as_str(), data))
    }

    pub fn category(&self, name: &str) -> Option<&OccupationCategory> {
        let wanted = name.trim();
        self.categories
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(wanted))
            .map(|(_, data)| data)
    }
}

// ─────────────────────────────────────────────────────────────────
// Requests
// ─────────────────────────────────────────────────────────────────

/// Parameters a persona is generated from. Also the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PersonaRequest {
    pub region: String,
    pub age_range: (u8, u8),
    pub occupation_category: String,
}

impl PersonaRequest {
    pub fn new(
        region: impl Into<String>,
        age_range: (u8, u8),
        occupation_category: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            age_range,
            occupation_category: occupation_category.into(),
        }
    }

    /// Case-folded copy so "india" and "India" share a cache slot.
    pub(crate) fn normalized(&self) -> Self {
        Self {
            region: self.region.trim().to_lowercase(),
            age_range: self.age_range,
            occupation_category: self.occupation_category.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for PersonaRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}-{} {}",
            self.region, self.age_range.0, self.age_range.1, self.occupation_category
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Generator
// ─────────────────────────────────────────────────────────────────

/// Builds personas from a [`RegionCatalog`].
#[derive(Debug, Clone)]
pub struct PersonaGenerator {
    catalog: RegionCatalog,
}

impl Default for PersonaGenerator {
    fn default() -> Self {
        Self::new(RegionCatalog::builtin())
    }
}

impl PersonaGenerator {
    pub fn new(catalog: RegionCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &RegionCatalog {
        &self.catalog
    }

    /// Generate a persona. Unknown regions, unknown categories and inverted
    /// age ranges are configuration errors.
    pub fn generate<R: Rng + ?Sized>(
        &self,
        request: &PersonaRequest,
        rng: &mut R,
    ) -> Result<Persona> {
        let label = request.to_string();
        let invalid = |message: String| Error::persona_invalid(label.clone(), message);

        let (region_name, region) = self.catalog.region(&request.region).ok_or_else(|| {
            invalid(format!(
                "unsupported region '{}'; known regions: {}",
                request.region,
                self.catalog.regions.keys().cloned().collect::<Vec<_>>().join(", ")
            ))
        })?;

        let (min_age, max_age) = request.age_range;
        if min_age > max_age {
            return Err(invalid(format!("age range {}-{} is inverted", min_age, max_age)));
        }

        let category = self.catalog.category(&request.occupation_category).ok_or_else(|| {
            invalid(format!(
                "unknown occupation category '{}'",
                request.occupation_category
            ))
        })?;

        let occupation = category
            .occupations
            .choose(rng)
            .ok_or_else(|| invalid("occupation category has no occupations".into()))?
            .clone();
        let name = region
            .names
            .choose(rng)
            .ok_or_else(|| invalid("region has no names".into()))?
            .clone();
        let city = region
            .locations
            .choose(rng)
            .ok_or_else(|| invalid("region has no locations".into()))?;

        let interests = self.interests(region, &occupation, rng);
        let personality_traits = Self::traits(category, rng);
        let content_preferences = self.preferences(&interests, &occupation, rng);

        let persona = Persona {
            name,
            age: rng.gen_range(min_age..=max_age),
            location: format!("{}, {}", city, region_name),
            daily_routine: DailyRoutine {
                morning: fill_routine(&region.morning_routine, &occupation),
                evening: fill_routine(&region.evening_routine, &occupation),
            },
            occupation,
            interests,
            personality_traits,
            content_preferences,
        };

        debug!(
            request = %request,
            name = %persona.name,
            occupation = %persona.occupation,
            "Persona generated"
        );
        Ok(persona)
    }

    fn interests<R: Rng + ?Sized>(
        &self,
        region: &RegionData,
        occupation: &str,
        rng: &mut R,
    ) -> Vec<String> {
        let occupational = self
            .catalog
            .occupation_interests
            .get(occupation)
            .unwrap_or(&self.catalog.default_occupation_interests);

        region
            .interests
            .choose_multiple(rng, INTERESTS_FROM_REGION)
            .chain(occupational.choose_multiple(rng, INTERESTS_FROM_OCCUPATION))
            .cloned()
            .collect()
    }

    /// Traits are drawn from the base set and the category's own traits as one pool.
    fn traits<R: Rng + ?Sized>(category: &OccupationCategory, rng: &mut R) -> Vec<String> {
        let mut pool: Vec<String> = PersonalityTrait::base()
            .iter()
            .map(|t| t.label().to_string())
            .collect();
        for extra in &category.traits {
            if !pool.contains(extra) {
                pool.push(extra.clone());
            }
        }
        pool.choose_multiple(rng, TRAIT_COUNT).cloned().collect()
    }

    fn preferences<R: Rng + ?Sized>(
        &self,
        interests: &[String],
        occupation: &str,
        rng: &mut R,
    ) -> ContentPreferences {
        let mut candidates: Vec<String> = interests
            .iter()
            .map(|i| format!("{} tips", i.to_lowercase()))
            .collect();
        match self.catalog.occupation_topics.get(occupation) {
            Some(topics) => candidates.extend(topics.iter().cloned()),
            None => candidates.push(format!("{} insights", occupation.to_lowercase())),
        }

        ContentPreferences {
            topics: candidates.choose_multiple(rng, MAX_TOPICS).cloned().collect(),
            formats: self
                .catalog
                .formats
                .choose_multiple(rng, MAX_FORMATS)
                .cloned()
                .collect(),
        }
    }
}

fn fill_routine(template: &[String], occupation: &str) -> Vec<String> {
    template
        .iter()
        .map(|line| line.replace("{occupation}", occupation))
        .collect()
}
