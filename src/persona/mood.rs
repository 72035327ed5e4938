//! Fixed mood tables.
//!
//! Time-of-day multipliers and energy buckets are closed enums so every case
//! is matched exhaustively.

use super::types::PersonalityTrait;

/// Energy level a persona starts from before trait offsets.
pub const BASE_ENERGY: f64 = 0.7;

/// Standard deviation of the per-call energy sample.
pub const ENERGY_SPREAD: f64 = 0.2;

/// Mood returned when the sampled energy lands outside every bucket.
pub const NEUTRAL_MOOD: &str = "neutral";

// ─────────────────────────────────────────────────────────────────
// Time of Day
// ─────────────────────────────────────────────────────────────────

/// Part of the day, each covering a half-open hour range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPhase {
    /// [0, 6)
    LateNight,
    /// [6, 11)
    Morning,
    /// [11, 15)
    EarlyAfternoon,
    /// [15, 20)
    Evening,
    /// [20, 24)
    Night,
}

impl DayPhase {
    pub const ALL: [DayPhase; 5] = [
        DayPhase::LateNight,
        DayPhase::Morning,
        DayPhase::EarlyAfternoon,
        DayPhase::Evening,
        DayPhase::Night,
    ];

    /// Phase for an hour of day. Hours past 23 wrap.
    pub fn for_hour(hour: u32) -> Self {
        match hour % 24 {
            0..=5 => DayPhase::LateNight,
            6..=10 => DayPhase::Morning,
            11..=14 => DayPhase::EarlyAfternoon,
            15..=19 => DayPhase::Evening,
            _ => DayPhase::Night,
        }
    }

    /// Half-open `[start, end)` hour range.
    pub fn hours(&self) -> std::ops::Range<u32> {
        match self {
            DayPhase::LateNight => 0..6,
            DayPhase::Morning => 6..11,
            DayPhase::EarlyAfternoon => 11..15,
            DayPhase::Evening => 15..20,
            DayPhase::Night => 20..24,
        }
    }

    pub fn energy_multiplier(&self) -> f64 {
        match self {
            DayPhase::LateNight => 0.5,
            DayPhase::Morning => 1.2,
            DayPhase::EarlyAfternoon => 0.9,
            DayPhase::Evening => 1.1,
            DayPhase::Night => 0.8,
        }
    }
}

// ─────────────────────────────────────────────────────────────────
// Energy Buckets
// ─────────────────────────────────────────────────────────────────

/// Energy ranges over [0, 1], highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnergyBucket {
    Peak,
    High,
    Moderate,
    Low,
    Depleted,
}

impl EnergyBucket {
    /// Scan order: high to low.
    pub const ALL: [EnergyBucket; 5] = [
        EnergyBucket::Peak,
        EnergyBucket::High,
        EnergyBucket::Moderate,
        EnergyBucket::Low,
        EnergyBucket::Depleted,
    ];

    /// Inclusive `(low, high)` bounds.
    pub fn bounds(&self) -> (f64, f64) {
        match self {
            EnergyBucket::Peak => (0.8, 1.0),
            EnergyBucket::High => (0.6, 0.8),
            EnergyBucket::Moderate => (0.4, 0.6),
            EnergyBucket::Low => (0.2, 0.4),
            EnergyBucket::Depleted => (0.0, 0.2),
        }
    }

    /// First bucket (scanning high to low) containing `energy`, if any.
    pub fn classify(energy: f64) -> Option<Self> {
        Self::ALL.into_iter().find(|bucket| {
            let (low, high) = bucket.bounds();
            low <= energy && energy <= high
        })
    }

    /// Trait-specific mood lists, checked in table order.
    pub fn trait_moods(&self) -> &'static [(PersonalityTrait, &'static [&'static str])] {
        match self {
            EnergyBucket::Peak => &[
                (PersonalityTrait::Creative, &["inspired", "innovative", "imaginative"]),
                (PersonalityTrait::Analytical, &["focused", "determined", "engaged"]),
            ],
            EnergyBucket::High => &[
                (PersonalityTrait::Social, &["friendly", "sociable", "connected"]),
                (PersonalityTrait::Professional, &["productive", "efficient", "focused"]),
            ],
            EnergyBucket::Moderate => &[
                (PersonalityTrait::Introspective, &["contemplative", "thoughtful", "meditative"]),
                (PersonalityTrait::Empathetic, &["caring", "understanding", "compassionate"]),
            ],
            EnergyBucket::Low => &[
                (PersonalityTrait::DetailOriented, &["careful", "precise", "methodical"]),
                (PersonalityTrait::Innovative, &["brainstorming", "exploring", "curious"]),
            ],
            EnergyBucket::Depleted => &[(
                PersonalityTrait::Ambitious,
                &["determined", "persevering", "pushing_through"],
            )],
        }
    }

    /// Moods used when none of the persona's traits has a list here.
    pub fn default_moods(&self) -> &'static [&'static str] {
        match self {
            EnergyBucket::Peak => &["excited", "energetic", "enthusiastic"],
            EnergyBucket::High => &["content", "positive", "balanced"],
            EnergyBucket::Moderate => &["calm", "neutral", "steady"],
            EnergyBucket::Low => &["tired", "quiet", "reserved"],
            EnergyBucket::Depleted => &["exhausted", "need_rest", "reflective"],
        }
    }

    /// Mood list for a persona with the given traits.
    pub fn moods_for(&self, traits: &[PersonalityTrait]) -> &'static [&'static str] {
        self.trait_moods()
            .iter()
            .find(|(t, _)| traits.contains(t))
            .map(|(_, moods)| *moods)
            .unwrap_or_else(|| self.default_moods())
    }
}

// ─────────────────────────────────────────────────────────────────
// Format Adjustments
// ─────────────────────────────────────────────────────────────────

const LOW_ENERGY_MOODS: &[&str] = &["tired", "exhausted"];
const HIGH_ENERGY_MOODS: &[&str] = &["energetic", "inspired"];
const SUSTAINED_FORMATS: &[&str] = &["tutorial videos", "long-form content"];
const LIGHTWEIGHT_FORMATS: &[&str] = &["quick tips", "behind-the-scenes"];

/// Weight for a format given the current mood.
pub fn format_weight(format: &str, mood: &str) -> f64 {
    let mood = mood.to_lowercase();
    let format = format.to_lowercase();
    let mut weight = 1.0;
    if LOW_ENERGY_MOODS.contains(&mood.as_str()) && SUSTAINED_FORMATS.contains(&format.as_str()) {
        weight -= 0.3;
    }
    if HIGH_ENERGY_MOODS.contains(&mood.as_str())
        && LIGHTWEIGHT_FORMATS.contains(&format.as_str())
    {
        weight += 0.3;
    }
    weight
}
