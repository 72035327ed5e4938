//! Clock-driven persona state: activity, mood and the next content idea.
//!
//! Every operation has an `*_at(hour, ..)` form taking the hour explicitly and a
//! wrapper reading the local clock.

use chrono::{Local, Timelike};
use rand::seq::SliceRandom;
use rand::Rng;
use rand_distr::{Distribution, Normal};
use tracing::trace;

use super::mood::{format_weight, DayPhase, EnergyBucket, BASE_ENERGY, ENERGY_SPREAD, NEUTRAL_MOOD};
use super::selection::{pick_weighted, WeightedPick};
use super::types::{ContentIdea, Persona, FREE_TIME};
use crate::error::{Error, Result};

/// Current local hour of day.
pub fn current_hour() -> u32 {
    Local::now().hour()
}

impl Persona {
    // ─────────────────────────────────────────────────────────────
    // Activity
    // ─────────────────────────────────────────────────────────────

    /// Latest routine entry whose hour has passed, or [`FREE_TIME`].
    pub fn activity_at(&self, hour: u32) -> &str {
        self.daily_routine
            .entries()
            .filter(|entry| entry.hour <= hour)
            .last()
            .map(|entry| entry.activity)
            .unwrap_or(FREE_TIME)
    }

    pub fn current_activity(&self) -> &str {
        self.activity_at(current_hour())
    }

    // ─────────────────────────────────────────────────────────────
    // Mood
    // ─────────────────────────────────────────────────────────────

    /// Base energy adjusted by trait offsets.
    pub fn base_energy(&self) -> f64 {
        BASE_ENERGY
            + self
                .known_traits()
                .iter()
                .map(|t| t.energy_offset())
                .sum::<f64>()
    }

    /// One energy sample for the given hour.
    pub fn energy_at<R: Rng + ?Sized>(&self, hour: u32, rng: &mut R) -> f64 {
        let base = self.base_energy();
        let sampled = match Normal::new(base, ENERGY_SPREAD) {
            Ok(normal) => normal.sample(rng),
            Err(_) => base,
        };
        sampled * DayPhase::for_hour(hour).energy_multiplier()
    }

    /// Mood label for an energy level.
    pub fn mood_for_energy<R: Rng + ?Sized>(&self, energy: f64, rng: &mut R) -> String {
        let Some(bucket) = EnergyBucket::classify(energy) else {
            return NEUTRAL_MOOD.to_string();
        };
        bucket
            .moods_for(&self.known_traits())
            .choose(rng)
            .map(|m| m.to_string())
            .unwrap_or_else(|| NEUTRAL_MOOD.to_string())
    }

    pub fn mood_at<R: Rng + ?Sized>(&self, hour: u32, rng: &mut R) -> String {
        let energy = self.energy_at(hour, rng);
        let mood = self.mood_for_energy(energy, rng);
        trace!(persona = %self.name, hour, energy, mood = %mood, "Mood derived");
        mood
    }

    pub fn current_mood<R: Rng + ?Sized>(&self, rng: &mut R) -> String {
        self.mood_at(current_hour(), rng)
    }

    // ─────────────────────────────────────────────────────────────
    // Content Ideas
    // ─────────────────────────────────────────────────────────────

    /// Selection weight for a topic given the current activity.
    pub fn topic_weight(&self, topic: &str, activity: &str) -> f64 {
        let topic_lower = topic.to_lowercase();
        let activity_lower = activity.to_lowercase();
        let topic_words: Vec<&str> = topic_lower.split_whitespace().collect();

        let mut weight = 1.0;
        if activity_lower
            .split_whitespace()
            .any(|word| topic_words.contains(&word))
        {
            weight += 0.5;
        }
        if self
            .interests
            .iter()
            .any(|interest| topic_lower.contains(&interest.to_lowercase()))
        {
            weight += 0.3;
        }
        weight
    }

    /// Pick a topic for the given activity.
    pub fn choose_topic<R: Rng + ?Sized>(&self, activity: &str, rng: &mut R) -> Result<&str> {
        let topics = &self.content_preferences.topics;
        let weights: Vec<f64> = topics.iter().map(|t| self.topic_weight(t, activity)).collect();
        let pick = pick_weighted(&weights, rng)
            .ok_or_else(|| {
                Error::validation("content_preferences.topics", "no topics to choose from")
            })?;
        if let WeightedPick::Fallback(_) = pick {
            trace!(persona = %self.name, "Topic draw fell back to uniform pick");
        }
        Ok(&topics[pick.index()])
    }

    /// Pick a format for the given mood.
    pub fn choose_format<R: Rng + ?Sized>(&self, mood: &str, rng: &mut R) -> Result<&str> {
        let formats = &self.content_preferences.formats;
        let weights: Vec<f64> = formats.iter().map(|f| format_weight(f, mood)).collect();
        let pick = pick_weighted(&weights, rng)
            .ok_or_else(|| {
                Error::validation("content_preferences.formats", "no formats to choose from")
            })?;
        Ok(&formats[pick.index()])
    }

    /// Derive a fresh idea for a post made at `hour`.
    pub fn content_idea_at<R: Rng + ?Sized>(&self, hour: u32, rng: &mut R) -> Result<ContentIdea> {
        let activity = self.activity_at(hour).to_string();
        let mood = self.mood_at(hour, rng);
        let topic = self.choose_topic(&activity, rng)?.to_string();
        let format = self.choose_format(&mood, rng)?.to_string();

        Ok(ContentIdea {
            topic,
            format,
            mood,
            context: activity,
        })
    }

    pub fn content_idea<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<ContentIdea> {
        self.content_idea_at(current_hour(), rng)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persona::{ContentPreferences, DailyRoutine};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn persona(traits: &[&str]) -> Persona {
        Persona {
            name: "Diya Reddy".into(),
            age: 26,
            location: "Bangalore, India".into(),
            occupation: "Software Developer".into(),
            interests: vec!["Yoga".into(), "Cricket".into()],
            personality_traits: traits.iter().map(|t| t.to_string()).collect(),
            daily_routine: DailyRoutine {
                morning: vec!["6:00: yoga".into(), "9:00: work".into()],
                evening: vec!["18:00: hobby".into()],
            },
            content_preferences: ContentPreferences {
                topics: vec![
                    "yoga tips".into(),
                    "coding tips".into(),
                    "technology tutorials".into(),
                ],
                formats: vec!["Quick tips".into(), "Tutorial videos".into()],
            },
        }
    }

    #[test]
    fn test_activity_scenario() {
        let p = persona(&[]);
        assert_eq!(p.activity_at(10), "work");
        assert_eq!(p.activity_at(3), "free time");
        assert_eq!(p.activity_at(6), "yoga");
        assert_eq!(p.activity_at(23), "hobby");
    }

    #[test]
    fn test_later_entry_overrides_earlier() {
        let mut p = persona(&[]);
        p.daily_routine.morning = vec!["9:00: work".into(), "6:00: yoga".into()];
        p.daily_routine.evening.clear();
        // Both have passed; the later entry in scan order wins.
        assert_eq!(p.activity_at(10), "yoga");
    }

    #[test]
    fn test_all_malformed_is_free_time() {
        let mut p = persona(&[]);
        p.daily_routine.morning = vec!["6:00 yoga".into(), "breakfast".into()];
        p.daily_routine.evening = vec!["evening-walk".into()];
        for hour in 0..24 {
            assert_eq!(p.activity_at(hour), FREE_TIME);
        }
    }

    #[test]
    fn test_base_energy_offsets() {
        assert!((persona(&[]).base_energy() - 0.7).abs() < 1e-9);
        assert!((persona(&["Energetic"]).base_energy() - 0.8).abs() < 1e-9);
        assert!((persona(&["Introspective"]).base_energy() - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_mood_for_energy_uses_trait_table() {
        let p = persona(&["Creative"]);
        let mut rng = StdRng::seed_from_u64(5);
        let mood = p.mood_for_energy(0.9, &mut rng);
        assert!(["inspired", "innovative", "imaginative"].contains(&mood.as_str()));

        let p = persona(&["Logical"]);
        let mood = p.mood_for_energy(0.3, &mut rng);
        assert!(["tired", "quiet", "reserved"].contains(&mood.as_str()));
    }

    #[test]
    fn test_mood_out_of_range_is_neutral() {
        let p = persona(&[]);
        let mut rng = StdRng::seed_from_u64(5);
        assert_eq!(p.mood_for_energy(1.4, &mut rng), "neutral");
        assert_eq!(p.mood_for_energy(-0.1, &mut rng), "neutral");
    }

    #[test]
    fn test_topic_weight() {
        let p = persona(&[]);
        // Activity word "yoga" is a topic word, and interest "Yoga" is a substring.
        assert!((p.topic_weight("yoga tips", "yoga") - 1.8).abs() < 1e-9);
        assert!((p.topic_weight("coding tips", "work") - 1.0).abs() < 1e-9);
        assert!((p.topic_weight("Coding Tips", "coding session") - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_seeded_topic_is_deterministic() {
        let p = persona(&[]);
        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            p.choose_topic("work", &mut rng).unwrap().to_string()
        };
        for seed in [0, 7, 42, 1234] {
            assert_eq!(draw(seed), draw(seed));
        }
    }

    #[test]
    fn test_content_idea_draws_from_preferences() {
        let p = persona(&["Creative", "Analytical"]);
        let mut rng = StdRng::seed_from_u64(11);
        for hour in 0..24 {
            let idea = p.content_idea_at(hour, &mut rng).unwrap();
            assert!(p.content_preferences.topics.contains(&idea.topic));
            assert!(p.content_preferences.formats.contains(&idea.format));
            assert_eq!(idea.context, p.activity_at(hour));
            assert!(!idea.mood.is_empty());
        }
    }

    #[test]
    fn test_content_idea_without_topics_is_validation_error() {
        let mut p = persona(&[]);
        p.content_preferences.topics.clear();
        let mut rng = StdRng::seed_from_u64(1);
        let err = p.content_idea_at(9, &mut rng).unwrap_err();
        assert!(matches!(err, Error::Validation { .. }));
    }
}
