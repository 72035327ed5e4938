//! Style tables shared by the generation services.
//!
//! Presets, cultures, mood templates and vocabulary enhancers are closed
//! enums; each modality accepts a fixed subset of presets.

use std::fmt;
use std::str::FromStr;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::traits::Modality;
use crate::error::{Error, Result};

/// Maximum comma-separated parts kept in an enhanced image prompt.
const IMAGE_PROMPT_PARTS: usize = 10;

// ─────────────────────────────────────────────────────────────────
// Presets
// ─────────────────────────────────────────────────────────────────

/// Named style requested from a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StylePreset {
    #[default]
    Professional,
    Casual,
    Energetic,
    Creative,
    Artistic,
}

impl StylePreset {
    pub fn name(&self) -> &'static str {
        match self {
            StylePreset::Professional => "professional",
            StylePreset::Casual => "casual",
            StylePreset::Energetic => "energetic",
            StylePreset::Creative => "creative",
            StylePreset::Artistic => "artistic",
        }
    }

    /// Presets a modality understands. Text takes any preset.
    pub fn supported_by(modality: Modality) -> &'static [StylePreset] {
        match modality {
            Modality::Text => &[
                StylePreset::Professional,
                StylePreset::Casual,
                StylePreset::Energetic,
                StylePreset::Creative,
                StylePreset::Artistic,
            ],
            Modality::Image => &[
                StylePreset::Professional,
                StylePreset::Casual,
                StylePreset::Artistic,
            ],
            Modality::Audio => &[
                StylePreset::Professional,
                StylePreset::Casual,
                StylePreset::Energetic,
            ],
            Modality::Video => &[
                StylePreset::Professional,
                StylePreset::Creative,
                StylePreset::Casual,
            ],
        }
    }

    /// Reject a preset the modality has no table entry for.
    pub fn check(&self, modality: Modality) -> Result<()> {
        if Self::supported_by(modality).contains(self) {
            Ok(())
        } else {
            Err(Error::validation(
                "style",
                format!("{} style '{}' is not supported", modality, self),
            ))
        }
    }

    /// Prompt additions for image generation.
    pub fn image_enhancers(&self) -> &'static [&'static str] {
        match self {
            StylePreset::Professional => &["high quality", "professional lighting"],
            StylePreset::Casual => &["natural lighting", "candid"],
            StylePreset::Artistic => &["artistic", "creative"],
            StylePreset::Energetic | StylePreset::Creative => &[],
        }
    }

    /// Speech parameters for audio generation.
    pub fn voice(&self) -> Option<VoiceStyle> {
        match self {
            StylePreset::Professional => Some(VoiceStyle { speed: 1.0, pitch: 1.0 }),
            StylePreset::Casual => Some(VoiceStyle { speed: 1.1, pitch: 1.05 }),
            StylePreset::Energetic => Some(VoiceStyle { speed: 1.2, pitch: 1.1 }),
            StylePreset::Creative | StylePreset::Artistic => None,
        }
    }

    /// Frame parameters for video generation.
    pub fn video(&self) -> Option<VideoPreset> {
        match self {
            StylePreset::Professional => Some(VideoPreset {
                num_frames: 24,
                height: 256,
                width: 256,
            }),
            StylePreset::Creative => Some(VideoPreset { num_frames: 16, height: 224, width: 224 }),
            StylePreset::Casual => Some(VideoPreset { num_frames: 20, height: 240, width: 240 }),
            StylePreset::Energetic | StylePreset::Artistic => None,
        }
    }
}

impl fmt::Display for StylePreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for StylePreset {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "professional" => Ok(StylePreset::Professional),
            "casual" => Ok(StylePreset::Casual),
            "energetic" => Ok(StylePreset::Energetic),
            "creative" => Ok(StylePreset::Creative),
            "artistic" => Ok(StylePreset::Artistic),
            _ => Err(format!("Unknown style preset: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoiceStyle {
    pub speed: f32,
    pub pitch: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoPreset {
    pub num_frames: u32,
    pub height: u32,
    pub width: u32,
}

// ─────────────────────────────────────────────────────────────────
// Cultures
// ─────────────────────────────────────────────────────────────────

/// Cultural flavour added to image prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Culture {
    India,
    Korean,
    Nepali,
}

impl Culture {
    /// Key passed to services in [`super::StyleParams::culture`].
    pub fn key(&self) -> &'static str {
        match self {
            Culture::India => "india",
            Culture::Korean => "korean",
            Culture::Nepali => "nepali",
        }
    }

    /// Culture for a location region ("India", "South Korea", ...).
    pub fn from_region(region: &str) -> Option<Self> {
        match region.trim().to_lowercase().as_str() {
            "india" | "indian" => Some(Culture::India),
            "south korea" | "korea" | "korean" => Some(Culture::Korean),
            "nepal" | "nepali" => Some(Culture::Nepali),
            _ => None,
        }
    }

    pub fn elements(&self) -> &'static [&'static str] {
        match self {
            Culture::India => &[
                "Indian style",
                "vibrant colors",
                "traditional Indian elements",
                "colorful saree",
                "cultural heritage",
            ],
            Culture::Korean => &["Korean aesthetic", "minimalist", "K-pop style", "modern Seoul"],
            Culture::Nepali => &["Himalayan influence", "traditional", "mountain landscape"],
        }
    }
}

impl FromStr for Culture {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Culture::from_region(s)
            .ok_or_else(|| Error::validation("culture", format!("unsupported culture '{}'", s)))
    }
}

/// Image prompt with style and culture elements, cut to ten parts.
pub fn enhance_image_prompt(prompt: &str, preset: StylePreset, culture: Option<Culture>) -> String {
    let mut parts: Vec<&str> = vec![prompt.trim()];
    parts.extend(preset.image_enhancers());
    if let Some(culture) = culture {
        parts.extend(culture.elements());
    }
    let joined = parts.join(", ");
    joined
        .split(", ")
        .take(IMAGE_PROMPT_PARTS)
        .collect::<Vec<_>>()
        .join(", ")
}

// ─────────────────────────────────────────────────────────────────
// Text Shaping
// ─────────────────────────────────────────────────────────────────

/// Wrap generated text in a template for the mood, if the mood has one.
pub fn format_with_mood<R: Rng + ?Sized>(text: &str, mood: &str, rng: &mut R) -> String {
    let templates: &[&str] = match mood.to_lowercase().as_str() {
        "excited" => &[
            "Can't wait to share this! {content}",
            "You won't believe what happened! {content}",
            "I'm so thrilled about this! {content}",
        ],
        "thoughtful" => &[
            "Been thinking about this lately... {content}",
            "Here's my perspective: {content}",
            "After careful consideration: {content}",
        ],
        "creative" => &[
            "Just had a creative burst! {content}",
            "Here's something I came up with: {content}",
            "Experimenting with this idea: {content}",
        ],
        _ => &["{content}"],
    };

    let content = strip_quotes(text.trim());
    templates
        .choose(rng)
        .unwrap_or(&"{content}")
        .replace("{content}", content)
}

fn strip_quotes(text: &str) -> &str {
    text.strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(text)
}

/// Extra vocabulary for the first topic word naming a known family.
pub fn vocabulary_for(topic: &str) -> &'static [&'static str] {
    topic
        .split_whitespace()
        .find_map(|word| match word.to_lowercase().as_str() {
            "tech" => Some(&["innovation", "development", "algorithm", "interface", "system"][..]),
            "food" => Some(&["flavors", "aroma", "texture", "cuisine", "ingredients"][..]),
            "culture" => {
                Some(&["tradition", "heritage", "celebration", "community", "festival"][..])
            }
            _ => None,
        })
        .unwrap_or(&[])
}

/// Prompt for a text backend built from traits, recent history and topic vocabulary.
pub fn build_text_prompt(
    prompt: &str,
    traits: &[String],
    topic: Option<&str>,
    history: &[String],
) -> String {
    let mut out = String::new();
    if !history.is_empty() {
        out.push_str(&history.join("\n"));
        out.push('\n');
    }

    let phrases: Vec<String> = traits
        .iter()
        .map(|t| format!("Speaking as someone who is {}", t))
        .collect();
    if !phrases.is_empty() {
        out.push_str(&phrases.join(", "));
        out.push_str(". ");
    }
    out.push_str(prompt);

    let words = topic.map(vocabulary_for).unwrap_or(&[]);
    if !words.is_empty() {
        out.push_str(" Consider these relevant terms: ");
        out.push_str(&words.join(", "));
    }
    out
}
