//! Configuration system for the persona simulator
//!
//! Supports multiple configuration sources with the following precedence (highest to lowest):
//! 1. CLI arguments
//! 2. Environment variables (PERSONA_SIM_* prefix)
//! 3. Configuration file (TOML)
//! 4. Default values

use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::backend::{Modality, StylePreset};
use crate::error::{Error, Result};
use crate::persona::Persona;
use crate::scheduler::SchedulerConfig;

/// Main simulator configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Timing of the simulation loop
    pub simulation: SimulationSettings,

    /// Where posts and media end up
    pub output: OutputSettings,

    /// Which generation backend serves each modality
    pub services: ServiceSettings,

    /// OpenAI-compatible text backend settings
    pub openai: OpenAiSettings,

    /// Region/occupation data used to build personas
    pub catalog: CatalogSettings,

    /// Logging configuration
    pub logging: LoggingSettings,

    /// Personas to simulate
    pub personas: Vec<PersonaSpec>,
}

/// Simulation loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    /// Total simulated run time in hours
    pub duration_hours: f64,

    /// Target gap between posts in minutes
    pub interval_minutes: f64,

    /// How long the loop idles between checks, in seconds
    pub poll_interval_secs: f64,

    /// Run one scheduler task per persona instead of one after another
    pub parallel: bool,

    /// Seed for reproducible runs (random if not set)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,

    /// Number of recent post texts kept to condition later requests
    pub history_size: usize,
}

/// Output location settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Root directory; each persona gets `<dir>/<persona_id>/{posts,media}`
    pub dir: String,

    /// Scratch directory generation services write artifacts into
    pub staging_dir: String,
}

/// Backend kind for one modality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// Local placeholder generator
    Mock,
    /// OpenAI-compatible chat completions (text only)
    OpenAi,
    /// Modality not generated; posts carry no artifact for it
    Disabled,
}

impl std::fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ServiceKind::Mock => "mock",
            ServiceKind::OpenAi => "openai",
            ServiceKind::Disabled => "disabled",
        };
        write!(f, "{}", name)
    }
}

impl std::str::FromStr for ServiceKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mock" => Ok(ServiceKind::Mock),
            "openai" => Ok(ServiceKind::OpenAi),
            "disabled" | "none" | "off" => Ok(ServiceKind::Disabled),
            other => Err(format!("unknown service kind '{}'", other)),
        }
    }
}

/// Generation service selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    pub text: ServiceKind,
    pub image: ServiceKind,
    pub audio: ServiceKind,
    pub video: ServiceKind,

    /// Style preset requested from every modality
    pub style: StylePreset,

    /// Artificial latency added by mock services, in milliseconds
    pub mock_latency_ms: u64,
}

impl ServiceSettings {
    /// Backend kind configured for a modality
    pub fn kind_for(&self, modality: Modality) -> ServiceKind {
        match modality {
            Modality::Text => self.text,
            Modality::Image => self.image,
            Modality::Audio => self.audio,
            Modality::Video => self.video,
        }
    }

    /// Modalities that are not disabled, in text/image/audio/video order
    pub fn enabled(&self) -> Vec<(Modality, ServiceKind)> {
        Modality::all()
            .iter()
            .map(|m| (*m, self.kind_for(*m)))
            .filter(|(_, kind)| *kind != ServiceKind::Disabled)
            .collect()
    }
}

/// OpenAI-compatible API backend settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAiSettings {
    /// API base URL (e.g., "https://api.openai.com/v1", "http://localhost:11434/v1")
    pub base_url: String,

    /// API key (empty string for local servers like Ollama)
    pub api_key: String,

    /// Model identifier
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Maximum retries on transient failures
    pub max_retries: u32,

    /// Upper bound on generated tokens per post
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,
}

/// Persona data settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// JSON file replacing the built-in region catalog
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_path: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Log level: trace, debug, info, warn, error
    pub level: String,

    /// Log file path (empty = no file logging)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,

    /// Rotation: minutely, hourly, daily, never
    pub rotation: String,

    /// Number of rotated log files to keep
    pub max_files: u32,

    /// Enable JSON formatted logging
    pub json_format: bool,
}

/// One persona to simulate
///
/// Either generated from `region`/`age_range`/`occupation_category`, or taken
/// verbatim from `profile` when present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonaSpec {
    /// Output directory name and log identifier
    pub id: String,

    pub region: String,

    /// Inclusive `[min, max]` age bounds
    pub age_range: [u8; 2],

    /// tech, creative or professional
    pub occupation_category: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<Persona>,
}

// Default implementations

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            duration_hours: 24.0,
            interval_minutes: 60.0,
            poll_interval_secs: 10.0,
            parallel: false,
            seed: None,
            history_size: 10,
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            dir: "output".to_string(),
            staging_dir: "output/.staging".to_string(),
        }
    }
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            text: ServiceKind::Mock,
            image: ServiceKind::Mock,
            audio: ServiceKind::Mock,
            video: ServiceKind::Mock,
            style: StylePreset::Professional,
            mock_latency_ms: 0,
        }
    }
}

impl Default for OpenAiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434/v1".to_string(),
            api_key: String::new(),
            model: "llama3".to_string(),
            timeout_secs: 60,
            max_retries: 2,
            max_tokens: 200,
            temperature: 0.8,
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file: None,
            rotation: "daily".to_string(),
            max_files: 5,
            json_format: false,
        }
    }
}

impl Default for PersonaSpec {
    fn default() -> Self {
        Self {
            id: "persona".to_string(),
            region: "India".to_string(),
            age_range: [23, 28],
            occupation_category: "tech".to_string(),
            profile: None,
        }
    }
}

impl SimulationSettings {
    /// Convert the hour/minute settings into loop timings
    pub fn scheduler_config(&self) -> Result<SchedulerConfig> {
        let duration =
            hours_to_duration("simulation.duration_hours", self.duration_hours, 3600.0)?;
        let interval =
            hours_to_duration("simulation.interval_minutes", self.interval_minutes, 60.0)?;
        let poll =
            hours_to_duration("simulation.poll_interval_secs", self.poll_interval_secs, 1.0)?;
        Ok(SchedulerConfig::new(duration, interval, poll))
    }
}

fn hours_to_duration(field: &str, value: f64, secs_per_unit: f64) -> Result<Duration> {
    if !value.is_finite() || value <= 0.0 {
        return Err(Error::config_field_invalid(
            field,
            format!("must be a positive number, got {}", value),
        ));
    }
    Duration::try_from_secs_f64(value * secs_per_unit)
        .map_err(|e| Error::config_field_invalid(field, e.to_string()))
}

impl SimConfig {
    /// Load configuration from file with environment variable overrides
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut config = Self::with_default_personas();

        // 1. Load from config file if it exists
        if let Some(path) = Self::find_config_file(config_path)? {
            debug!(path = %path.display(), "Loading configuration file");
            let content = fs::read_to_string(&path).map_err(|e| Error::IoRead {
                path: path.clone(),
                source: e,
            })?;
            config = Self::from_toml(&content)?;
            info!(path = %path.display(), "Configuration loaded from file");
        }

        // 2. Apply environment variable overrides
        config.apply_env_overrides();

        // 3. Expand paths
        config.expand_paths();

        // 4. Validate
        config.validate()?;

        Ok(config)
    }

    /// Parse a TOML document, falling back to the default personas when none are listed
    pub fn from_toml(content: &str) -> Result<Self> {
        let mut config: SimConfig = toml::from_str(content).map_err(|e| Error::ConfigParse {
            message: e.to_string(),
            source: Some(e),
        })?;
        if config.personas.is_empty() {
            config.personas = default_personas();
        }
        Ok(config)
    }

    /// Defaults plus the two stock personas
    pub fn with_default_personas() -> Self {
        Self {
            personas: default_personas(),
            ..Self::default()
        }
    }

    /// Find the configuration file to use
    fn find_config_file(explicit_path: Option<&str>) -> Result<Option<PathBuf>> {
        if let Some(path) = explicit_path {
            let path = PathBuf::from(expand_path(path));
            if path.exists() {
                return Ok(Some(path));
            }
            return Err(Error::config_not_found(path));
        }

        let search_paths = [
            PathBuf::from("persona-sim.toml"),
            dirs::config_dir()
                .map(|p| p.join("persona-sim").join("config.toml"))
                .unwrap_or_default(),
            dirs::home_dir()
                .map(|p| p.join(".persona-sim").join("config.toml"))
                .unwrap_or_default(),
        ];

        for path in &search_paths {
            if !path.as_os_str().is_empty() && path.exists() {
                debug!(path = %path.display(), "Found configuration file");
                return Ok(Some(path.clone()));
            }
        }

        debug!("No configuration file found, using defaults");
        Ok(None)
    }

    /// Apply environment variable overrides
    pub(crate) fn apply_env_overrides(&mut self) {
        // Simulation settings
        if let Some(n) = env_parse("PERSONA_SIM_DURATION_HOURS") {
            self.simulation.duration_hours = n;
        }
        if let Some(n) = env_parse("PERSONA_SIM_INTERVAL_MINUTES") {
            self.simulation.interval_minutes = n;
        }
        if let Some(n) = env_parse("PERSONA_SIM_POLL_INTERVAL_SECS") {
            self.simulation.poll_interval_secs = n;
        }
        if let Some(n) = env_parse("PERSONA_SIM_SEED") {
            self.simulation.seed = Some(n);
        }
        if let Ok(val) = std::env::var("PERSONA_SIM_PARALLEL") {
            self.simulation.parallel = env_flag(&val);
        }

        // Output settings
        if let Ok(val) = std::env::var("PERSONA_SIM_OUTPUT_DIR") {
            self.output.dir = val;
        }
        if let Ok(val) = std::env::var("PERSONA_SIM_STAGING_DIR") {
            self.output.staging_dir = val;
        }

        // Service selection
        if let Some(kind) = env_parse("PERSONA_SIM_TEXT_SERVICE") {
            self.services.text = kind;
        }
        if let Some(kind) = env_parse("PERSONA_SIM_IMAGE_SERVICE") {
            self.services.image = kind;
        }
        if let Some(kind) = env_parse("PERSONA_SIM_AUDIO_SERVICE") {
            self.services.audio = kind;
        }
        if let Some(kind) = env_parse("PERSONA_SIM_VIDEO_SERVICE") {
            self.services.video = kind;
        }

        // Logging settings
        if let Ok(val) = std::env::var("PERSONA_SIM_LOG_LEVEL") {
            self.logging.level = val;
        }
        if let Ok(val) = std::env::var("PERSONA_SIM_LOG_FILE") {
            self.logging.file = Some(val);
        }
        if let Ok(val) = std::env::var("PERSONA_SIM_LOG_JSON") {
            self.logging.json_format = env_flag(&val);
        }

        // OpenAI settings
        if let Ok(val) = std::env::var("PERSONA_SIM_OPENAI_BASE_URL") {
            self.openai.base_url = val;
        }
        if let Ok(val) = std::env::var("PERSONA_SIM_OPENAI_API_KEY") {
            self.openai.api_key = val;
        }
        if let Ok(val) = std::env::var("PERSONA_SIM_OPENAI_MODEL") {
            self.openai.model = val;
        }
        if let Some(n) = env_parse("PERSONA_SIM_OPENAI_TIMEOUT_SECS") {
            self.openai.timeout_secs = n;
        }
    }

    /// Expand ~ and other path variables
    fn expand_paths(&mut self) {
        self.output.dir = expand_path(&self.output.dir);
        self.output.staging_dir = expand_path(&self.output.staging_dir);

        if let Some(ref file) = self.logging.file {
            self.logging.file = Some(expand_path(file));
        }
        if let Some(ref path) = self.catalog.data_path {
            self.catalog.data_path = Some(expand_path(path));
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.simulation.scheduler_config()?;

        if self.simulation.history_size == 0 {
            return Err(Error::config_field_invalid(
                "simulation.history_size",
                "must be at least 1",
            ));
        }

        if self.output.dir.trim().is_empty() {
            return Err(Error::config_field_invalid("output.dir", "cannot be empty"));
        }

        if self.services.text == ServiceKind::Disabled {
            return Err(Error::config_field_invalid(
                "services.text",
                "text generation cannot be disabled; every post carries text",
            ));
        }
        for (field, kind) in [
            ("services.image", self.services.image),
            ("services.audio", self.services.audio),
            ("services.video", self.services.video),
        ] {
            if kind == ServiceKind::OpenAi {
                return Err(Error::config_field_invalid(
                    field,
                    "the openai backend only serves text; use 'mock' or 'disabled'",
                ));
            }
        }

        for (modality, _) in self.services.enabled() {
            self.services.style.check(modality).map_err(|_| {
                Error::config_field_invalid(
                    "services.style",
                    format!(
                        "style '{}' is not supported by the {} service (supported: {})",
                        self.services.style,
                        modality,
                        StylePreset::supported_by(modality)
                            .iter()
                            .map(|p| p.name())
                            .collect::<Vec<_>>()
                            .join(", ")
                    ),
                )
            })?;
        }

        if self.services.text == ServiceKind::OpenAi {
            let parsed = url::Url::parse(&self.openai.base_url).map_err(|e| {
                Error::config_field_invalid("openai.base_url", format!("invalid URL: {}", e))
            })?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(Error::config_field_invalid(
                    "openai.base_url",
                    "must start with http:// or https://",
                ));
            }
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            return Err(Error::config_field_invalid(
                "logging.level",
                format!(
                    "Invalid log level '{}'. Must be one of: {}",
                    self.logging.level,
                    valid_levels.join(", ")
                ),
            ));
        }

        if self.personas.is_empty() {
            return Err(Error::config_field_invalid("personas", "at least one persona is required"));
        }
        let mut seen = HashSet::new();
        for spec in &self.personas {
            if spec.id.trim().is_empty() {
                return Err(Error::config_field_invalid("personas.id", "cannot be empty"));
            }
            if !seen.insert(spec.id.as_str()) {
                return Err(Error::config_field_invalid(
                    "personas.id",
                    format!("duplicate persona id '{}'", spec.id),
                ));
            }
            if spec.age_range[0] > spec.age_range[1] {
                return Err(Error::persona_invalid(
                    &spec.id,
                    format!(
                        "age range [{}, {}] is inverted",
                        spec.age_range[0], spec.age_range[1]
                    ),
                ));
            }
            if let Some(ref profile) = spec.profile {
                profile.validate(&spec.id)?;
            }
        }

        Ok(())
    }

    /// Root directory for all persona output
    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(&self.output.dir)
    }

    /// Directory generation services stage artifacts in
    pub fn staging_dir(&self) -> PathBuf {
        PathBuf::from(&self.output.staging_dir)
    }

    /// Keep only the persona with the given id
    pub fn retain_persona(&mut self, id: &str) -> Result<()> {
        self.personas.retain(|p| p.id == id);
        if self.personas.is_empty() {
            return Err(Error::config_field_invalid(
                "personas",
                format!("no persona with id '{}' is configured", id),
            ));
        }
        Ok(())
    }
}

fn default_personas() -> Vec<PersonaSpec> {
    vec![
        PersonaSpec {
            id: "indian".to_string(),
            region: "India".to_string(),
            age_range: [23, 28],
            occupation_category: "tech".to_string(),
            profile: None,
        },
        PersonaSpec {
            id: "korean".to_string(),
            region: "South Korea".to_string(),
            age_range: [24, 29],
            occupation_category: "creative".to_string(),
            profile: None,
        },
    ]
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

fn env_flag(val: &str) -> bool {
    val.to_lowercase() == "true" || val == "1"
}

/// Expand ~ and environment variables in paths
fn expand_path(path: &str) -> String {
    shellexpand::full(path)
        .unwrap_or(std::borrow::Cow::Borrowed(path))
        .into_owned()
}

/// Initialize a new configuration file
pub fn init_config(path: Option<&str>, force: bool) -> Result<PathBuf> {
    let config_path = path
        .map(|p| PathBuf::from(expand_path(p)))
        .unwrap_or_else(|| PathBuf::from("persona-sim.toml"));

    if config_path.exists() && !force {
        return Err(Error::config_validation(format!(
            "Configuration file already exists: {}. Use --force to overwrite.",
            config_path.display()
        )));
    }

    if let Some(parent) = config_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| Error::IoWrite {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
    }

    fs::write(&config_path, generate_default_config()).map_err(|e| Error::IoWrite {
        path: config_path.clone(),
        source: e,
    })?;

    Ok(config_path)
}

/// Generate default configuration content with comments
pub fn generate_default_config() -> String {
    r#"# Persona simulator configuration

[simulation]
# Total run time in hours
duration_hours = 24.0

# Target gap between posts in minutes
interval_minutes = 60.0

# Idle time between schedule checks, in seconds
poll_interval_secs = 10.0

# Run all personas at once instead of one after another
parallel = false

# Fixed seed for reproducible runs
# seed = 42

# Recent post texts remembered per persona
history_size = 10

[output]
# Each persona writes to <dir>/<persona id>/posts and <dir>/<persona id>/media
dir = "output"

# Scratch space for freshly generated artifacts
staging_dir = "output/.staging"

[services]
# mock | openai (text only) | disabled (not allowed for text)
text = "mock"
image = "mock"
audio = "mock"
video = "mock"

# professional | casual | energetic | creative | artistic
style = "professional"

# Artificial mock latency in milliseconds
mock_latency_ms = 0

[openai]
# API base URL (OpenAI, Ollama, vLLM, LM Studio, etc.)
base_url = "http://localhost:11434/v1"

# API key (leave empty for local servers like Ollama)
api_key = ""

model = "llama3"
timeout_secs = 60
max_retries = 2
max_tokens = 200
temperature = 0.8

[catalog]
# Replace the built-in region data with a JSON file
# data_path = "~/.persona-sim/regions.json"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log file path (comment out to disable file logging)
# file = "logs/simulation.log"

# minutely | hourly | daily | never
rotation = "daily"
max_files = 5
json_format = false

[[personas]]
id = "indian"
region = "India"
age_range = [23, 28]
occupation_category = "tech"

[[personas]]
id = "korean"
region = "South Korea"
age_range = [24, 29]
occupation_category = "creative"
"#
    .to_string()
}
