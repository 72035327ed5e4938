//! CLI argument parsing using clap v4
//!
//! Defines the command-line interface for the persona simulator.

use clap::{Parser, Subcommand};

/// Persona Sim - scheduled multimodal posts from simulated personas
///
/// Generates personas, then has each one post text, image, audio and video
/// content on a timer, writing every post under the output directory.
#[derive(Parser, Debug)]
#[command(name = "persona-sim")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase logging verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the simulation
    Run {
        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_SIM_CONFIG")]
        config: Option<String>,

        /// Total run time in hours
        #[arg(short, long)]
        duration: Option<f64>,

        /// Minutes between posts
        #[arg(short, long)]
        interval: Option<f64>,

        /// Only simulate the persona with this id
        #[arg(short, long)]
        persona: Option<String>,

        /// Seed for reproducible personas and posts
        #[arg(long)]
        seed: Option<u64>,
    },

    /// Persona inspection
    Persona {
        #[command(subcommand)]
        subcommand: PersonaSubcommand,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        subcommand: ConfigSubcommand,
    },

    /// Display version information
    Version,
}

/// Persona subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum PersonaSubcommand {
    /// Print the profiles the configuration produces
    Show {
        /// Path to configuration file
        #[arg(short, long, env = "PERSONA_SIM_CONFIG")]
        config: Option<String>,

        /// Only show the persona with this id
        #[arg(short, long)]
        persona: Option<String>,

        /// Seed for persona generation
        #[arg(long)]
        seed: Option<u64>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

/// Configuration subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigSubcommand {
    /// Display the current configuration
    Show {
        /// Path to configuration file
        #[arg(short, long)]
        config: Option<String>,
    },

    /// Initialize a new configuration file
    Init {
        /// Path where to create the config file
        #[arg(short, long)]
        path: Option<String>,

        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Validate a configuration file
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        config: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_command() {
        let cli = Cli::parse_from(["persona-sim", "run"]);
        match cli.command {
            Commands::Run {
                config,
                duration,
                interval,
                persona,
                seed,
            } => {
                assert!(config.is_none());
                assert!(duration.is_none());
                assert!(interval.is_none());
                assert!(persona.is_none());
                assert!(seed.is_none());
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_run_with_overrides() {
        let cli = Cli::parse_from([
            "persona-sim",
            "run",
            "--config",
            "/path/to/config.toml",
            "--duration",
            "0.1",
            "--interval",
            "3",
            "--persona",
            "korean",
            "--seed",
            "42",
        ]);
        match cli.command {
            Commands::Run {
                config,
                duration,
                interval,
                persona,
                seed,
            } => {
                assert_eq!(config, Some("/path/to/config.toml".to_string()));
                assert_eq!(duration, Some(0.1));
                assert_eq!(interval, Some(3.0));
                assert_eq!(persona, Some("korean".to_string()));
                assert_eq!(seed, Some(42));
            }
            _ => panic!("Expected Run command"),
        }
    }

    #[test]
    fn test_persona_show() {
        let cli =
            Cli::parse_from(["persona-sim", "persona", "show", "--persona", "indian", "--json"]);
        match cli.command {
            Commands::Persona {
                subcommand: PersonaSubcommand::Show { persona, json, .. },
            } => {
                assert_eq!(persona, Some("indian".to_string()));
                assert!(json);
            }
            _ => panic!("Expected Persona Show command"),
        }
    }

    #[test]
    fn test_verbose_flags() {
        let cli = Cli::parse_from(["persona-sim", "-vv", "version"]);
        assert_eq!(cli.verbose, 2);
        assert!(!cli.quiet);
    }

    #[test]
    fn test_quiet_flag() {
        let cli = Cli::parse_from(["persona-sim", "--quiet", "version"]);
        assert!(cli.quiet);
    }

    #[test]
    fn test_config_show() {
        let cli = Cli::parse_from(["persona-sim", "config", "show"]);
        match cli.command {
            Commands::Config {
                subcommand: ConfigSubcommand::Show { config },
            } => {
                assert!(config.is_none());
            }
            _ => panic!("Expected Config Show command"),
        }
    }

    #[test]
    fn test_config_init() {
        let cli = Cli::parse_from(["persona-sim", "config", "init", "--force"]);
        match cli.command {
            Commands::Config {
                subcommand: ConfigSubcommand::Init { path, force },
            } => {
                assert!(path.is_none());
                assert!(force);
            }
            _ => panic!("Expected Config Init command"),
        }
    }
}
