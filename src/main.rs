//! Persona Sim binary
//!
//! Parses the command line, loads configuration and drives the simulation.

use clap::Parser;
use tracing::{info, warn};

use persona_sim::cli::{Cli, Commands, ConfigSubcommand, PersonaSubcommand};
use persona_sim::config::{self, SimConfig};
use persona_sim::error::{Error, Result};
use persona_sim::logging;
use persona_sim::persona::current_hour;
use persona_sim::scheduler::ShutdownSignal;
use persona_sim::simulation::Simulation;

fn main() {
    // Parse CLI arguments first (before logging, so we know verbosity)
    let cli = Cli::parse();

    if let Err(e) = dispatch(cli) {
        eprint!("{}", e.format_for_terminal());
        std::process::exit(e.exit_code());
    }
}

fn dispatch(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Version => {
            println!("persona-sim {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        Commands::Config { subcommand } => {
            // Config commands use minimal logging
            logging::init_simple(tracing::Level::WARN)?;
            handle_config_command(subcommand)
        }
        Commands::Persona { subcommand } => {
            logging::init_simple(tracing::Level::WARN)?;
            handle_persona_command(subcommand)
        }
        Commands::Run {
            config,
            duration,
            interval,
            persona,
            seed,
        } => {
            let mut cfg = SimConfig::load(config.as_deref())?;
            if let Some(hours) = duration {
                cfg.simulation.duration_hours = hours;
            }
            if let Some(minutes) = interval {
                cfg.simulation.interval_minutes = minutes;
            }
            if let Some(seed) = seed {
                cfg.simulation.seed = Some(seed);
            }
            if let Some(ref id) = persona {
                cfg.retain_persona(id)?;
            }
            cfg.validate()?;

            // The guards must be kept alive for the lifetime of the program
            let _log_guards = logging::init_logging(&cfg.logging, cli.verbose, cli.quiet)?;
            info!(version = env!("CARGO_PKG_VERSION"), "Starting persona-sim");

            run_simulation(cfg)
        }
    }
}

/// Build the runtime and run every persona
fn run_simulation(config: SimConfig) -> Result<()> {
    info!(
        duration_hours = config.simulation.duration_hours,
        interval_minutes = config.simulation.interval_minutes,
        output = %config.output.dir,
        text = %config.services.text,
        image = %config.services.image,
        audio = %config.services.audio,
        video = %config.services.video,
        "Configuration loaded"
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .worker_threads(num_cpus::get().clamp(1, 8))
        .thread_name("persona-sim")
        .build()
        .map_err(|e| Error::Internal(format!("Failed to create async runtime: {}", e)))?;

    runtime.block_on(async_main(config))
}

async fn async_main(config: SimConfig) -> Result<()> {
    let simulation = Simulation::from_config(config)?;
    simulation.initialize().await?;

    // Set up graceful shutdown on Ctrl+C
    let (shutdown_tx, shutdown) = ShutdownSignal::channel();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Shutdown signal received");
                let _ = shutdown_tx.send(true);
            }
            Err(e) => warn!(error = %e, "Could not listen for Ctrl+C"),
        }
    });

    let all_stats = simulation.run(shutdown).await?;

    for stats in &all_stats {
        info!(
            persona = %stats.persona_id,
            posts = stats.posts_created,
            failed = stats.failed_cycles,
            outcome = %stats.outcome,
            elapsed_secs = stats.elapsed.as_secs_f64(),
            "Persona summary"
        );
    }
    info!(
        posts = all_stats.iter().map(|s| s.posts_created).sum::<u32>(),
        output = %simulation.config().output.dir,
        "Simulation complete"
    );
    Ok(())
}

/// Handle persona subcommands
fn handle_persona_command(subcommand: PersonaSubcommand) -> Result<()> {
    match subcommand {
        PersonaSubcommand::Show {
            config,
            persona,
            seed,
            json,
        } => {
            let mut cfg = SimConfig::load(config.as_deref())?;
            if let Some(seed) = seed {
                cfg.simulation.seed = Some(seed);
            }
            if let Some(ref id) = persona {
                cfg.retain_persona(id)?;
            }
            let simulation = Simulation::from_config(cfg)?;

            if json {
                let profiles: serde_json::Map<String, serde_json::Value> = simulation
                    .personas()
                    .iter()
                    .map(|p| Ok((p.id.clone(), serde_json::to_value(&p.persona)?)))
                    .collect::<Result<_>>()?;
                println!("{}", serde_json::to_string_pretty(&profiles)?);
                return Ok(());
            }

            let hour = current_hour();
            for entry in simulation.personas() {
                let p = &entry.persona;
                println!("{}", "=".repeat(50));
                println!("Persona:          {} ({})", p.name, entry.id);
                println!("Location:         {}", p.location);
                println!("Age:              {}", p.age);
                println!("Occupation:       {}", p.occupation);
                println!("Personality:      {}", p.personality_traits.join(", "));
                println!("Interests:        {}", p.interests.join(", "));
                println!("Topics:           {}", p.content_preferences.topics.join(", "));
                println!("Formats:          {}", p.content_preferences.formats.join(", "));
                println!("Current activity: {}", p.activity_at(hour));
            }
        }
    }

    Ok(())
}

/// Handle configuration subcommands
fn handle_config_command(subcommand: ConfigSubcommand) -> Result<()> {
    match subcommand {
        ConfigSubcommand::Show { config } => {
            let cfg = SimConfig::load(config.as_deref())?;
            println!("{}", toml::to_string_pretty(&cfg)?);
        }
        ConfigSubcommand::Init { path, force } => {
            let written = config::init_config(path.as_deref(), force)?;
            println!("Configuration written to {}", written.display());
        }
        ConfigSubcommand::Validate { config } => {
            SimConfig::load(config.as_deref())?;
            println!("Configuration is valid.");
        }
    }

    Ok(())
}
