//! End-to-end simulation tests
//!
//! Drives whole simulations against mock services and a real output tree,
//! with tokio's clock paused so hours of simulated time pass instantly.

mod common;

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use common::{count_files, SimFixture};
use persona_sim::backend::{MockConfig, MockService, Modality, ServiceRegistry};
use persona_sim::config::{PersonaSpec, SimConfig};
use persona_sim::scheduler::{Outcome, ShutdownSignal};
use persona_sim::simulation::Simulation;

fn persona(id: &str, region: &str, category: &str) -> PersonaSpec {
    PersonaSpec {
        id: id.to_string(),
        region: region.to_string(),
        age_range: [23, 29],
        occupation_category: category.to_string(),
        profile: None,
    }
}

/// Config writing into the fixture: `hours` long, a post every `minutes`
fn config_for(
    fixture: &SimFixture,
    hours: f64,
    minutes: f64,
    personas: Vec<PersonaSpec>,
) -> SimConfig {
    let mut config = SimConfig::with_default_personas();
    config.simulation.duration_hours = hours;
    config.simulation.interval_minutes = minutes;
    config.simulation.poll_interval_secs = 10.0;
    config.simulation.seed = Some(5);
    config.output.dir = fixture.output_dir().display().to_string();
    config.output.staging_dir = fixture.staging_dir().display().to_string();
    config.personas = personas;
    config
}

fn mock(modality: Modality, fixture: &SimFixture, fail_first: u32) -> Arc<MockService> {
    Arc::new(MockService::with_config(
        modality,
        MockConfig {
            fail_first,
            staging_dir: fixture.staging_dir(),
            ..Default::default()
        },
    ))
}

fn mock_registry(fixture: &SimFixture, image_failures: u32) -> ServiceRegistry {
    ServiceRegistry::new(mock(Modality::Text, fixture, 0))
        .with_service(Modality::Image, mock(Modality::Image, fixture, image_failures))
        .with_service(Modality::Audio, mock(Modality::Audio, fixture, 0))
        .with_service(Modality::Video, mock(Modality::Video, fixture, 0))
}

fn read_records(fixture: &SimFixture, persona_id: &str) -> Vec<serde_json::Value> {
    let posts_dir = fixture.output_dir().join(persona_id).join("posts");
    let mut paths: Vec<_> = fs::read_dir(posts_dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect();
    paths.sort();
    paths
        .iter()
        .map(|p| serde_json::from_str(&fs::read_to_string(p).unwrap()).unwrap())
        .collect()
}

// ─────────────────────────────────────────────────────────────────
// Sequential Runs
// ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_run_writes_complete_posts() {
    let fixture = SimFixture::new();
    let config = config_for(&fixture, 0.25, 5.0, vec![persona("indian", "India", "tech")]);
    let simulation = Simulation::with_services(config, mock_registry(&fixture, 0)).unwrap();
    simulation.initialize().await.unwrap();

    let stats = simulation.run(ShutdownSignal::never()).await.unwrap();
    assert_eq!(stats.len(), 1);
    assert_eq!(stats[0].persona_id, "indian");
    assert!(matches!(stats[0].outcome, Outcome::Completed));
    assert_eq!(stats[0].failed_cycles, 0);
    // 15 minutes at one post per 5 minutes
    assert!(stats[0].posts_created >= 2, "posts: {}", stats[0].posts_created);

    let records = read_records(&fixture, "indian");
    assert_eq!(records.len() as u32, stats[0].posts_created);

    let media_dir = fixture.output_dir().join("indian").join("media");
    for record in &records {
        assert_eq!(record["author"], simulation.personas()[0].persona.name.as_str());
        assert_eq!(record["content_type"], "multimodal");
        assert!(!record["content"].as_str().unwrap().is_empty());
        assert!(!record["hashtags"].as_array().unwrap().is_empty());

        for key in ["image_path", "audio_path", "video_path"] {
            let path = record["metadata"][key].as_str().unwrap();
            assert!(path.starts_with(media_dir.to_str().unwrap()), "{} = {}", key, path);
            assert!(std::path::Path::new(path).is_file());
        }
    }

    // Staged artifacts have all been moved into the persona's media dir
    for ext in ["png", "wav", "mp4"] {
        assert_eq!(count_files(&fixture.staging_dir(), ext), 0);
    }
}

#[tokio::test(start_paused = true)]
async fn test_failed_cycle_is_skipped() {
    let fixture = SimFixture::new();
    let config = config_for(&fixture, 0.2, 3.0, vec![persona("korean", "South Korea", "creative")]);
    let simulation = Simulation::with_services(config, mock_registry(&fixture, 1)).unwrap();

    let stats = simulation.run(ShutdownSignal::never()).await.unwrap();
    assert_eq!(stats[0].failed_cycles, 1);
    assert!(stats[0].posts_created >= 2);

    // The failed cycle leaves nothing behind
    assert_eq!(read_records(&fixture, "korean").len() as u32, stats[0].posts_created);
}

#[tokio::test(start_paused = true)]
async fn test_history_carries_into_later_posts() {
    let fixture = SimFixture::new();
    let config = config_for(&fixture, 0.25, 5.0, vec![persona("indian", "India", "tech")]);
    let simulation = Simulation::with_services(config, mock_registry(&fixture, 0)).unwrap();
    simulation.run(ShutdownSignal::never()).await.unwrap();

    // Only the first post starts without history
    let records = read_records(&fixture, "indian");
    let fresh = records
        .iter()
        .filter(|r| !r["content"].as_str().unwrap().contains("Picking up from my last post"))
        .count();
    assert!(records.len() >= 2);
    assert_eq!(fresh, 1);
}

#[tokio::test(start_paused = true)]
async fn test_disabled_media_is_omitted() {
    let fixture = SimFixture::new();
    let config = config_for(&fixture, 0.1, 5.0, vec![persona("indian", "India", "tech")]);
    let registry = ServiceRegistry::new(mock(Modality::Text, &fixture, 0))
        .with_service(Modality::Audio, mock(Modality::Audio, &fixture, 0));
    let simulation = Simulation::with_services(config, registry).unwrap();

    let stats = simulation.run(ShutdownSignal::never()).await.unwrap();
    assert!(stats[0].posts_created >= 1);

    let record = &read_records(&fixture, "indian")[0];
    assert!(record["metadata"]["audio_path"].is_string());
    assert!(record["metadata"]["image_path"].is_null());
    assert!(record["metadata"]["video_path"].is_null());
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_skips_remaining_personas() {
    let fixture = SimFixture::new();
    let config = config_for(
        &fixture,
        24.0,
        5.0,
        vec![persona("indian", "India", "tech"), persona("korean", "South Korea", "creative")],
    );
    let simulation = Simulation::with_services(config, mock_registry(&fixture, 0)).unwrap();

    let (tx, shutdown) = ShutdownSignal::channel();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(20 * 60)).await;
        let _ = tx.send(true);
    });

    let stats = simulation.run(shutdown).await.unwrap();
    assert_eq!(stats.len(), 1);
    assert!(matches!(stats[0].outcome, Outcome::Interrupted));
    assert!(stats[0].posts_created >= 3);
    assert!(!fixture.output_dir().join("korean").exists());
}

// ─────────────────────────────────────────────────────────────────
// Parallel Runs
// ─────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn test_parallel_personas_write_separate_trees() {
    let fixture = SimFixture::new();
    let mut config = config_for(
        &fixture,
        0.25,
        5.0,
        vec![
            persona("indian", "India", "tech"),
            persona("korean", "South Korea", "creative"),
            persona("mumbai", "India", "creative"),
        ],
    );
    config.simulation.parallel = true;
    let simulation = Simulation::with_services(config, mock_registry(&fixture, 0)).unwrap();

    let stats = simulation.run(ShutdownSignal::never()).await.unwrap();
    let ids: Vec<_> = stats.iter().map(|s| s.persona_id.as_str()).collect();
    assert_eq!(ids, vec!["indian", "korean", "mumbai"]);

    for s in &stats {
        assert!(s.posts_created >= 2);
        let records = read_records(&fixture, &s.persona_id);
        assert_eq!(records.len() as u32, s.posts_created);
        let persona = &simulation
            .personas()
            .iter()
            .find(|p| p.id == s.persona_id)
            .unwrap()
            .persona;
        assert!(records.iter().all(|r| r["author"] == persona.name.as_str()));
    }
}
