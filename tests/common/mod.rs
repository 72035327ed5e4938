//! Common test utilities and fixtures
//!
//! Shared config fixtures written into temporary directories.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use tempfile::TempDir;

/// Get a command for the persona-sim binary
pub fn sim_cmd() -> assert_cmd::Command {
    assert_cmd::Command::cargo_bin("persona-sim").unwrap()
}

/// Temporary workspace holding a config file and an output tree
pub struct SimFixture {
    pub temp_dir: TempDir,
    pub config_path: PathBuf,
}

impl SimFixture {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("persona-sim.toml");
        Self { temp_dir, config_path }
    }

    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn output_dir(&self) -> PathBuf {
        self.root().join("output")
    }

    pub fn staging_dir(&self) -> PathBuf {
        self.root().join("staging")
    }

    pub fn write_config(&self, content: &str) {
        fs::write(&self.config_path, content).unwrap();
    }

    /// Write a config whose output and staging dirs point into the fixture
    pub fn write_with_paths(&self, body: &str) {
        let content = format!(
            "[output]\ndir = {:?}\nstaging_dir = {:?}\n\n{}",
            self.output_dir().display().to_string(),
            self.staging_dir().display().to_string(),
            body
        );
        self.write_config(&content);
    }

    pub fn path(&self) -> &str {
        self.config_path.to_str().unwrap()
    }
}

/// Single Indian tech persona used by most fixtures
pub const ONE_PERSONA: &str = r#"
[[personas]]
id = "indian"
region = "India"
age_range = [23, 28]
occupation_category = "tech"
"#;

/// Count files with the given extension directly inside `dir`
pub fn count_files(dir: &Path, ext: &str) -> usize {
    match fs::read_dir(dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok())
            .filter(|e| e.path().extension().map_or(false, |x| x == ext))
            .count(),
        Err(_) => 0,
    }
}
