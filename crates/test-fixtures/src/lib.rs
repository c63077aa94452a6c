//! Test fixture loader and mock collaborators shared by every crate's tests.
//!
//! JSON fixtures live in the workspace-level `test-fixtures/` directory:
//! `knowledge/` (chunks), `rules/` (structured rules), `scenarios/`
//! (scripted end-to-end decisions).

pub mod mocks;

use std::path::PathBuf;

use levy_core::config::LevyConfig;
use levy_core::models::{ChunkMatch, KnowledgeChunk};
use levy_core::StructuredRule;
use serde::de::DeserializeOwned;
use serde::Deserialize;

/// Root directory of the fixture data.
pub fn fixtures_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let mut path = PathBuf::from(&manifest_dir);

    // The fixture crate itself is also named test-fixtures; look for the data dir.
    while !path.join("test-fixtures").join("knowledge").exists() {
        if !path.pop() {
            panic!(
                "Could not find test-fixtures directory from CARGO_MANIFEST_DIR={}",
                manifest_dir
            );
        }
    }
    path.join("test-fixtures")
}

/// Load and deserialize a JSON fixture file.
///
/// # Panics
/// Panics if the file doesn't exist or can't be deserialized.
pub fn load_fixture<T: DeserializeOwned>(relative_path: &str) -> T {
    let path = fixtures_root().join(relative_path);
    let content = std::fs::read_to_string(&path)
        .unwrap_or_else(|e| panic!("Failed to read fixture {}: {}", path.display(), e));
    serde_json::from_str(&content)
        .unwrap_or_else(|e| panic!("Failed to parse fixture {}: {}", path.display(), e))
}

/// Get the absolute path to a fixture file.
pub fn fixture_path(relative_path: &str) -> PathBuf {
    fixtures_root().join(relative_path)
}

/// The tax knowledge corpus.
pub fn knowledge_chunks() -> Vec<KnowledgeChunk> {
    load_fixture("knowledge/chunks.json")
}

/// A chunk from the corpus by id.
///
/// # Panics
/// Panics if no chunk has that id.
pub fn chunk(id: &str) -> KnowledgeChunk {
    knowledge_chunks()
        .into_iter()
        .find(|c| c.id == id)
        .unwrap_or_else(|| panic!("no fixture chunk {id}"))
}

/// A scored match for fixture chunk `id`.
pub fn chunk_match(id: &str, score: f64) -> ChunkMatch {
    ChunkMatch {
        chunk: chunk(id),
        score,
    }
}

/// Structured rules keyed by category.
pub fn rules() -> Vec<StructuredRule> {
    load_fixture("rules/rules.json")
}

/// Config with millisecond backoff so retry tests stay fast on a real clock.
pub fn fast_config() -> LevyConfig {
    let mut config = LevyConfig::default();
    config.resilience.initial_backoff_ms = 1;
    config.resilience.timeout_ms = 2_000;
    config
}

/// One scripted end-to-end decision from `scenarios/`.
#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub query: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub cached_confidence: Option<f64>,
    pub expected_action: String,
    #[serde(default)]
    pub expected_citations: Vec<String>,
}

pub fn scenarios() -> Vec<Scenario> {
    load_fixture("scenarios/decisions.json")
}
