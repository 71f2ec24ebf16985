use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE: &str = ".pdfbenchrc.json";

/// Checksum written into every manifest; the harness does not verify it for
/// load tests.
pub const PLACEHOLDER_CHECKSUM: &str = "09a41b9a759d60c698228224ab85b46d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Interpreter used for the harness and the comparator
    #[serde(default = "default_python")]
    pub python: String,

    /// Version control executable
    #[serde(default = "default_git")]
    pub git: String,

    /// Harness entry point, relative to the test directory
    #[serde(default = "default_harness")]
    pub harness: String,

    /// Browser manifest passed to the harness
    #[serde(default = "default_browser_manifest")]
    pub browser_manifest: String,

    /// Statistics comparator, relative to the test directory
    #[serde(default = "default_comparator")]
    pub comparator: String,

    /// Parent of the per-PDF workspaces, relative to the test directory
    #[serde(default = "default_results_dir")]
    pub results_dir: String,

    /// Where the test directory is mounted for the harness
    #[serde(default = "default_container_root")]
    pub container_root: String,

    #[serde(default = "default_checksum")]
    pub checksum: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            python: default_python(),
            git: default_git(),
            harness: default_harness(),
            browser_manifest: default_browser_manifest(),
            comparator: default_comparator(),
            results_dir: default_results_dir(),
            container_root: default_container_root(),
            checksum: default_checksum(),
        }
    }
}

impl Config {
    /// Load `.pdfbenchrc.json` from the test directory, falling back to
    /// defaults when the file is absent.
    pub fn load_from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: Config = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }
}

fn default_python() -> String {
    "python".to_string()
}

fn default_git() -> String {
    "git".to_string()
}

fn default_harness() -> String {
    "test.py".to_string()
}

fn default_browser_manifest() -> String {
    "resources/browser_manifests/browser_manifest.json".to_string()
}

fn default_comparator() -> String {
    "stats/statcmp.py".to_string()
}

fn default_results_dir() -> String {
    "stats/results".to_string()
}

fn default_container_root() -> String {
    "/test".to_string()
}

fn default_checksum() -> String {
    PLACEHOLDER_CHECKSUM.to_string()
}
