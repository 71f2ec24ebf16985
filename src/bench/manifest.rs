//! Test manifest consumed by the harness.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::Config;
use crate::error::{BenchError, BenchResult};

/// Harness test type for a load benchmark
pub const TEST_TYPE: &str = "load";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub id: String,
    /// Path of the PDF copy as the harness sees it
    pub file: String,
    pub md5: String,
    pub rounds: u32,
    pub last_page: u32,
    #[serde(rename = "type")]
    pub kind: String,
}

impl ManifestEntry {
    pub fn for_pdf(pdf_name: &str, config: &Config, rounds: u32, last_page: u32) -> Self {
        let root = config.container_root.trim_end_matches('/');
        let results = config.results_dir.trim_matches('/');
        Self {
            id: pdf_name.to_string(),
            file: format!("{root}/{results}/{pdf_name}/{pdf_name}"),
            md5: config.checksum.clone(),
            rounds,
            last_page,
            kind: TEST_TYPE.to_string(),
        }
    }
}

/// Write the manifest as a JSON array.
pub fn write_manifest(path: &Path, entries: &[ManifestEntry]) -> BenchResult<()> {
    let json = serde_json::to_string_pretty(entries)
        .map_err(|e| BenchError::io("serialize manifest for", path, e.into()))?;
    fs::write(path, json).map_err(|e| BenchError::io("write manifest", path, e))
}
