//! Config schema types (scan walk limits, batch concurrency, report output).

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PlugcheckConfig {
    pub scan: ScanConfig,
    pub output: OutputConfig,
}

/// How plugin directories are walked and how many are analyzed at once.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// Directory names that are never descended into.
    pub skip_dirs: Vec<String>,
    /// Files above this size are listed but their contents are not read.
    pub max_file_bytes: u64,
    /// Maximum number of plugins analyzed concurrently in a batch.
    pub concurrency: usize,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            skip_dirs: [
                ".git",
                "node_modules",
                ".venv",
                "venv",
                "__pycache__",
                "target",
                "dist",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            max_file_bytes: 1024 * 1024,
            concurrency: 8,
        }
    }
}

impl ScanConfig {
    /// Concurrency clamped to at least one task.
    #[must_use]
    pub fn effective_concurrency(&self) -> usize {
        self.concurrency.max(1)
    }

    /// Whether a directory with this file name should be skipped.
    #[must_use]
    pub fn is_skipped_dir(&self, name: &str) -> bool {
        self.skip_dirs.iter().any(|d| d == name)
    }
}

/// Report rendering format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub format: OutputFormat,
    /// Pretty-print JSON output.
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: OutputFormat::Text,
            pretty: true,
        }
    }
}
