//! In-memory plugin contents handed to the scanners.
//!
//! Everything here is already read and parsed by a collaborator (see
//! [`crate::loader`]); scanners never touch the filesystem.

use std::path::{Path, PathBuf};

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::frontmatter::DocumentFrontmatter;

/// Plugin manifest, `.claude-plugin/plugin.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PluginManifest {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub author: Option<PluginAuthor>,
    /// Author-declared host surfaces.
    #[serde(default)]
    pub targets: Option<Vec<String>>,
    /// Inline hook config object, or a path relative to the plugin root.
    #[serde(default)]
    pub hooks: Option<Value>,
    /// Inline MCP server map, or a path relative to the plugin root.
    #[serde(default, rename = "mcpServers")]
    pub mcp_servers: Option<Value>,
}

/// Author field can be a string or an object with `name` (and optionally `email`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PluginAuthor {
    Simple(String),
    Object { name: String },
}

impl PluginAuthor {
    pub fn name(&self) -> &str {
        match self {
            Self::Simple(s) => s,
            Self::Object { name } => name,
        }
    }
}

/// A skill, command or agent markdown file.
#[derive(Debug, Clone)]
pub struct InstructionDocument {
    /// Path relative to the plugin root.
    pub path: PathBuf,
    /// Full file text, frontmatter included, so line numbers match the file.
    pub raw: String,
    /// Parsed frontmatter, `None` when absent or malformed.
    pub frontmatter: Option<DocumentFrontmatter>,
}

/// A parsed JSON config (hooks or MCP servers). `None` when unparsable.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub path: PathBuf,
    pub config: Option<Value>,
}

/// Any file in the plugin listing.
#[derive(Debug, Clone)]
pub struct BundleFile {
    pub path: PathBuf,
    /// UTF-8 text for script files within the size limit, `None` otherwise.
    pub contents: Option<String>,
}

impl BundleFile {
    pub fn extension(&self) -> Option<&str> {
        self.path.extension().and_then(|e| e.to_str())
    }
}

/// Everything the engine needs to analyze one plugin.
#[derive(Debug, Clone, Default)]
pub struct PluginBundle {
    pub root: PathBuf,
    pub manifest: Option<PluginManifest>,
    pub documents: Vec<InstructionDocument>,
    pub hook_configs: Vec<ConfigFile>,
    pub mcp_configs: Vec<ConfigFile>,
    pub files: Vec<BundleFile>,
}

impl PluginBundle {
    pub fn new(root: impl Into<PathBuf>, manifest: PluginManifest) -> Self {
        Self {
            root: root.into(),
            manifest: Some(manifest),
            ..Self::default()
        }
    }

    /// Path of the manifest file, relative to the root.
    pub fn manifest_path() -> &'static Path {
        Path::new(".claude-plugin/plugin.json")
    }
}
