//! Filesystem collaborator: reads a plugin directory into a [`PluginBundle`].
//!
//! Layout recognised (Claude Code plugin format):
//!
//! ```text
//! <root>/
//!   .claude-plugin/plugin.json   manifest (fallback: plugin.json)
//!   skills/**/SKILL.md           instruction documents
//!   commands/**/*.md
//!   agents/**/*.md
//!   hooks/hooks.json             hook config
//!   .mcp.json                    MCP server config
//! ```
//!
//! Content defects (unreadable files, bad JSON) are logged and absorbed. Only
//! an unparsable manifest is an error here; a missing one is left for the
//! aggregator to reject.

use std::path::{Component, Path, PathBuf};

use {
    async_trait::async_trait,
    plugcheck_config::ScanConfig,
    serde_json::Value,
    tracing::{debug, warn},
    walkdir::WalkDir,
};

use crate::{
    bundle::{BundleFile, ConfigFile, InstructionDocument, PluginBundle, PluginManifest},
    error::{Context, Error, Result},
    frontmatter,
    scan::scripts,
};

const MANIFEST_CANDIDATES: &[&str] = &[".claude-plugin/plugin.json", "plugin.json"];
const DOCUMENT_DIRS: &[&str] = &["skills", "commands", "agents"];
const HOOKS_FILE: &str = "hooks/hooks.json";
const MCP_FILE: &str = ".mcp.json";

/// Reads a plugin root into memory.
#[async_trait]
pub trait BundleLoader: Send + Sync {
    async fn load(&self, root: &Path) -> Result<PluginBundle>;
}

/// [`BundleLoader`] backed by the local filesystem.
#[derive(Debug, Clone, Default)]
pub struct FsBundleLoader {
    config: ScanConfig,
}

impl FsBundleLoader {
    pub fn new(config: ScanConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl BundleLoader for FsBundleLoader {
    async fn load(&self, root: &Path) -> Result<PluginBundle> {
        let root = root.to_path_buf();
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || load_blocking(&root, &config)).await?
    }
}

fn load_blocking(root: &Path, config: &ScanConfig) -> Result<PluginBundle> {
    let manifest = read_manifest(root)?;
    let listing = walk(root, config);
    debug!(root = %root.display(), files = listing.len(), "walked plugin directory");

    let mut bundle = PluginBundle {
        root: root.to_path_buf(),
        manifest: None,
        ..PluginBundle::default()
    };

    for rel in listing {
        let abs = root.join(&rel);

        if is_document(&rel) {
            if let Some(raw) = read_text(&abs, config.max_file_bytes) {
                let frontmatter = frontmatter::parse(&raw, &rel);
                bundle.documents.push(InstructionDocument {
                    path: rel.clone(),
                    raw,
                    frontmatter,
                });
            }
        } else if rel == Path::new(HOOKS_FILE) {
            bundle
                .hook_configs
                .push(read_config(root, &rel, config.max_file_bytes));
        } else if rel == Path::new(MCP_FILE) {
            bundle
                .mcp_configs
                .push(read_config(root, &rel, config.max_file_bytes));
        }

        let contents = if scripts::is_script(&rel) {
            read_text(&abs, config.max_file_bytes)
        } else {
            None
        };
        bundle.files.push(BundleFile {
            path: rel,
            contents,
        });
    }

    if let Some((manifest_rel, manifest)) = manifest {
        if let Some(hooks) = &manifest.hooks
            && let Some(cfg) = manifest_section(root, &manifest_rel, hooks, HOOKS_FILE, config)
        {
            bundle.hook_configs.push(cfg);
        }
        if let Some(servers) = &manifest.mcp_servers
            && let Some(cfg) = manifest_section(root, &manifest_rel, servers, MCP_FILE, config)
        {
            bundle.mcp_configs.push(cfg);
        }
        bundle.manifest = Some(manifest);
    }

    Ok(bundle)
}

/// Locate and parse the manifest. `Ok(None)` when there is none.
fn read_manifest(root: &Path) -> Result<Option<(PathBuf, PluginManifest)>> {
    let Some(rel) = MANIFEST_CANDIDATES
        .iter()
        .map(PathBuf::from)
        .find(|rel| root.join(rel).is_file())
    else {
        return Ok(None);
    };

    let path = root.join(&rel);
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let manifest: PluginManifest =
        serde_json::from_str(&raw).map_err(|e| Error::invalid_manifest(&path, e.to_string()))?;
    Ok(Some((rel, manifest)))
}

/// Sorted relative paths of every file under `root`, honouring `skip_dirs`.
fn walk(root: &Path, config: &ScanConfig) -> Vec<PathBuf> {
    let mut files = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| {
            !(e.depth() > 0
                && e.file_type().is_dir()
                && e.file_name()
                    .to_str()
                    .is_some_and(|name| config.is_skipped_dir(name)))
        });

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!(root = %root.display(), error = %e, "skipping unreadable entry");
                continue;
            },
        };
        if !entry.file_type().is_file() {
            continue;
        }
        if let Ok(rel) = entry.path().strip_prefix(root) {
            files.push(rel.to_path_buf());
        }
    }
    files
}

fn is_document(rel: &Path) -> bool {
    let top_level = rel
        .components()
        .next()
        .and_then(|c| c.as_os_str().to_str())
        .is_some_and(|first| DOCUMENT_DIRS.contains(&first));
    top_level && rel.extension().and_then(|e| e.to_str()) == Some("md")
}

/// Read a UTF-8 file within the size limit. Failures are logged and absorbed.
fn read_text(path: &Path, max_bytes: u64) -> Option<String> {
    match std::fs::metadata(path) {
        Ok(meta) if meta.len() > max_bytes => {
            debug!(path = %path.display(), size = meta.len(), "file exceeds size limit, not read");
            return None;
        },
        Ok(_) => {},
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to stat file");
            return None;
        },
    }
    match std::fs::read_to_string(path) {
        Ok(text) => Some(text),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read file");
            None
        },
    }
}

fn read_config(root: &Path, rel: &Path, max_bytes: u64) -> ConfigFile {
    let config = read_text(&root.join(rel), max_bytes).and_then(|raw| {
        serde_json::from_str::<Value>(&raw)
            .map_err(|e| warn!(path = %rel.display(), error = %e, "ignoring malformed config"))
            .ok()
    });
    ConfigFile {
        path: rel.to_path_buf(),
        config,
    }
}

/// Resolve an inline-or-path manifest section (`hooks`, `mcpServers`).
///
/// Paths that point at the conventional file already picked up by the walk
/// are skipped so the same config is not scanned twice.
fn manifest_section(
    root: &Path,
    manifest_rel: &Path,
    value: &Value,
    conventional: &str,
    config: &ScanConfig,
) -> Option<ConfigFile> {
    match value {
        Value::Object(_) => Some(ConfigFile {
            path: manifest_rel.to_path_buf(),
            config: Some(value.clone()),
        }),
        Value::String(rel) => {
            let rel = normalize_relative(rel)?;
            if rel == Path::new(conventional) {
                return None;
            }
            Some(read_config(root, &rel, config.max_file_bytes))
        },
        other => {
            warn!(path = %manifest_rel.display(), value = %other, "ignoring unsupported manifest section");
            None
        },
    }
}

/// Strip `./` and reject paths that would leave the plugin root.
fn normalize_relative(raw: &str) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in Path::new(raw).components() {
        match component {
            Component::CurDir => {},
            Component::Normal(part) => out.push(part),
            _ => {
                warn!(path = raw, "ignoring manifest path outside the plugin root");
                return None;
            },
        }
    }
    (!out.as_os_str().is_empty()).then_some(out)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    fn write(root: &Path, rel: &str, contents: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, contents).unwrap();
    }

    #[test]
    fn missing_manifest_is_not_a_load_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "README.md", "hello");
        let bundle = load_blocking(tmp.path(), &ScanConfig::default()).unwrap();
        assert!(bundle.manifest.is_none());
        assert_eq!(bundle.files.len(), 1);
    }

    #[test]
    fn broken_manifest_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), ".claude-plugin/plugin.json", "{not json");
        let err = load_blocking(tmp.path(), &ScanConfig::default()).unwrap_err();
        assert!(matches!(err, Error::InvalidManifest { .. }));
    }

    #[test]
    fn collects_documents_configs_and_scripts() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(root, ".claude-plugin/plugin.json", r#"{"name":"demo"}"#);
        write(root, "skills/report/SKILL.md", "---\nname: report\n---\nbody\n");
        write(root, "commands/run.md", "run it\n");
        write(root, "docs/guide.md", "not an instruction document\n");
        write(root, "hooks/hooks.json", r#"{"hooks":{}}"#);
        write(root, ".mcp.json", "{broken");
        write(root, "scripts/run.py", "import os\n");
        write(root, "node_modules/left-pad/index.js", "module.exports = 1;\n");

        let bundle = load_blocking(root, &ScanConfig::default()).unwrap();
        assert_eq!(bundle.manifest.as_ref().unwrap().name, "demo");

        let docs: Vec<_> = bundle.documents.iter().map(|d| d.path.clone()).collect();
        assert_eq!(
            docs,
            vec![
                PathBuf::from("commands/run.md"),
                PathBuf::from("skills/report/SKILL.md")
            ]
        );
        assert!(bundle.documents[1].frontmatter.is_some());

        assert_eq!(bundle.hook_configs.len(), 1);
        assert!(bundle.hook_configs[0].config.is_some());
        assert_eq!(bundle.mcp_configs.len(), 1);
        assert!(bundle.mcp_configs[0].config.is_none());

        let script = bundle
            .files
            .iter()
            .find(|f| f.path == Path::new("scripts/run.py"))
            .unwrap();
        assert_eq!(script.contents.as_deref(), Some("import os\n"));
        assert!(
            bundle
                .files
                .iter()
                .all(|f| !f.path.starts_with("node_modules"))
        );
    }

    #[test]
    fn manifest_sections_inline_and_by_path() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write(
            root,
            ".claude-plugin/plugin.json",
            r#"{"name":"demo","hooks":"./config/hooks.json","mcpServers":{"db":{"command":"uvx"}}}"#,
        );
        write(root, "config/hooks.json", r#"{"Stop":[]}"#);

        let bundle = load_blocking(root, &ScanConfig::default()).unwrap();
        assert_eq!(bundle.hook_configs.len(), 1);
        assert_eq!(bundle.hook_configs[0].path, Path::new("config/hooks.json"));
        assert_eq!(bundle.mcp_configs.len(), 1);
        assert_eq!(
            bundle.mcp_configs[0].path,
            Path::new(".claude-plugin/plugin.json")
        );
    }

    #[test]
    fn oversized_scripts_are_listed_but_not_read() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "plugin.json", r#"{"name":"demo"}"#);
        write(tmp.path(), "big.py", &"x = 1\n".repeat(100));
        let config = ScanConfig {
            max_file_bytes: 16,
            ..ScanConfig::default()
        };
        let bundle = load_blocking(tmp.path(), &config).unwrap();
        let big = bundle
            .files
            .iter()
            .find(|f| f.path == Path::new("big.py"))
            .unwrap();
        assert!(big.contents.is_none());
    }

    #[test]
    fn rejects_escaping_paths() {
        assert_eq!(normalize_relative("./a/b.json"), Some(PathBuf::from("a/b.json")));
        assert_eq!(normalize_relative("../outside.json"), None);
        assert_eq!(normalize_relative("/etc/passwd"), None);
    }

    #[tokio::test]
    async fn async_loader_matches_blocking() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "plugin.json", r#"{"name":"demo","version":"0.2.0"}"#);
        let bundle = FsBundleLoader::default().load(tmp.path()).await.unwrap();
        assert_eq!(
            bundle.manifest.unwrap().version.as_deref(),
            Some("0.2.0")
        );
    }
}
