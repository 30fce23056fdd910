use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::{env_subst::substitute_env, schema::PlugcheckConfig};

/// Standard config file names, checked in order.
const CONFIG_FILENAMES: &[&str] = &[
    "plugcheck.toml",
    "plugcheck.yaml",
    "plugcheck.yml",
    "plugcheck.json",
];

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<PlugcheckConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let raw = substitute_env(&raw);
    parse_config(&raw, path)
}

/// Discover and load config from standard locations.
///
/// Search order:
/// 1. `./plugcheck.{toml,yaml,yml,json}` (project-local)
/// 2. `~/.config/plugcheck/plugcheck.{toml,yaml,yml,json}` (user-global)
///
/// Returns `PlugcheckConfig::default()` if no config file is found.
pub fn discover_and_load() -> PlugcheckConfig {
    match find_config_file(Path::new(".")) {
        Some(path) => load_or_default(Some(&path)),
        None => {
            debug!("no config file found, using defaults");
            PlugcheckConfig::default()
        },
    }
}

/// Load an explicit config file, falling back to defaults when it is absent
/// or broken. `None` means "no file", which is not an error.
pub fn load_or_default(path: Option<&Path>) -> PlugcheckConfig {
    let Some(path) = path else {
        return PlugcheckConfig::default();
    };
    debug!(path = %path.display(), "loading config");
    match load_config(path) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to load config, using defaults");
            PlugcheckConfig::default()
        },
    }
}

/// Find the first config file in `cwd`, then in the user-global config dir.
fn find_config_file(cwd: &Path) -> Option<PathBuf> {
    let local = CONFIG_FILENAMES.iter().map(|name| cwd.join(name));
    let global = config_dir()
        .into_iter()
        .flat_map(|dir| CONFIG_FILENAMES.iter().map(move |name| dir.join(name)));
    local.chain(global).find(|p| p.exists())
}

/// Returns the user-global config directory (`~/.config/plugcheck/`).
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "plugcheck").map(|d| d.config_dir().to_path_buf())
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<PlugcheckConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}
