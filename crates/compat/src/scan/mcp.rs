//! MCP server launch commands.
//!
//! Only the executable is classified, never the arguments: `node server.js`
//! is a node server no matter what the script does.

use std::path::Path;

use {
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::{
    bundle::PluginBundle,
    classifier::classify_command_binary,
    evidence::{Evidence, EvidenceSource},
    scan::classified,
};

/// Scan an MCP config, either `{"mcpServers": {...}}` or a bare server map.
pub fn scan(config: &Value, path: &Path) -> Vec<Evidence> {
    let Some(servers) = servers_map(config) else {
        debug!(file = %path.display(), "mcp config is not an object");
        return Vec::new();
    };

    servers
        .iter()
        .filter_map(|(name, server)| scan_server(name, server, path))
        .collect()
}

pub fn scan_bundle(bundle: &PluginBundle) -> Vec<Evidence> {
    bundle
        .mcp_configs
        .iter()
        .filter_map(|file| file.config.as_ref().map(|cfg| scan(cfg, &file.path)))
        .flatten()
        .collect()
}

fn servers_map(config: &Value) -> Option<&Map<String, Value>> {
    match config.get("mcpServers") {
        Some(Value::Object(inner)) => Some(inner),
        _ => config.as_object(),
    }
}

fn scan_server(name: &str, server: &Value, path: &Path) -> Option<Evidence> {
    let Some(command) = server.get("command").and_then(Value::as_str) else {
        debug!(file = %path.display(), server = name, "mcp server has no command, skipping");
        return None;
    };
    let binary = binary_name(command);
    let hit = classify_command_binary(binary)?;

    let args: Vec<&str> = server
        .get("args")
        .and_then(Value::as_array)
        .map(|a| a.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    let invocation = if args.is_empty() {
        command.to_string()
    } else {
        format!("{command} {}", args.join(" "))
    };

    classified(
        EvidenceSource::McpServer,
        path,
        format!("mcp-server: {}", hit.signal),
        format!("server `{name}` {} (`{invocation}`)", hit.detail),
        hit,
    )
}

/// Executable name of a command: last path component, `.exe` stripped.
fn binary_name(command: &str) -> &str {
    let command = command.trim();
    let base = command.rsplit(['/', '\\']).next().unwrap_or(command);
    base.strip_suffix(".exe").unwrap_or(base)
}
