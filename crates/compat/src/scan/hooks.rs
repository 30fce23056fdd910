//! Command-type lifecycle hook handlers.
//!
//! Accepted shapes (all may be wrapped in a top-level `{"hooks": ...}`):
//!
//! ```text
//! { "SessionStart": [ {"type": "command", "command": "bash init.sh"} ] }
//! { "PreToolUse":   [ {"matcher": "Bash", "hooks": [ {"type": "command", ...} ]} ] }
//! ```

use std::path::Path;

use {
    serde_json::{Map, Value},
    tracing::debug,
};

use crate::{
    bundle::PluginBundle,
    classifier::classify_command,
    evidence::{Evidence, EvidenceSource},
    scan::classified,
};

/// Scan one hook config. Anything that is not the expected shape is skipped.
pub fn scan(config: &Value, path: &Path) -> Vec<Evidence> {
    let Some(events) = events_map(config) else {
        debug!(file = %path.display(), "hook config is not an object");
        return Vec::new();
    };

    let mut evidence = Vec::new();
    for (event, entries) in events {
        let Some(entries) = entries.as_array() else {
            debug!(file = %path.display(), %event, "hook event is not an array");
            continue;
        };
        for entry in entries {
            match entry.get("hooks").and_then(Value::as_array) {
                Some(handlers) => {
                    for handler in handlers {
                        evidence.extend(scan_handler(event, handler, path));
                    }
                },
                None => evidence.extend(scan_handler(event, entry, path)),
            }
        }
    }
    evidence
}

pub fn scan_bundle(bundle: &PluginBundle) -> Vec<Evidence> {
    bundle
        .hook_configs
        .iter()
        .filter_map(|file| file.config.as_ref().map(|cfg| scan(cfg, &file.path)))
        .flatten()
        .collect()
}

fn events_map(config: &Value) -> Option<&Map<String, Value>> {
    match config.get("hooks") {
        Some(Value::Object(inner)) => Some(inner),
        _ => config.as_object(),
    }
}

fn scan_handler(event: &str, handler: &Value, path: &Path) -> Option<Evidence> {
    if handler.get("type").and_then(Value::as_str) != Some("command") {
        return None;
    }
    let command = handler.get("command").and_then(Value::as_str)?.trim();
    let hit = classify_command(command)?;
    classified(
        EvidenceSource::Hook,
        path,
        format!("hook-command: {}", hit.signal),
        format!("{event} hook {} (`{command}`)", hit.detail),
        hit,
    )
}
