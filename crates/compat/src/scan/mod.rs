//! Evidence scanners.
//!
//! Each scanner is a pure function over one class of parsed input. The
//! `scan_bundle` adapters lift them to a whole [`PluginBundle`]; [`SCANNERS`]
//! is the order in which the aggregator runs them, which is also the order of
//! the final evidence list.

pub mod code_block;
pub mod declaration;
pub mod hooks;
pub mod mcp;
pub mod scripts;

use std::path::Path;

use {regex::Regex, tracing::debug};

use crate::{
    bundle::PluginBundle,
    classifier::Classification,
    evidence::{Evidence, EvidenceSource},
};

/// A bundle-level scanner.
pub type ScanFn = fn(&PluginBundle) -> Vec<Evidence>;

/// Scanners in evidence order. Adding an evidence source means adding one
/// entry here.
pub const SCANNERS: &[(&str, ScanFn)] = &[
    ("declaration", declaration::scan_bundle),
    ("code-block", code_block::scan_bundle),
    ("script", scripts::scan_bundle),
    ("script-import", scripts::scan_imports_bundle),
    ("hook", hooks::scan_bundle),
    ("mcp-server", mcp::scan_bundle),
];

/// Turn a classifier hit into evidence, dropping hits that are compatible
/// everywhere.
pub(crate) fn classified(
    source: EvidenceSource,
    file: &Path,
    signal: String,
    detail: String,
    hit: Classification,
) -> Option<Evidence> {
    if hit.impact.is_compatible() {
        debug!(file = %file.display(), %signal, "compatible match, no evidence");
        return None;
    }
    Some(Evidence::new(source, file, signal, detail, hit.impact))
}

/// Compile a built-in pattern, logging instead of panicking on failure.
pub(crate) fn compile(pattern: &str) -> Option<Regex> {
    Regex::new(pattern)
        .map_err(|e| tracing::error!(pattern, error = %e, "invalid built-in pattern"))
        .ok()
}
