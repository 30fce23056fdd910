//! Compatibility evidence engine for plugin bundles.
//!
//! A plugin bundle (instructions, scripts, hook handlers, MCP server configs)
//! is fed through independent scanners that each emit [`Evidence`]. The
//! aggregator merges all evidence into one [`CompatibilityResult`] with a
//! [`Verdict`] per host surface ([`Target`]), using worst-evidence-wins.

pub mod analyze;
pub mod bundle;
pub mod classifier;
pub mod error;
pub mod evidence;
pub mod frontmatter;
pub mod loader;
pub mod scan;
pub mod verdict;

pub use {
    analyze::{analyze, analyze_dir, analyze_dirs, merge_impacts},
    bundle::PluginBundle,
    error::{Error, Result},
    evidence::{CompatibilityResult, Evidence, EvidenceSource, ScanSummary},
    loader::{BundleLoader, FsBundleLoader},
    verdict::{ImpactVector, Target, Verdict},
};
