//! Evidence aggregation: scanners fan out over a bundle, evidence folds into
//! one [`CompatibilityResult`].

use std::path::{Path, PathBuf};

use {
    futures::{StreamExt, stream},
    tracing::{debug, info},
};

use crate::{
    bundle::PluginBundle,
    error::{Error, Result},
    evidence::{CompatibilityResult, Evidence, ScanSummary},
    loader::BundleLoader,
    scan::{SCANNERS, scripts},
    verdict::ImpactVector,
};

/// Worst-evidence-wins merge. No evidence means compatible everywhere.
pub fn merge_impacts(evidence: &[Evidence]) -> ImpactVector {
    evidence
        .iter()
        .fold(ImpactVector::COMPATIBLE, |acc, ev| acc.merge(ev.impact))
}

/// Analyze one already-loaded plugin.
///
/// Fails only when the bundle has no manifest or the manifest has no name.
/// Content defects were absorbed by the loader and never surface here.
pub fn analyze(bundle: &PluginBundle) -> Result<CompatibilityResult> {
    let manifest = bundle
        .manifest
        .as_ref()
        .filter(|m| !m.name.trim().is_empty())
        .ok_or_else(|| Error::manifest_not_found(&bundle.root))?;

    let mut evidence = Vec::new();
    for (name, scanner) in SCANNERS {
        let found = scanner(bundle);
        debug!(plugin = %manifest.name, scanner = name, count = found.len(), "scanner finished");
        evidence.extend(found);
    }

    let analyzed = merge_impacts(&evidence);
    let summary = ScanSummary {
        total_files: bundle.files.len(),
        skill_files: bundle
            .documents
            .iter()
            .filter(|d| is_skill_file(&d.path))
            .count(),
        script_files: bundle
            .files
            .iter()
            .filter(|f| scripts::is_script(&f.path))
            .count(),
        hook_files: bundle.hook_configs.len(),
        mcp_configs: bundle.mcp_configs.len(),
    };

    info!(
        plugin = %manifest.name,
        evidence = evidence.len(),
        verdict = %analyzed,
        "analyzed plugin"
    );

    Ok(CompatibilityResult {
        plugin: manifest.name.clone(),
        version: manifest.version.clone(),
        declared_targets: manifest.targets.clone(),
        analyzed,
        evidence,
        summary,
    })
}

/// `skills/**/SKILL.md`. Commands and agents are documents but not skills.
fn is_skill_file(path: &Path) -> bool {
    path.starts_with("skills") && path.file_name().is_some_and(|n| n == "SKILL.md")
}

/// Load and analyze one plugin directory.
pub async fn analyze_dir<L: BundleLoader + ?Sized>(
    loader: &L,
    root: &Path,
) -> Result<CompatibilityResult> {
    let bundle = loader.load(root).await?;
    analyze(&bundle)
}

/// Analyze many plugin directories with at most `concurrency` in flight.
///
/// Results come back in input order and one plugin's failure never affects
/// another's result.
pub async fn analyze_dirs<L: BundleLoader + ?Sized>(
    loader: &L,
    roots: &[PathBuf],
    concurrency: usize,
) -> Vec<(PathBuf, Result<CompatibilityResult>)> {
    stream::iter(roots)
        .map(|root| async move { (root.clone(), analyze_dir(loader, root).await) })
        .buffered(concurrency.max(1))
        .collect()
        .await
}
