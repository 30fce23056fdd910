//! Author-asserted metadata: manifest `targets` and frontmatter
//! `allowed-tools`.
//!
//! This evidence merges like any other. A plugin declaring `desktop` still
//! ends up incompatible there if one of its scripts is.

use std::path::Path;

use tracing::warn;

use crate::{
    bundle::{PluginBundle, PluginManifest},
    evidence::{Evidence, EvidenceSource},
    frontmatter::DocumentFrontmatter,
    verdict::{ImpactVector, Target, Verdict},
};

/// Evidence for the manifest's `targets` list.
///
/// Declared targets are compatible, omitted ones need review. An absent,
/// empty or entirely unrecognized list yields nothing.
pub fn scan_manifest(manifest: &PluginManifest, path: &Path) -> Option<Evidence> {
    let declared = manifest.targets.as_ref()?;

    let mut targets = Vec::new();
    for name in declared {
        match name.parse::<Target>() {
            Ok(target) => targets.push(target),
            Err(_) => warn!(
                plugin = %manifest.name,
                target = %name,
                "ignoring unknown declared target"
            ),
        }
    }
    if targets.is_empty() {
        warn!(plugin = %manifest.name, "no recognized targets declared");
        return None;
    }

    let impact = Target::ALL.into_iter().fold(ImpactVector::COMPATIBLE, |acc, t| {
        if targets.contains(&t) {
            acc
        } else {
            acc.with(t, Verdict::NeedsReview)
        }
    });
    let (listed, omitted): (Vec<Target>, Vec<Target>) =
        Target::ALL.into_iter().partition(|t| targets.contains(t));

    let mut detail = format!("author declares {}", join(&listed));
    if !omitted.is_empty() {
        detail.push_str(&format!("; {} not declared", join(&omitted)));
    }
    Some(Evidence::new(
        EvidenceSource::Declaration,
        path,
        "declared-targets",
        detail,
        impact,
    ))
}

/// Evidence for a document's `allowed-tools` frontmatter.
pub fn scan_frontmatter(frontmatter: &DocumentFrontmatter, path: &Path) -> Option<Evidence> {
    let entries = frontmatter.allowed_tools.as_ref()?.entries();
    if entries.is_empty() {
        return None;
    }

    let shell: Vec<&str> = entries
        .iter()
        .map(String::as_str)
        .filter(|e| is_bash_tool(e))
        .collect();
    let (impact, detail) = if shell.is_empty() {
        (
            ImpactVector::COMPATIBLE,
            format!("pre-approves {}", entries.join(", ")),
        )
    } else {
        (
            ImpactVector::DESKTOP_REVIEW,
            format!("pre-approves shell access ({})", shell.join(", ")),
        )
    };
    Some(Evidence::new(
        EvidenceSource::Frontmatter,
        path,
        "allowed-tools",
        detail,
        impact,
    ))
}

pub fn scan_bundle(bundle: &PluginBundle) -> Vec<Evidence> {
    let manifest = bundle
        .manifest
        .as_ref()
        .and_then(|m| scan_manifest(m, PluginBundle::manifest_path()));
    let documents = bundle.documents.iter().filter_map(|doc| {
        doc.frontmatter
            .as_ref()
            .and_then(|fm| scan_frontmatter(fm, &doc.path))
    });
    manifest.into_iter().chain(documents).collect()
}

fn is_bash_tool(entry: &str) -> bool {
    entry == "Bash" || (entry.starts_with("Bash(") && entry.ends_with(')'))
}

fn join(targets: &[Target]) -> String {
    targets
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {rstest::rstest, std::path::PathBuf};

    use super::*;
    use crate::{bundle::InstructionDocument, frontmatter::AllowedTools};

    fn manifest(targets: Option<&[&str]>) -> PluginManifest {
        PluginManifest {
            name: "demo".into(),
            targets: targets.map(|t| t.iter().map(|s| s.to_string()).collect()),
            ..PluginManifest::default()
        }
    }

    fn tools(inline: &str) -> DocumentFrontmatter {
        DocumentFrontmatter {
            allowed_tools: Some(AllowedTools::Inline(inline.into())),
            ..DocumentFrontmatter::default()
        }
    }

    #[test]
    fn declared_targets_are_compatible_and_omitted_need_review() {
        let ev = scan_manifest(&manifest(Some(&["desktop", "Code"])), Path::new("p.json")).unwrap();
        assert_eq!(ev.signal, "declared-targets");
        assert_eq!(ev.source, EvidenceSource::Declaration);
        assert!(ev.line.is_none());
        assert_eq!(ev.impact.get(Target::Desktop), Verdict::Compatible);
        assert_eq!(ev.impact.get(Target::Cowork), Verdict::NeedsReview);
        assert_eq!(ev.impact.get(Target::Code), Verdict::Compatible);
        assert!(ev.detail.contains("cowork not declared"));
    }

    #[test]
    fn all_targets_declared_is_fully_compatible() {
        let ev = scan_manifest(
            &manifest(Some(&["desktop", "cowork", "code", "mobile"])),
            Path::new("p.json"),
        )
        .unwrap();
        assert!(ev.impact.is_compatible());
    }

    #[rstest]
    #[case(None)]
    #[case(Some(&[][..]))]
    #[case(Some(&["mobile", "web"][..]))]
    fn nothing_recognizable_yields_no_evidence(#[case] targets: Option<&[&str]>) {
        assert!(scan_manifest(&manifest(targets), Path::new("p.json")).is_none());
    }

    #[rstest]
    #[case("Read, Grep, Glob", ImpactVector::COMPATIBLE)]
    #[case("Read Bash", ImpactVector::DESKTOP_REVIEW)]
    #[case("Bash(git add:*), Read", ImpactVector::DESKTOP_REVIEW)]
    #[case("BashOutput, Read", ImpactVector::COMPATIBLE)]
    fn allowed_tools_impact(#[case] inline: &str, #[case] expected: ImpactVector) {
        let ev = scan_frontmatter(&tools(inline), Path::new("SKILL.md")).unwrap();
        assert_eq!(ev.signal, "allowed-tools");
        assert_eq!(ev.impact, expected);
    }

    #[test]
    fn missing_or_empty_allowed_tools() {
        let path = Path::new("SKILL.md");
        assert!(scan_frontmatter(&DocumentFrontmatter::default(), path).is_none());
        assert!(scan_frontmatter(&tools("  , "), path).is_none());
    }

    #[test]
    fn bundle_orders_manifest_before_documents() {
        let mut bundle = PluginBundle::new("/tmp/demo", manifest(Some(&["code"])));
        bundle.documents = vec![
            InstructionDocument {
                path: PathBuf::from("skills/a/SKILL.md"),
                raw: String::new(),
                frontmatter: Some(tools("Bash")),
            },
            InstructionDocument {
                path: PathBuf::from("commands/b.md"),
                raw: String::new(),
                frontmatter: None,
            },
        ];
        let ev = scan_bundle(&bundle);
        assert_eq!(ev.len(), 2);
        assert_eq!(ev[0].file, PluginBundle::manifest_path());
        assert_eq!(ev[1].file, PathBuf::from("skills/a/SKILL.md"));
    }
}
