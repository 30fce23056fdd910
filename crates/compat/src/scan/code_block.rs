//! Fenced shell blocks in skill, command and agent documents.

use std::path::Path;

use crate::{
    bundle::PluginBundle,
    classifier::classify_command,
    evidence::{Evidence, EvidenceSource},
    scan::classified,
};

/// Info-string tags whose blocks are treated as runnable shell.
const EXECUTABLE_TAGS: &[&str] = &["", "bash", "sh", "shell", "zsh", "console"];

struct Fence {
    marker: char,
    len: usize,
    tag: String,
}

/// Scan one document. `text` is the full file so line numbers are exact.
pub fn scan(text: &str, path: &Path) -> Vec<Evidence> {
    let mut evidence = Vec::new();
    let mut open: Option<Fence> = None;

    for (idx, line) in text.lines().enumerate() {
        let line_no = idx + 1;

        if open.as_ref().is_some_and(|fence| is_closing_fence(line, fence)) {
            open = None;
            continue;
        }

        let Some(fence) = &open else {
            open = opening_fence(line);
            continue;
        };
        if !is_executable(&fence.tag) {
            continue;
        }
        let Some(command) = command_text(line) else {
            continue;
        };
        let Some(hit) = classify_command(command) else {
            continue;
        };
        let tag = if fence.tag.is_empty() {
            "untagged"
        } else {
            fence.tag.as_str()
        };
        let detail = format!("{} (`{command}` in {tag} code block)", hit.detail);
        if let Some(ev) = classified(
            EvidenceSource::CodeBlock,
            path,
            hit.signal.to_string(),
            detail,
            hit,
        ) {
            evidence.push(ev.at_line(line_no));
        }
    }

    evidence
}

pub fn scan_bundle(bundle: &PluginBundle) -> Vec<Evidence> {
    bundle
        .documents
        .iter()
        .flat_map(|doc| scan(&doc.raw, &doc.path))
        .collect()
}

/// Strip fence indentation. Fences nested in list items sit deeper than the
/// three spaces a top-level fence allows, so any leading whitespace is accepted.
fn strip_indent(line: &str) -> &str {
    line.trim_start_matches([' ', '\t'])
}

fn opening_fence(line: &str) -> Option<Fence> {
    let rest = strip_indent(line);
    let marker = rest.chars().next().filter(|c| *c == '`' || *c == '~')?;
    let len = rest.chars().take_while(|c| *c == marker).count();
    if len < 3 {
        return None;
    }
    let info = rest[len..].trim();
    if marker == '`' && info.contains('`') {
        return None;
    }
    let tag = info
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .trim_start_matches('{')
        .trim_start_matches('.')
        .trim_end_matches('}')
        .to_ascii_lowercase();
    Some(Fence { marker, len, tag })
}

fn is_closing_fence(line: &str, fence: &Fence) -> bool {
    let rest = strip_indent(line);
    let len = rest.chars().take_while(|c| *c == fence.marker).count();
    len >= fence.len && rest[len..].trim().is_empty()
}

fn is_executable(tag: &str) -> bool {
    EXECUTABLE_TAGS.contains(&tag)
}

/// The command on a block line, or `None` for blanks and comments.
fn command_text(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    Some(trimmed.strip_prefix("$ ").unwrap_or(trimmed))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;
    use crate::verdict::{ImpactVector, Target, Verdict};

    fn scan_str(text: &str) -> Vec<Evidence> {
        scan(text, Path::new("skills/demo/SKILL.md"))
    }

    #[rstest]
    #[case("json", 0)]
    #[case("yaml", 0)]
    #[case("python", 0)]
    #[case("", 1)]
    #[case("bash", 1)]
    #[case("sh", 1)]
    #[case("shell", 1)]
    #[case("Bash", 1)]
    fn language_tag_filtering(#[case] tag: &str, #[case] expected: usize) {
        let doc = format!("Intro\n\n```{tag}\npython3\n```\n");
        assert_eq!(scan_str(&doc).len(), expected, "tag: {tag:?}");
    }

    #[test]
    fn reports_exact_lines_across_blocks() {
        let doc = "---\nname: demo\n---\n# Demo\n\n```bash\npip install pandas\n```\n\nText.\n\n```json\n{\"cmd\": \"python3\"}\n```\n\n```\n# comment\n$ python3 analyze.py\n```\n";
        let ev = scan_str(doc);
        assert_eq!(ev.len(), 2);

        assert_eq!(ev[0].signal, "pip install");
        assert_eq!(ev[0].line, Some(7));
        assert_eq!(ev[0].source, EvidenceSource::CodeBlock);
        assert_eq!(ev[0].impact, ImpactVector::DESKTOP_INCOMPATIBLE);

        assert_eq!(ev[1].signal, "python3");
        assert_eq!(ev[1].line, Some(18));
        assert_eq!(ev[1].impact.get(Target::Desktop), Verdict::NeedsReview);
        assert_eq!(ev[1].file, Path::new("skills/demo/SKILL.md"));
    }

    #[test]
    fn text_outside_fences_is_ignored() {
        assert!(scan_str("Run python3 main.py to start.\n").is_empty());
    }

    #[test]
    fn compatible_commands_yield_nothing() {
        assert!(scan_str("```bash\nnode server.js\nnpx prettier .\n```\n").is_empty());
    }

    #[test]
    fn longer_fence_contains_shorter_one() {
        let doc = "````markdown\n```bash\npython3 x.py\n```\n````\n";
        assert!(scan_str(doc).is_empty());
    }

    #[test]
    fn tilde_fences_and_info_strings() {
        let doc = "~~~sh title=\"setup\"\nuv sync\n~~~\n";
        let ev = scan_str(doc);
        assert_eq!(ev.len(), 1);
        assert_eq!(ev[0].signal, "uv");
        assert_eq!(ev[0].line, Some(2));
    }

    #[test]
    fn unclosed_fence_runs_to_end() {
        let ev = scan_str("```\nbash run.sh\n\nsh other\n");
        let lines: Vec<_> = ev.iter().map(|e| e.line.unwrap()).collect();
        assert_eq!(lines, vec![2, 4]);
    }

    #[test]
    fn fences_nested_in_list_items() {
        let doc = "1. Install deps:\n\n    ```bash\n    pip install pandas\n    ```\n\n2. Run:\n\n\t```sh\n\tpython3 etl.py\n\t```\n";
        let ev = scan_str(doc);
        let found: Vec<_> = ev.iter().map(|e| (e.signal.as_str(), e.line)).collect();
        assert_eq!(found, [("pip install", Some(4)), ("python3", Some(10))]);
    }

    #[test]
    fn empty_document() {
        assert!(scan_str("").is_empty());
    }
}
