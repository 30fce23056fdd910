//! YAML frontmatter of skill, command and agent documents.

use {
    serde::{Deserialize, Serialize},
    tracing::warn,
};

/// The frontmatter fields the engine reads.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentFrontmatter {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Pre-approved tools. Accepts a YAML list or a comma/space separated string.
    #[serde(default, alias = "allowed_tools", rename = "allowed-tools")]
    pub allowed_tools: Option<AllowedTools>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AllowedTools {
    List(Vec<String>),
    Inline(String),
}

impl AllowedTools {
    /// Individual tool entries, trimmed, empties dropped.
    ///
    /// `Bash(git add:*), Read` splits on commas outside parentheses, then on
    /// whitespace outside parentheses.
    pub fn entries(&self) -> Vec<String> {
        match self {
            Self::List(items) => items
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            Self::Inline(s) => split_outside_parens(s),
        }
    }
}

fn split_outside_parens(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    for c in s.chars() {
        match c {
            '(' => {
                depth += 1;
                current.push(c);
            },
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(c);
            },
            ',' | ' ' | '\t' if depth == 0 => {
                if !current.trim().is_empty() {
                    out.push(current.trim().to_string());
                }
                current.clear();
            },
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        out.push(current.trim().to_string());
    }
    out
}

/// The YAML between a leading `---` line and the next line that is exactly
/// `---` (trailing whitespace allowed). `None` when the document has no
/// complete frontmatter block.
pub fn yaml_block(content: &str) -> Option<&str> {
    let rest = content
        .strip_prefix("---\n")
        .or_else(|| content.strip_prefix("---\r\n"))?;
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end() == "---" {
            return Some(rest[..offset].trim_end_matches(['\r', '\n']));
        }
        offset += line.len();
    }
    None
}

/// Parse frontmatter from a full document. Malformed YAML is logged and
/// treated as absent.
pub fn parse(content: &str, path: &std::path::Path) -> Option<DocumentFrontmatter> {
    let yaml = yaml_block(content)?;
    match serde_yaml::from_str::<DocumentFrontmatter>(yaml) {
        Ok(fm) => Some(fm),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "ignoring malformed frontmatter");
            None
        },
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    #[test]
    fn extracts_yaml_block() {
        assert_eq!(yaml_block("---\nname: x\n---\n# Title\nbody\n"), Some("name: x"));
        assert_eq!(yaml_block("---\r\nname: x\r\n---  \r\nbody"), Some("name: x"));
        assert_eq!(yaml_block("---\n---\nbody"), Some(""));
    }

    #[test]
    fn no_frontmatter() {
        assert!(yaml_block("# Title\n---\n").is_none());
        assert!(yaml_block("---\nunterminated: true\n").is_none());
    }

    #[test]
    fn dash_prefixed_lines_do_not_close_the_block() {
        let doc = "---\nname: notes\ndescription: |\n  ---begin example\n  text\nallowed-tools: Bash, Read\n---\nbody\n";
        let fm = parse(doc, Path::new("SKILL.md")).unwrap();
        assert_eq!(fm.name.as_deref(), Some("notes"));
        assert_eq!(
            fm.allowed_tools.unwrap().entries(),
            vec!["Bash".to_string(), "Read".to_string()]
        );
    }

    #[test]
    fn allowed_tools_list() {
        let doc = "---\nname: commit\nallowed-tools:\n  - Bash(git add:*)\n  - Read\n---\nbody\n";
        let fm = parse(doc, Path::new("SKILL.md")).unwrap();
        assert_eq!(
            fm.allowed_tools.unwrap().entries(),
            vec!["Bash(git add:*)", "Read"]
        );
    }

    #[test]
    fn allowed_tools_inline_string() {
        let doc = "---\nallowed-tools: Bash(git add:*, git commit:*), Read Grep\n---\n";
        let fm = parse(doc, Path::new("commands/c.md")).unwrap();
        assert_eq!(
            fm.allowed_tools.unwrap().entries(),
            vec!["Bash(git add:*, git commit:*)", "Read", "Grep"]
        );
    }

    #[test]
    fn malformed_yaml_is_none() {
        let doc = "---\nname: [unclosed\n---\nbody\n";
        assert!(parse(doc, Path::new("SKILL.md")).is_none());
    }
}
