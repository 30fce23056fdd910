//! Evidence records and the per-plugin compatibility result.

use std::{fmt, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::verdict::{ImpactVector, Target, Verdict};

/// Where a signal was found. Descriptive only; never consulted when merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EvidenceSource {
    /// Author-declared target list in the plugin manifest.
    Declaration,
    /// Skill/command/agent frontmatter (e.g. `allowed-tools`).
    Frontmatter,
    /// Fenced shell block in an instruction document.
    CodeBlock,
    /// Interpreted script bundled with the plugin.
    Script,
    /// Third-party import inside a bundled script.
    ScriptImport,
    /// Command-type lifecycle hook handler.
    Hook,
    /// MCP server launch command.
    McpServer,
}

impl EvidenceSource {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Declaration => "declaration",
            Self::Frontmatter => "frontmatter",
            Self::CodeBlock => "code-block",
            Self::Script => "script",
            Self::ScriptImport => "script-import",
            Self::Hook => "hook",
            Self::McpServer => "mcp-server",
        }
    }
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One located, classified signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub source: EvidenceSource,
    /// Path relative to the plugin root.
    pub file: PathBuf,
    /// 1-based line, absent for whole-file signals.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    /// Short stable identifier of what matched, e.g. `pip install`.
    pub signal: String,
    /// Explanation for a human reviewer.
    pub detail: String,
    pub impact: ImpactVector,
}

impl Evidence {
    pub fn new(
        source: EvidenceSource,
        file: impl Into<PathBuf>,
        signal: impl Into<String>,
        detail: impl Into<String>,
        impact: ImpactVector,
    ) -> Self {
        Self {
            source,
            file: file.into(),
            line: None,
            signal: signal.into(),
            detail: detail.into(),
            impact,
        }
    }

    #[must_use]
    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// `file:line` or just `file`.
    pub fn location(&self) -> String {
        match self.line {
            Some(line) => format!("{}:{line}", self.file.display()),
            None => self.file.display().to_string(),
        }
    }
}

/// File counts for one analyzed plugin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub total_files: usize,
    pub skill_files: usize,
    pub script_files: usize,
    pub hook_files: usize,
    pub mcp_configs: usize,
}

/// Final per-plugin verdicts plus the evidence trail that produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub plugin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Author-declared targets, copied verbatim. Informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub declared_targets: Option<Vec<String>>,
    /// Merged verdict per target.
    pub analyzed: ImpactVector,
    pub evidence: Vec<Evidence>,
    pub summary: ScanSummary,
}

impl CompatibilityResult {
    pub fn verdict(&self, target: Target) -> Verdict {
        self.analyzed.get(target)
    }

    /// Most restrictive verdict across all targets.
    pub fn worst(&self) -> Verdict {
        self.analyzed.worst()
    }

    /// Most restrictive verdict among `targets` (all targets when empty).
    pub fn worst_for(&self, targets: &[Target]) -> Verdict {
        if targets.is_empty() {
            return self.worst();
        }
        targets
            .iter()
            .map(|t| self.verdict(*t))
            .max()
            .unwrap_or_default()
    }
}
