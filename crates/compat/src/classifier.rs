//! Command classification: which runtime a shell line or executable needs.
//!
//! Two read-only tables back the classifier:
//!
//! - [`command_rules`]: regex rules tested against a full shell line. The
//!   table is **ordered** and the first match wins, so package-manager rules
//!   (`pip install`, `npm install`, `uv ...`) sit above the bare interpreter
//!   rules (`python3`, `bash`, `sh`). Moving a rule changes results.
//! - [`binary_rules`]: exact, case-sensitive executable names, for callers
//!   that already hold an isolated program name (MCP `command` fields).

use std::sync::LazyLock;

use {regex::Regex, serde::Serialize, tracing::error};

use crate::verdict::{ImpactVector, Target, Verdict};

/// Incompatible wherever containers are unavailable.
const CONTAINER_IMPACT: ImpactVector =
    ImpactVector::DESKTOP_INCOMPATIBLE.with(Target::Cowork, Verdict::Incompatible);

/// Result of a successful classification. `impact` is an owned copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub signal: &'static str,
    pub detail: &'static str,
    pub impact: ImpactVector,
}

struct RuleSpec {
    signal: &'static str,
    pattern: &'static str,
    detail: &'static str,
    impact: ImpactVector,
}

/// Shell-line rules in priority order (index 0 wins).
const COMMAND_RULE_SPECS: &[RuleSpec] = &[
    RuleSpec {
        signal: "pip install",
        pattern: r"\bpip3?\s+install\b",
        detail: "installs Python packages into the host environment",
        impact: ImpactVector::DESKTOP_INCOMPATIBLE,
    },
    RuleSpec {
        signal: "npm install",
        pattern: r"\bnpm\s+(?:install|i|ci|add)\b",
        detail: "installs Node packages into the host environment",
        impact: ImpactVector::DESKTOP_INCOMPATIBLE,
    },
    RuleSpec {
        signal: "yarn add",
        pattern: r"\byarn\s+(?:add|install)\b",
        detail: "installs Node packages with yarn",
        impact: ImpactVector::DESKTOP_INCOMPATIBLE,
    },
    RuleSpec {
        signal: "pnpm add",
        pattern: r"\bpnpm\s+(?:add|install|i)\b",
        detail: "installs Node packages with pnpm",
        impact: ImpactVector::DESKTOP_INCOMPATIBLE,
    },
    RuleSpec {
        signal: "uv",
        pattern: r"\buv\s+(?:run|pip|sync|tool|add)\b",
        detail: "requires the uv Python toolchain",
        impact: ImpactVector::DESKTOP_INCOMPATIBLE,
    },
    RuleSpec {
        signal: "uvx",
        pattern: r"\buvx\b",
        detail: "runs a Python tool through uvx",
        impact: ImpactVector::DESKTOP_INCOMPATIBLE,
    },
    RuleSpec {
        signal: "docker",
        pattern: r"\bdocker(?:-compose\b|\s+(?:run|compose|build|exec|pull)\b)",
        detail: "requires a container runtime",
        impact: CONTAINER_IMPACT,
    },
    RuleSpec {
        signal: "brew install",
        pattern: r"\bbrew\s+install\b",
        detail: "installs system packages with Homebrew",
        impact: ImpactVector::DESKTOP_INCOMPATIBLE,
    },
    RuleSpec {
        signal: "python3",
        pattern: r"\bpython3(?:\.\d+)?\b",
        detail: "invokes a python3 interpreter",
        impact: ImpactVector::DESKTOP_REVIEW,
    },
    RuleSpec {
        signal: "python",
        pattern: r"\bpython\b",
        detail: "invokes a python interpreter",
        impact: ImpactVector::DESKTOP_REVIEW,
    },
    RuleSpec {
        signal: "node",
        pattern: r"\bnode\b",
        detail: "invokes the bundled Node runtime",
        impact: ImpactVector::COMPATIBLE,
    },
    RuleSpec {
        signal: "npx",
        pattern: r"\bnpx\b",
        detail: "runs a Node package through npx",
        impact: ImpactVector::COMPATIBLE,
    },
    RuleSpec {
        signal: "deno",
        pattern: r"\bdeno\s+(?:run|task|eval|install)\b",
        detail: "invokes the Deno runtime",
        impact: ImpactVector::DESKTOP_REVIEW,
    },
    RuleSpec {
        signal: "bun",
        pattern: r"\b(?:bunx|bun\s+(?:run|x|install|add|i))\b",
        detail: "invokes the Bun runtime",
        impact: ImpactVector::DESKTOP_REVIEW,
    },
    RuleSpec {
        signal: "bash",
        pattern: r"(?:^|[;&|\s])bash\b",
        detail: "invokes a bash shell",
        impact: ImpactVector::DESKTOP_REVIEW,
    },
    RuleSpec {
        signal: "sh",
        pattern: r"(?:^|[;&|\s])sh\b",
        detail: "invokes a POSIX shell",
        impact: ImpactVector::DESKTOP_REVIEW,
    },
];

/// A compiled shell-line rule.
#[derive(Debug)]
pub struct CommandRule {
    pub signal: &'static str,
    pub detail: &'static str,
    pub impact: ImpactVector,
    pattern: Regex,
}

impl CommandRule {
    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }
}

static COMMAND_RULES: LazyLock<Vec<CommandRule>> = LazyLock::new(|| {
    COMMAND_RULE_SPECS
        .iter()
        .filter_map(|spec| match Regex::new(spec.pattern) {
            Ok(pattern) => Some(CommandRule {
                signal: spec.signal,
                detail: spec.detail,
                impact: spec.impact,
                pattern,
            }),
            Err(e) => {
                error!(signal = spec.signal, error = %e, "dropping command rule with invalid pattern");
                None
            },
        })
        .collect()
});

/// Exact executable-name rule.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct BinaryRule {
    pub binary: &'static str,
    pub detail: &'static str,
    pub impact: ImpactVector,
}

const BINARY_RULES: &[BinaryRule] = &[
    BinaryRule {
        binary: "node",
        detail: "launched with the bundled Node runtime",
        impact: ImpactVector::COMPATIBLE,
    },
    BinaryRule {
        binary: "npx",
        detail: "launched through npx",
        impact: ImpactVector::COMPATIBLE,
    },
    BinaryRule {
        binary: "python",
        detail: "launched with a python interpreter",
        impact: ImpactVector::DESKTOP_REVIEW,
    },
    BinaryRule {
        binary: "python3",
        detail: "launched with a python3 interpreter",
        impact: ImpactVector::DESKTOP_REVIEW,
    },
    BinaryRule {
        binary: "bash",
        detail: "launched through a bash shell",
        impact: ImpactVector::DESKTOP_REVIEW,
    },
    BinaryRule {
        binary: "sh",
        detail: "launched through a POSIX shell",
        impact: ImpactVector::DESKTOP_REVIEW,
    },
    BinaryRule {
        binary: "uv",
        detail: "launched with the uv Python toolchain",
        impact: ImpactVector::DESKTOP_INCOMPATIBLE,
    },
    BinaryRule {
        binary: "uvx",
        detail: "launched through uvx",
        impact: ImpactVector::DESKTOP_INCOMPATIBLE,
    },
    BinaryRule {
        binary: "docker",
        detail: "launched in a container",
        impact: CONTAINER_IMPACT,
    },
    BinaryRule {
        binary: "deno",
        detail: "launched with the Deno runtime",
        impact: ImpactVector::DESKTOP_REVIEW,
    },
    BinaryRule {
        binary: "bun",
        detail: "launched with the Bun runtime",
        impact: ImpactVector::DESKTOP_REVIEW,
    },
];

/// Shell-line rules in priority order.
pub fn command_rules() -> &'static [CommandRule] {
    &COMMAND_RULES
}

/// Executable-name rules.
pub fn binary_rules() -> &'static [BinaryRule] {
    BINARY_RULES
}

/// Classify a shell command line. Returns the first matching rule in table order.
pub fn classify_command(command_line: &str) -> Option<Classification> {
    COMMAND_RULES
        .iter()
        .find(|rule| rule.pattern.is_match(command_line))
        .map(|rule| Classification {
            signal: rule.signal,
            detail: rule.detail,
            impact: rule.impact,
        })
}

/// Classify an isolated executable name by exact lookup.
pub fn classify_command_binary(binary: &str) -> Option<Classification> {
    BINARY_RULES
        .iter()
        .find(|rule| rule.binary == binary)
        .map(|rule| Classification {
            signal: rule.binary,
            detail: rule.detail,
            impact: rule.impact,
        })
}
