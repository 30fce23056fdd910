//! Host surfaces, the three-state verdict lattice and per-surface impact vectors.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};

// ── Target ──────────────────────────────────────────────────────────────────

/// Host surface a plugin may be deployed to, most restrictive first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Desktop app: no general-purpose shell or package installs.
    Desktop,
    /// Sandboxed agent surface with a restricted shell.
    Cowork,
    /// Full developer environment.
    Code,
}

impl Target {
    /// All surfaces in restrictiveness order.
    pub const ALL: [Self; 3] = [Self::Desktop, Self::Cowork, Self::Code];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Desktop => "desktop",
            Self::Cowork => "cowork",
            Self::Code => "code",
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown target '{s}'"))
    }
}

// ── Verdict ─────────────────────────────────────────────────────────────────

/// Confidence-graded compatibility label. Variant order is the merge order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Verdict {
    #[default]
    Compatible,
    NeedsReview,
    Incompatible,
}

impl Verdict {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Compatible => "compatible",
            Self::NeedsReview => "needs-review",
            Self::Incompatible => "incompatible",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Verdict {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compatible" => Ok(Self::Compatible),
            "needs-review" | "needs_review" | "review" => Ok(Self::NeedsReview),
            "incompatible" => Ok(Self::Incompatible),
            other => Err(format!("unknown verdict '{other}'")),
        }
    }
}

// ── ImpactVector ────────────────────────────────────────────────────────────

/// Verdict for every [`Target`]. Always fully populated.
///
/// The vector is `Copy`, so every rule, classification and evidence item
/// owns its own value; reusing a template constant can never alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Target, Verdict>",
    into = "BTreeMap<Target, Verdict>"
)]
pub struct ImpactVector([Verdict; Target::ALL.len()]);

impl ImpactVector {
    /// Compatible on every surface.
    pub const COMPATIBLE: Self = Self([Verdict::Compatible; Target::ALL.len()]);
    /// Needs review on desktop, fine elsewhere.
    pub const DESKTOP_REVIEW: Self = Self([
        Verdict::NeedsReview,
        Verdict::Compatible,
        Verdict::Compatible,
    ]);
    /// Incompatible on desktop, fine elsewhere.
    pub const DESKTOP_INCOMPATIBLE: Self = Self([
        Verdict::Incompatible,
        Verdict::Compatible,
        Verdict::Compatible,
    ]);

    pub const fn get(&self, target: Target) -> Verdict {
        self.0[target.index()]
    }

    /// Copy of `self` with one surface replaced.
    #[must_use]
    pub const fn with(mut self, target: Target, verdict: Verdict) -> Self {
        self.0[target.index()] = verdict;
        self
    }

    /// Element-wise maximum: the more restrictive verdict wins per surface.
    #[must_use]
    pub fn merge(self, other: Self) -> Self {
        let mut merged = self;
        for target in Target::ALL {
            merged.0[target.index()] = self.get(target).max(other.get(target));
        }
        merged
    }

    /// Most restrictive verdict across all surfaces.
    pub fn worst(&self) -> Verdict {
        self.0.iter().copied().max().unwrap_or_default()
    }

    pub fn is_compatible(&self) -> bool {
        self.worst() == Verdict::Compatible
    }

    pub fn iter(&self) -> impl Iterator<Item = (Target, Verdict)> + '_ {
        Target::ALL.into_iter().map(|t| (t, self.get(t)))
    }
}

impl Default for ImpactVector {
    fn default() -> Self {
        Self::COMPATIBLE
    }
}

impl From<ImpactVector> for BTreeMap<Target, Verdict> {
    fn from(v: ImpactVector) -> Self {
        v.iter().collect()
    }
}

impl TryFrom<BTreeMap<Target, Verdict>> for ImpactVector {
    type Error = String;

    fn try_from(map: BTreeMap<Target, Verdict>) -> Result<Self, Self::Error> {
        let mut v = Self::COMPATIBLE;
        for target in Target::ALL {
            let verdict = map
                .get(&target)
                .ok_or_else(|| format!("impact vector is missing target '{target}'"))?;
            v = v.with(target, *verdict);
        }
        Ok(v)
    }
}

impl fmt::Display for ImpactVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.iter().map(|(t, v)| format!("{t}={v}")).collect();
        f.write_str(&parts.join(" "))
    }
}
