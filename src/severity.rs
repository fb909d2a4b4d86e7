//! Severity tiers shared by the analysis instruction and every diagram prompt.

use std::fmt;

/// Five-tier severity scale.
///
/// The analysis grades findings with the first four tiers; diagrams add
/// `Monitoring` for observations that are not yet problems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SeverityTier {
    Critical,
    High,
    Medium,
    Low,
    Monitoring,
}

impl SeverityTier {
    /// All tiers, most severe first.
    pub const ALL: [SeverityTier; 5] = [
        SeverityTier::Critical,
        SeverityTier::High,
        SeverityTier::Medium,
        SeverityTier::Low,
        SeverityTier::Monitoring,
    ];

    /// Tiers a finding can be graded with.
    pub const ASSESSED: [SeverityTier; 4] = [
        SeverityTier::Critical,
        SeverityTier::High,
        SeverityTier::Medium,
        SeverityTier::Low,
    ];

    pub fn label(self) -> &'static str {
        match self {
            SeverityTier::Critical => "Critical",
            SeverityTier::High => "High",
            SeverityTier::Medium => "Medium",
            SeverityTier::Low => "Low",
            SeverityTier::Monitoring => "Monitoring",
        }
    }

    pub fn color_name(self) -> &'static str {
        match self {
            SeverityTier::Critical => "Red",
            SeverityTier::High => "Orange",
            SeverityTier::Medium => "Yellow",
            SeverityTier::Low => "Green",
            SeverityTier::Monitoring => "Blue",
        }
    }

    /// PlantUML color literal.
    pub fn hex(self) -> &'static str {
        match self {
            SeverityTier::Critical => "#FF0000",
            SeverityTier::High => "#FFA500",
            SeverityTier::Medium => "#FFFF00",
            SeverityTier::Low => "#00FF00",
            SeverityTier::Monitoring => "#0000FF",
        }
    }

    /// `"Critical/High/Medium/Low"`, as written in the analysis instruction.
    pub fn assessed_scale() -> String {
        Self::ASSESSED
            .iter()
            .map(|t| t.label())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// `"Red=Critical, Orange=High, ..."`, as written in the diagram prompts.
    pub fn color_legend() -> String {
        Self::ALL
            .iter()
            .map(|t| format!("{}={}", t.color_name(), t.label()))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
