//! Prompt templates. The analysis text is interpolated verbatim.

use crate::analysis::AnalysisText;
use crate::diagram::DiagramKind;
use crate::severity::SeverityTier;

/// Build the prompt asking for `kind` from `analysis`.
pub fn diagram_prompt(kind: DiagramKind, analysis: &AnalysisText) -> String {
    match kind {
        DiagramKind::MindMap => mindmap_prompt(analysis.as_str()),
        DiagramKind::Wbs => wbs_prompt(analysis.as_str()),
        DiagramKind::StructuredData => json_prompt(analysis.as_str()),
    }
}

fn tier_heading(tier: SeverityTier) -> &'static str {
    match tier {
        SeverityTier::Critical => "Critical Issues",
        SeverityTier::High => "High Priority",
        SeverityTier::Medium => "Medium Priority",
        SeverityTier::Low => "Low Priority",
        SeverityTier::Monitoring => "Monitoring Areas",
    }
}

fn tier_placeholders(tier: SeverityTier) -> [&'static str; 4] {
    match tier {
        SeverityTier::Critical => [
            "Problem: [Specific safety/operational problem]",
            "Immediate Cause: [Direct cause]",
            "Root Cause: [Underlying system issue]",
            "Action: [Immediate intervention needed]",
        ],
        SeverityTier::High => [
            "Problem: [Significant efficiency/quality issue]",
            "Immediate Cause: [Direct cause]",
            "Root Cause: [Underlying system issue]",
            "Action: [Priority fix needed]",
        ],
        SeverityTier::Medium => [
            "Problem: [Moderate impact issue]",
            "Immediate Cause: [Direct cause]",
            "Root Cause: [Underlying system issue]",
            "Action: [Scheduled improvement]",
        ],
        SeverityTier::Low => [
            "Problem: [Minor issue]",
            "Immediate Cause: [Direct cause]",
            "Root Cause: [Underlying system issue]",
            "Action: [Future enhancement]",
        ],
        SeverityTier::Monitoring => [
            "Observation: [Potential future issue]",
            "Watch For: [Warning signs]",
            "Prevention: [Proactive measures]",
            "",
        ],
    }
}

fn mindmap_skeleton() -> String {
    let mut lines = vec!["@startmindmap".to_string(), "* Root Cause Analysis".to_string()];
    for tier in SeverityTier::ALL {
        lines.push(format!("**[{}] {}", tier.hex(), tier_heading(tier)));
        lines.extend(
            tier_placeholders(tier)
                .iter()
                .filter(|p| !p.is_empty())
                .map(|p| format!("*** {}", p)),
        );
    }
    lines.push("@endmindmap".to_string());
    lines.join("\n")
}

fn mindmap_prompt(analysis: &str) -> String {
    format!(
        "Based on this workplace Root Cause Analysis, generate a PlantUML mind map organized by severity levels.

Analysis: {analysis}

Use this EXACT format with severity-based color coding:
{skeleton}

Replace placeholders with actual findings from the analysis. Use the color codes for severity: {legend}. Return ONLY the PlantUML code, no markdown.",
        skeleton = mindmap_skeleton(),
        legend = SeverityTier::color_legend(),
    )
}

fn wbs_prompt(analysis: &str) -> String {
    format!(
        "Based on this workplace Root Cause Analysis, create a PlantUML WBS (Work Breakdown Structure) for the resolution project organized by severity phases.

Analysis: {analysis}

Use this EXACT format and create specific tasks based on the issues identified:
@startwbs
* Root Cause Resolution Project
**[{critical}] Phase 1: Critical Issues (Immediate)
*** Emergency Response Actions
*** Safety Risk Mitigation
*** Operational Continuity
*** Incident Documentation
**[{high}] Phase 2: High Priority Fixes (Week 1-2)
*** System Repairs
*** Process Corrections
*** Quality Improvements
*** Staff Notifications
**[{medium}] Phase 3: Medium Priority (Month 1-2)
*** Workflow Optimization
*** Equipment Upgrades
*** Training Programs
*** Standard Updates
**[{low}] Phase 4: Low Priority (Month 3-6)
*** Efficiency Enhancements
*** Preventive Measures
*** Documentation Updates
*** Long-term Planning
**[{monitoring}] Phase 5: Prevention & Monitoring (Ongoing)
*** Root Cause Prevention
*** Regular Inspections
*** Performance Tracking
*** Continuous Improvement
@endwbs

Adjust the tasks based on the specific problems and root causes found in the analysis. Focus more detailed tasks on the higher severity issues. If critical safety issues were found, expand the emergency response section. Use the color codes for severity: {legend}.

Return ONLY the PlantUML WBS code, no markdown, no explanation, no code blocks.",
        critical = SeverityTier::Critical.hex(),
        high = SeverityTier::High.hex(),
        medium = SeverityTier::Medium.hex(),
        low = SeverityTier::Low.hex(),
        monitoring = SeverityTier::Monitoring.hex(),
        legend = SeverityTier::color_legend(),
    )
}

fn json_prompt(analysis: &str) -> String {
    let tiers = SeverityTier::ALL
        .iter()
        .map(|t| {
            format!(
                "    {{\n      \"severity\": \"{}\",\n      \"color\": \"{}\",\n      \"findings\": [\n        {{\"problem\": \"...\", \"immediate_cause\": \"...\", \"root_cause\": \"...\", \"action\": \"...\"}}\n      ]\n    }}",
                t.label(),
                t.hex()
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");

    format!(
        "Based on this workplace Root Cause Analysis, produce a PlantUML JSON diagram of the findings organized by severity levels.

Analysis: {analysis}

Use this EXACT structure:
@startjson
{{
  \"root_cause_analysis\": [
{tiers}
  ]
}}
@endjson

Fill every tier with the actual findings from the analysis; use an empty findings list for a tier with no findings. Keep the color codes for severity: {legend}. The text between @startjson and @endjson must be valid JSON. Return ONLY the PlantUML JSON code, no markdown, no explanation, no code blocks.",
        legend = SeverityTier::color_legend(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const ANALYSIS: &str = "Critical: blocked fire exit {east wing}.\nLow: faded floor markings.";

    #[test]
    fn every_prompt_embeds_analysis_verbatim() {
        let analysis = AnalysisText::new(ANALYSIS);
        for kind in DiagramKind::ALL {
            let prompt = diagram_prompt(kind, &analysis);
            assert!(prompt.contains(ANALYSIS), "{kind:?} prompt lost the analysis");
            assert!(prompt.contains(&kind.start_marker()));
            assert!(prompt.contains(&kind.end_marker()));
            assert!(prompt.contains("Red=Critical"));
            assert!(prompt.contains("Blue=Monitoring"));
        }
    }

    #[test]
    fn mindmap_skeleton_colors_every_tier() {
        let skeleton = mindmap_skeleton();
        assert!(skeleton.contains("**[#FF0000] Critical Issues"));
        assert!(skeleton.contains("**[#FFA500] High Priority"));
        assert!(skeleton.contains("**[#0000FF] Monitoring Areas"));
        assert!(skeleton.contains("*** Prevention: [Proactive measures]"));
    }

    #[test]
    fn json_skeleton_is_valid_json() {
        let prompt = json_prompt("x");
        let start = prompt.find("@startjson").unwrap() + "@startjson".len();
        let end = prompt.find("@endjson").unwrap();
        let body = &prompt[start..end];
        let value: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(value["root_cause_analysis"].as_array().unwrap().len(), 5);
    }
}
