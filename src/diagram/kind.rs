//! The three diagram variants and their per-variant metadata.

use std::fmt;

/// Diagram variants generated from one analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DiagramKind {
    /// Findings grouped by severity tier.
    MindMap,
    /// Resolution project broken into severity-ordered phases.
    Wbs,
    /// Findings as a JSON document.
    StructuredData,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 3] = [
        DiagramKind::MindMap,
        DiagramKind::Wbs,
        DiagramKind::StructuredData,
    ];

    /// PlantUML block tag: `@start<tag>` ... `@end<tag>`.
    pub fn tag(self) -> &'static str {
        match self {
            DiagramKind::MindMap => "mindmap",
            DiagramKind::Wbs => "wbs",
            DiagramKind::StructuredData => "json",
        }
    }

    pub fn start_marker(self) -> String {
        format!("@start{}", self.tag())
    }

    pub fn end_marker(self) -> String {
        format!("@end{}", self.tag())
    }

    /// Human name of the notation, used in error messages.
    pub fn notation_name(self) -> &'static str {
        match self {
            DiagramKind::MindMap => "PlantUML mind map",
            DiagramKind::Wbs => "PlantUML WBS",
            DiagramKind::StructuredData => "PlantUML JSON",
        }
    }

    /// Output file stem, `<purpose>_<variant>`.
    pub fn file_stem(self) -> &'static str {
        match self {
            DiagramKind::MindMap => "analysis_mindmap",
            DiagramKind::Wbs => "improvement_wbs",
            DiagramKind::StructuredData => "analysis_json",
        }
    }

    /// Suggested name when the user saves the PNG.
    pub fn download_name(self) -> &'static str {
        match self {
            DiagramKind::MindMap => "root_cause_analysis_map.png",
            DiagramKind::Wbs => "root_cause_resolution_plan.png",
            DiagramKind::StructuredData => "root_cause_structured_data.png",
        }
    }

    /// Suggested name when the user saves the diagram source.
    pub fn source_download_name(self) -> String {
        format!("{}.puml", self.file_stem())
    }

    /// Title shown in the shell.
    pub fn title(self) -> &'static str {
        match self {
            DiagramKind::MindMap => "Root Cause Map",
            DiagramKind::Wbs => "Resolution Plan",
            DiagramKind::StructuredData => "Structured Data",
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markers_follow_tag() {
        assert_eq!(DiagramKind::MindMap.start_marker(), "@startmindmap");
        assert_eq!(DiagramKind::Wbs.end_marker(), "@endwbs");
        assert_eq!(DiagramKind::StructuredData.start_marker(), "@startjson");
    }

    #[test]
    fn file_stems_are_distinct() {
        let mut stems: Vec<_> = DiagramKind::ALL.iter().map(|k| k.file_stem()).collect();
        stems.dedup();
        assert_eq!(stems.len(), 3);
        assert_eq!(DiagramKind::Wbs.source_download_name(), "improvement_wbs.puml");
    }
}
