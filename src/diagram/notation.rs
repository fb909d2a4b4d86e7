//! Minimal notation checks for model-generated diagram text.
//!
//! The model is asked to return only PlantUML, but nothing forces it to. Before
//! anything is sent to the renderer the response goes through [`extract`]:
//!
//! 1. locate the `@start<tag>` ... `@end<tag>` block (lenient mode skips
//!    surrounding prose and code fences, strict mode refuses them);
//! 2. check the body against a small grammar for the diagram kind.
//!
//! The start tag may carry a diagram name (`@startmindmap rca`).
//!
//! Mind maps and WBS bodies are outlines: every node line starts with a run of
//! `*` (or `+`/`-` for side placement), an optional `<`/`>` WBS direction, an
//! optional `[#color]`, an optional `_` for boxless nodes, then the label.
//! Depth may grow by at most one per line and the first node must be the
//! single-marker root. Multi-line labels (`**:first line` ... `last line;`)
//! are accepted, and `<style>` ... `</style>` blocks are skipped whole. JSON
//! bodies must parse as a JSON object or array; `#highlight` directives are
//! skipped.

use std::sync::OnceLock;

use regex::Regex;

use crate::config::NotationPolicy;
use crate::diagram::DiagramKind;
use crate::error::{RcaError, RcaResult};

fn node_pattern() -> &'static Regex {
    static NODE: OnceLock<Regex> = OnceLock::new();
    NODE.get_or_init(|| {
        Regex::new(r"^(?P<depth>\*+|\++|-+)(?P<side>[<>])?(?P<color>\[#[0-9A-Za-z]+\])?(?P<boxless>_)?(?P<rest>.*)$")
            .expect("node pattern is a valid regex")
    })
}

/// Outline lines that are not nodes but are legal PlantUML.
const OUTLINE_DIRECTIVES: &[&str] = &[
    "'", "title", "caption", "header", "footer", "legend", "endlegend", "left side",
    "right side", "skinparam", "!",
];

/// Return the normalized diagram block, or a notation error.
pub fn extract(kind: DiagramKind, raw: &str, policy: NotationPolicy) -> RcaResult<String> {
    let block = locate_block(kind, raw, policy)?;
    let lines: Vec<&str> = block.lines().collect();
    let body = &lines[1..lines.len() - 1];

    match kind {
        DiagramKind::MindMap | DiagramKind::Wbs => check_outline(kind, body)?,
        DiagramKind::StructuredData => check_json(kind, body)?,
    }
    Ok(block)
}

fn locate_block(kind: DiagramKind, raw: &str, policy: NotationPolicy) -> RcaResult<String> {
    let start = kind.start_marker();
    let end = kind.end_marker();
    let lines: Vec<&str> = raw.lines().map(str::trim_end).collect();

    let start_idx = lines
        .iter()
        .position(|l| is_start_line(l.trim_start(), &start))
        .ok_or_else(|| RcaError::notation(kind.notation_name(), format!("missing {}", start)))?;
    let end_idx = lines[start_idx + 1..]
        .iter()
        .position(|l| l.trim_start() == end)
        .map(|i| i + start_idx + 1)
        .ok_or_else(|| RcaError::notation(kind.notation_name(), format!("missing {}", end)))?;

    if policy == NotationPolicy::Strict {
        let outside = lines[..start_idx]
            .iter()
            .chain(lines[end_idx + 1..].iter())
            .any(|l| !l.trim().is_empty());
        if outside {
            return Err(RcaError::notation(
                kind.notation_name(),
                "response contains text outside the diagram block",
            ));
        }
    }

    let mut block: Vec<&str> = Vec::with_capacity(end_idx - start_idx + 1);
    block.push(lines[start_idx].trim_start());
    block.extend(lines[start_idx + 1..end_idx].iter().copied());
    block.push(&end);
    Ok(block.join("\n"))
}

/// `@startwbs` alone, or followed by whitespace and a diagram name.
fn is_start_line(line: &str, start: &str) -> bool {
    match line.strip_prefix(start) {
        Some(rest) => rest.is_empty() || rest.starts_with(char::is_whitespace),
        None => false,
    }
}

fn check_outline(kind: DiagramKind, body: &[&str]) -> RcaResult<()> {
    let fail = |line_no: usize, reason: String| {
        RcaError::notation(kind.notation_name(), format!("line {}: {}", line_no, reason))
    };

    let mut previous_depth = 0usize;
    let mut in_multiline = false;
    let mut in_style = false;
    let mut nodes = 0usize;

    for (i, raw_line) in body.iter().enumerate() {
        let line_no = i + 2;
        let line = raw_line.trim();

        if in_multiline {
            if line.ends_with(';') {
                in_multiline = false;
            }
            continue;
        }
        if in_style {
            if line.contains("</style>") {
                in_style = false;
            }
            continue;
        }
        if line.is_empty() {
            continue;
        }
        if line.starts_with("<style>") {
            in_style = !line.contains("</style>");
            continue;
        }

        let Some(caps) = node_pattern().captures(line) else {
            if OUTLINE_DIRECTIVES.iter().any(|d| line.starts_with(d)) {
                continue;
            }
            return Err(fail(line_no, format!("expected a node, found '{}'", line)));
        };

        let depth = caps["depth"].len();
        let rest = &caps["rest"];

        if nodes == 0 && depth != 1 {
            return Err(fail(line_no, "first node must be the root (single marker)".to_string()));
        }
        if depth > previous_depth + 1 {
            return Err(fail(
                line_no,
                format!("depth jumps from {} to {}", previous_depth, depth),
            ));
        }

        if let Some(label) = rest.strip_prefix(':') {
            if !label.trim_end().ends_with(';') {
                in_multiline = true;
            }
        } else if !rest.starts_with(char::is_whitespace) || rest.trim().is_empty() {
            return Err(fail(line_no, format!("node has no label: '{}'", line)));
        }

        previous_depth = depth;
        nodes += 1;
    }

    if in_multiline {
        return Err(RcaError::notation(
            kind.notation_name(),
            "unterminated multi-line node (missing ';')",
        ));
    }
    if in_style {
        return Err(RcaError::notation(kind.notation_name(), "unterminated <style> block"));
    }
    if nodes == 0 {
        return Err(RcaError::notation(kind.notation_name(), "diagram has no nodes"));
    }
    Ok(())
}

fn check_json(kind: DiagramKind, body: &[&str]) -> RcaResult<()> {
    let json: String = body
        .iter()
        .filter(|l| !l.trim_start().starts_with("#highlight"))
        .copied()
        .collect::<Vec<_>>()
        .join("\n");

    let value: serde_json::Value = serde_json::from_str(&json)
        .map_err(|e| RcaError::notation(kind.notation_name(), format!("invalid JSON: {}", e)))?;
    if !(value.is_object() || value.is_array()) {
        return Err(RcaError::notation(
            kind.notation_name(),
            "JSON body must be an object or an array",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINDMAP: &str = "@startmindmap
* Root Cause Analysis
**[#FF0000] Critical Issues
*** Problem: Blocked fire exit
*** Immediate Cause: Pallets stored in corridor
**[#0000FF] Monitoring Areas
*** Watch For: Clutter returning
@endmindmap";

    #[test]
    fn clean_mindmap_passes_unchanged() {
        let out = extract(DiagramKind::MindMap, MINDMAP, NotationPolicy::Strict).unwrap();
        assert_eq!(out, MINDMAP);
    }

    #[test]
    fn lenient_mode_strips_prose_and_fences() {
        let raw = format!("Here is your mind map:\n```plantuml\n{}\n```\nLet me know!", MINDMAP);
        let out = extract(DiagramKind::MindMap, &raw, NotationPolicy::Lenient).unwrap();
        assert_eq!(out, MINDMAP);
    }

    #[test]
    fn strict_mode_rejects_prose() {
        let raw = format!("Sure!\n{}", MINDMAP);
        let err = extract(DiagramKind::MindMap, &raw, NotationPolicy::Strict).unwrap_err();
        assert_eq!(err.category(), "notation");
        assert!(err.to_string().contains("outside the diagram block"));
    }

    #[test]
    fn missing_markers_are_rejected() {
        let err = extract(DiagramKind::Wbs, "* Root\n** Child", NotationPolicy::Lenient).unwrap_err();
        assert!(err.to_string().contains("@startwbs"));

        let err = extract(DiagramKind::Wbs, "@startwbs\n* Root\n", NotationPolicy::Lenient).unwrap_err();
        assert!(err.to_string().contains("@endwbs"));
    }

    #[test]
    fn wrong_kind_is_rejected() {
        assert!(extract(DiagramKind::Wbs, MINDMAP, NotationPolicy::Lenient).is_err());
    }

    #[test]
    fn depth_jump_is_rejected() {
        let raw = "@startwbs\n* Project\n*** Too deep\n@endwbs";
        let err = extract(DiagramKind::Wbs, raw, NotationPolicy::Lenient).unwrap_err();
        assert!(err.to_string().contains("depth jumps"));
    }

    #[test]
    fn first_node_must_be_root() {
        let raw = "@startwbs\n** Phase 1\n@endwbs";
        assert!(extract(DiagramKind::Wbs, raw, NotationPolicy::Lenient).is_err());
    }

    #[test]
    fn prose_inside_block_is_rejected() {
        let raw = "@startmindmap\n* Root\nThis line is commentary\n@endmindmap";
        let err = extract(DiagramKind::MindMap, raw, NotationPolicy::Lenient).unwrap_err();
        assert!(err.to_string().contains("expected a node"));
    }

    #[test]
    fn directives_comments_and_multiline_nodes_are_accepted() {
        let raw = "@startmindmap
title Workplace RCA
' generated
* Root
**:Critical
spans two lines;
left side
**_ Boxless
@endmindmap";
        assert!(extract(DiagramKind::MindMap, raw, NotationPolicy::Strict).is_ok());
    }

    #[test]
    fn named_start_tag_is_accepted() {
        let raw = "@startmindmap rca\n* Root\n** Child\n@endmindmap";
        let out = extract(DiagramKind::MindMap, raw, NotationPolicy::Lenient).unwrap();
        assert!(out.starts_with("@startmindmap rca\n"));

        // A longer tag is a different diagram type, not a name.
        let err = extract(DiagramKind::MindMap, "@startmindmapx\n* Root\n@endmindmap", NotationPolicy::Lenient)
            .unwrap_err();
        assert!(err.to_string().contains("missing @startmindmap"));
    }

    #[test]
    fn wbs_direction_markers_are_accepted() {
        let raw = "@startwbs
* Workplace Improvement
**< Phase 1: Critical
*** Remove pallets
**> Phase 2: Preventive
***[#FFA500] Weekly walkthrough
@endwbs";
        assert!(extract(DiagramKind::Wbs, raw, NotationPolicy::Strict).is_ok());

        let err = extract(DiagramKind::Wbs, "@startwbs\n* Root\n**<\n@endwbs", NotationPolicy::Lenient)
            .unwrap_err();
        assert!(err.to_string().contains("no label"));
    }

    #[test]
    fn style_blocks_are_skipped() {
        let raw = "@startmindmap
<style>
mindmapDiagram {
  node {
    BackgroundColor lightGreen
  }
}
</style>
* Root
** Child
@endmindmap";
        assert!(extract(DiagramKind::MindMap, raw, NotationPolicy::Strict).is_ok());

        let open = "@startmindmap\n<style>\nnode { }\n* Root\n@endmindmap";
        let err = extract(DiagramKind::MindMap, open, NotationPolicy::Lenient).unwrap_err();
        assert!(err.to_string().contains("<style>"));
    }

    #[test]
    fn unterminated_multiline_is_rejected() {
        let raw = "@startmindmap\n* Root\n**:never closed\n@endmindmap";
        assert!(extract(DiagramKind::MindMap, raw, NotationPolicy::Lenient).is_err());
    }

    #[test]
    fn empty_body_is_rejected() {
        let err = extract(DiagramKind::MindMap, "@startmindmap\n@endmindmap", NotationPolicy::Lenient)
            .unwrap_err();
        assert!(err.to_string().contains("no nodes"));
    }

    #[test]
    fn json_body_must_parse() {
        let good = "@startjson\n#highlight \"root_cause_analysis\"\n{\"root_cause_analysis\": []}\n@endjson";
        assert!(extract(DiagramKind::StructuredData, good, NotationPolicy::Strict).is_ok());

        let bad = "@startjson\n{\"root_cause_analysis\": [\n@endjson";
        let err = extract(DiagramKind::StructuredData, bad, NotationPolicy::Lenient).unwrap_err();
        assert!(err.to_string().contains("invalid JSON"));

        let scalar = "@startjson\n42\n@endjson";
        assert!(extract(DiagramKind::StructuredData, scalar, NotationPolicy::Lenient).is_err());
    }
}
