//! # Diagram Text Generation
//!
//! Each generator sends the analysis text, embedded in a fixed template, to
//! the hosted model and gets PlantUML back. There is no caching: two calls
//! with the same analysis are two requests.

pub mod kind;
pub mod notation;
pub mod prompt;

use std::path::PathBuf;

use tracing::{info, warn};

pub use kind::DiagramKind;

use crate::analysis::AnalysisText;
use crate::config::{Credential, NotationPolicy};
use crate::error::RcaResult;
use crate::llm::{ChatModel, MessageContent};

/// Diagram source produced by one generator call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramText {
    pub kind: DiagramKind,
    /// Model output, verbatim.
    pub raw: String,
    /// The checked `@start...@end` block sent to the renderer.
    pub source: String,
}

/// A rendered diagram: where the PNG was written and the text it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagramArtifact {
    pub kind: DiagramKind,
    pub path: PathBuf,
    pub text: DiagramText,
}

/// Ask the model for `kind` and check the result against its notation.
///
/// On a notation failure the model output travels in the error's
/// `raw_text` metadata so callers can still show it.
pub fn generate_diagram_text(
    model: &dyn ChatModel,
    credential: &Credential,
    analysis: &AnalysisText,
    kind: DiagramKind,
    policy: NotationPolicy,
) -> RcaResult<DiagramText> {
    let raw = request_diagram_text(model, credential, analysis, kind)?;
    check_diagram_text(kind, raw, policy)
}

/// Ask the model for `kind` and return its answer unchecked.
pub fn request_diagram_text(
    model: &dyn ChatModel,
    credential: &Credential,
    analysis: &AnalysisText,
    kind: DiagramKind,
) -> RcaResult<String> {
    let prompt = prompt::diagram_prompt(kind, analysis);
    let raw = model.complete(credential, MessageContent::Text(prompt))?;
    info!(kind = ?kind, chars = raw.len(), "Diagram text generated");
    Ok(raw)
}

/// Validate model output for `kind`.
pub fn check_diagram_text(kind: DiagramKind, raw: String, policy: NotationPolicy) -> RcaResult<DiagramText> {
    match notation::extract(kind, &raw, policy) {
        Ok(source) => Ok(DiagramText { kind, raw, source }),
        Err(e) => {
            warn!(kind = ?kind, error = %e, "Diagram text failed notation check");
            Err(e.with_metadata("raw_text", raw))
        }
    }
}

pub fn generate_mindmap(
    model: &dyn ChatModel,
    credential: &Credential,
    analysis: &AnalysisText,
    policy: NotationPolicy,
) -> RcaResult<DiagramText> {
    generate_diagram_text(model, credential, analysis, DiagramKind::MindMap, policy)
}

pub fn generate_wbs(
    model: &dyn ChatModel,
    credential: &Credential,
    analysis: &AnalysisText,
    policy: NotationPolicy,
) -> RcaResult<DiagramText> {
    generate_diagram_text(model, credential, analysis, DiagramKind::Wbs, policy)
}

pub fn generate_structured_data(
    model: &dyn ChatModel,
    credential: &Credential,
    analysis: &AnalysisText,
    policy: NotationPolicy,
) -> RcaResult<DiagramText> {
    generate_diagram_text(model, credential, analysis, DiagramKind::StructuredData, policy)
}
