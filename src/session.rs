//! # Session State
//!
//! State behind the interactive shell: the credentials, the current upload and
//! the analysis/diagram results.
//!
//! ## States
//!
//! ```text
//!            complete_analysis               complete_diagram (same generation)
//!   Idle ──────────────────────► Analyzed ◄──────────────────┐
//!                                   │  └──────────────────────┘
//!                                   │ complete_analysis
//!                                   ▼
//!                                Analyzed (new generation, no diagrams)
//! ```
//!
//! Work is split into a *request* (validated on the UI side, carries the
//! generation it was issued for) and a *completion*. The desktop shell runs
//! the blocking part in between on a worker; the CLI and tests use the
//! synchronous `run_*` helpers. A completion whose generation no longer
//! matches is rejected, so a slow diagram from a previous analysis can never
//! land next to a newer analysis.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{debug, info};

use crate::analysis::AnalysisText;
use crate::config::{Credential, ResolvedCredential};
use crate::diagram::{DiagramArtifact, DiagramKind};
use crate::error::{RcaError, RcaResult};
use crate::pipeline::Pipeline;

/// Diagrams that must exist before the shell reports "Diagrams Ready".
pub const REQUIRED_DIAGRAMS: [DiagramKind; 2] = [DiagramKind::MindMap, DiagramKind::Wbs];

/// Raw uploaded bytes plus the name they arrived under.
#[derive(Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read an upload from disk.
    pub fn from_path(path: &Path) -> RcaResult<Self> {
        let bytes = std::fs::read(path)
            .map_err(|e| RcaError::io_at("read upload", path.display().to_string(), e))?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { file_name, bytes })
    }

    /// `.ext` of the original file name, or empty.
    pub fn suffix(&self) -> String {
        Path::new(&self.file_name)
            .extension()
            .map(|ext| format!(".{}", ext.to_string_lossy()))
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for Upload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, Default)]
pub enum SessionState {
    #[default]
    Idle,
    Analyzed {
        generation: u64,
        analysis: AnalysisText,
        diagrams: BTreeMap<DiagramKind, DiagramArtifact>,
    },
}

impl SessionState {
    fn name(&self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Analyzed { .. } => "analyzed",
        }
    }
}

/// Everything an analysis job needs, captured at request time.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub generation: u64,
    pub credential: Credential,
    pub upload: Upload,
}

/// Everything a diagram job needs, captured at request time.
#[derive(Debug, Clone)]
pub struct DiagramRequest {
    pub generation: u64,
    pub kind: DiagramKind,
    pub credential: Credential,
    pub analysis: AnalysisText,
}

#[derive(Debug, Default)]
pub struct Session {
    environment_credential: Option<Credential>,
    session_credential: Option<Credential>,
    upload: Option<Upload>,
    state: SessionState,
    issued_generation: u64,
}

impl Session {
    pub fn new(environment_credential: Option<Credential>) -> Self {
        Self {
            environment_credential,
            ..Self::default()
        }
    }

    /// Replace the current upload. Existing results stay until the next
    /// analysis completes.
    pub fn upload(&mut self, upload: Upload) {
        debug!(file = %upload.file_name, bytes = upload.bytes.len(), "Upload replaced");
        self.upload = Some(upload);
    }

    pub fn current_upload(&self) -> Option<&Upload> {
        self.upload.as_ref()
    }

    /// Set the key typed into the shell. A blank value clears it.
    ///
    /// Existing diagrams are kept: they depend on the analysis, not the key.
    pub fn set_session_credential(&mut self, key: &str) {
        self.session_credential = Credential::new(key);
    }

    /// Session key if set, otherwise the environment key.
    pub fn credential(&self) -> Option<ResolvedCredential> {
        ResolvedCredential::resolve(
            self.session_credential.as_ref(),
            self.environment_credential.as_ref(),
        )
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn analysis(&self) -> Option<&AnalysisText> {
        match &self.state {
            SessionState::Analyzed { analysis, .. } => Some(analysis),
            SessionState::Idle => None,
        }
    }

    pub fn diagram(&self, kind: DiagramKind) -> Option<&DiagramArtifact> {
        match &self.state {
            SessionState::Analyzed { diagrams, .. } => diagrams.get(&kind),
            SessionState::Idle => None,
        }
    }

    pub fn analysis_complete(&self) -> bool {
        matches!(self.state, SessionState::Analyzed { .. })
    }

    pub fn diagrams_ready(&self) -> bool {
        REQUIRED_DIAGRAMS.iter().all(|k| self.diagram(*k).is_some())
    }

    /// Validate and capture an analysis job. No request leaves the process
    /// when this fails.
    pub fn analysis_request(&mut self) -> RcaResult<AnalysisRequest> {
        let credential = self.require_credential("analyze")?;
        let upload = self.upload.clone().ok_or_else(|| {
            RcaError::state(self.state.name(), "analyze", "no image has been uploaded")
        })?;
        self.issued_generation += 1;
        Ok(AnalysisRequest {
            generation: self.issued_generation,
            credential,
            upload,
        })
    }

    /// Store a finished analysis. All diagrams from earlier analyses are
    /// dropped.
    pub fn complete_analysis(&mut self, generation: u64, analysis: AnalysisText) -> RcaResult<()> {
        if generation != self.issued_generation {
            return Err(RcaError::state(
                self.state.name(),
                "complete analysis",
                format!(
                    "result belongs to request {} but request {} is current",
                    generation, self.issued_generation
                ),
            ));
        }
        info!(generation, "Analysis stored, diagrams reset");
        self.state = SessionState::Analyzed {
            generation,
            analysis,
            diagrams: BTreeMap::new(),
        };
        Ok(())
    }

    /// Validate and capture a diagram job for the current analysis.
    pub fn diagram_request(&self, kind: DiagramKind) -> RcaResult<DiagramRequest> {
        let credential = self.require_credential("generate diagram")?;
        match &self.state {
            SessionState::Analyzed {
                generation,
                analysis,
                ..
            } => Ok(DiagramRequest {
                generation: *generation,
                kind,
                credential,
                analysis: analysis.clone(),
            }),
            SessionState::Idle => Err(RcaError::state(
                "idle",
                format!("generate {}", kind),
                "run the analysis first",
            )),
        }
    }

    /// Store a rendered diagram produced for `generation`.
    pub fn complete_diagram(&mut self, generation: u64, artifact: DiagramArtifact) -> RcaResult<()> {
        match &mut self.state {
            SessionState::Analyzed {
                generation: current,
                diagrams,
                ..
            } if *current == generation => {
                debug!(kind = ?artifact.kind, path = %artifact.path.display(), "Diagram stored");
                diagrams.insert(artifact.kind, artifact);
                Ok(())
            }
            state => Err(RcaError::state(
                state.name(),
                format!("store {}", artifact.kind),
                "diagram belongs to an earlier analysis",
            )),
        }
    }

    /// Analyze the current upload and store the result.
    pub fn run_analysis(&mut self, pipeline: &Pipeline) -> RcaResult<&AnalysisText> {
        let request = self.analysis_request()?;
        let analysis = pipeline.analyze_upload(&request.credential, &request.upload)?;
        self.complete_analysis(request.generation, analysis)?;
        self.analysis()
            .ok_or_else(|| RcaError::state("idle", "read analysis", "analysis was not stored"))
    }

    /// Return the stored diagram for `kind`, producing it first if missing.
    pub fn run_diagram(&mut self, pipeline: &Pipeline, kind: DiagramKind) -> RcaResult<&DiagramArtifact> {
        if self.diagram(kind).is_none() {
            return self.regenerate_diagram(pipeline, kind);
        }
        self.diagram(kind)
            .ok_or_else(|| RcaError::state("analyzed", "read diagram", "diagram disappeared"))
    }

    /// Always request fresh diagram text for `kind` and render it.
    pub fn regenerate_diagram(&mut self, pipeline: &Pipeline, kind: DiagramKind) -> RcaResult<&DiagramArtifact> {
        let request = self.diagram_request(kind)?;
        let artifact = pipeline.produce_diagram(&request.credential, &request.analysis, kind)?;
        self.complete_diagram(request.generation, artifact)?;
        self.diagram(kind)
            .ok_or_else(|| RcaError::state("analyzed", "read diagram", "diagram was not stored"))
    }

    fn require_credential(&self, operation: &str) -> RcaResult<Credential> {
        self.credential()
            .map(|resolved| resolved.credential)
            .ok_or_else(|| {
                RcaError::auth(operation, "no API key configured")
                    .with_recovery_suggestion("Enter an API key in Settings or set it in the environment")
            })
    }
}
