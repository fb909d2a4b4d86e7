//! # Pipeline
//!
//! Owns the resolved configuration, the HTTP transport, the chat client and
//! the renderer. Both front ends drive the same steps through it:
//!
//! ```text
//! Upload / path ──► encode ──► analyze ──► generate_diagram_text ──► render
//!                   (intake)   (model)     (model, per kind)          (PNG)
//! ```
//!
//! Every step is a blocking call. Steps never retry.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::analysis::{self, AnalysisText};
use crate::config::{Credential, RcaConfig};
use crate::diagram::{self, DiagramArtifact, DiagramKind, DiagramText};
use crate::error::{RcaError, RcaResult};
use crate::llm::{ChatClient, ReqwestTransport, Transport};
use crate::processing::{self, EncodedImage};
use crate::render::DiagramRenderer;
use crate::session::Upload;

pub struct Pipeline {
    config: RcaConfig,
    chat: ChatClient,
    renderer: DiagramRenderer,
}

impl Pipeline {
    /// Validate `config` and connect through a `reqwest` transport.
    pub fn new(config: RcaConfig) -> RcaResult<Self> {
        config.validate()?;
        let transport = Arc::new(ReqwestTransport::new(config.request_timeout())?);
        Self::with_transport(config, transport)
    }

    /// Same as [`Pipeline::new`] over a caller-supplied transport.
    pub fn with_transport(config: RcaConfig, transport: Arc<dyn Transport>) -> RcaResult<Self> {
        config.validate()?;
        let chat = ChatClient::new(transport.clone(), config.chat_url(), config.model.clone());
        let renderer = DiagramRenderer::new(transport, config.render_url.clone(), config.output_dir.clone());
        info!(
            model = %config.model,
            render_url = %config.render_url,
            output_dir = %config.output_dir.display(),
            "Pipeline ready"
        );
        Ok(Self {
            config,
            chat,
            renderer,
        })
    }

    pub fn config(&self) -> &RcaConfig {
        &self.config
    }

    pub fn renderer(&self) -> &DiagramRenderer {
        &self.renderer
    }

    /// Key from the environment variable named in the configuration.
    pub fn environment_credential(&self) -> Option<Credential> {
        Credential::from_env(&self.config.api_key_env)
    }

    pub fn encode_image_file(&self, path: &Path) -> RcaResult<EncodedImage> {
        processing::encode_image_file(path, &self.config.to_intake_config())
    }

    pub fn encode_image_bytes(&self, bytes: &[u8]) -> RcaResult<EncodedImage> {
        processing::encode_image_bytes(bytes, &self.config.to_intake_config())
    }

    /// Spool an upload to a temporary file and encode it from there.
    ///
    /// The temporary file is removed when this returns, on success or failure.
    pub fn encode_upload(&self, upload: &Upload) -> RcaResult<EncodedImage> {
        let mut spool = tempfile::Builder::new()
            .prefix("rca-upload-")
            .suffix(&upload.suffix())
            .tempfile()
            .map_err(|e| RcaError::io("create upload spool file", e))?;
        spool
            .write_all(&upload.bytes)
            .and_then(|_| spool.flush())
            .map_err(|e| RcaError::io_at("write upload", spool.path().display().to_string(), e))?;
        debug!(file = %upload.file_name, spool = %spool.path().display(), "Upload spooled");

        self.encode_image_file(spool.path()).map_err(|e| match e {
            RcaError::ImageDecode { reason, .. } => RcaError::image_decode(&upload.file_name, reason),
            other => other,
        })
    }

    pub fn analyze(&self, credential: &Credential, image: &EncodedImage) -> RcaResult<AnalysisText> {
        analysis::analyze_workplace(&self.chat, credential, image)
    }

    /// Encode an upload and analyze it. Nothing is sent if decoding fails.
    pub fn analyze_upload(&self, credential: &Credential, upload: &Upload) -> RcaResult<AnalysisText> {
        let image = self.encode_upload(upload)?;
        self.analyze(credential, &image)
    }

    pub fn generate_diagram_text(
        &self,
        credential: &Credential,
        analysis: &AnalysisText,
        kind: DiagramKind,
    ) -> RcaResult<DiagramText> {
        diagram::generate_diagram_text(&self.chat, credential, analysis, kind, self.config.notation_policy)
    }

    /// Render checked diagram text to `<output_dir>/<file_stem>.png`.
    pub fn render(&self, text: &DiagramText) -> RcaResult<PathBuf> {
        self.renderer.render(&text.source, text.kind.file_stem())
    }

    /// Generate fresh diagram text for `kind` and render it.
    ///
    /// A render failure carries the diagram source as `raw_text` metadata.
    pub fn produce_diagram(
        &self,
        credential: &Credential,
        analysis: &AnalysisText,
        kind: DiagramKind,
    ) -> RcaResult<DiagramArtifact> {
        let text = self.generate_diagram_text(credential, analysis, kind)?;
        let path = self
            .render(&text)
            .map_err(|e| e.with_metadata("raw_text", text.source.as_str()))?;
        Ok(DiagramArtifact { kind, path, text })
    }
}
