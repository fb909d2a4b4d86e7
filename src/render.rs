//! Diagram rendering through a remote PlantUML service.
//!
//! The diagram source is POSTed as `text/plain` to the render endpoint. On
//! status 200 the response body is written byte-for-byte to
//! `<output_dir>/<name>.png`, replacing any file of that name. Any other
//! status leaves the filesystem untouched.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::error::{RcaError, RcaResult};
use crate::llm::Transport;

/// Render status that counts as success. Other 2xx codes do not.
const RENDER_OK: u16 = 200;

pub struct DiagramRenderer {
    transport: Arc<dyn Transport>,
    endpoint: String,
    output_dir: PathBuf,
}

impl DiagramRenderer {
    pub fn new(
        transport: Arc<dyn Transport>,
        endpoint: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            transport,
            endpoint: endpoint.into(),
            output_dir: output_dir.into(),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Path a successful render of `name` is written to.
    pub fn output_path(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}.png", name))
    }

    /// Render `source` and write `<name>.png`. Returns the written path.
    pub fn render(&self, source: &str, name: &str) -> RcaResult<PathBuf> {
        validate_name(name)?;

        let reply = self
            .transport
            .post_text(&self.endpoint, source)
            .map_err(|e| {
                warn!(name, error = %e, "Render request failed");
                RcaError::render(None, e.to_string())
                    .with_operation("render diagram")
                    .with_metadata("name", name)
            })?;

        if reply.status != RENDER_OK {
            let reason = summarize_body(&reply.text());
            warn!(name, status = reply.status, "Renderer rejected diagram");
            return Err(RcaError::render(Some(reply.status), reason)
                .with_operation("render diagram")
                .with_metadata("name", name)
                .with_metadata("endpoint", self.endpoint.as_str()));
        }

        let path = self.output_path(name);
        fs::write(&path, &reply.body)
            .map_err(|e| RcaError::io_at("write rendered diagram", path.display().to_string(), e))?;
        info!(path = %path.display(), bytes = reply.body.len(), "Diagram rendered");
        Ok(path)
    }
}

/// Names are plain file stems: no separators, no parent references.
fn validate_name(name: &str) -> RcaResult<()> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\'])
        || name.chars().any(char::is_control);
    if bad {
        return Err(RcaError::validation(
            "name",
            "must be a plain file stem without path separators",
            name,
        ));
    }
    Ok(())
}

/// Keep error messages readable when the renderer returns a large page.
fn summarize_body(body: &str) -> String {
    const LIMIT: usize = 200;
    let trimmed = body.trim();
    if trimmed.chars().count() <= LIMIT {
        return trimmed.to_string();
    }
    let head: String = trimmed.chars().take(LIMIT).collect();
    format!("{}...", head)
}
