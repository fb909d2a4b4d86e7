//! # Configuration
//!
//! [`RcaConfig`] is the common interface between the CLI, the desktop shell and
//! the library. It is built from defaults, overridden from the environment, then
//! overridden again by CLI flags or shell settings.
//!
//! ## Configuration Parameters
//!
//! | Parameter | Default | Environment |
//! |-----------|---------|-------------|
//! | `api_base_url` | `https://api.groq.com/openai/v1` | `RCA_API_BASE` |
//! | `model` | `meta-llama/llama-4-scout-17b-16e-instruct` | `RCA_MODEL` |
//! | `render_url` | `https://kroki.io/plantuml/png` | `RCA_RENDER_URL` |
//! | `output_dir` | `.` | `RCA_OUTPUT_DIR` |
//! | `api_key_env` | `GROQ_API_KEY` | `RCA_API_KEY_ENV` |
//! | `target_width` × `target_height` | 800 × 600 | |
//! | `jpeg_quality` | 95 | |
//! | `notation_policy` | lenient | |
//! | `request_timeout_secs` | transport default | |
//!
//! ## Examples
//!
//! ```rust
//! use workplace_rca::config::RcaConfig;
//!
//! let mut config = RcaConfig::default();
//! config.model = "llama-3.2-90b-vision-preview".to_string();
//! assert!(config.validate().is_ok());
//!
//! config.jpeg_quality = 0;
//! assert!(config.validate().is_err());
//! ```

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{RcaError, RcaResult};
use crate::processing::intake::IntakeConfig;

/// How strictly model output must match the requested diagram notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotationPolicy {
    /// Extract the diagram block from surrounding prose or code fences.
    #[default]
    Lenient,
    /// The whole response must be the diagram block.
    Strict,
}

impl std::str::FromStr for NotationPolicy {
    type Err = RcaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lenient" => Ok(NotationPolicy::Lenient),
            "strict" => Ok(NotationPolicy::Strict),
            other => Err(RcaError::config(
                "notation_policy",
                other,
                "expected 'lenient' or 'strict'",
            )),
        }
    }
}

/// Settings shared by every pipeline step.
#[derive(Debug, Clone)]
pub struct RcaConfig {
    /// OpenAI-compatible API root; `/chat/completions` is appended.
    pub api_base_url: String,

    /// Multimodal model used for both the analysis and the diagram text.
    pub model: String,

    /// Rendering endpoint accepting PlantUML source as `text/plain`.
    pub render_url: String,

    /// Directory rendered PNG files are written to.
    pub output_dir: PathBuf,

    /// Environment variable holding the API key.
    pub api_key_env: String,

    /// Width the uploaded image is resized to.
    pub target_width: u32,

    /// Height the uploaded image is resized to.
    pub target_height: u32,

    /// JPEG quality (1-100) for the re-encoded image.
    pub jpeg_quality: u8,

    pub notation_policy: NotationPolicy,

    /// `None` keeps the HTTP client's own default.
    pub request_timeout_secs: Option<u64>,
}

impl Default for RcaConfig {
    fn default() -> Self {
        Self {
            api_base_url: "https://api.groq.com/openai/v1".to_string(),
            model: "meta-llama/llama-4-scout-17b-16e-instruct".to_string(),
            render_url: "https://kroki.io/plantuml/png".to_string(),
            output_dir: PathBuf::from("."),
            api_key_env: "GROQ_API_KEY".to_string(),
            target_width: 800,
            target_height: 600,
            jpeg_quality: 95,
            notation_policy: NotationPolicy::Lenient,
            request_timeout_secs: None,
        }
    }
}

impl RcaConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults overridden by `RCA_*` process environment variables.
    pub fn from_env() -> Self {
        Self::from_env_map(&std::env::vars().collect())
    }

    /// Defaults overridden by the given variables (useful for testing).
    pub fn from_env_map(env: &HashMap<String, String>) -> Self {
        let mut config = Self::default();
        let get = |key: &str| {
            env.get(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        if let Some(v) = get("RCA_API_BASE") {
            config.api_base_url = v;
        }
        if let Some(v) = get("RCA_MODEL") {
            config.model = v;
        }
        if let Some(v) = get("RCA_RENDER_URL") {
            config.render_url = v;
        }
        if let Some(v) = get("RCA_OUTPUT_DIR") {
            config.output_dir = PathBuf::from(v);
        }
        if let Some(v) = get("RCA_API_KEY_ENV") {
            config.api_key_env = v;
        }
        config
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> RcaResult<()> {
        if !is_http_url(&self.api_base_url) {
            return Err(RcaError::config(
                "api_base_url",
                &self.api_base_url,
                "must be an http(s) URL",
            ));
        }
        if !is_http_url(&self.render_url) {
            return Err(RcaError::config(
                "render_url",
                &self.render_url,
                "must be an http(s) URL",
            ));
        }
        if self.model.trim().is_empty() {
            return Err(RcaError::config("model", &self.model, "must not be empty"));
        }
        if self.api_key_env.trim().is_empty() {
            return Err(RcaError::config(
                "api_key_env",
                &self.api_key_env,
                "must name an environment variable",
            ));
        }
        if self.target_width == 0 || self.target_height == 0 {
            return Err(RcaError::config(
                "target_size",
                format!("{}x{}", self.target_width, self.target_height),
                "both dimensions must be greater than 0",
            ));
        }
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(RcaError::config(
                "jpeg_quality",
                self.jpeg_quality.to_string(),
                "must be between 1 and 100",
            ));
        }
        if self.request_timeout_secs == Some(0) {
            return Err(RcaError::config(
                "request_timeout_secs",
                "0",
                "must be greater than 0 when set",
            ));
        }
        Ok(())
    }

    /// Full chat-completions URL.
    pub fn chat_url(&self) -> String {
        format!("{}/chat/completions", self.api_base_url.trim_end_matches('/'))
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Convert to the intake step's settings.
    pub fn to_intake_config(&self) -> IntakeConfig {
        IntakeConfig {
            target_width: self.target_width,
            target_height: self.target_height,
            jpeg_quality: self.jpeg_quality,
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
