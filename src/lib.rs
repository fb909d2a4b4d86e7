//! # Workplace Root-Cause Analysis
//!
//! Thin client that sends a workplace photograph to a hosted multimodal model
//! for a root-cause analysis, asks the same model for diagram text derived from
//! that analysis, and has a remote PlantUML service render the text to PNG.
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//! - `processing`: image intake (decode, resize to 800×600, JPEG, base64)
//! - `llm`: HTTP transport and the chat-completions client
//! - `analysis`: the root-cause analysis request
//! - `diagram`: mind map, WBS and structured-data text generation plus notation checks
//! - `render`: remote rendering to `<name>.png`
//! - `pipeline`: one value wiring the steps together for both front ends
//! - `session`: state behind the interactive shell
//! - `config`: configuration and credential resolution
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use workplace_rca::{DiagramKind, Pipeline, RcaConfig};
//! use workplace_rca::config::Credential;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pipeline = Pipeline::new(RcaConfig::from_env())?;
//! let key = Credential::from_env("GROQ_API_KEY").ok_or("GROQ_API_KEY is not set")?;
//!
//! let image = pipeline.encode_image_file(Path::new("floor.jpg"))?;
//! let analysis = pipeline.analyze(&key, &image)?;
//! let map = pipeline.produce_diagram(&key, &analysis, DiagramKind::MindMap)?;
//! println!("{}", map.path.display());
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod config;
pub mod diagram;
pub mod error;
pub mod llm;
pub mod logging;
pub mod pipeline;
pub mod processing;
pub mod render;
pub mod session;
pub mod severity;

/// Re-export error types for convenience
pub use error::{HasRecoverySuggestion, HasSeverity, RcaError, RcaResult, Recoverable};

pub use analysis::AnalysisText;
pub use config::{NotationPolicy, RcaConfig};
pub use diagram::{DiagramArtifact, DiagramKind, DiagramText};
pub use pipeline::Pipeline;
pub use session::{Session, SessionState, Upload};
pub use severity::SeverityTier;
