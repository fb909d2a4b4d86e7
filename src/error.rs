//! # Error Handling
//!
//! Hierarchical error type for the analysis pipeline, with an attached
//! [`ErrorContext`] and classification traits.
//!
//! ## Error Classification
//!
//! - **Fatal**: local problems the user must fix before anything can proceed
//!   (undecodable image, invalid configuration).
//! - **Surfaced**: model endpoint failures (transport, authentication, API
//!   status). The caller shows the message and leaves session state untouched.
//! - **Recoverable**: rendering failures and diagram text that does not match
//!   the expected notation. The caller may show the raw diagram text instead.
//!
//! Nothing is retried automatically; every failure ends its request.
//!
//! ## Usage
//!
//! ```rust
//! use workplace_rca::error::{RcaError, Recoverable};
//!
//! let error = RcaError::render(Some(500), "internal error")
//!     .with_context("rendering analysis_mindmap");
//!
//! assert!(error.is_recoverable());
//! assert!(error.to_string().contains("500"));
//! ```

use std::collections::BTreeMap;
use std::{error::Error as StdError, fmt, time::SystemTime};

/// How bad a failure is for the current request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    /// The request failed but a fallback exists (e.g. show raw diagram text).
    Warning,
    /// The request failed; nothing else is affected.
    Error,
    /// Nothing can proceed until the user fixes the input or configuration.
    Fatal,
}

/// Metadata attached to every [`RcaError`].
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub timestamp: SystemTime,
    /// Pipeline step that failed, e.g. `render diagram`.
    pub operation: Option<String>,
    /// Free-form detail added by the caller.
    pub context: Option<String>,
    /// What the user can do about it.
    pub recovery_suggestion: Option<String>,
    pub severity: ErrorSeverity,
    /// Whether the caller has a fallback for this failure.
    pub recoverable: bool,
    /// Extra key/value detail, e.g. `raw_text` for diagram failures.
    pub metadata: BTreeMap<String, String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::with_severity(ErrorSeverity::Error, false)
    }

    fn with_severity(severity: ErrorSeverity, recoverable: bool) -> Self {
        Self {
            timestamp: SystemTime::now(),
            operation: None,
            context: None,
            recovery_suggestion: None,
            severity,
            recoverable,
            metadata: BTreeMap::new(),
        }
    }

    fn fatal() -> Self {
        Self::with_severity(ErrorSeverity::Fatal, false)
    }

    fn recoverable() -> Self {
        Self::with_severity(ErrorSeverity::Warning, true)
    }
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Base error type for the analysis pipeline
#[derive(Debug)]
pub enum RcaError {
    /// Configuration errors
    Config {
        field: String,
        value: String,
        reason: String,
        context: ErrorContext,
    },
    /// Validation errors on caller-supplied values
    Validation {
        field: String,
        constraint: String,
        value: String,
        context: ErrorContext,
    },
    /// Missing or rejected credential
    Auth {
        operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// Uploaded bytes are not a decodable raster image
    ImageDecode {
        source_name: String,
        reason: String,
        context: ErrorContext,
    },
    /// Resizing or JPEG encoding failed
    ImageEncode {
        stage: String,
        reason: String,
        context: ErrorContext,
    },
    /// I/O errors
    Io {
        operation: String,
        path: Option<String>,
        source: std::io::Error,
        context: ErrorContext,
    },
    /// Transport-level failure talking to a remote endpoint
    Network {
        operation: String,
        address: Option<String>,
        source: Option<Box<dyn StdError + Send + Sync>>,
        context: ErrorContext,
    },
    /// Model endpoint answered with an unusable response
    Api {
        status: Option<u16>,
        message: String,
        context: ErrorContext,
    },
    /// Rendering endpoint did not produce an image
    Render {
        status: Option<u16>,
        reason: String,
        context: ErrorContext,
    },
    /// Diagram text does not match the expected notation
    Notation {
        notation: String,
        reason: String,
        context: ErrorContext,
    },
    /// Operation attempted from the wrong session state
    State {
        current_state: String,
        attempted_operation: String,
        reason: String,
        context: ErrorContext,
    },
    /// External library errors
    External {
        library: String,
        source: Box<dyn StdError + Send + Sync>,
        context: ErrorContext,
    },
}

impl RcaError {
    /// Create a configuration error
    pub fn config(
        field: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Config {
            field: field.into(),
            value: value.into(),
            reason: reason.into(),
            context: ErrorContext::fatal(),
        }
    }

    /// Create a validation error
    pub fn validation(
        field: impl Into<String>,
        constraint: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self::Validation {
            field: field.into(),
            constraint: constraint.into(),
            value: value.into(),
            context: ErrorContext::fatal(),
        }
    }

    /// Create an authentication error
    pub fn auth(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Auth {
            operation: operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an image decode error
    pub fn image_decode(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ImageDecode {
            source_name: source_name.into(),
            reason: reason.into(),
            context: ErrorContext::fatal(),
        }
    }

    /// Create an image encode error
    pub fn image_encode(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ImageEncode {
            stage: stage.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            operation: operation.into(),
            path: None,
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create an I/O error tied to a path
    pub fn io_at(
        operation: impl Into<String>,
        path: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        Self::Io {
            operation: operation.into(),
            path: Some(path.into()),
            source,
            context: ErrorContext::new(),
        }
    }

    /// Create a network error
    pub fn network(
        operation: impl Into<String>,
        address: Option<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            operation: operation.into(),
            address,
            source: Some(Box::new(source)),
            context: ErrorContext::new(),
        }
    }

    /// Create an API response error
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create a rendering error
    pub fn render(status: Option<u16>, reason: impl Into<String>) -> Self {
        Self::Render {
            status,
            reason: reason.into(),
            context: ErrorContext::recoverable(),
        }
    }

    /// Create a notation error
    pub fn notation(notation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Notation {
            notation: notation.into(),
            reason: reason.into(),
            context: ErrorContext::recoverable(),
        }
    }

    /// Create a state error
    pub fn state(
        current_state: impl Into<String>,
        attempted_operation: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::State {
            current_state: current_state.into(),
            attempted_operation: attempted_operation.into(),
            reason: reason.into(),
            context: ErrorContext::new(),
        }
    }

    /// Create an external library error
    pub fn external(
        library: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            library: library.into(),
            source: Box::new(source),
            context: ErrorContext::new(),
        }
    }

    /// Add context to the error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context_mut().context = Some(context.into());
        self
    }

    /// Add operation context
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.context_mut().operation = Some(operation.into());
        self
    }

    /// Add recovery suggestion
    pub fn with_recovery_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context_mut().recovery_suggestion = Some(suggestion.into());
        self
    }

    /// Add metadata
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context_mut().metadata.insert(key.into(), value.into());
        self
    }

    /// HTTP status attached to API and render failures, if any
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Render { status, .. } => *status,
            _ => None,
        }
    }

    /// Get the error context
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::Validation { context, .. } => context,
            Self::Auth { context, .. } => context,
            Self::ImageDecode { context, .. } => context,
            Self::ImageEncode { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Api { context, .. } => context,
            Self::Render { context, .. } => context,
            Self::Notation { context, .. } => context,
            Self::State { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    fn context_mut(&mut self) -> &mut ErrorContext {
        match self {
            Self::Config { context, .. } => context,
            Self::Validation { context, .. } => context,
            Self::Auth { context, .. } => context,
            Self::ImageDecode { context, .. } => context,
            Self::ImageEncode { context, .. } => context,
            Self::Io { context, .. } => context,
            Self::Network { context, .. } => context,
            Self::Api { context, .. } => context,
            Self::Render { context, .. } => context,
            Self::Notation { context, .. } => context,
            Self::State { context, .. } => context,
            Self::External { context, .. } => context,
        }
    }

    /// Get the error category as a string
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::Validation { .. } => "validation",
            Self::Auth { .. } => "auth",
            Self::ImageDecode { .. } => "image_decode",
            Self::ImageEncode { .. } => "image_encode",
            Self::Io { .. } => "io",
            Self::Network { .. } => "network",
            Self::Api { .. } => "api",
            Self::Render { .. } => "render",
            Self::Notation { .. } => "notation",
            Self::State { .. } => "state",
            Self::External { .. } => "external",
        }
    }
}

impl fmt::Display for RcaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RcaError::Config {
                field,
                value,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Configuration error in '{}': {} (value: {})",
                    field, reason, value
                )
            }
            RcaError::Validation {
                field,
                constraint,
                value,
                ..
            } => {
                write!(
                    f,
                    "Validation failed for '{}': {} (value: {})",
                    field, constraint, value
                )
            }
            RcaError::Auth {
                operation, reason, ..
            } => {
                write!(f, "Authentication error during {}: {}", operation, reason)
            }
            RcaError::ImageDecode {
                source_name,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Could not open or decode the image '{}': {}",
                    source_name, reason
                )
            }
            RcaError::ImageEncode { stage, reason, .. } => {
                write!(f, "Image encoding failed during {}: {}", stage, reason)
            }
            RcaError::Io {
                operation,
                path,
                source,
                ..
            } => {
                if let Some(path) = path {
                    write!(
                        f,
                        "I/O error during {} on '{}': {}",
                        operation, path, source
                    )
                } else {
                    write!(f, "I/O error during {}: {}", operation, source)
                }
            }
            RcaError::Network {
                operation,
                address,
                source,
                ..
            } => {
                match address {
                    Some(address) => write!(f, "Network error during {} on {}", operation, address)?,
                    None => write!(f, "Network error during {}", operation)?,
                }
                if let Some(source) = source {
                    write!(f, ": {}", source)?;
                }
                Ok(())
            }
            RcaError::Api {
                status, message, ..
            } => {
                if let Some(status) = status {
                    write!(f, "Model API error (status {}): {}", status, message)
                } else {
                    write!(f, "Model API error: {}", message)
                }
            }
            RcaError::Render { status, reason, .. } => {
                if let Some(status) = status {
                    write!(
                        f,
                        "Failed to generate diagram. Status code: {} ({})",
                        status, reason
                    )
                } else {
                    write!(f, "Error generating diagram: {}", reason)
                }
            }
            RcaError::Notation {
                notation, reason, ..
            } => {
                write!(f, "Model output is not valid {}: {}", notation, reason)
            }
            RcaError::State {
                current_state,
                attempted_operation,
                reason,
                ..
            } => {
                write!(
                    f,
                    "Cannot {} while session is {}: {}",
                    attempted_operation, current_state, reason
                )
            }
            RcaError::External {
                library, source, ..
            } => {
                write!(f, "External library error in {}: {}", library, source)
            }
        }
    }
}

impl StdError for RcaError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::External { source, .. } => Some(source.as_ref()),
            Self::Network {
                source: Some(source),
                ..
            } => Some(source.as_ref()),
            _ => None,
        }
    }
}

/// Result type alias using our custom error type
pub type RcaResult<T> = Result<T, RcaError>;

/// Trait for errors that can be recovered from
pub trait Recoverable {
    /// Check if this error can be recovered from
    fn is_recoverable(&self) -> bool;
}

impl Recoverable for RcaError {
    fn is_recoverable(&self) -> bool {
        self.context().recoverable || matches!(self, Self::Render { .. } | Self::Notation { .. })
    }
}

/// Trait for errors with severity levels
pub trait HasSeverity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

impl HasSeverity for RcaError {
    fn severity(&self) -> ErrorSeverity {
        self.context().severity
    }
}

/// Trait for errors that provide recovery suggestions
pub trait HasRecoverySuggestion {
    /// Get recovery suggestion for this error
    fn recovery_suggestion(&self) -> Option<&str>;
}

impl HasRecoverySuggestion for RcaError {
    fn recovery_suggestion(&self) -> Option<&str> {
        self.context().recovery_suggestion.as_deref()
    }
}

/// Error classification utilities
pub mod classify {
    use super::*;

    /// Check if an error is fatal (the operation must halt)
    pub fn is_fatal(error: &RcaError) -> bool {
        matches!(
            error,
            RcaError::Config { .. } | RcaError::Validation { .. } | RcaError::ImageDecode { .. }
        ) || error.severity() == ErrorSeverity::Fatal
    }

    /// Check if an error came from the hosted model endpoint
    pub fn is_model_failure(error: &RcaError) -> bool {
        matches!(
            error,
            RcaError::Network { .. } | RcaError::Auth { .. } | RcaError::Api { .. }
        )
    }
}

/// Error conversion implementations
impl From<std::io::Error> for RcaError {
    fn from(error: std::io::Error) -> Self {
        Self::io("unknown", error)
    }
}

impl From<serde_json::Error> for RcaError {
    fn from(error: serde_json::Error) -> Self {
        Self::external("serde_json", error)
    }
}

impl From<rca_scale::cpu::ScaleError> for RcaError {
    fn from(error: rca_scale::cpu::ScaleError) -> Self {
        Self::image_encode("resize", error.to_string())
    }
}
