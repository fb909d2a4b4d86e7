//! # Configuration Module
//!
//! Endpoint, model and intake settings, plus credential resolution.

pub mod config;
pub mod credential;

pub use config::{NotationPolicy, RcaConfig};
pub use credential::{Credential, CredentialSource, ResolvedCredential};
