//! API key handling.
//!
//! A key comes from one of two places: the process environment, or a value the
//! user typed into the shell for the current session. The session value wins
//! when present. Resolution happens once per session and the result is passed
//! to every request, instead of each call site reading the environment.

use std::collections::HashMap;
use std::fmt;

/// An API key. `Debug` and `Display` never print the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a key; blank input yields `None`.
    pub fn new(key: impl AsRef<str>) -> Option<Self> {
        let key = key.as_ref().trim();
        if key.is_empty() {
            None
        } else {
            Some(Self(key.to_string()))
        }
    }

    /// Read a key from the process environment.
    pub fn from_env(var: &str) -> Option<Self> {
        std::env::var(var).ok().and_then(Self::new)
    }

    /// Read a key from the given variables (useful for testing).
    pub fn from_env_map(env: &HashMap<String, String>, var: &str) -> Option<Self> {
        env.get(var).and_then(Self::new)
    }

    /// The raw secret, for the `Authorization` header only.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// `...abcd` style hint showing the last four characters.
    pub fn masked(&self) -> String {
        let tail: String = {
            let chars: Vec<char> = self.0.chars().collect();
            let start = chars.len().saturating_sub(4);
            chars[start..].iter().collect()
        };
        format!("...{}", tail)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Credential({})", self.masked())
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

/// Where the resolved key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Session,
    Environment,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Session => f.write_str("session"),
            CredentialSource::Environment => f.write_str("environment"),
        }
    }
}

/// A key together with its origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub credential: Credential,
    pub source: CredentialSource,
}

impl ResolvedCredential {
    /// Session value first, then the environment value.
    pub fn resolve(session: Option<&Credential>, environment: Option<&Credential>) -> Option<Self> {
        session
            .map(|c| Self {
                credential: c.clone(),
                source: CredentialSource::Session,
            })
            .or_else(|| {
                environment.map(|c| Self {
                    credential: c.clone(),
                    source: CredentialSource::Environment,
                })
            })
    }
}
