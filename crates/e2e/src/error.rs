//! Error types for scenario execution

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Timeout after {waited_ms} ms waiting for {target} to be {condition}")]
    Timeout {
        target: String,
        condition: String,
        waited_ms: u64,
    },

    #[error("Predicate mismatch on {target}: expected {expected}, observed {actual}")]
    PredicateMismatch {
        target: String,
        expected: String,
        actual: String,
    },

    #[error("Navigation to {url} failed: {reason}")]
    NavigationFailure { url: String, reason: String },

    #[error("Playwright not found. Install with: npm i playwright && npx playwright install")]
    PlaywrightNotFound,

    #[error("Driver error: {0}")]
    Driver(String),

    #[error("Fixture error: {0}")]
    Fixture(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    TomlDe(#[from] toml::de::Error),

    #[error("TOML error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

/// Outcome class of a failed scenario
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// A condition never became true within its bound
    Timeout,
    /// A predicate evaluated to a different state than expected
    PredicateMismatch,
    /// The target page could not be reached
    NavigationFailure,
    /// The harness itself failed (driver process, protocol, I/O)
    Harness,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Timeout => "timeout",
            FailureKind::PredicateMismatch => "predicate_mismatch",
            FailureKind::NavigationFailure => "navigation_failure",
            FailureKind::Harness => "harness",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl E2eError {
    pub fn kind(&self) -> FailureKind {
        match self {
            E2eError::Timeout { .. } => FailureKind::Timeout,
            E2eError::PredicateMismatch { .. } => FailureKind::PredicateMismatch,
            E2eError::NavigationFailure { .. } => FailureKind::NavigationFailure,
            _ => FailureKind::Harness,
        }
    }
}
