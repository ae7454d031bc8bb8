//! Custom error types for verbench.
//!
//! This module defines explicit enum error types as per coding guidelines.
//! No `Box<dyn Error>`, no `anyhow::Result` - all errors are strongly typed.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::ScenarioKind;

/// Top-level error type for a benchmark run.
/// All errors are explicit variants - no catch-all or generic handling.
#[derive(Debug, Error)]
pub enum VerbenchError {
    // =========================================================================
    // Configuration Errors - Fail-Fast on Invalid Config
    // =========================================================================
    #[error("Hard validation error: {0}")]
    HardValidation(#[from] HardValidationError),

    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: PathBuf },

    #[error("Configuration parse error: {message}")]
    ConfigParse { message: String },

    // =========================================================================
    // Setup Errors - A partially registered catalog is never measured
    // =========================================================================
    #[error("Registration failed: {0}")]
    Registration(#[from] RegistrationError),

    #[error("Unknown target version: {version}")]
    UnknownVersion { version: String },

    #[error("Server error: {message}")]
    Server { message: String },

    // =========================================================================
    // Measurement Errors
    // =========================================================================
    #[error("Load error: {0}")]
    Load(#[from] LoadError),

    // =========================================================================
    // System Errors
    // =========================================================================
    #[error("IO error: {context} - {source}")]
    Io {
        context: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// Hard validation errors abort the run before any server is started.
#[derive(Debug, Error)]
pub enum HardValidationError {
    #[error("Invalid field value: {field} = {value} - {reason}")]
    InvalidFieldValue {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid port: {port} - {reason}")]
    InvalidPort { port: u16, reason: String },

    #[error("Duplicate route path: {path}")]
    DuplicateRoute { path: String },
}

/// Names of the registration strategies, in resolution priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyName {
    /// Operation named after the kind whose parameters accept the arguments exactly.
    ExactMatch,
    /// Same leading parameters plus a trailing array parameter.
    VarargArray,
    /// Error handler registered as `(status, handler)`.
    ErrorStatusHandler,
    /// Error handler registered as `(status, "*", handler)`.
    ErrorStatusWildcardRole,
}

impl StrategyName {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ExactMatch => "exact-match",
            Self::VarargArray => "vararg-array",
            Self::ErrorStatusHandler => "error-status-handler",
            Self::ErrorStatusWildcardRole => "error-status-wildcard-role",
        }
    }
}

impl fmt::Display for StrategyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single strategy could not register a scenario.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrategyFailure {
    #[error("no '{kind}' operation accepts the arguments")]
    NoCandidate { kind: ScenarioKind },

    #[error("trailing array component type of '{kind}' operation #{index} is undeterminable")]
    UnknownComponentType { kind: ScenarioKind, index: usize },

    #[error("operation #{index} rejected the arguments: {source}")]
    Invoke {
        index: usize,
        #[source]
        source: InvokeError,
    },
}

/// One attempted strategy and its outcome, kept for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyAttempt {
    pub strategy: StrategyName,
    pub failure: StrategyFailure,
}

impl fmt::Display for StrategyAttempt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.strategy, self.failure)
    }
}

/// No compatible operation after exhausting the resolution ladder. Fatal.
#[derive(Debug, Clone, PartialEq, Error)]
#[error(
    "no compatible '{kind}' operation on {surface_type} for {path}; attempted: [{}]",
    .attempted.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ")
)]
pub struct RegistrationError {
    pub surface_type: String,
    pub kind: ScenarioKind,
    pub path: String,
    pub attempted: Vec<StrategyAttempt>,
}

/// Raised by a surface operation when the supplied arguments are unusable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvokeError {
    #[error("expected {expected} at position {position}")]
    ArgumentMismatch {
        position: usize,
        expected: &'static str,
    },

    #[error("expected {expected} arguments, got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("target refused registration: {reason}")]
    Refused { reason: String },
}

/// Transport-level failure of a single measured request.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("client used before setup()")]
    NotStarted,

    #[error("failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("failed to start client runtime: {0}")]
    Runtime(#[source] std::io::Error),

    #[error("connection to {url} failed: {source}")]
    Connect {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} timed out after {timeout_ms}ms")]
    Timeout { url: String, timeout_ms: u64 },

    #[error("transfer from {url} failed after {bytes_read} bytes: {source}")]
    Transfer {
        url: String,
        bytes_read: u64,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected response from {url}: {reason}")]
    Unexpected { url: String, reason: String },
}

/// Result type alias using VerbenchError.
pub type VerbenchResult<T> = Result<T, VerbenchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_error_display_lists_attempts() {
        let err = RegistrationError {
            surface_type: "TargetV9".to_string(),
            kind: ScenarioKind::Error,
            path: "/exception".to_string(),
            attempted: vec![
                StrategyAttempt {
                    strategy: StrategyName::ExactMatch,
                    failure: StrategyFailure::NoCandidate {
                        kind: ScenarioKind::Error,
                    },
                },
                StrategyAttempt {
                    strategy: StrategyName::ErrorStatusWildcardRole,
                    failure: StrategyFailure::NoCandidate {
                        kind: ScenarioKind::Error,
                    },
                },
            ],
        };
        let text = err.to_string();
        assert!(text.contains("TargetV9"));
        assert!(text.contains("exact-match"));
        assert!(text.contains("error-status-wildcard-role"));
    }

    #[test]
    fn test_error_chain() {
        let validation_err = HardValidationError::InvalidPort {
            port: 80,
            reason: "privileged".to_string(),
        };
        let err: VerbenchError = validation_err.into();
        assert!(matches!(err, VerbenchError::HardValidation(_)));
    }
}
