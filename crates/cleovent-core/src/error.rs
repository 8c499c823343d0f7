//! Error taxonomy shared by every flow.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// What was wrong with a single field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum FieldProblem {
    Missing,
    WrongType {
        expected: &'static str,
        found: &'static str,
    },
    NonFinite,
    Invalid {
        message: String,
    },
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldProblem::Missing => f.write_str("required field is missing"),
            FieldProblem::WrongType { expected, found } => {
                write!(f, "expected {expected}, found {found}")
            }
            FieldProblem::NonFinite => f.write_str("expected a finite number"),
            FieldProblem::Invalid { message } => f.write_str(message),
        }
    }
}

/// One schema violation, addressed by a dotted/indexed path
/// (e.g. `suggestions[0].location.latitude`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub path: String,
    pub problem: FieldProblem,
}

impl FieldError {
    pub fn new(path: impl Into<String>, problem: FieldProblem) -> Self {
        Self {
            path: path.into(),
            problem,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.problem)
    }
}

/// Failure of a single flow invocation.
///
/// Every variant is scoped to one call. None of them is retried by the
/// gateway; see [`FlowError::is_retryable`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FlowError {
    /// A required credential or setting is missing, or a flow was registered
    /// with a template that does not match its schema. Raised before any
    /// network activity.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Input or output failed its declared schema. Carries every offending field.
    #[error("{flow}: {} field error(s): {}", .errors.len(), join_errors(.errors))]
    Validation {
        flow: String,
        errors: Vec<FieldError>,
    },

    /// Network failure, timeout, or non-success HTTP status.
    #[error("{service} transport error{}: {message}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Transport {
        service: &'static str,
        status: Option<u16>,
        message: String,
    },

    /// The service answered at the transport level but signalled an
    /// application-level failure or sent an unusable payload.
    #[error("{service} returned an error: {message}")]
    Upstream {
        service: &'static str,
        message: String,
    },
}

fn join_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl FlowError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    pub fn validation(flow: impl Into<String>, errors: Vec<FieldError>) -> Self {
        Self::Validation {
            flow: flow.into(),
            errors,
        }
    }

    pub fn transport(service: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            service,
            status: None,
            message: message.into(),
        }
    }

    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::Upstream {
            service,
            message: message.into(),
        }
    }

    /// Field errors carried by a validation failure, empty otherwise.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            FlowError::Validation { errors, .. } => errors,
            _ => &[],
        }
    }

    /// Flows never retry automatically, whatever the failure.
    pub fn is_retryable(&self) -> bool {
        false
    }

    /// Generic text suitable for showing to an end user.
    pub fn user_message(&self) -> &'static str {
        match self {
            FlowError::Configuration(_) => "The service is not configured. Please contact an administrator.",
            FlowError::Validation { .. } => "The request or the service reply was not in the expected format.",
            FlowError::Transport { .. } | FlowError::Upstream { .. } => {
                "The external service is unavailable right now. Please try again later."
            }
        }
    }
}
