//! Domain-level errors

use thiserror::Error;

/// Errors raised while declaring a behavior rule
///
/// Always surfaced at registration time, never while a proxied call runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AuthoringError {
    /// The rule names a method the contract does not declare
    #[error("Contract '{contract}' has no method named '{method}'")]
    UnknownMethod { contract: String, method: String },

    /// No method with that name takes the given number of arguments
    #[error("Method '{method}' takes {expected} argument(s), rule supplies {found}")]
    ArityMismatch {
        method: String,
        expected: String,
        found: usize,
    },

    /// A matcher's type differs from the parameter type at its position
    #[error("Argument {position} of '{method}' is {expected}, matcher expects {found}")]
    ArgumentTypeMismatch {
        method: String,
        position: usize,
        expected: &'static str,
        found: &'static str,
    },

    /// A trigger probability outside `0.0..=1.0`
    #[error("Invalid probability {0}: must be between 0.0 and 1.0")]
    InvalidProbability(f64),

    /// A latency specification that cannot be sampled
    #[error("Invalid latency: {0}")]
    InvalidLatency(String),

    /// A declared argument value that cannot be turned into a matcher
    #[error("Invalid argument {position} for '{method}': {reason}")]
    InvalidArgument {
        method: String,
        position: usize,
        reason: String,
    },

    /// A declarative rule names a contract nobody affected
    #[error("Unknown contract: {0}")]
    UnknownContract(String),

    /// A rule without a method name
    #[error("Method name must not be empty")]
    EmptyMethodName,
}

impl AuthoringError {
    /// Create an unknown method error
    pub fn unknown_method(contract: impl Into<String>, method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            contract: contract.into(),
            method: method.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(
        method: impl Into<String>,
        position: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            method: method.into(),
            position,
            reason: reason.into(),
        }
    }
}
