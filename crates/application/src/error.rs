//! Application-level errors

use thiserror::Error;

/// Errors raised by a resolution context while producing a real instance
///
/// Propagated unchanged through the proxy, converted into the contract's own
/// error type. The proxy never retries or substitutes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// Nothing is registered for the requested service
    #[error("Service not registered: {service}")]
    NotRegistered { service: String },

    /// A scoped service was requested outside of any scope
    #[error("Scoped service {service} cannot be resolved from the root provider")]
    ScopedFromRoot { service: String },

    /// The scope the proxy was created in no longer exists
    #[error("Resolution scope has been disposed")]
    ScopeDisposed,

    /// The registered instance is not of the requested type
    #[error("Registered instance for {service} has an unexpected type")]
    TypeMismatch { service: String },

    /// The service factory failed
    #[error("Factory for {service} failed: {reason}")]
    Factory { service: String, reason: String },
}

impl ResolutionError {
    /// Create a not registered error
    pub fn not_registered(service: impl Into<String>) -> Self {
        Self::NotRegistered {
            service: service.into(),
        }
    }

    /// Create a factory error
    pub fn factory(service: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Factory {
            service: service.into(),
            reason: reason.into(),
        }
    }
}

/// Failure produced by a throw rule declared in configuration
///
/// Rules written in code produce the contract's own error values directly.
/// Contracts that accept configured rules convert this into their error type.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Injected fault: {message}")]
pub struct InjectedFault {
    /// Message declared with the rule
    pub message: String,
}

impl InjectedFault {
    /// Create an injected fault with the given message
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
