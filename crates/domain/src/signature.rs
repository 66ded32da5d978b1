//! Invocation signatures: the matching key of a behavior rule

use std::fmt;

use crate::errors::AuthoringError;
use crate::invocation::Invocation;
use crate::matcher::ArgumentMatcher;

/// Method name plus ordered argument matchers
///
/// Matches an [`Invocation`] when the method names are equal, the arities are
/// equal and every positional matcher accepts its actual argument.
#[derive(Debug, Clone)]
pub struct InvocationSignature {
    method: String,
    matchers: Vec<ArgumentMatcher>,
}

impl InvocationSignature {
    /// Signature for `method` with the given positional matchers
    pub fn new(
        method: impl Into<String>,
        matchers: impl IntoIterator<Item = ArgumentMatcher>,
    ) -> Result<Self, AuthoringError> {
        let method = method.into();
        if method.trim().is_empty() {
            return Err(AuthoringError::EmptyMethodName);
        }
        Ok(Self {
            method,
            matchers: matchers.into_iter().collect(),
        })
    }

    /// Method name
    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    /// Positional matchers
    #[must_use]
    pub fn matchers(&self) -> &[ArgumentMatcher] {
        &self.matchers
    }

    /// Number of arguments this signature describes
    #[must_use]
    pub fn arity(&self) -> usize {
        self.matchers.len()
    }

    /// Whether an actual call matches this signature
    #[must_use]
    pub fn matches(&self, invocation: &Invocation<'_>) -> bool {
        self.method == invocation.method()
            && self.matchers.len() == invocation.arity()
            && self
                .matchers
                .iter()
                .zip(invocation.args())
                .all(|(matcher, argument)| matcher.accepts(*argument))
    }
}

impl fmt::Display for InvocationSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.method)?;
        for (idx, matcher) in self.matchers.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{matcher}")?;
        }
        write!(f, ")")
    }
}
