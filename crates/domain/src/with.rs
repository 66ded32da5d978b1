//! Shorthand constructors for argument matchers
//!
//! Reads naturally at the rule declaration site:
//!
//! ```
//! use domain::with;
//!
//! let matchers = [with::any::<u32>(), with::value("widget".to_string())];
//! assert_eq!(matchers[0].to_string(), "any<u32>");
//! ```

use std::any::Any;
use std::fmt;

use crate::matcher::ArgumentMatcher;

/// Any argument of type `T`
#[must_use]
pub fn any<T: Any>() -> ArgumentMatcher {
    ArgumentMatcher::any::<T>()
}

/// Only an argument equal to `value`
#[must_use]
pub fn value<T>(value: T) -> ArgumentMatcher
where
    T: PartialEq + fmt::Debug + Send + Sync + 'static,
{
    ArgumentMatcher::exactly(value)
}

/// Any argument of type `T` satisfying `predicate`
#[must_use]
pub fn matching<T, F>(description: impl Into<String>, predicate: F) -> ArgumentMatcher
where
    T: Any,
    F: Fn(&T) -> bool + Send + Sync + 'static,
{
    ArgumentMatcher::matching(description, predicate)
}
