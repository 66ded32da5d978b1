//! Actual invocation descriptor captured at a proxied call site

use std::any::Any;
use std::fmt;

/// A single call argument, borrowed from the call site
///
/// Arguments are compared by runtime type and, for exact matchers, by value.
/// Borrowed data (`&str`, slices) is captured through its owned form.
pub type Argument = dyn Any + Send + Sync;

/// An actual method call on a contract: the method name plus its arguments
///
/// Built by a proxy right before interception. It only borrows, so it never
/// outlives the call that produced it and matching has no side effects.
#[derive(Clone, Copy)]
pub struct Invocation<'a> {
    method: &'a str,
    args: &'a [&'a Argument],
}

impl<'a> Invocation<'a> {
    /// Describe a call to `method` with the given positional arguments
    #[must_use]
    pub const fn new(method: &'a str, args: &'a [&'a Argument]) -> Self {
        Self { method, args }
    }

    /// Describe a call to a method without arguments
    #[must_use]
    pub const fn without_args(method: &'a str) -> Self {
        Self { method, args: &[] }
    }

    /// Name of the invoked method
    #[must_use]
    pub const fn method(&self) -> &'a str {
        self.method
    }

    /// Positional arguments
    #[must_use]
    pub const fn args(&self) -> &'a [&'a Argument] {
        self.args
    }

    /// Number of arguments
    #[must_use]
    pub const fn arity(&self) -> usize {
        self.args.len()
    }

    /// Argument at `position`, downcast to `T`
    ///
    /// Returns `None` when the position is out of range or the type differs.
    #[must_use]
    pub fn arg<T: Any>(&self, position: usize) -> Option<&'a T> {
        self.args.get(position)?.downcast_ref::<T>()
    }
}

impl fmt::Debug for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Invocation")
            .field("method", &self.method)
            .field("arity", &self.args.len())
            .finish()
    }
}

impl fmt::Display for Invocation<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.method, self.args.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn captures_method_and_args() {
        let id = 42_u32;
        let name = "widget".to_string();
        let args: [&Argument; 2] = [&id, &name];
        let invocation = Invocation::new("find", &args);

        assert_eq!(invocation.method(), "find");
        assert_eq!(invocation.arity(), 2);
        assert_eq!(invocation.arg::<u32>(0), Some(&42));
        assert_eq!(invocation.arg::<String>(1).map(String::as_str), Some("widget"));
    }

    #[test]
    fn arg_with_wrong_type_is_none() {
        let id = 42_u32;
        let args: [&Argument; 1] = [&id];
        let invocation = Invocation::new("get_by_id", &args);
        assert!(invocation.arg::<i64>(0).is_none());
        assert!(invocation.arg::<u32>(1).is_none());
    }

    #[test]
    fn without_args_has_zero_arity() {
        let invocation = Invocation::without_args("list_all");
        assert_eq!(invocation.arity(), 0);
        assert!(invocation.args().is_empty());
    }

    #[test]
    fn display_shows_method_and_arity() {
        let id = 7_i32;
        let args: [&Argument; 1] = [&id];
        let invocation = Invocation::new("get_by_id", &args);
        assert_eq!(invocation.to_string(), "get_by_id/1");
        assert!(format!("{invocation:?}").contains("get_by_id"));
    }
}
