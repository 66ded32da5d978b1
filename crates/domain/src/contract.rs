//! Contract descriptors
//!
//! A contract describes the methods a proxy intercepts: their names and
//! parameter types. Rules are validated against it when they are declared, so
//! a rule that could never match is rejected up front instead of silently
//! doing nothing at runtime.

use std::any::Any;
use std::fmt;

use serde::de::DeserializeOwned;

use crate::errors::AuthoringError;
use crate::matcher::{ArgumentMatcher, ArgumentType};
use crate::signature::InvocationSignature;

/// Parser turning a declared JSON/TOML value into an exact matcher
type ValueParser = fn(&serde_json::Value) -> Result<ArgumentMatcher, String>;

/// One method parameter
#[derive(Clone, Copy)]
pub struct ParamSpec {
    ty: ArgumentType,
    parse: Option<ValueParser>,
}

impl ParamSpec {
    /// Parameter type
    #[must_use]
    pub const fn argument_type(&self) -> ArgumentType {
        self.ty
    }

    /// Matcher accepting any value of this parameter's type
    #[must_use]
    pub const fn any_matcher(&self) -> ArgumentMatcher {
        ArgumentMatcher::Any(self.ty)
    }

    /// Build an exact matcher from a declared value
    ///
    /// Fails for opaque parameters and for values that do not deserialize
    /// into the parameter type.
    pub fn parse_value(&self, value: &serde_json::Value) -> Result<ArgumentMatcher, String> {
        match self.parse {
            Some(parse) => parse(value),
            None => Err(format!(
                "{} cannot be matched by value from configuration",
                self.ty
            )),
        }
    }
}

impl fmt::Debug for ParamSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamSpec")
            .field("ty", &self.ty.name())
            .field("parseable", &self.parse.is_some())
            .finish()
    }
}

fn parse_exact<T>(value: &serde_json::Value) -> Result<ArgumentMatcher, String>
where
    T: DeserializeOwned + PartialEq + fmt::Debug + Send + Sync + 'static,
{
    serde_json::from_value::<T>(value.clone())
        .map(ArgumentMatcher::exactly)
        .map_err(|e| e.to_string())
}

/// One interceptable method of a contract
#[derive(Debug, Clone)]
pub struct MethodSpec {
    name: &'static str,
    params: Vec<ParamSpec>,
}

impl MethodSpec {
    /// Method without parameters
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            params: Vec::new(),
        }
    }

    /// Append a parameter whose values can also be declared in configuration
    #[must_use]
    pub fn param<T>(mut self) -> Self
    where
        T: DeserializeOwned + PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        self.params.push(ParamSpec {
            ty: ArgumentType::of::<T>(),
            parse: Some(parse_exact::<T>),
        });
        self
    }

    /// Append a parameter that can only be matched by type or in code
    #[must_use]
    pub fn opaque_param<T: Any>(mut self) -> Self {
        self.params.push(ParamSpec {
            ty: ArgumentType::of::<T>(),
            parse: None,
        });
        self
    }

    /// Method name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Parameters in declaration order
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Number of parameters
    #[must_use]
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

/// Name and method table of a contract
#[derive(Debug, Clone)]
pub struct ContractDescriptor {
    name: &'static str,
    methods: Vec<MethodSpec>,
}

impl ContractDescriptor {
    /// Descriptor for a contract without methods
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            methods: Vec::new(),
        }
    }

    /// Add a method; the same name may appear with different parameter lists
    #[must_use]
    pub fn method(mut self, method: MethodSpec) -> Self {
        self.methods.push(method);
        self
    }

    /// Contract name, used in configuration and log output
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// All declared methods
    #[must_use]
    pub fn methods(&self) -> &[MethodSpec] {
        &self.methods
    }

    /// Methods with the given name and arity
    pub fn overloads<'a>(
        &'a self,
        name: &'a str,
        arity: usize,
    ) -> impl Iterator<Item = &'a MethodSpec> + 'a {
        self.methods
            .iter()
            .filter(move |m| m.name == name && m.arity() == arity)
    }

    /// Check that a signature can match at least one declared method
    pub fn validate(&self, signature: &InvocationSignature) -> Result<(), AuthoringError> {
        let named: Vec<&MethodSpec> = self
            .methods
            .iter()
            .filter(|m| m.name == signature.method())
            .collect();

        if named.is_empty() {
            return Err(AuthoringError::unknown_method(self.name, signature.method()));
        }

        let same_arity: Vec<&MethodSpec> = named
            .iter()
            .copied()
            .filter(|m| m.arity() == signature.arity())
            .collect();

        if same_arity.is_empty() {
            let expected = named
                .iter()
                .map(|m| m.arity().to_string())
                .collect::<Vec<_>>()
                .join(" or ");
            return Err(AuthoringError::ArityMismatch {
                method: signature.method().to_string(),
                expected,
                found: signature.arity(),
            });
        }

        let mut first_mismatch = None;
        for method in same_arity {
            match type_mismatch(method, signature) {
                None => return Ok(()),
                Some(err) => {
                    first_mismatch.get_or_insert(err);
                },
            }
        }

        first_mismatch.map_or(Ok(()), Err)
    }
}

fn type_mismatch(method: &MethodSpec, signature: &InvocationSignature) -> Option<AuthoringError> {
    method
        .params
        .iter()
        .zip(signature.matchers())
        .enumerate()
        .find(|(_, (param, matcher))| param.ty != matcher.argument_type())
        .map(|(position, (param, matcher))| AuthoringError::ArgumentTypeMismatch {
            method: signature.method().to_string(),
            position,
            expected: param.ty.name(),
            found: matcher.argument_type().name(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::with;

    fn catalog() -> ContractDescriptor {
        ContractDescriptor::new("Catalog")
            .method(MethodSpec::new("list_all"))
            .method(MethodSpec::new("get_by_id").param::<u32>())
            .method(MethodSpec::new("search").param::<String>())
            .method(MethodSpec::new("search").param::<String>().param::<u32>())
    }

    fn signature(method: &str, matchers: Vec<ArgumentMatcher>) -> InvocationSignature {
        InvocationSignature::new(method, matchers).unwrap()
    }

    #[test]
    fn valid_signatures_pass() {
        let contract = catalog();
        assert!(contract.validate(&signature("list_all", vec![])).is_ok());
        assert!(
            contract
                .validate(&signature("get_by_id", vec![with::any::<u32>()]))
                .is_ok()
        );
        assert!(
            contract
                .validate(&signature("get_by_id", vec![with::value(3_u32)]))
                .is_ok()
        );
    }

    #[test]
    fn overloads_resolve_by_arity() {
        let contract = catalog();
        assert!(
            contract
                .validate(&signature("search", vec![with::any::<String>()]))
                .is_ok()
        );
        assert!(
            contract
                .validate(&signature(
                    "search",
                    vec![with::any::<String>(), with::any::<u32>()]
                ))
                .is_ok()
        );
        assert_eq!(contract.overloads("search", 2).count(), 1);
    }

    #[test]
    fn unknown_method_is_rejected() {
        let err = catalog()
            .validate(&signature("delete", vec![]))
            .unwrap_err();
        assert_eq!(err, AuthoringError::unknown_method("Catalog", "delete"));
    }

    #[test]
    fn arity_mismatch_lists_known_arities() {
        let err = catalog()
            .validate(&signature("search", vec![]))
            .unwrap_err();
        assert_eq!(
            err,
            AuthoringError::ArityMismatch {
                method: "search".to_string(),
                expected: "1 or 2".to_string(),
                found: 0,
            }
        );
    }

    #[test]
    fn type_mismatch_reports_position() {
        let err = catalog()
            .validate(&signature("get_by_id", vec![with::any::<i64>()]))
            .unwrap_err();
        assert!(matches!(
            err,
            AuthoringError::ArgumentTypeMismatch { position: 0, expected: "u32", .. }
        ));
    }

    #[test]
    fn parse_value_builds_exact_matcher() {
        let contract = catalog();
        let param = contract.overloads("get_by_id", 1).next().unwrap().params()[0];
        let matcher = param.parse_value(&serde_json::json!(42)).unwrap();
        assert!(matcher.accepts(&42_u32));
        assert!(!matcher.accepts(&41_u32));
    }

    #[test]
    fn parse_value_rejects_wrong_shape() {
        let contract = catalog();
        let param = contract.overloads("get_by_id", 1).next().unwrap().params()[0];
        assert!(param.parse_value(&serde_json::json!("forty-two")).is_err());
    }

    #[test]
    fn opaque_params_cannot_be_parsed() {
        struct Token;
        let method = MethodSpec::new("authorize").opaque_param::<Token>();
        let err = method.params()[0]
            .parse_value(&serde_json::json!(1))
            .unwrap_err();
        assert!(err.contains("cannot be matched by value"));
    }
}
