//! Argument matchers
//!
//! A matcher is a constraint on one positional call argument. Matchers never
//! fail: an argument of the wrong type is simply not accepted.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::sync::Arc;

use crate::invocation::Argument;
use crate::service_key::short_type_name;

/// Runtime type of a call argument
#[derive(Debug, Clone, Copy)]
pub struct ArgumentType {
    id: TypeId,
    name: &'static str,
}

impl ArgumentType {
    /// Type descriptor for `T`
    #[must_use]
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Fully qualified type name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether `argument` has exactly this runtime type
    #[must_use]
    pub fn accepts(&self, argument: &Argument) -> bool {
        argument.type_id() == self.id
    }
}

impl PartialEq for ArgumentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ArgumentType {}

impl fmt::Display for ArgumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", short_type_name(self.name))
    }
}

/// A captured value compared against actual arguments
pub trait ExpectedValue: Send + Sync {
    /// Whether the argument equals the captured value
    fn accepts(&self, argument: &Argument) -> bool;
    /// Debug rendering of the captured value
    fn describe(&self) -> String;
}

struct Expected<T>(T);

impl<T> ExpectedValue for Expected<T>
where
    T: PartialEq + fmt::Debug + Send + Sync + 'static,
{
    fn accepts(&self, argument: &Argument) -> bool {
        argument
            .downcast_ref::<T>()
            .is_some_and(|actual| *actual == self.0)
    }

    fn describe(&self) -> String {
        format!("{:?}", self.0)
    }
}

type ArgumentPredicate = Arc<dyn Fn(&Argument) -> bool + Send + Sync>;

/// Constraint on a single call argument
#[derive(Clone)]
pub enum ArgumentMatcher {
    /// Any argument of the given runtime type
    Any(ArgumentType),
    /// Only an argument of the given type equal to the captured value
    Exactly {
        ty: ArgumentType,
        value: Arc<dyn ExpectedValue>,
    },
    /// Any argument of the given type accepted by a predicate
    Matching {
        ty: ArgumentType,
        description: String,
        predicate: ArgumentPredicate,
    },
}

impl ArgumentMatcher {
    /// Accept any argument of type `T`
    #[must_use]
    pub fn any<T: Any>() -> Self {
        Self::Any(ArgumentType::of::<T>())
    }

    /// Accept only an argument equal to `value`
    #[must_use]
    pub fn exactly<T>(value: T) -> Self
    where
        T: PartialEq + fmt::Debug + Send + Sync + 'static,
    {
        Self::Exactly {
            ty: ArgumentType::of::<T>(),
            value: Arc::new(Expected(value)),
        }
    }

    /// Accept any argument of type `T` for which `predicate` holds
    #[must_use]
    pub fn matching<T, F>(description: impl Into<String>, predicate: F) -> Self
    where
        T: Any,
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::Matching {
            ty: ArgumentType::of::<T>(),
            description: description.into(),
            predicate: Arc::new(move |argument: &Argument| {
                argument.downcast_ref::<T>().is_some_and(&predicate)
            }),
        }
    }

    /// Runtime type this matcher constrains
    #[must_use]
    pub fn argument_type(&self) -> ArgumentType {
        match self {
            Self::Any(ty) | Self::Exactly { ty, .. } | Self::Matching { ty, .. } => *ty,
        }
    }

    /// Whether the actual argument satisfies this matcher
    #[must_use]
    pub fn accepts(&self, argument: &Argument) -> bool {
        match self {
            Self::Any(ty) => ty.accepts(argument),
            Self::Exactly { value, .. } => value.accepts(argument),
            Self::Matching { predicate, .. } => predicate(argument),
        }
    }
}

impl fmt::Debug for ArgumentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for ArgumentMatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any(ty) => write!(f, "any<{ty}>"),
            Self::Exactly { value, .. } => write!(f, "{}", value.describe()),
            Self::Matching { ty, description, .. } => write!(f, "{ty} where {description}"),
        }
    }
}
