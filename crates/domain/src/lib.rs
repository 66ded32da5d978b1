//! Domain layer for ruhroh
//!
//! Contains the vocabulary of call interception: invocations, argument
//! matchers, invocation signatures, contract descriptors and service lifetimes.
//! This layer has no runtime dependencies and defines the ubiquitous language.

pub mod contract;
pub mod errors;
pub mod invocation;
pub mod lifetime;
pub mod matcher;
pub mod service_key;
pub mod signature;
pub mod with;

pub use contract::{ContractDescriptor, MethodSpec};
pub use errors::AuthoringError;
pub use invocation::{Argument, Invocation};
pub use lifetime::ServiceLifetime;
pub use matcher::{ArgumentMatcher, ArgumentType};
pub use service_key::ServiceKey;
pub use signature::InvocationSignature;
