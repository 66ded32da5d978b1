//! Port definitions for application layer
//!
//! Ports are interfaces that define how the interception engine talks to its
//! collaborators. The service container in the infrastructure layer implements
//! the resolution port; every affected contract implements the contract port.

mod contract;
mod resolution;

pub use contract::{Contract, Implements, Injectable};
pub use resolution::{Instance, ResolutionContext, ResolutionContextExt};
