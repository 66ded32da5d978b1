//! Service container
//!
//! A small dependency injection container: registrations are collected in a
//! [`ServiceCollection`], which builds a [`ServiceProvider`]. Providers and
//! scopes implement [`application::ResolutionContext`], the port through
//! which chaos proxies reach the real implementations.

mod collection;
mod provider;

pub use collection::{Factory, ServiceCollection, ServiceDescriptor};
pub use provider::{ServiceProvider, ServiceScope};
