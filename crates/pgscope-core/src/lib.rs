//! pgscope core - shared abstractions for catalog introspection
//!
//! This crate provides the types every other pgscope crate depends on:
//!
//! - `Connection` - Trait for an opened database connection (read queries,
//!   bulk text export, close)
//! - `ConnectionConfig` - Where and how to connect
//! - `PgscopeError` - Error taxonomy shared by drivers and the catalog engine
//! - Common types like `Value`, `Row`, `QueryResult`

mod config;
mod connection;
mod error;
mod types;

pub use config::*;
pub use connection::*;
pub use error::*;
pub use types::*;
