//! Catalog introspection for PostgreSQL tables, views and functions.
//!
//! Given an open [`pgscope_core::Connection`] and an [`ObjectRef`], this crate
//! discovers an object's columns, keys and indexes from the system catalogs,
//! correlates them into [`ColumnFact`]s, and reconstructs a re-executable
//! `CREATE TABLE` script.
//!
//! - [`collector`] - key/index/column queries merged into one ordered fact list
//! - [`definition`] - text extraction from constraint and index definitions
//! - [`ddl`] - `CREATE TABLE` reconstruction
//! - [`descriptor`] - labels and tooltips for a fact list
//! - [`statements`] - SQL templates offered for an object or column
//! - [`export`] - whole-table JSON and CSV export
//! - [`tree`] - projection of facts into display nodes

pub mod collector;
pub mod ddl;
pub mod definition;
pub mod descriptor;
pub mod export;
mod model;
mod queries;
pub mod statements;
pub mod tree;

pub use collector::{ColumnFactCollector, function_signature};
pub use ddl::{DdlFragments, DdlGenerator};
pub use model::*;
