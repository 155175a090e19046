//! Core record types and the family-tree generator for famtree.
//!
//! This crate is deliberately free of database dependencies. The SQLite
//! backend and the services layer both depend on it; it performs no I/O
//! except for optionally reading a corpus directory from disk.

pub mod corpus;
pub mod error;
pub mod event;
pub mod generator;
pub mod id;
pub mod person;
pub mod user;

pub use error::{Error, Result};
