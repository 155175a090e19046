//! SQLite backend for famtree.
//!
//! [`Database`] hands out at most one [`Session`] at a time. Every read and
//! write goes through a [`Dao`] borrowed from that session, so nothing touches
//! the file outside a transaction.

mod conflict;
mod encode;
mod schema;

pub mod dao;
pub mod database;
pub mod error;
pub mod table;

pub use dao::Dao;
pub use database::{Database, Outcome, Session};
pub use error::{Error, Result};
pub use table::{Record, Table};
