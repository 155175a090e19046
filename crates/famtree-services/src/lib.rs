//! Operations over a famtree store.
//!
//! Each service borrows a [`famtree_store_sqlite::Database`] and runs its
//! work as one or more short transactions. Transport concerns (HTTP, JSON
//! framing, bearer-header parsing) belong to the caller.

pub mod account;
pub mod error;
pub mod fetch;
pub mod fill;
pub mod load;
pub mod password;

pub use account::{AccountService, AuthResult, Registration};
pub use error::{Error, Result};
pub use fetch::FetchService;
pub use fill::{FillService, FillSummary};
pub use load::{LoadRequest, LoadSummary, clear, load};
