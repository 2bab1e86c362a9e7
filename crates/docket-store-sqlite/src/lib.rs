//! SQLite backend for the Docket remote record store.
//!
//! Implements [`docket_core::remote::RemoteStore`] and
//! [`docket_core::remote::ChangeFeed`] on a single SQLite file. Every table is
//! a partition of one `rows` table holding JSON bodies; writes fan out change
//! notifications to in-process subscribers.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod encode;
mod feed;
mod schema;
mod store;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;

#[cfg(test)]
mod tests;
