//! Client-side synchronization layer for Docket.
//!
//! A [`SyncStore`] keeps an in-memory [`Mirror`](mirror::Mirror) of the
//! remote record store for one signed-in session:
//!
//! - [`SyncStore::open`] subscribes to remote changes and loads every
//!   collection; [`SyncStore::close`] undoes both.
//! - Writes go through the pipeline (guard → translate → remote → apply)
//!   and reach the mirror only once the remote store has confirmed them.
//! - Any remote change on a watched table reloads everything.
//!
//! The remote side is any [`Backend`]: a type implementing both
//! [`docket_core::remote::RemoteStore`] and
//! [`docket_core::remote::ChangeFeed`].

pub mod collection;
pub mod config;
pub mod draft;
pub mod error;
pub mod fetch;
pub mod guard;
pub mod mirror;
pub mod notify;
pub mod seed;

mod listener;
mod pipeline;
mod store;

pub use config::SyncConfig;
pub use error::{Error, Result, ValidationFailure};
pub use fetch::{FetchOutcome, FetchReport};
pub use store::{Backend, Session, SyncStore};

#[cfg(test)]
mod tests;
