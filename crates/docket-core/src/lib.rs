//! Core types and trait definitions for the Docket record mirror.
//!
//! This crate is deliberately free of runtime and database dependencies. It
//! defines the JSON-like [`value::Value`] model, the key-casing translator that
//! sits between the remote store's column names and the application's field
//! names, the record types for every entity kind, and the traits a remote
//! backend implements.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod casing;
pub mod entity;
pub mod error;
pub mod record;
pub mod remote;
pub mod value;

pub use error::{Error, Result};
