//! Core types and trait definitions for the Hearth household service.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! All other crates depend on it; it depends on nothing proprietary.

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod error;
pub mod guard;
pub mod household;
pub mod identity;
pub mod invitation;
pub mod patient;
pub mod query;
pub mod store;

pub use error::{Error, Result};
