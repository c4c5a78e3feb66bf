//! SQLite backend for the Hearth household store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated
//! thread without blocking the async runtime. Errors surface as the
//! `hearth_core` taxonomy: typed application failures pass through
//! unchanged, transport failures become
//! [`Error::Storage`](hearth_core::Error::Storage).

mod encode;
mod schema;
mod store;

pub use store::SqliteStore;
