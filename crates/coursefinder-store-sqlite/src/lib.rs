//! SQLite backend for the CourseFinder store.
//!
//! A single [`tokio_rusqlite::Connection`] serialises all access; compound
//! checks run inside the same call (and transaction) as the writes they
//! guard.

pub mod encode;
pub mod schema;
pub mod store;


pub use store::SqliteStore;
