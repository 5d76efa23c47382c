//! SQLite backend for the Creator Finder store.

mod error;
mod schema;
mod store;


pub use error::{Error, Result};
pub use store::SqliteStore;
