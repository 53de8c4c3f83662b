//! Persistence for projects and issues.
//!
//! One explicitly constructed [`SqliteStorage`] handle owns the connection;
//! callers receive it by injection rather than through a global.

pub mod schema;
pub mod sqlite;

pub use sqlite::{ListFilters, SqliteStorage};
