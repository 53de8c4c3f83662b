//! bugboard: an issue tracker backend.
//!
//! Projects own issues on a four-column board (`TO_DO`, `IN_PROGRESS`,
//! `IN_REVIEW`, `DONE`). Data lives in SQLite; the HTTP API and the CLI are
//! thin layers over [`storage::SqliteStorage`], and [`stats`] turns a
//! project's issues into the dashboard aggregates.

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod seed;
pub mod server;
pub mod stats;
pub mod storage;
pub mod util;
pub mod validation;

pub use error::{ErrorCode, Result, StructuredError, TrackerError};
