//! Subcommand implementations.

pub mod projects;
pub mod seed;
pub mod serve;
pub mod stats;
