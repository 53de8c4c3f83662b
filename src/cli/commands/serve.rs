//! Serve command implementation.

use crate::config::Settings;
use crate::error::{Result, TrackerError};
use crate::server;

/// Run the HTTP API until Ctrl-C or SIGTERM.
///
/// # Errors
///
/// Returns an error if the runtime cannot start, the database cannot be
/// opened, or the address cannot be bound.
pub fn execute(settings: &Settings) -> Result<()> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime
        .block_on(server::start_server(settings))
        .map_err(TrackerError::Other)
}
