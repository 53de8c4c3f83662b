//! HTTP server: router assembly, the async store handle, and lifecycle.

pub mod api;
pub mod payload;

use std::sync::{Arc, Mutex};

use anyhow::Context;
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::config::{Settings, open_storage};
use crate::error::{Result, TrackerError};
use crate::storage::SqliteStorage;
use api::AppState;

/// Async-safe handle to the store.
///
/// SQLite access is synchronous, so every call runs on tokio's blocking
/// pool while holding the mutex for the duration of one closure.
#[derive(Clone)]
pub struct StoreHandle {
    inner: Arc<Mutex<SqliteStorage>>,
}

impl StoreHandle {
    #[must_use]
    pub fn new(storage: SqliteStorage) -> Self {
        Self {
            inner: Arc::new(Mutex::new(storage)),
        }
    }

    /// Run `f` against the store on a blocking thread.
    ///
    /// # Errors
    ///
    /// Returns whatever `f` returns, or an internal error if the lock is
    /// poisoned or the task panics.
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&mut SqliteStorage) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let inner = Arc::clone(&self.inner);
        tokio::task::spawn_blocking(move || {
            let mut guard = inner
                .lock()
                .map_err(|e| TrackerError::Other(anyhow::anyhow!("store lock poisoned: {e}")))?;
            f(&mut guard)
        })
        .await
        .map_err(|e| TrackerError::Other(anyhow::anyhow!("store task failed: {e}")))?
    }
}

/// Build the application router around an open store.
#[must_use]
pub fn build_router(store: StoreHandle, cors: bool) -> Router {
    let state = Arc::new(AppState { store });
    let app = api::api_router()
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if cors {
        app.layer(CorsLayer::permissive())
    } else {
        app
    }
}

/// Open the database and serve the API until a shutdown signal arrives.
///
/// # Errors
///
/// Returns an error if the database cannot be opened, the address cannot be
/// bound, or the server fails while running.
pub async fn start_server(settings: &Settings) -> anyhow::Result<()> {
    let storage = open_storage(settings).with_context(|| {
        format!("Failed to open database at {}", settings.db_path.display())
    })?;
    let app = build_router(StoreHandle::new(storage), settings.cors);

    let addr = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {addr}"))?;
    let local_addr = listener.local_addr()?;

    tracing::info!(
        addr = %local_addr,
        db = %settings.db_path.display(),
        cors = settings.cors,
        "Bug tracker API listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shut down gracefully");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %err, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
