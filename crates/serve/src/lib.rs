#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Minimal artifact server for arcdl
//!
//! Exposes a fixed set of named files over HTTP as attachments. Range and
//! conditional requests are answered by `tower-http`, so clients can resume
//! against it.

mod routes;

use arcdl_errors::{ConfigError, Error};
use axum::routing::get;
use axum::Router;
use std::collections::HashMap;
use std::future::Future;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Default bind address
pub const DEFAULT_BIND: &str = "127.0.0.1:5000";

/// A file exposed at `GET /<name>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub name: String,
    pub path: PathBuf,
}

impl Artifact {
    #[must_use]
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }

    /// Parse `<name>=<path>`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if either side is empty or the name
    /// contains `/`.
    pub fn parse(spec: &str) -> Result<Self, Error> {
        let invalid = || -> Error {
            ConfigError::InvalidValue {
                field: "artifact".to_string(),
                value: spec.to_string(),
            }
            .into()
        };
        let (name, path) = spec.split_once('=').ok_or_else(invalid)?;
        let name = name.trim();
        if name.is_empty() || name.contains('/') || path.is_empty() {
            return Err(invalid());
        }
        Ok(Self::new(name, path))
    }
}

/// Shared state for the route handlers
#[derive(Clone)]
pub(crate) struct ServeState {
    pub(crate) artifacts: Arc<HashMap<String, PathBuf>>,
}

/// Build the router serving `artifacts`
pub fn router(artifacts: impl IntoIterator<Item = Artifact>) -> Router {
    let artifacts = artifacts
        .into_iter()
        .map(|artifact| (artifact.name, artifact.path))
        .collect();
    let state = ServeState {
        artifacts: Arc::new(artifacts),
    };

    Router::new()
        .route("/:name", get(routes::download))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Serve on an already bound listener until `shutdown` resolves
///
/// # Errors
///
/// Returns an error if the server fails while running.
pub async fn serve_on<F>(
    listener: TcpListener,
    artifacts: Vec<Artifact>,
    shutdown: F,
) -> Result<(), Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(address = %addr, artifacts = artifacts.len(), "serving artifacts");
    }
    for artifact in &artifacts {
        if !artifact.path.is_file() {
            tracing::warn!(
                name = %artifact.name,
                path = %artifact.path.display(),
                "artifact does not exist yet; requests will get 404"
            );
        }
    }

    axum::serve(listener, router(artifacts))
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| Error::internal(format!("server error: {e}")))?;

    tracing::info!("server stopped");
    Ok(())
}

/// Bind `bind` and serve until `shutdown` resolves
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn serve<F>(bind: SocketAddr, artifacts: Vec<Artifact>, shutdown: F) -> Result<(), Error>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind(bind).await?;
    serve_on(listener, artifacts, shutdown).await
}
