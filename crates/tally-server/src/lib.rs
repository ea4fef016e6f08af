//! Tally HTTP server.
//!
//! Wires a [`TallyStore`] into an [`Engine`], mounts the JSON API under
//! `/api`, and adds request tracing.

use std::{path::PathBuf, sync::Arc};

use axum::Router;
use serde::Deserialize;
use tally_core::{Engine, store::TallyStore};
use tower_http::trace::TraceLayer;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Server settings, read from the config file and `TALLY_*` environment
/// variables. Every field has a default.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
  pub host:       String,
  pub port:       u16,
  pub store_path: PathBuf,
}

impl Default for ServerConfig {
  fn default() -> Self {
    Self {
      host:       "127.0.0.1".to_string(),
      port:       5000,
      store_path: PathBuf::from("tally.db"),
    }
  }
}

impl ServerConfig {
  pub fn address(&self) -> String { format!("{}:{}", self.host, self.port) }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// The full application: the API nested under `/api` with HTTP tracing.
pub fn router<S>(engine: Arc<Engine<S>>) -> Router
where
  S: TallyStore + 'static,
{
  Router::new()
    .nest("/api", tally_api::api_router(engine))
    .layer(TraceLayer::new_for_http())
}
