//! JSON REST API for Tally.
//!
//! Exposes an axum [`Router`] backed by an [`Engine`] over any
//! [`TallyStore`]. TLS and transport concerns are the caller's
//! responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", tally_api::api_router(engine.clone()))
//! ```

pub mod comments;
pub mod error;
pub mod extract;
pub mod facemash;
pub mod people;
pub mod rankings;
pub mod ratings;
pub mod session;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use tally_core::{Engine, store::TallyStore};

pub use error::ApiError;
pub use session::{SESSION_HEADER, Session};

/// Build the API router for `engine`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(engine: Arc<Engine<S>>) -> Router<()>
where
  S: TallyStore + 'static,
{
  Router::new()
    // People
    .route("/people", get(people::list::<S>).post(people::create::<S>))
    .route(
      "/people/{id}",
      get(people::get_one::<S>).delete(people::delete_one::<S>),
    )
    .route("/people/{id}/comments", get(comments::list::<S>))
    .route("/people/{id}/ratings", get(ratings::list::<S>))
    .route("/people/{id}/rated", get(ratings::has_rated::<S>))
    // Ledger writes
    .route("/ratings", post(ratings::create::<S>))
    .route("/comments", post(comments::create::<S>))
    .route(
      "/comments/{id}/vote",
      get(comments::my_vote::<S>).post(comments::vote::<S>),
    )
    // FaceMash
    .route("/facemash/pair", get(facemash::pair::<S>))
    .route("/facemash/compare", post(facemash::compare::<S>))
    // Rankings
    .route("/rankings/top", get(rankings::top::<S>))
    .route("/rankings/worst", get(rankings::worst::<S>))
    .route("/stats", get(rankings::stats::<S>))
    .with_state(engine)
}
