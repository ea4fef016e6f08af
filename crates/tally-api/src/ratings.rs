//! Handlers for rating endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/ratings` | Body: `{"subject_id":1,"score":4}`; 409 on a repeat |
//! | `GET`  | `/people/{id}/ratings` | Every rating of one subject |
//! | `GET`  | `/people/{id}/rated` | `{"rated":bool}` for the caller's session |
//!
//! Write and `rated` routes require the `x-session-id` header.

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use tally_core::{Engine, id::SubjectId, ledger::Rating, store::TallyStore};

use crate::{
  error::ApiError,
  extract::{JsonBody, PathParam},
  session::Session,
};

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub subject_id: SubjectId,
  pub score:      i64,
}

/// `POST /ratings`
pub async fn create<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  Session(session): Session,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let rating = engine
    .submit_rating(body.subject_id, session, body.score)
    .await?;
  Ok((StatusCode::CREATED, Json(rating)))
}

/// `GET /people/{id}/ratings`
pub async fn list<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  PathParam(id): PathParam<SubjectId>,
) -> Result<Json<Vec<Rating>>, ApiError> {
  Ok(Json(engine.ratings(id).await?))
}

#[derive(Debug, Serialize)]
pub struct RatedResponse {
  pub rated: bool,
}

/// `GET /people/{id}/rated`
pub async fn has_rated<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  Session(session): Session,
  PathParam(id): PathParam<SubjectId>,
) -> Result<Json<RatedResponse>, ApiError> {
  let rated = engine.has_rated(id, session).await?;
  Ok(Json(RatedResponse { rated }))
}
