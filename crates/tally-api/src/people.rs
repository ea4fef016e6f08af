//! Handlers for `/people` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/people` | Optional `?category=<category>&sort=<sort>` |
//! | `POST`   | `/people` | Body: `{"name","description","category","image_url"}` |
//! | `GET`    | `/people/{id}` | Counts a view; 404 if not found |
//! | `DELETE` | `/people/{id}` | Removes the subject and its ledgers |

use std::sync::Arc;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use tally_core::{
  Engine,
  id::SubjectId,
  store::TallyStore,
  subject::{Category, NewSubject, Subject, SubjectSort},
};

use crate::{
  error::ApiError,
  extract::{JsonBody, PathParam, QueryParams},
};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub category: Option<Category>,
  #[serde(default)]
  pub sort:     SubjectSort,
}

/// `GET /people[?category=<category>][&sort=<sort>]`
pub async fn list<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  let subjects = engine.list_subjects(params.category, params.sort).await?;
  Ok(Json(subjects))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /people`
pub async fn create<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  JsonBody(body): JsonBody<NewSubject>,
) -> Result<impl IntoResponse, ApiError> {
  let subject = engine.create_subject(body).await?;
  Ok((StatusCode::CREATED, Json(subject)))
}

// ─── Get / delete ─────────────────────────────────────────────────────────────

/// `GET /people/{id}`
pub async fn get_one<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  PathParam(id): PathParam<SubjectId>,
) -> Result<Json<Subject>, ApiError> {
  Ok(Json(engine.get_subject(id).await?))
}

/// `DELETE /people/{id}`
pub async fn delete_one<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  PathParam(id): PathParam<SubjectId>,
) -> Result<StatusCode, ApiError> {
  engine.delete_subject(id).await?;
  Ok(StatusCode::NO_CONTENT)
}
