//! Handlers for head-to-head comparisons.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/facemash/pair` | Two distinct random subjects; 404 if fewer than two exist |
//! | `POST` | `/facemash/compare` | Body: `{"winner_id":1,"loser_id":2}` |

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde::{Deserialize, Serialize};
use tally_core::{Engine, id::SubjectId, store::TallyStore, subject::Subject};

use crate::{error::ApiError, extract::JsonBody, session::Session};

#[derive(Debug, Serialize)]
pub struct PairResponse {
  pub first:  Subject,
  pub second: Subject,
}

/// `GET /facemash/pair`
pub async fn pair<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
) -> Result<Json<PairResponse>, ApiError> {
  let (first, second) = engine
    .pick_comparison_pair()
    .await?
    .ok_or_else(|| ApiError::NotFound("not enough people for comparison".into()))?;
  Ok(Json(PairResponse { first, second }))
}

#[derive(Debug, Deserialize)]
pub struct CompareBody {
  pub winner_id: SubjectId,
  pub loser_id:  SubjectId,
}

/// `POST /facemash/compare`
pub async fn compare<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  Session(session): Session,
  JsonBody(body): JsonBody<CompareBody>,
) -> Result<impl IntoResponse, ApiError> {
  let comparison = engine
    .record_comparison(body.winner_id, body.loser_id, session)
    .await?;
  Ok((StatusCode::CREATED, Json(comparison)))
}
