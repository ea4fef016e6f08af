//! Handlers for comments and comment votes.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/people/{id}/comments` | Optional `?sort=score\|newest`; buried comments included |
//! | `POST` | `/comments` | Body: `{"subject_id":1,"text":"..."}` |
//! | `POST` | `/comments/{id}/vote` | Body: `{"direction":"up\|down"}`; 409 on a repeat |
//! | `GET`  | `/comments/{id}/vote` | The caller's vote or `null` |

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
  id::{CommentId, SubjectId},
  ledger::{Comment, CommentSort, Vote, VoteDirection},
  store::TallyStore,
};

use crate::{
  error::ApiError,
  extract::{JsonBody, PathParam, QueryParams},
  session::Session,
};

// ─── Comments ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub sort: CommentSort,
}

/// `GET /people/{id}/comments[?sort=<sort>]`
pub async fn list<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  PathParam(id): PathParam<SubjectId>,
  QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Vec<Comment>>, ApiError> {
  Ok(Json(engine.list_comments(id, params.sort).await?))
}

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub subject_id: SubjectId,
  pub text:       String,
}

/// `POST /comments`
pub async fn create<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  Session(session): Session,
  JsonBody(body): JsonBody<CreateBody>,
) -> Result<impl IntoResponse, ApiError> {
  let comment = engine
    .post_comment(body.subject_id, session, body.text)
    .await?;
  Ok((StatusCode::CREATED, Json(comment)))
}

// ─── Votes ────────────────────────────────────────────────────────────────────

/// `direction` is parsed by hand so an unknown value maps to a 400.
#[derive(Debug, Deserialize)]
pub struct VoteBody {
  pub direction: String,
}

/// `POST /comments/{id}/vote`
pub async fn vote<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  Session(session): Session,
  PathParam(id): PathParam<CommentId>,
  JsonBody(body): JsonBody<VoteBody>,
) -> Result<impl IntoResponse, ApiError> {
  let direction: VoteDirection = body.direction.parse()?;
  let vote = engine.vote_comment(id, session, direction).await?;
  Ok((StatusCode::CREATED, Json(vote)))
}

/// `GET /comments/{id}/vote`
pub async fn my_vote<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  Session(session): Session,
  PathParam(id): PathParam<CommentId>,
) -> Result<Json<Option<Vote>>, ApiError> {
  Ok(Json(engine.session_vote(id, session).await?))
}
