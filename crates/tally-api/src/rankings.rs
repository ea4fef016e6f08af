//! Leaderboards and platform totals.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/rankings/top` | Optional `?limit=N` (default 10, also for 0) |
//! | `GET`  | `/rankings/worst` | Average below 2.0, lowest first |
//! | `GET`  | `/stats` | Subject, rating and comment counts |

use std::sync::Arc;

use axum::{Json, extract::State};
use serde::Deserialize;
use tally_core::{
  Engine,
  engine::DEFAULT_RANK_LIMIT,
  store::{TallyStore, Totals},
  subject::Subject,
};

use crate::{error::ApiError, extract::QueryParams};

#[derive(Debug, Deserialize)]
pub struct LimitParams {
  pub limit: Option<usize>,
}

impl LimitParams {
  /// Absent or zero falls back to [`DEFAULT_RANK_LIMIT`].
  fn limit(&self) -> usize {
    self
      .limit
      .filter(|&n| n > 0)
      .unwrap_or(DEFAULT_RANK_LIMIT)
  }
}

/// `GET /rankings/top[?limit=N]`
pub async fn top<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  QueryParams(params): QueryParams<LimitParams>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  Ok(Json(engine.top_ranked(params.limit()).await?))
}

/// `GET /rankings/worst[?limit=N]`
pub async fn worst<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
  QueryParams(params): QueryParams<LimitParams>,
) -> Result<Json<Vec<Subject>>, ApiError> {
  Ok(Json(engine.worst_ranked(params.limit()).await?))
}

/// `GET /stats`
pub async fn stats<S: TallyStore>(
  State(engine): State<Arc<Engine<S>>>,
) -> Result<Json<Totals>, ApiError> {
  Ok(Json(engine.totals().await?))
}
