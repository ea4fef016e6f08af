//! Anonymous session extractor.
//!
//! The session id is issued and kept by the client; the server only reads it
//! from the [`SESSION_HEADER`] header and never validates its format.

use axum::{extract::FromRequestParts, http::request::Parts};
use tally_core::ledger::SessionId;

use crate::error::ApiError;

pub const SESSION_HEADER: &str = "x-session-id";

/// The caller's session id. Rejects the request with 400 if absent or blank.
#[derive(Debug, Clone)]
pub struct Session(pub SessionId);

impl<S> FromRequestParts<S> for Session
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Self, Self::Rejection> {
    let id = parts
      .headers
      .get(SESSION_HEADER)
      .and_then(|v| v.to_str().ok())
      .map(str::trim)
      .filter(|s| !s.is_empty())
      .ok_or_else(|| ApiError::BadRequest("session id required".into()))?;
    Ok(Session(SessionId::new(id)))
  }
}
