//! Error types for `tally-core`.

use thiserror::Error;

use crate::{
  id::{CommentId, SubjectId},
  ledger::SessionId,
};

#[derive(Debug, Error)]
pub enum Error {
  #[error("subject not found: {0}")]
  SubjectNotFound(SubjectId),

  #[error("comment not found: {0}")]
  CommentNotFound(CommentId),

  #[error("session {session} has already rated subject {subject}")]
  AlreadyRated {
    subject: SubjectId,
    session: SessionId,
  },

  #[error("session {session} has already voted on comment {comment}")]
  AlreadyVoted {
    comment: CommentId,
    session: SessionId,
  },

  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// A failure reported by the storage backend, passed through untouched.
  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  /// Wrap a backend error. Used as `map_err(Error::store)`.
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub fn invalid(message: impl Into<String>) -> Self {
    Self::InvalidInput(message.into())
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, Self::SubjectNotFound(_) | Self::CommentNotFound(_))
  }

  /// True for the one-action-per-session rejections.
  pub fn is_duplicate(&self) -> bool {
    matches!(self, Self::AlreadyRated { .. } | Self::AlreadyVoted { .. })
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
