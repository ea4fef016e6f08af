//! The `TallyStore` trait, the persistence layer behind the engine.
//!
//! Backends offer keyed CRUD and filtered scans. They never compute derived
//! counters themselves; the engine recomputes and writes them back with
//! [`TallyStore::apply_stat_patch`] and [`TallyStore::update_comment_tally`].
//!
//! The `append_*` methods for ratings and votes must enforce the
//! one-per-session uniqueness rule at write time and report a conflict as
//! `Ok(None)` rather than as an error.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  aggregate::CommentTally,
  id::{CommentId, SubjectId},
  ledger::{
    Comment, Comparison, NewComment, NewComparison, NewRating, NewVote, Rating,
    SessionId, Vote,
  },
  subject::{Category, NewSubject, StatPatch, Subject},
};

/// Row counts across the store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
  pub subject_count: u64,
  pub rating_count:  u64,
  pub comment_count: u64,
}

/// Abstraction over a Tally storage backend.
///
/// All listing methods return rows in insertion (id) order; callers rely on
/// that for stable tie-breaking.
pub trait TallyStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Subjects ──────────────────────────────────────────────────────────

  /// Persist a new subject with zeroed counters and a fresh id.
  fn insert_subject(
    &self,
    input: NewSubject,
  ) -> impl Future<Output = Result<Subject, Self::Error>> + Send + '_;

  fn get_subject(
    &self,
    id: SubjectId,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// All subjects, optionally restricted to one category.
  fn list_subjects(
    &self,
    category: Option<Category>,
  ) -> impl Future<Output = Result<Vec<Subject>, Self::Error>> + Send + '_;

  /// Atomically add one to the view counter. Returns `false` if the subject
  /// does not exist.
  fn record_view(
    &self,
    id: SubjectId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Merge the set fields of `patch` into the subject. Returns the updated
  /// subject, or `None` if it does not exist.
  fn apply_stat_patch(
    &self,
    id: SubjectId,
    patch: StatPatch,
  ) -> impl Future<Output = Result<Option<Subject>, Self::Error>> + Send + '_;

  /// Remove a subject together with its ratings, comments, votes and the
  /// comparisons it took part in. Returns `false` if it did not exist.
  fn delete_subject(
    &self,
    id: SubjectId,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  // ── Ratings ───────────────────────────────────────────────────────────

  fn ratings_for(
    &self,
    subject_id: SubjectId,
  ) -> impl Future<Output = Result<Vec<Rating>, Self::Error>> + Send + '_;

  fn find_rating(
    &self,
    subject_id: SubjectId,
    session_id: SessionId,
  ) -> impl Future<Output = Result<Option<Rating>, Self::Error>> + Send + '_;

  /// Append a rating. `None` if the session has already rated the subject.
  fn append_rating(
    &self,
    input: NewRating,
  ) -> impl Future<Output = Result<Option<Rating>, Self::Error>> + Send + '_;

  // ── Comments ──────────────────────────────────────────────────────────

  fn append_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    id: CommentId,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  fn comments_for(
    &self,
    subject_id: SubjectId,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// Overwrite the derived vote fields of a comment. Returns the updated
  /// comment, or `None` if it does not exist.
  fn update_comment_tally(
    &self,
    id: CommentId,
    tally: CommentTally,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  // ── Votes ─────────────────────────────────────────────────────────────

  fn votes_for(
    &self,
    comment_id: CommentId,
  ) -> impl Future<Output = Result<Vec<Vote>, Self::Error>> + Send + '_;

  fn find_vote(
    &self,
    comment_id: CommentId,
    session_id: SessionId,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + '_;

  /// Append a vote. `None` if the session has already voted on the comment.
  fn append_vote(
    &self,
    input: NewVote,
  ) -> impl Future<Output = Result<Option<Vote>, Self::Error>> + Send + '_;

  // ── Comparisons ───────────────────────────────────────────────────────

  fn append_comparison(
    &self,
    input: NewComparison,
  ) -> impl Future<Output = Result<Comparison, Self::Error>> + Send + '_;

  // ── Stats ─────────────────────────────────────────────────────────────

  fn totals(&self) -> impl Future<Output = Result<Totals, Self::Error>> + Send + '_;
}
