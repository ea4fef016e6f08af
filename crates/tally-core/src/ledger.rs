//! Ledger records: ratings, comments, votes and comparisons.
//!
//! Ratings, votes and comparisons are immutable once appended. A comment's
//! text is immutable too; only its vote tally is rewritten, and only by the
//! engine after a vote lands.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  Error,
  id::{CommentId, ComparisonId, RatingId, SubjectId, VoteId},
};

// ─── Session ─────────────────────────────────────────────────────────────────

/// An opaque, unauthenticated token supplied by the client. Only ever
/// compared for equality.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
  pub fn new(id: impl Into<String>) -> Self { Self(id.into()) }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for SessionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&str> for SessionId {
  fn from(s: &str) -> Self { Self::new(s) }
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

/// A star score between 1 and 5 inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Score(u8);

impl Score {
  pub const MIN: u8 = 1;
  pub const MAX: u8 = 5;

  pub fn get(self) -> u8 { self.0 }
}

impl TryFrom<i64> for Score {
  type Error = Error;

  fn try_from(value: i64) -> Result<Self, Self::Error> {
    match u8::try_from(value) {
      Ok(v) if (Self::MIN..=Self::MAX).contains(&v) => Ok(Self(v)),
      _ => Err(Error::invalid(format!(
        "score must be between {} and {}, got {value}",
        Self::MIN,
        Self::MAX
      ))),
    }
  }
}

impl From<Score> for i64 {
  fn from(score: Score) -> Self { i64::from(score.0) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rating {
  pub id:         RatingId,
  pub subject_id: SubjectId,
  pub session_id: SessionId,
  pub score:      Score,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewRating {
  pub subject_id: SubjectId,
  pub session_id: SessionId,
  pub score:      Score,
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
  pub id:         CommentId,
  pub subject_id: SubjectId,
  pub session_id: SessionId,
  pub text:       String,
  pub upvotes:    u32,
  pub downvotes:  u32,
  /// `upvotes - downvotes`.
  pub score:      i64,
  /// Display hint; buried comments are still listed.
  pub is_buried:  bool,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
  pub subject_id: SubjectId,
  pub session_id: SessionId,
  pub text:       String,
}

/// Sort keys for a subject's comment thread. Both are descending and stable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommentSort {
  #[default]
  Score,
  Newest,
}

impl CommentSort {
  /// Sort `comments`, which must already be in insertion order.
  pub fn sort(self, comments: &mut [Comment]) {
    match self {
      Self::Score => comments.sort_by(|a, b| b.score.cmp(&a.score)),
      Self::Newest => comments.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
    }
  }
}

// ─── Votes ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
  Up,
  Down,
}

impl VoteDirection {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Up => "up",
      Self::Down => "down",
    }
  }
}

impl fmt::Display for VoteDirection {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for VoteDirection {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "up" => Ok(Self::Up),
      "down" => Ok(Self::Down),
      other => Err(Error::invalid(format!("invalid vote direction: {other:?}"))),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
  pub id:         VoteId,
  pub comment_id: CommentId,
  pub session_id: SessionId,
  pub direction:  VoteDirection,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVote {
  pub comment_id: CommentId,
  pub session_id: SessionId,
  pub direction:  VoteDirection,
}

// ─── Comparisons ─────────────────────────────────────────────────────────────

/// One head-to-head outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
  pub id:         ComparisonId,
  pub winner_id:  SubjectId,
  pub loser_id:   SubjectId,
  pub session_id: SessionId,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComparison {
  pub winner_id:  SubjectId,
  pub loser_id:   SubjectId,
  pub session_id: SessionId,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn score_accepts_one_through_five() {
    for v in 1..=5 {
      assert_eq!(Score::try_from(v).unwrap().get() as i64, v);
    }
    for v in [0, 6, -1, 256, i64::MAX] {
      assert!(matches!(Score::try_from(v), Err(Error::InvalidInput(_))));
    }
  }

  #[test]
  fn score_rejects_out_of_range_json() {
    assert!(serde_json::from_str::<Score>("4").is_ok());
    assert!(serde_json::from_str::<Score>("9").is_err());
    assert_eq!(serde_json::to_string(&Score(3)).unwrap(), "3");
  }

  #[test]
  fn direction_parses_only_up_and_down() {
    assert_eq!("up".parse::<VoteDirection>().unwrap(), VoteDirection::Up);
    assert_eq!("down".parse::<VoteDirection>().unwrap(), VoteDirection::Down);
    assert!("sideways".parse::<VoteDirection>().is_err());
    assert!("UP".parse::<VoteDirection>().is_err());
  }

  #[test]
  fn comment_sort_by_score_keeps_ties_in_order() {
    let comment = |id: i64, score: i64| Comment {
      id:         CommentId(id),
      subject_id: SubjectId(1),
      session_id: SessionId::new("s"),
      text:       "hi".into(),
      upvotes:    0,
      downvotes:  0,
      score,
      is_buried:  false,
      created_at: Utc::now(),
    };
    let mut list = vec![comment(1, 0), comment(2, 3), comment(3, 0), comment(4, -7)];
    CommentSort::Score.sort(&mut list);
    let ids: Vec<_> = list.iter().map(|c| c.id.get()).collect();
    assert_eq!(ids, vec![2, 1, 3, 4]);
  }
}
