//! Encoding and decoding helpers between domain types and SQLite columns.
//!
//! Timestamps are stored as RFC 3339 strings and enums as their lowercase
//! names. Rows are first read into `Raw*` structs of plain column values
//! inside the connection thread, then decoded on the async side.

use chrono::{DateTime, Utc};
use tally_core::{
  id::{CommentId, RatingId, SubjectId, VoteId},
  ledger::{Comment, Rating, Score, SessionId, Vote, VoteDirection},
  subject::{Category, Subject},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Enums ───────────────────────────────────────────────────────────────────

pub fn decode_category(s: &str) -> Result<Category> {
  s.parse().map_err(|_| Error::Decode(format!("unknown category: {s:?}")))
}

pub fn decode_direction(s: &str) -> Result<VoteDirection> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown vote direction: {s:?}")))
}

// ─── Subjects ────────────────────────────────────────────────────────────────

pub const SUBJECT_COLUMNS: &str = "subject_id, name, description, category, image_url, \
   created_at, average_rating, total_ratings, total_comments, total_views, \
   comparison_wins, comparison_losses";

/// Raw values read directly from a `subjects` row.
pub struct RawSubject {
  pub subject_id:        i64,
  pub name:              String,
  pub description:       String,
  pub category:          String,
  pub image_url:         String,
  pub created_at:        String,
  pub average_rating:    f64,
  pub total_ratings:     u32,
  pub total_comments:    u32,
  pub total_views:       u32,
  pub comparison_wins:   u32,
  pub comparison_losses: u32,
}

impl RawSubject {
  /// Row mapper for queries selecting [`SUBJECT_COLUMNS`].
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      subject_id:        row.get(0)?,
      name:              row.get(1)?,
      description:       row.get(2)?,
      category:          row.get(3)?,
      image_url:         row.get(4)?,
      created_at:        row.get(5)?,
      average_rating:    row.get(6)?,
      total_ratings:     row.get(7)?,
      total_comments:    row.get(8)?,
      total_views:       row.get(9)?,
      comparison_wins:   row.get(10)?,
      comparison_losses: row.get(11)?,
    })
  }

  pub fn into_subject(self) -> Result<Subject> {
    Ok(Subject {
      id:                SubjectId(self.subject_id),
      name:              self.name,
      description:       self.description,
      category:          decode_category(&self.category)?,
      image_url:         self.image_url,
      created_at:        decode_dt(&self.created_at)?,
      average_rating:    self.average_rating,
      total_ratings:     self.total_ratings,
      total_comments:    self.total_comments,
      total_views:       self.total_views,
      comparison_wins:   self.comparison_wins,
      comparison_losses: self.comparison_losses,
    })
  }
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

pub const RATING_COLUMNS: &str = "rating_id, subject_id, session_id, score, created_at";

pub struct RawRating {
  pub rating_id:  i64,
  pub subject_id: i64,
  pub session_id: String,
  pub score:      i64,
  pub created_at: String,
}

impl RawRating {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      rating_id:  row.get(0)?,
      subject_id: row.get(1)?,
      session_id: row.get(2)?,
      score:      row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_rating(self) -> Result<Rating> {
    Ok(Rating {
      id:         RatingId(self.rating_id),
      subject_id: SubjectId(self.subject_id),
      session_id: SessionId::new(self.session_id),
      score:      Score::try_from(self.score).map_err(|e| Error::Decode(e.to_string()))?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Comments ────────────────────────────────────────────────────────────────

pub const COMMENT_COLUMNS: &str = "comment_id, subject_id, session_id, text, upvotes, \
   downvotes, score, is_buried, created_at";

pub struct RawComment {
  pub comment_id: i64,
  pub subject_id: i64,
  pub session_id: String,
  pub text:       String,
  pub upvotes:    u32,
  pub downvotes:  u32,
  pub score:      i64,
  pub is_buried:  bool,
  pub created_at: String,
}

impl RawComment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      subject_id: row.get(1)?,
      session_id: row.get(2)?,
      text:       row.get(3)?,
      upvotes:    row.get(4)?,
      downvotes:  row.get(5)?,
      score:      row.get(6)?,
      is_buried:  row.get(7)?,
      created_at: row.get(8)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      id:         CommentId(self.comment_id),
      subject_id: SubjectId(self.subject_id),
      session_id: SessionId::new(self.session_id),
      text:       self.text,
      upvotes:    self.upvotes,
      downvotes:  self.downvotes,
      score:      self.score,
      is_buried:  self.is_buried,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Votes ───────────────────────────────────────────────────────────────────

pub const VOTE_COLUMNS: &str = "vote_id, comment_id, session_id, direction, created_at";

pub struct RawVote {
  pub vote_id:    i64,
  pub comment_id: i64,
  pub session_id: String,
  pub direction:  String,
  pub created_at: String,
}

impl RawVote {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      vote_id:    row.get(0)?,
      comment_id: row.get(1)?,
      session_id: row.get(2)?,
      direction:  row.get(3)?,
      created_at: row.get(4)?,
    })
  }

  pub fn into_vote(self) -> Result<Vote> {
    Ok(Vote {
      id:         VoteId(self.vote_id),
      comment_id: CommentId(self.comment_id),
      session_id: SessionId::new(self.session_id),
      direction:  decode_direction(&self.direction)?,
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

// ─── Constraint errors ───────────────────────────────────────────────────────

/// True if `e` is a `UNIQUE` constraint violation.
pub fn is_unique_violation(e: &rusqlite::Error) -> bool {
  matches!(
    e,
    rusqlite::Error::SqliteFailure(err, _)
      if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
  )
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn datetime_roundtrips_through_rfc3339() {
    let now = Utc::now();
    assert_eq!(decode_dt(&encode_dt(now)).unwrap(), now);
    assert!(matches!(decode_dt("yesterday"), Err(Error::DateParse(_))));
  }

  #[test]
  fn unknown_enum_values_are_decode_errors() {
    assert!(matches!(decode_category("alien"), Err(Error::Decode(_))));
    assert!(matches!(decode_direction("left"), Err(Error::Decode(_))));
    assert_eq!(decode_category("student").unwrap(), Category::Student);
    assert_eq!(decode_direction("down").unwrap(), VoteDirection::Down);
  }
}
