//! Recomputation rules for derived aggregates.
//!
//! Every aggregate is recomputed from the full ledger rather than adjusted
//! incrementally, so a recomputation always reflects exactly the rows that
//! exist at the time it runs.

use crate::{
  ledger::{Rating, Vote, VoteDirection},
  subject::StatPatch,
};

/// A comment is buried once its score drops strictly below this value.
pub const BURIAL_THRESHOLD: i64 = -5;

/// Subjects strictly below this average appear in the worst-ranked list.
pub const WORST_RANK_CEILING: f64 = 2.0;

pub fn is_burial_score(score: i64) -> bool { score < BURIAL_THRESHOLD }

fn count(n: usize) -> u32 { u32::try_from(n).unwrap_or(u32::MAX) }

// ─── Ratings ─────────────────────────────────────────────────────────────────

/// Average and count over one subject's rating ledger.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingStats {
  /// Unrounded mean; `0.0` for an empty ledger.
  pub average: f64,
  pub total:   u32,
}

impl RatingStats {
  pub fn from_ratings(ratings: &[Rating]) -> Self {
    if ratings.is_empty() {
      return Self { average: 0.0, total: 0 };
    }
    let sum: u64 = ratings.iter().map(|r| u64::from(r.score.get())).sum();
    Self {
      average: sum as f64 / ratings.len() as f64,
      total:   count(ratings.len()),
    }
  }

  pub fn to_patch(self) -> StatPatch {
    StatPatch {
      average_rating: Some(self.average),
      total_ratings: Some(self.total),
      ..StatPatch::default()
    }
  }
}

// ─── Comment votes ───────────────────────────────────────────────────────────

/// The derived vote fields of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommentTally {
  pub upvotes:   u32,
  pub downvotes: u32,
  pub score:     i64,
  pub is_buried: bool,
}

impl CommentTally {
  /// Tally `votes` for one comment. Burial is sticky: `was_buried` carries
  /// over regardless of the new score.
  pub fn from_votes(votes: &[Vote], was_buried: bool) -> Self {
    let up = votes
      .iter()
      .filter(|v| v.direction == VoteDirection::Up)
      .count();
    let down = votes.len() - up;
    let score = up as i64 - down as i64;
    Self {
      upvotes: count(up),
      downvotes: count(down),
      score,
      is_buried: was_buried || is_burial_score(score),
    }
  }
}

#[cfg(test)]
mod tests {
  use chrono::Utc;

  use super::*;
  use crate::{
    id::{CommentId, RatingId, SubjectId, VoteId},
    ledger::{Score, SessionId},
  };

  fn ratings(scores: &[i64]) -> Vec<Rating> {
    scores
      .iter()
      .enumerate()
      .map(|(i, &s)| Rating {
        id:         RatingId(i as i64 + 1),
        subject_id: SubjectId(1),
        session_id: SessionId::new(format!("session-{i}")),
        score:      Score::try_from(s).unwrap(),
        created_at: Utc::now(),
      })
      .collect()
  }

  fn votes(up: usize, down: usize) -> Vec<Vote> {
    let dirs = std::iter::repeat_n(VoteDirection::Up, up)
      .chain(std::iter::repeat_n(VoteDirection::Down, down));
    dirs
      .enumerate()
      .map(|(i, direction)| Vote {
        id: VoteId(i as i64 + 1),
        comment_id: CommentId(1),
        session_id: SessionId::new(format!("voter-{i}")),
        direction,
        created_at: Utc::now(),
      })
      .collect()
  }

  #[test]
  fn empty_ledger_averages_to_zero() {
    let stats = RatingStats::from_ratings(&[]);
    assert_eq!(stats, RatingStats { average: 0.0, total: 0 });
  }

  #[test]
  fn average_is_the_plain_mean() {
    assert_eq!(RatingStats::from_ratings(&ratings(&[5, 3])).average, 4.0);
    assert_eq!(RatingStats::from_ratings(&ratings(&[5, 3, 1])).average, 3.0);

    let stats = RatingStats::from_ratings(&ratings(&[5, 4, 4]));
    assert_eq!(stats.total, 3);
    assert!((stats.average - 13.0 / 3.0).abs() < f64::EPSILON);
  }

  #[test]
  fn rating_patch_sets_only_rating_fields() {
    let patch = RatingStats { average: 2.5, total: 2 }.to_patch();
    assert_eq!(patch.average_rating, Some(2.5));
    assert_eq!(patch.total_ratings, Some(2));
    assert_eq!(patch.total_comments, None);
    assert_eq!(patch.comparison_wins, None);
  }

  #[test]
  fn tally_counts_directions() {
    let tally = CommentTally::from_votes(&votes(4, 1), false);
    assert_eq!(tally.upvotes, 4);
    assert_eq!(tally.downvotes, 1);
    assert_eq!(tally.score, 3);
    assert!(!tally.is_buried);
  }

  #[test]
  fn burial_starts_below_minus_five() {
    assert!(!CommentTally::from_votes(&votes(0, 5), false).is_buried);
    assert!(CommentTally::from_votes(&votes(0, 6), false).is_buried);
  }

  #[test]
  fn burial_is_sticky() {
    let tally = CommentTally::from_votes(&votes(1, 6), true);
    assert_eq!(tally.score, -5);
    assert!(tally.is_buried);

    let tally = CommentTally::from_votes(&votes(20, 6), true);
    assert!(tally.is_buried);
  }
}
