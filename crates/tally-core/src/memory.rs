//! A process-local [`TallyStore`] backed by ordered maps.
//!
//! Used for tests and for running the server without a database file.

use std::{collections::BTreeMap, convert::Infallible, sync::Arc};

use chrono::Utc;
use tokio::sync::RwLock;

use crate::{
  aggregate::CommentTally,
  id::{CommentId, ComparisonId, RatingId, SubjectId, VoteId},
  ledger::{
    Comment, Comparison, NewComment, NewComparison, NewRating, NewVote, Rating,
    SessionId, Vote,
  },
  store::{TallyStore, Totals},
  subject::{Category, NewSubject, StatPatch, Subject},
};

#[derive(Debug, Default)]
struct Tables {
  last_subject:    i64,
  last_rating:     i64,
  last_comment:    i64,
  last_vote:       i64,
  last_comparison: i64,

  subjects:    BTreeMap<SubjectId, Subject>,
  ratings:     BTreeMap<RatingId, Rating>,
  comments:    BTreeMap<CommentId, Comment>,
  votes:       BTreeMap<VoteId, Vote>,
  comparisons: BTreeMap<ComparisonId, Comparison>,
}

/// Advance a per-table id counter; the first id handed out is 1.
fn bump(last: &mut i64) -> i64 {
  *last += 1;
  *last
}

/// An in-memory store. Cloning is cheap and clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
  tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
  pub fn new() -> Self { Self::default() }
}

impl TallyStore for MemoryStore {
  type Error = Infallible;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn insert_subject(&self, input: NewSubject) -> Result<Subject, Infallible> {
    let mut t = self.tables.write().await;
    let id = SubjectId(bump(&mut t.last_subject));
    let subject = input.into_subject(id, Utc::now());
    t.subjects.insert(id, subject.clone());
    Ok(subject)
  }

  async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>, Infallible> {
    Ok(self.tables.read().await.subjects.get(&id).cloned())
  }

  async fn list_subjects(
    &self,
    category: Option<Category>,
  ) -> Result<Vec<Subject>, Infallible> {
    let t = self.tables.read().await;
    Ok(
      t.subjects
        .values()
        .filter(|s| category.is_none_or(|c| s.category == c))
        .cloned()
        .collect(),
    )
  }

  async fn record_view(&self, id: SubjectId) -> Result<bool, Infallible> {
    let mut t = self.tables.write().await;
    Ok(match t.subjects.get_mut(&id) {
      Some(s) => {
        s.total_views = s.total_views.saturating_add(1);
        true
      }
      None => false,
    })
  }

  async fn apply_stat_patch(
    &self,
    id: SubjectId,
    patch: StatPatch,
  ) -> Result<Option<Subject>, Infallible> {
    let mut t = self.tables.write().await;
    Ok(t.subjects.get_mut(&id).map(|s| {
      patch.apply_to(s);
      s.clone()
    }))
  }

  async fn delete_subject(&self, id: SubjectId) -> Result<bool, Infallible> {
    let mut t = self.tables.write().await;
    if t.subjects.remove(&id).is_none() {
      return Ok(false);
    }
    t.ratings.retain(|_, r| r.subject_id != id);
    t.comparisons
      .retain(|_, c| c.winner_id != id && c.loser_id != id);

    let orphaned: Vec<CommentId> = t
      .comments
      .values()
      .filter(|c| c.subject_id == id)
      .map(|c| c.id)
      .collect();
    t.comments.retain(|_, c| c.subject_id != id);
    t.votes.retain(|_, v| !orphaned.contains(&v.comment_id));
    Ok(true)
  }

  // ── Ratings ───────────────────────────────────────────────────────────────

  async fn ratings_for(&self, subject_id: SubjectId) -> Result<Vec<Rating>, Infallible> {
    let t = self.tables.read().await;
    Ok(
      t.ratings
        .values()
        .filter(|r| r.subject_id == subject_id)
        .cloned()
        .collect(),
    )
  }

  async fn find_rating(
    &self,
    subject_id: SubjectId,
    session_id: SessionId,
  ) -> Result<Option<Rating>, Infallible> {
    let t = self.tables.read().await;
    Ok(
      t.ratings
        .values()
        .find(|r| r.subject_id == subject_id && r.session_id == session_id)
        .cloned(),
    )
  }

  async fn append_rating(&self, input: NewRating) -> Result<Option<Rating>, Infallible> {
    let mut t = self.tables.write().await;
    let taken = t
      .ratings
      .values()
      .any(|r| r.subject_id == input.subject_id && r.session_id == input.session_id);
    if taken {
      return Ok(None);
    }
    let rating = Rating {
      id:         RatingId(bump(&mut t.last_rating)),
      subject_id: input.subject_id,
      session_id: input.session_id,
      score:      input.score,
      created_at: Utc::now(),
    };
    t.ratings.insert(rating.id, rating.clone());
    Ok(Some(rating))
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn append_comment(&self, input: NewComment) -> Result<Comment, Infallible> {
    let mut t = self.tables.write().await;
    let comment = Comment {
      id:         CommentId(bump(&mut t.last_comment)),
      subject_id: input.subject_id,
      session_id: input.session_id,
      text:       input.text,
      upvotes:    0,
      downvotes:  0,
      score:      0,
      is_buried:  false,
      created_at: Utc::now(),
    };
    t.comments.insert(comment.id, comment.clone());
    Ok(comment)
  }

  async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>, Infallible> {
    Ok(self.tables.read().await.comments.get(&id).cloned())
  }

  async fn comments_for(&self, subject_id: SubjectId) -> Result<Vec<Comment>, Infallible> {
    let t = self.tables.read().await;
    Ok(
      t.comments
        .values()
        .filter(|c| c.subject_id == subject_id)
        .cloned()
        .collect(),
    )
  }

  async fn update_comment_tally(
    &self,
    id: CommentId,
    tally: CommentTally,
  ) -> Result<Option<Comment>, Infallible> {
    let mut t = self.tables.write().await;
    Ok(t.comments.get_mut(&id).map(|c| {
      c.upvotes = tally.upvotes;
      c.downvotes = tally.downvotes;
      c.score = tally.score;
      c.is_buried = tally.is_buried;
      c.clone()
    }))
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn votes_for(&self, comment_id: CommentId) -> Result<Vec<Vote>, Infallible> {
    let t = self.tables.read().await;
    Ok(
      t.votes
        .values()
        .filter(|v| v.comment_id == comment_id)
        .cloned()
        .collect(),
    )
  }

  async fn find_vote(
    &self,
    comment_id: CommentId,
    session_id: SessionId,
  ) -> Result<Option<Vote>, Infallible> {
    let t = self.tables.read().await;
    Ok(
      t.votes
        .values()
        .find(|v| v.comment_id == comment_id && v.session_id == session_id)
        .cloned(),
    )
  }

  async fn append_vote(&self, input: NewVote) -> Result<Option<Vote>, Infallible> {
    let mut t = self.tables.write().await;
    let taken = t
      .votes
      .values()
      .any(|v| v.comment_id == input.comment_id && v.session_id == input.session_id);
    if taken {
      return Ok(None);
    }
    let vote = Vote {
      id:         VoteId(bump(&mut t.last_vote)),
      comment_id: input.comment_id,
      session_id: input.session_id,
      direction:  input.direction,
      created_at: Utc::now(),
    };
    t.votes.insert(vote.id, vote.clone());
    Ok(Some(vote))
  }

  // ── Comparisons ───────────────────────────────────────────────────────────

  async fn append_comparison(&self, input: NewComparison) -> Result<Comparison, Infallible> {
    let mut t = self.tables.write().await;
    let comparison = Comparison {
      id:         ComparisonId(bump(&mut t.last_comparison)),
      winner_id:  input.winner_id,
      loser_id:   input.loser_id,
      session_id: input.session_id,
      created_at: Utc::now(),
    };
    t.comparisons.insert(comparison.id, comparison.clone());
    Ok(comparison)
  }

  // ── Stats ─────────────────────────────────────────────────────────────────

  async fn totals(&self) -> Result<Totals, Infallible> {
    let t = self.tables.read().await;
    Ok(Totals {
      subject_count: t.subjects.len() as u64,
      rating_count:  t.ratings.len() as u64,
      comment_count: t.comments.len() as u64,
    })
  }
}
