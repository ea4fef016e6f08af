//! [`Engine`], the operations exposed to the routing layer.
//!
//! Every write that feeds a derived aggregate runs as one unit under the
//! [`KeyedLocks`] slot of the subject or comment it rewrites: the duplicate
//! guard, the ledger append, the recomputation over the full ledger and the
//! write-back. Input is validated before any lock is taken or row written.

use tracing::{debug, info};

use crate::{
  Error, Result,
  aggregate::{CommentTally, RatingStats, WORST_RANK_CEILING},
  id::{CommentId, SubjectId},
  ledger::{
    Comment, CommentSort, Comparison, NewComment, NewComparison, NewRating,
    NewVote, Rating, Score, SessionId, Vote, VoteDirection,
  },
  locks::{KeyedLocks, LockKey},
  pair,
  store::{TallyStore, Totals},
  subject::{Category, NewSubject, StatPatch, Subject, SubjectSort},
};

/// Default number of entries in a ranking.
pub const DEFAULT_RANK_LIMIT: usize = 10;

/// The rating, comment and comparison engine over a [`TallyStore`].
#[derive(Debug)]
pub struct Engine<S> {
  store: S,
  locks: KeyedLocks,
}

impl<S: TallyStore> Engine<S> {
  pub fn new(store: S) -> Self {
    Self {
      store,
      locks: KeyedLocks::new(),
    }
  }

  /// Read-only access to the backend.
  pub fn store(&self) -> &S { &self.store }

  async fn require_subject(&self, id: SubjectId) -> Result<Subject> {
    self
      .store
      .get_subject(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SubjectNotFound(id))
  }

  async fn patch_subject(&self, id: SubjectId, patch: StatPatch) -> Result<Subject> {
    self
      .store
      .apply_stat_patch(id, patch)
      .await
      .map_err(Error::store)?
      .ok_or(Error::SubjectNotFound(id))
  }

  // ── Subjects ──────────────────────────────────────────────────────────────

  pub async fn create_subject(&self, input: NewSubject) -> Result<Subject> {
    if input.name.trim().is_empty() {
      return Err(Error::invalid("name must not be empty"));
    }
    let subject = self
      .store
      .insert_subject(input)
      .await
      .map_err(Error::store)?;
    info!(subject = %subject.id, category = %subject.category, "subject created");
    Ok(subject)
  }

  /// Fetch a subject and count the view.
  pub async fn get_subject(&self, id: SubjectId) -> Result<Subject> {
    if !self.store.record_view(id).await.map_err(Error::store)? {
      return Err(Error::SubjectNotFound(id));
    }
    self.require_subject(id).await
  }

  pub async fn list_subjects(
    &self,
    category: Option<Category>,
    sort: SubjectSort,
  ) -> Result<Vec<Subject>> {
    let mut subjects = self
      .store
      .list_subjects(category)
      .await
      .map_err(Error::store)?;
    sort.sort(&mut subjects);
    Ok(subjects)
  }

  /// Remove a subject and everything attached to it.
  ///
  /// Holds the subject lock and then every comment lock of the subject, so no
  /// vote can land on a comment that is being cascaded away. Vote writers
  /// only ever take a comment key, so subject-then-comments cannot deadlock.
  pub async fn delete_subject(&self, id: SubjectId) -> Result<()> {
    let _guard = self.locks.lock(LockKey::Subject(id)).await;
    let comments = self.store.comments_for(id).await.map_err(Error::store)?;
    let _comment_guards = self
      .locks
      .lock_all(comments.iter().map(|c| LockKey::Comment(c.id)))
      .await;

    if !self.store.delete_subject(id).await.map_err(Error::store)? {
      return Err(Error::SubjectNotFound(id));
    }
    info!(subject = %id, "subject deleted");
    Ok(())
  }

  // ── Ratings ───────────────────────────────────────────────────────────────

  /// Rate a subject once per session and refresh its average.
  pub async fn submit_rating(
    &self,
    subject_id: SubjectId,
    session_id: SessionId,
    score: i64,
  ) -> Result<Rating> {
    let score = Score::try_from(score)?;

    let _guard = self.locks.lock(LockKey::Subject(subject_id)).await;
    self.require_subject(subject_id).await?;

    let duplicate = || Error::AlreadyRated {
      subject: subject_id,
      session: session_id.clone(),
    };

    if self
      .store
      .find_rating(subject_id, session_id.clone())
      .await
      .map_err(Error::store)?
      .is_some()
    {
      debug!(subject = %subject_id, session = %session_id, "duplicate rating rejected");
      return Err(duplicate());
    }

    let rating = self
      .store
      .append_rating(NewRating {
        subject_id,
        session_id: session_id.clone(),
        score,
      })
      .await
      .map_err(Error::store)?
      .ok_or_else(duplicate)?;

    let ratings = self
      .store
      .ratings_for(subject_id)
      .await
      .map_err(Error::store)?;
    let stats = RatingStats::from_ratings(&ratings);
    self.patch_subject(subject_id, stats.to_patch()).await?;

    debug!(
      subject = %subject_id,
      rating = %rating.id,
      average = stats.average,
      total = stats.total,
      "rating recorded"
    );
    Ok(rating)
  }

  pub async fn has_rated(&self, subject_id: SubjectId, session_id: SessionId) -> Result<bool> {
    Ok(
      self
        .store
        .find_rating(subject_id, session_id)
        .await
        .map_err(Error::store)?
        .is_some(),
    )
  }

  /// The subject's full rating ledger, oldest first.
  pub async fn ratings(&self, subject_id: SubjectId) -> Result<Vec<Rating>> {
    self.require_subject(subject_id).await?;
    self.store.ratings_for(subject_id).await.map_err(Error::store)
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  pub async fn post_comment(
    &self,
    subject_id: SubjectId,
    session_id: SessionId,
    text: String,
  ) -> Result<Comment> {
    if text.trim().is_empty() {
      return Err(Error::invalid("comment text must not be empty"));
    }

    let _guard = self.locks.lock(LockKey::Subject(subject_id)).await;
    self.require_subject(subject_id).await?;

    let comment = self
      .store
      .append_comment(NewComment {
        subject_id,
        session_id,
        text,
      })
      .await
      .map_err(Error::store)?;

    let total = self
      .store
      .comments_for(subject_id)
      .await
      .map_err(Error::store)?
      .len();
    let patch = StatPatch {
      total_comments: Some(u32::try_from(total).unwrap_or(u32::MAX)),
      ..StatPatch::default()
    };
    self.patch_subject(subject_id, patch).await?;

    debug!(subject = %subject_id, comment = %comment.id, "comment posted");
    Ok(comment)
  }

  /// All comments on a subject, buried ones included.
  pub async fn list_comments(
    &self,
    subject_id: SubjectId,
    sort: CommentSort,
  ) -> Result<Vec<Comment>> {
    let mut comments = self
      .store
      .comments_for(subject_id)
      .await
      .map_err(Error::store)?;
    sort.sort(&mut comments);
    Ok(comments)
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  /// Vote on a comment once per session and refresh its tally.
  pub async fn vote_comment(
    &self,
    comment_id: CommentId,
    session_id: SessionId,
    direction: VoteDirection,
  ) -> Result<Vote> {
    let _guard = self.locks.lock(LockKey::Comment(comment_id)).await;

    let comment = self
      .store
      .get_comment(comment_id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::CommentNotFound(comment_id))?;

    let duplicate = || Error::AlreadyVoted {
      comment: comment_id,
      session: session_id.clone(),
    };

    if self
      .store
      .find_vote(comment_id, session_id.clone())
      .await
      .map_err(Error::store)?
      .is_some()
    {
      debug!(comment = %comment_id, session = %session_id, "duplicate vote rejected");
      return Err(duplicate());
    }

    let vote = self
      .store
      .append_vote(NewVote {
        comment_id,
        session_id: session_id.clone(),
        direction,
      })
      .await
      .map_err(Error::store)?
      .ok_or_else(duplicate)?;

    let votes = self
      .store
      .votes_for(comment_id)
      .await
      .map_err(Error::store)?;
    let tally = CommentTally::from_votes(&votes, comment.is_buried);
    self
      .store
      .update_comment_tally(comment_id, tally)
      .await
      .map_err(Error::store)?
      .ok_or(Error::CommentNotFound(comment_id))?;

    if tally.is_buried && !comment.is_buried {
      info!(comment = %comment_id, score = tally.score, "comment buried");
    }
    debug!(comment = %comment_id, %direction, score = tally.score, "vote recorded");
    Ok(vote)
  }

  /// The vote this session has already cast on a comment, if any.
  pub async fn session_vote(
    &self,
    comment_id: CommentId,
    session_id: SessionId,
  ) -> Result<Option<Vote>> {
    self
      .store
      .find_vote(comment_id, session_id)
      .await
      .map_err(Error::store)
  }

  // ── Comparisons ───────────────────────────────────────────────────────────

  /// Two distinct subjects drawn uniformly at random, or `None` when fewer
  /// than two exist.
  pub async fn pick_comparison_pair(&self) -> Result<Option<(Subject, Subject)>> {
    let mut subjects = self
      .store
      .list_subjects(None)
      .await
      .map_err(Error::store)?;
    let pair = {
      let mut rng = rand::thread_rng();
      pair::pick_two(&mut subjects, &mut rng)
    };
    Ok(pair)
  }

  /// Record a head-to-head outcome and bump both tallies.
  pub async fn record_comparison(
    &self,
    winner_id: SubjectId,
    loser_id: SubjectId,
    session_id: SessionId,
  ) -> Result<Comparison> {
    if winner_id == loser_id {
      return Err(Error::invalid("a subject cannot be compared with itself"));
    }

    let _guards = self
      .locks
      .lock_all([LockKey::Subject(winner_id), LockKey::Subject(loser_id)])
      .await;
    let winner = self.require_subject(winner_id).await?;
    let loser = self.require_subject(loser_id).await?;

    let comparison = self
      .store
      .append_comparison(NewComparison {
        winner_id,
        loser_id,
        session_id,
      })
      .await
      .map_err(Error::store)?;

    self
      .patch_subject(winner_id, StatPatch {
        comparison_wins: Some(winner.comparison_wins.saturating_add(1)),
        ..StatPatch::default()
      })
      .await?;
    self
      .patch_subject(loser_id, StatPatch {
        comparison_losses: Some(loser.comparison_losses.saturating_add(1)),
        ..StatPatch::default()
      })
      .await?;

    debug!(winner = %winner_id, loser = %loser_id, "comparison recorded");
    Ok(comparison)
  }

  // ── Rankings & stats ──────────────────────────────────────────────────────

  /// Highest average rating first.
  pub async fn top_ranked(&self, limit: usize) -> Result<Vec<Subject>> {
    let mut subjects = self.list_subjects(None, SubjectSort::AverageRating).await?;
    subjects.truncate(limit);
    Ok(subjects)
  }

  /// Subjects averaging below 2, lowest first. Unrated subjects average 0
  /// and are included.
  pub async fn worst_ranked(&self, limit: usize) -> Result<Vec<Subject>> {
    let mut subjects = self.list_subjects(None, SubjectSort::AverageRating).await?;
    subjects.retain(|s| s.average_rating < WORST_RANK_CEILING);
    subjects.sort_by(|a, b| a.average_rating.total_cmp(&b.average_rating));
    subjects.truncate(limit);
    Ok(subjects)
  }

  pub async fn totals(&self) -> Result<Totals> {
    self.store.totals().await.map_err(Error::store)
  }
}
