//! The SQLite implementation of [`TallyStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::OptionalExtension as _;

use tally_core::{
  aggregate::CommentTally,
  id::{CommentId, ComparisonId, RatingId, SubjectId, VoteId},
  ledger::{
    Comment, Comparison, NewComment, NewComparison, NewRating, NewVote, Rating,
    SessionId, Vote,
  },
  store::{TallyStore, Totals},
  subject::{Category, NewSubject, StatPatch, Subject},
};

use crate::{
  Result,
  encode::{
    COMMENT_COLUMNS, RATING_COLUMNS, RawComment, RawRating, RawSubject, RawVote,
    SUBJECT_COLUMNS, VOTE_COLUMNS, encode_dt, is_unique_violation,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A Tally store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn count(&self, table: &'static str) -> Result<u64> {
    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| {
          r.get(0)
        })?)
      })
      .await?;
    Ok(n.max(0) as u64)
  }
}

// ─── TallyStore impl ─────────────────────────────────────────────────────────

impl TallyStore for SqliteStore {
  type Error = crate::Error;

  // ── Subjects ──────────────────────────────────────────────────────────────

  async fn insert_subject(&self, input: NewSubject) -> Result<Subject> {
    let created_at   = Utc::now();
    let at_str       = encode_dt(created_at);
    let name         = input.name.clone();
    let description  = input.description.clone();
    let category_str = input.category.as_str();
    let image_url    = input.image_url.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO subjects (name, description, category, image_url, created_at)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![name, description, category_str, image_url, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(input.into_subject(SubjectId(id), created_at))
  }

  async fn get_subject(&self, id: SubjectId) -> Result<Option<Subject>> {
    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
            rusqlite::params![id.get()],
            RawSubject::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn list_subjects(&self, category: Option<Category>) -> Result<Vec<Subject>> {
    let category_str = category.map(Category::as_str);

    let raws: Vec<RawSubject> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(c) = category_str {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects WHERE category = ?1 ORDER BY subject_id"
          ))?;
          stmt
            .query_map(rusqlite::params![c], RawSubject::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt = conn.prepare(&format!(
            "SELECT {SUBJECT_COLUMNS} FROM subjects ORDER BY subject_id"
          ))?;
          stmt
            .query_map([], RawSubject::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawSubject::into_subject).collect()
  }

  async fn record_view(&self, id: SubjectId) -> Result<bool> {
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE subjects SET total_views = total_views + 1 WHERE subject_id = ?1",
          rusqlite::params![id.get()],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  async fn apply_stat_patch(
    &self,
    id: SubjectId,
    patch: StatPatch,
  ) -> Result<Option<Subject>> {
    let raw: Option<RawSubject> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        // NULL parameters leave the column untouched.
        tx.execute(
          "UPDATE subjects SET
             average_rating    = COALESCE(?2, average_rating),
             total_ratings     = COALESCE(?3, total_ratings),
             total_comments    = COALESCE(?4, total_comments),
             total_views       = COALESCE(?5, total_views),
             comparison_wins   = COALESCE(?6, comparison_wins),
             comparison_losses = COALESCE(?7, comparison_losses)
           WHERE subject_id = ?1",
          rusqlite::params![
            id.get(),
            patch.average_rating,
            patch.total_ratings,
            patch.total_comments,
            patch.total_views,
            patch.comparison_wins,
            patch.comparison_losses,
          ],
        )?;
        let raw = tx
          .query_row(
            &format!("SELECT {SUBJECT_COLUMNS} FROM subjects WHERE subject_id = ?1"),
            rusqlite::params![id.get()],
            RawSubject::from_row,
          )
          .optional()?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawSubject::into_subject).transpose()
  }

  async fn delete_subject(&self, id: SubjectId) -> Result<bool> {
    // Ledger rows go with it via ON DELETE CASCADE.
    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM subjects WHERE subject_id = ?1",
          rusqlite::params![id.get()],
        )?)
      })
      .await?;
    Ok(changed > 0)
  }

  // ── Ratings ───────────────────────────────────────────────────────────────

  async fn ratings_for(&self, subject_id: SubjectId) -> Result<Vec<Rating>> {
    let raws: Vec<RawRating> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {RATING_COLUMNS} FROM ratings WHERE subject_id = ?1 ORDER BY rating_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![subject_id.get()], RawRating::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawRating::into_rating).collect()
  }

  async fn find_rating(
    &self,
    subject_id: SubjectId,
    session_id: SessionId,
  ) -> Result<Option<Rating>> {
    let raw: Option<RawRating> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {RATING_COLUMNS} FROM ratings
               WHERE subject_id = ?1 AND session_id = ?2"
            ),
            rusqlite::params![subject_id.get(), session_id.as_str()],
            RawRating::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawRating::into_rating).transpose()
  }

  async fn append_rating(&self, input: NewRating) -> Result<Option<Rating>> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let session    = input.session_id.as_str().to_owned();
    let subject_id = input.subject_id.get();
    let score      = input.score.get();

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO ratings (subject_id, session_id, score, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![subject_id, session, score, at_str],
        ) {
          Ok(_) => Ok(Some(conn.last_insert_rowid())),
          Err(e) if is_unique_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(id.map(|id| Rating {
      id: RatingId(id),
      subject_id: input.subject_id,
      session_id: input.session_id,
      score: input.score,
      created_at,
    }))
  }

  // ── Comments ──────────────────────────────────────────────────────────────

  async fn append_comment(&self, input: NewComment) -> Result<Comment> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let session    = input.session_id.as_str().to_owned();
    let subject_id = input.subject_id.get();
    let text       = input.text.clone();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (subject_id, session_id, text, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![subject_id, session, text, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Comment {
      id: CommentId(id),
      subject_id: input.subject_id,
      session_id: input.session_id,
      text: input.text,
      upvotes: 0,
      downvotes: 0,
      score: 0,
      is_buried: false,
      created_at,
    })
  }

  async fn get_comment(&self, id: CommentId) -> Result<Option<Comment>> {
    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1"),
            rusqlite::params![id.get()],
            RawComment::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn comments_for(&self, subject_id: SubjectId) -> Result<Vec<Comment>> {
    let raws: Vec<RawComment> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comments WHERE subject_id = ?1 ORDER BY comment_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![subject_id.get()], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawComment::into_comment).collect()
  }

  async fn update_comment_tally(
    &self,
    id: CommentId,
    tally: CommentTally,
  ) -> Result<Option<Comment>> {
    let raw: Option<RawComment> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "UPDATE comments
           SET upvotes = ?2, downvotes = ?3, score = ?4, is_buried = ?5
           WHERE comment_id = ?1",
          rusqlite::params![
            id.get(),
            tally.upvotes,
            tally.downvotes,
            tally.score,
            tally.is_buried,
          ],
        )?;
        let raw = tx
          .query_row(
            &format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE comment_id = ?1"),
            rusqlite::params![id.get()],
            RawComment::from_row,
          )
          .optional()?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  // ── Votes ─────────────────────────────────────────────────────────────────

  async fn votes_for(&self, comment_id: CommentId) -> Result<Vec<Vote>> {
    let raws: Vec<RawVote> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VOTE_COLUMNS} FROM comment_votes WHERE comment_id = ?1 ORDER BY vote_id"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![comment_id.get()], RawVote::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVote::into_vote).collect()
  }

  async fn find_vote(
    &self,
    comment_id: CommentId,
    session_id: SessionId,
  ) -> Result<Option<Vote>> {
    let raw: Option<RawVote> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!(
              "SELECT {VOTE_COLUMNS} FROM comment_votes
               WHERE comment_id = ?1 AND session_id = ?2"
            ),
            rusqlite::params![comment_id.get(), session_id.as_str()],
            RawVote::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawVote::into_vote).transpose()
  }

  async fn append_vote(&self, input: NewVote) -> Result<Option<Vote>> {
    let created_at    = Utc::now();
    let at_str        = encode_dt(created_at);
    let session       = input.session_id.as_str().to_owned();
    let comment_id    = input.comment_id.get();
    let direction_str = input.direction.as_str();

    let id: Option<i64> = self
      .conn
      .call(move |conn| {
        match conn.execute(
          "INSERT INTO comment_votes (comment_id, session_id, direction, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![comment_id, session, direction_str, at_str],
        ) {
          Ok(_) => Ok(Some(conn.last_insert_rowid())),
          Err(e) if is_unique_violation(&e) => Ok(None),
          Err(e) => Err(e.into()),
        }
      })
      .await?;

    Ok(id.map(|id| Vote {
      id: VoteId(id),
      comment_id: input.comment_id,
      session_id: input.session_id,
      direction: input.direction,
      created_at,
    }))
  }

  // ── Comparisons ───────────────────────────────────────────────────────────

  async fn append_comparison(&self, input: NewComparison) -> Result<Comparison> {
    let created_at = Utc::now();
    let at_str     = encode_dt(created_at);
    let session    = input.session_id.as_str().to_owned();
    let winner_id  = input.winner_id.get();
    let loser_id   = input.loser_id.get();

    let id: i64 = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comparisons (winner_id, loser_id, session_id, created_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![winner_id, loser_id, session, at_str],
        )?;
        Ok(conn.last_insert_rowid())
      })
      .await?;

    Ok(Comparison {
      id: ComparisonId(id),
      winner_id: input.winner_id,
      loser_id: input.loser_id,
      session_id: input.session_id,
      created_at,
    })
  }

  // ── Stats ─────────────────────────────────────────────────────────────────

  async fn totals(&self) -> Result<Totals> {
    Ok(Totals {
      subject_count: self.count("subjects").await?,
      rating_count:  self.count("ratings").await?,
      comment_count: self.count("comments").await?,
    })
  }
}
