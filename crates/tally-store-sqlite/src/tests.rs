//! Integration tests for `SqliteStore` against an in-memory database.

use tally_core::{
  Engine, Error as CoreError,
  aggregate::CommentTally,
  id::{CommentId, SubjectId},
  ledger::{
    CommentSort, NewComment, NewComparison, NewRating, NewVote, Score, SessionId,
    VoteDirection,
  },
  store::TallyStore,
  subject::{Category, NewSubject, StatPatch},
};

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn person(name: &str, category: Category) -> NewSubject {
  NewSubject {
    name: name.into(),
    description: "someone".into(),
    category,
    image_url: "https://img.example/p.png".into(),
  }
}

fn session(s: &str) -> SessionId { SessionId::new(s) }

// ─── Subjects ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_subject() {
  let s = store().await;

  let subject = s.insert_subject(person("Alice", Category::Teacher)).await.unwrap();
  assert_eq!(subject.id, SubjectId(1));
  assert_eq!(subject.total_ratings, 0);

  let fetched = s.get_subject(subject.id).await.unwrap().unwrap();
  assert_eq!(fetched.name, "Alice");
  assert_eq!(fetched.category, Category::Teacher);
  assert_eq!(fetched.created_at, subject.created_at);
  assert_eq!(fetched.average_rating, 0.0);
}

#[tokio::test]
async fn get_subject_missing_returns_none() {
  let s = store().await;
  assert!(s.get_subject(SubjectId(99)).await.unwrap().is_none());
}

#[tokio::test]
async fn list_subjects_in_id_order_with_filter() {
  let s = store().await;
  s.insert_subject(person("a", Category::Student)).await.unwrap();
  s.insert_subject(person("b", Category::Celebrity)).await.unwrap();
  s.insert_subject(person("c", Category::Student)).await.unwrap();

  let all = s.list_subjects(None).await.unwrap();
  let ids: Vec<_> = all.iter().map(|s| s.id.get()).collect();
  assert_eq!(ids, vec![1, 2, 3]);

  let students = s.list_subjects(Some(Category::Student)).await.unwrap();
  assert_eq!(students.len(), 2);
  assert!(students.iter().all(|p| p.category == Category::Student));
}

#[tokio::test]
async fn record_view_increments() {
  let s = store().await;
  let subject = s.insert_subject(person("a", Category::Other)).await.unwrap();

  assert!(s.record_view(subject.id).await.unwrap());
  assert!(s.record_view(subject.id).await.unwrap());
  assert!(!s.record_view(SubjectId(404)).await.unwrap());

  let fetched = s.get_subject(subject.id).await.unwrap().unwrap();
  assert_eq!(fetched.total_views, 2);
}

#[tokio::test]
async fn stat_patch_merges_only_set_fields() {
  let s = store().await;
  let subject = s.insert_subject(person("a", Category::Other)).await.unwrap();
  s.record_view(subject.id).await.unwrap();

  let patched = s
    .apply_stat_patch(subject.id, StatPatch {
      average_rating: Some(3.5),
      total_ratings: Some(2),
      ..StatPatch::default()
    })
    .await
    .unwrap()
    .unwrap();

  assert_eq!(patched.average_rating, 3.5);
  assert_eq!(patched.total_ratings, 2);
  assert_eq!(patched.total_views, 1);
  assert_eq!(patched.comparison_wins, 0);

  let missing = s
    .apply_stat_patch(SubjectId(50), StatPatch::default())
    .await
    .unwrap();
  assert!(missing.is_none());
}

// ─── Ratings ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn append_rating_enforces_one_per_session() {
  let s = store().await;
  let subject = s.insert_subject(person("a", Category::Other)).await.unwrap();
  let rating = |session_id: &str, score: i64| NewRating {
    subject_id: subject.id,
    session_id: session(session_id),
    score:      Score::try_from(score).unwrap(),
  };

  let first = s.append_rating(rating("u1", 4)).await.unwrap();
  assert!(first.is_some());
  assert!(s.append_rating(rating("u1", 2)).await.unwrap().is_none());
  assert!(s.append_rating(rating("u2", 2)).await.unwrap().is_some());

  let ratings = s.ratings_for(subject.id).await.unwrap();
  assert_eq!(ratings.len(), 2);
  assert_eq!(ratings[0].score.get(), 4);

  let found = s.find_rating(subject.id, session("u1")).await.unwrap().unwrap();
  assert_eq!(found.id, first.unwrap().id);
  assert!(s.find_rating(subject.id, session("u3")).await.unwrap().is_none());
}

// ─── Comments & votes ────────────────────────────────────────────────────────

#[tokio::test]
async fn comment_tally_roundtrip() {
  let s = store().await;
  let subject = s.insert_subject(person("a", Category::Other)).await.unwrap();
  let comment = s
    .append_comment(NewComment {
      subject_id: subject.id,
      session_id: session("u1"),
      text:       "nice".into(),
    })
    .await
    .unwrap();
  assert_eq!(comment.id, CommentId(1));

  let tally = CommentTally {
    upvotes:   1,
    downvotes: 7,
    score:     -6,
    is_buried: true,
  };
  let updated = s.update_comment_tally(comment.id, tally).await.unwrap().unwrap();
  assert_eq!(updated.score, -6);
  assert!(updated.is_buried);

  let fetched = s.get_comment(comment.id).await.unwrap().unwrap();
  assert_eq!((fetched.upvotes, fetched.downvotes), (1, 7));
  assert_eq!(fetched.text, "nice");
  assert!(s.get_comment(CommentId(9)).await.unwrap().is_none());
}

#[tokio::test]
async fn append_vote_enforces_one_per_session() {
  let s = store().await;
  let subject = s.insert_subject(person("a", Category::Other)).await.unwrap();
  let comment = s
    .append_comment(NewComment {
      subject_id: subject.id,
      session_id: session("author"),
      text:       "hello".into(),
    })
    .await
    .unwrap();
  let vote = |session_id: &str, direction| NewVote {
    comment_id: comment.id,
    session_id: session(session_id),
    direction,
  };

  assert!(s.append_vote(vote("u1", VoteDirection::Up)).await.unwrap().is_some());
  assert!(s.append_vote(vote("u1", VoteDirection::Down)).await.unwrap().is_none());
  assert!(s.append_vote(vote("u2", VoteDirection::Down)).await.unwrap().is_some());

  let votes = s.votes_for(comment.id).await.unwrap();
  assert_eq!(votes.len(), 2);
  assert_eq!(votes[0].direction, VoteDirection::Up);
  assert_eq!(votes[1].direction, VoteDirection::Down);

  let mine = s.find_vote(comment.id, session("u2")).await.unwrap().unwrap();
  assert_eq!(mine.direction, VoteDirection::Down);
}

// ─── Deletion & totals ───────────────────────────────────────────────────────

#[tokio::test]
async fn delete_subject_cascades_ledgers() {
  let s = store().await;
  let a = s.insert_subject(person("a", Category::Other)).await.unwrap();
  let b = s.insert_subject(person("b", Category::Other)).await.unwrap();

  s.append_rating(NewRating {
    subject_id: a.id,
    session_id: session("u1"),
    score:      Score::try_from(5).unwrap(),
  })
  .await
  .unwrap();
  let comment = s
    .append_comment(NewComment {
      subject_id: a.id,
      session_id: session("u1"),
      text:       "bye".into(),
    })
    .await
    .unwrap();
  s.append_vote(NewVote {
    comment_id: comment.id,
    session_id: session("u2"),
    direction:  VoteDirection::Up,
  })
  .await
  .unwrap();
  s.append_comparison(NewComparison {
    winner_id:  b.id,
    loser_id:   a.id,
    session_id: session("u1"),
  })
  .await
  .unwrap();

  assert!(s.delete_subject(a.id).await.unwrap());
  assert!(!s.delete_subject(a.id).await.unwrap());

  let totals = s.totals().await.unwrap();
  assert_eq!(totals.subject_count, 1);
  assert_eq!(totals.rating_count, 0);
  assert_eq!(totals.comment_count, 0);
  assert!(s.votes_for(comment.id).await.unwrap().is_empty());
}

// ─── Through the engine ──────────────────────────────────────────────────────

#[tokio::test]
async fn engine_rating_and_burial_scenarios() {
  let e = Engine::new(store().await);
  let x = e.create_subject(person("x", Category::Teacher)).await.unwrap();
  let y = e.create_subject(person("y", Category::Teacher)).await.unwrap();
  assert_eq!((x.id, y.id), (SubjectId(1), SubjectId(2)));

  e.submit_rating(x.id, session("s1"), 5).await.unwrap();
  e.submit_rating(x.id, session("s2"), 3).await.unwrap();
  assert_eq!(e.get_subject(x.id).await.unwrap().average_rating, 4.0);

  e.submit_rating(x.id, session("s3"), 1).await.unwrap();
  let err = e.submit_rating(x.id, session("s1"), 2).await.unwrap_err();
  assert!(matches!(err, CoreError::AlreadyRated { .. }));

  let x_now = e.get_subject(x.id).await.unwrap();
  assert_eq!(x_now.average_rating, 3.0);
  assert_eq!(x_now.total_ratings, 3);

  let c = e.post_comment(x.id, session("s1"), "meh".into()).await.unwrap();
  for i in 0..6 {
    e.vote_comment(c.id, session(&format!("d{i}")), VoteDirection::Down)
      .await
      .unwrap();
  }
  e.vote_comment(c.id, session("u7"), VoteDirection::Up).await.unwrap();

  let comments = e.list_comments(x.id, CommentSort::Score).await.unwrap();
  assert_eq!(comments[0].score, -5);
  assert!(comments[0].is_buried);
  assert_eq!(e.get_subject(x.id).await.unwrap().total_comments, 1);
}

#[tokio::test]
async fn engine_comparisons_persist() {
  let e = Engine::new(store().await);
  let a = e.create_subject(person("a", Category::Other)).await.unwrap();
  let b = e.create_subject(person("b", Category::Other)).await.unwrap();

  let cmp = e.record_comparison(a.id, b.id, session("s")).await.unwrap();
  assert_eq!(cmp.winner_id, a.id);

  let a = e.get_subject(a.id).await.unwrap();
  let b = e.get_subject(b.id).await.unwrap();
  assert_eq!(a.comparison_wins, 1);
  assert_eq!(b.comparison_losses, 1);

  let (p, q) = e.pick_comparison_pair().await.unwrap().unwrap();
  assert_ne!(p.id, q.id);
}
