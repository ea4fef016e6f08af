//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE ... IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS subjects (
    subject_id        INTEGER PRIMARY KEY AUTOINCREMENT,
    name              TEXT    NOT NULL,
    description       TEXT    NOT NULL,
    category          TEXT    NOT NULL,  -- teacher | student | employee | celebrity | other
    image_url         TEXT    NOT NULL,
    created_at        TEXT    NOT NULL,  -- RFC 3339 UTC
    -- Derived counters; only written by the engine's recomputation.
    average_rating    REAL    NOT NULL DEFAULT 0,
    total_ratings     INTEGER NOT NULL DEFAULT 0,
    total_comments    INTEGER NOT NULL DEFAULT 0,
    total_views       INTEGER NOT NULL DEFAULT 0,
    comparison_wins   INTEGER NOT NULL DEFAULT 0,
    comparison_losses INTEGER NOT NULL DEFAULT 0
);

-- Append-only. One rating per session per subject.
CREATE TABLE IF NOT EXISTS ratings (
    rating_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id INTEGER NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    session_id TEXT    NOT NULL,
    score      INTEGER NOT NULL CHECK (score BETWEEN 1 AND 5),
    created_at TEXT    NOT NULL,
    UNIQUE (subject_id, session_id)
);

CREATE TABLE IF NOT EXISTS comments (
    comment_id INTEGER PRIMARY KEY AUTOINCREMENT,
    subject_id INTEGER NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    session_id TEXT    NOT NULL,
    text       TEXT    NOT NULL,
    upvotes    INTEGER NOT NULL DEFAULT 0,
    downvotes  INTEGER NOT NULL DEFAULT 0,
    score      INTEGER NOT NULL DEFAULT 0,
    is_buried  INTEGER NOT NULL DEFAULT 0,
    created_at TEXT    NOT NULL
);

-- Append-only. One vote per session per comment.
CREATE TABLE IF NOT EXISTS comment_votes (
    vote_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    comment_id INTEGER NOT NULL REFERENCES comments(comment_id) ON DELETE CASCADE,
    session_id TEXT    NOT NULL,
    direction  TEXT    NOT NULL CHECK (direction IN ('up', 'down')),
    created_at TEXT    NOT NULL,
    UNIQUE (comment_id, session_id)
);

-- Append-only log of head-to-head outcomes.
CREATE TABLE IF NOT EXISTS comparisons (
    comparison_id INTEGER PRIMARY KEY AUTOINCREMENT,
    winner_id     INTEGER NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    loser_id      INTEGER NOT NULL REFERENCES subjects(subject_id) ON DELETE CASCADE,
    session_id    TEXT    NOT NULL,
    created_at    TEXT    NOT NULL
);

CREATE INDEX IF NOT EXISTS subjects_category_idx  ON subjects(category);
CREATE INDEX IF NOT EXISTS comments_subject_idx   ON comments(subject_id);
CREATE INDEX IF NOT EXISTS comparisons_winner_idx ON comparisons(winner_id);
CREATE INDEX IF NOT EXISTS comparisons_loser_idx  ON comparisons(loser_id);

PRAGMA user_version = 1;
";
