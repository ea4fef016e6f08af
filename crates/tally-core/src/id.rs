//! Synthetic integer identifiers.
//!
//! Every ledger and the subject store hand out auto-incrementing ids starting
//! at 1. Each table gets its own newtype so a comment id can never be passed
//! where a subject id is expected.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! id_type {
  ($(#[$meta:meta])* $name:ident) => {
    $(#[$meta])*
    #[derive(
      Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize,
      Deserialize,
    )]
    #[serde(transparent)]
    pub struct $name(pub i64);

    impl $name {
      pub fn get(self) -> i64 { self.0 }
    }

    impl fmt::Display for $name {
      fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
      }
    }

    impl From<i64> for $name {
      fn from(value: i64) -> Self { Self(value) }
    }
  };
}

id_type!(
  /// Identifies a [`Subject`](crate::subject::Subject).
  SubjectId
);
id_type!(
  /// Identifies a [`Rating`](crate::ledger::Rating).
  RatingId
);
id_type!(
  /// Identifies a [`Comment`](crate::ledger::Comment).
  CommentId
);
id_type!(
  /// Identifies a [`Vote`](crate::ledger::Vote).
  VoteId
);
id_type!(
  /// Identifies a [`Comparison`](crate::ledger::Comparison).
  ComparisonId
);
