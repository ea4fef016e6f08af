//! A rateable person entry and its derived counters.
//!
//! The descriptive fields are written once at creation. The counters are
//! derived from the ledgers and only change through [`StatPatch`]es issued by
//! the engine.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, id::SubjectId};

// ─── Category ────────────────────────────────────────────────────────────────

/// What kind of person a subject is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
  Teacher,
  Student,
  Employee,
  Celebrity,
  Other,
}

impl Category {
  pub const ALL: [Category; 5] = [
    Self::Teacher,
    Self::Student,
    Self::Employee,
    Self::Celebrity,
    Self::Other,
  ];

  /// The lowercase name used on the wire and in the database.
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Teacher => "teacher",
      Self::Student => "student",
      Self::Employee => "employee",
      Self::Celebrity => "celebrity",
      Self::Other => "other",
    }
  }
}

impl fmt::Display for Category {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for Category {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|c| c.as_str() == s)
      .ok_or_else(|| Error::invalid(format!("unknown category: {s:?}")))
  }
}

// ─── Subject ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subject {
  pub id:                SubjectId,
  pub name:              String,
  pub description:       String,
  pub category:          Category,
  pub image_url:         String,
  pub created_at:        DateTime<Utc>,
  /// Plain arithmetic mean of all ratings; `0.0` while unrated.
  pub average_rating:    f64,
  pub total_ratings:     u32,
  pub total_comments:    u32,
  pub total_views:       u32,
  pub comparison_wins:   u32,
  pub comparison_losses: u32,
}

/// Input to [`crate::store::TallyStore::insert_subject`]. Counters, id and
/// creation time are assigned by the store.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubject {
  pub name:        String,
  pub description: String,
  pub category:    Category,
  pub image_url:   String,
}

impl NewSubject {
  /// Build a subject with all derived counters at zero.
  pub fn into_subject(self, id: SubjectId, created_at: DateTime<Utc>) -> Subject {
    Subject {
      id,
      name: self.name,
      description: self.description,
      category: self.category,
      image_url: self.image_url,
      created_at,
      average_rating: 0.0,
      total_ratings: 0,
      total_comments: 0,
      total_views: 0,
      comparison_wins: 0,
      comparison_losses: 0,
    }
  }
}

// ─── StatPatch ───────────────────────────────────────────────────────────────

/// A partial update of a subject's derived counters. `None` leaves the field
/// as it is.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatPatch {
  pub average_rating:    Option<f64>,
  pub total_ratings:     Option<u32>,
  pub total_comments:    Option<u32>,
  pub total_views:       Option<u32>,
  pub comparison_wins:   Option<u32>,
  pub comparison_losses: Option<u32>,
}

impl StatPatch {
  pub fn is_empty(&self) -> bool { *self == Self::default() }

  pub fn apply_to(&self, subject: &mut Subject) {
    if let Some(v) = self.average_rating {
      subject.average_rating = v;
    }
    if let Some(v) = self.total_ratings {
      subject.total_ratings = v;
    }
    if let Some(v) = self.total_comments {
      subject.total_comments = v;
    }
    if let Some(v) = self.total_views {
      subject.total_views = v;
    }
    if let Some(v) = self.comparison_wins {
      subject.comparison_wins = v;
    }
    if let Some(v) = self.comparison_losses {
      subject.comparison_losses = v;
    }
  }
}

// ─── Ordering ────────────────────────────────────────────────────────────────

/// Sort keys for subject listings. All orders are descending and stable, so
/// ties keep insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectSort {
  #[default]
  AverageRating,
  Newest,
  MostComments,
  FaceMash,
}

impl SubjectSort {
  /// Sort `subjects`, which must already be in insertion order.
  pub fn sort(self, subjects: &mut [Subject]) {
    match self {
      Self::AverageRating => {
        subjects.sort_by(|a, b| b.average_rating.total_cmp(&a.average_rating))
      }
      Self::Newest => subjects.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
      Self::MostComments => {
        subjects.sort_by(|a, b| b.total_comments.cmp(&a.total_comments))
      }
      Self::FaceMash => {
        subjects.sort_by(|a, b| b.comparison_wins.cmp(&a.comparison_wins))
      }
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn subject(id: i64, average: f64, comments: u32, wins: u32) -> Subject {
    let mut s = NewSubject {
      name:        format!("s{id}"),
      description: String::new(),
      category:    Category::Other,
      image_url:   String::new(),
    }
    .into_subject(SubjectId(id), Utc::now());
    s.average_rating = average;
    s.total_comments = comments;
    s.comparison_wins = wins;
    s
  }

  fn ids(subjects: &[Subject]) -> Vec<i64> {
    subjects.iter().map(|s| s.id.get()).collect()
  }

  #[test]
  fn category_parses_lowercase_names() {
    assert_eq!("celebrity".parse::<Category>().unwrap(), Category::Celebrity);
    assert!("Celebrity".parse::<Category>().is_err());
    assert!("alien".parse::<Category>().is_err());
  }

  #[test]
  fn category_serde_matches_as_str() {
    for c in Category::ALL {
      let json = serde_json::to_string(&c).unwrap();
      assert_eq!(json, format!("\"{}\"", c.as_str()));
    }
  }

  #[test]
  fn sort_by_rating_is_stable_on_ties() {
    let mut list = vec![
      subject(1, 3.0, 0, 0),
      subject(2, 4.5, 0, 0),
      subject(3, 3.0, 0, 0),
      subject(4, 0.0, 0, 0),
    ];
    SubjectSort::AverageRating.sort(&mut list);
    assert_eq!(ids(&list), vec![2, 1, 3, 4]);
  }

  #[test]
  fn sort_by_comments_and_wins() {
    let mut list = vec![
      subject(1, 0.0, 2, 7),
      subject(2, 0.0, 9, 1),
      subject(3, 0.0, 2, 7),
    ];
    SubjectSort::MostComments.sort(&mut list);
    assert_eq!(ids(&list), vec![2, 1, 3]);

    SubjectSort::FaceMash.sort(&mut list);
    assert_eq!(ids(&list), vec![1, 3, 2]);
  }

  #[test]
  fn stat_patch_only_touches_named_fields() {
    let mut s = subject(1, 2.0, 3, 4);
    s.total_views = 10;

    let patch = StatPatch {
      average_rating: Some(4.25),
      comparison_losses: Some(1),
      ..StatPatch::default()
    };
    patch.apply_to(&mut s);

    assert_eq!(s.average_rating, 4.25);
    assert_eq!(s.comparison_losses, 1);
    assert_eq!(s.total_comments, 3);
    assert_eq!(s.comparison_wins, 4);
    assert_eq!(s.total_views, 10);
    assert!(StatPatch::default().is_empty());
    assert!(!patch.is_empty());
  }
}
