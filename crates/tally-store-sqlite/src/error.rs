//! Error type for `tally-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(#[from] tokio_rusqlite::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A stored column held a value the domain types reject.
  #[error("corrupt row: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
