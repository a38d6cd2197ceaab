//! Error type for `perk-store-sqlite`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("core error: {0}")]
  Core(#[from] perk_core::Error),

  #[error("database error: {0}")]
  Database(#[from] rusqlite::Error),

  #[error("io error: {0}")]
  Io(#[from] std::io::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("decimal parse error: {0}")]
  Decimal(#[from] rust_decimal::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  /// A column held a value that does not map onto a domain type.
  #[error("invalid stored value: {0}")]
  Decode(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
