//! Error types for `perk-core`.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::member::{Id, ReservationId, TransactionId};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
  /// The operation would leave two members with the same identity.
  #[error("a member with id {0} already exists")]
  DuplicateMember(Id),

  #[error("member not found: {0}")]
  MemberNotFound(Id),

  #[error("transaction amount must not be negative: {0}")]
  NegativeAmount(Decimal),

  #[error("invalid member id: {0:?}")]
  InvalidId(String),

  /// Every id up to `u32::MAX` is taken by the highest member.
  #[error("no member ids left to assign")]
  IdsExhausted,

  #[error("duplicate transaction id: {0}")]
  DuplicateTransaction(TransactionId),

  #[error("duplicate reservation id: {0}")]
  DuplicateReservation(ReservationId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
