//! Encoding and decoding helpers between domain types and the plain values
//! stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, amounts are decimal strings, UUIDs are
//! hyphenated lowercase strings and member ids are plain integers.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use perk_core::member::{
  Id, Member, Reservation, ReservationId, ReservationStatus, Tier, Transaction,
  TransactionId,
};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{Error, Result};

// ─── Id ──────────────────────────────────────────────────────────────────────

pub fn encode_id(id: Id) -> i64 { i64::from(id.value()) }

pub fn decode_id(raw: i64) -> Result<Id> {
  u32::try_from(raw)
    .map(Id::new)
    .map_err(|_| Error::Decode(format!("member id out of range: {raw}")))
}

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

pub fn encode_amount(amount: Decimal) -> String { amount.to_string() }

pub fn decode_amount(s: &str) -> Result<Decimal> { Ok(Decimal::from_str(s)?) }

// ─── Tier / ReservationStatus ────────────────────────────────────────────────

pub fn encode_tier(tier: Tier) -> String { tier.to_string() }

pub fn decode_tier(s: &str) -> Result<Tier> {
  Tier::from_str(s).map_err(|_| Error::Decode(format!("unknown tier: {s:?}")))
}

pub fn encode_status(status: ReservationStatus) -> String { status.to_string() }

pub fn decode_status(s: &str) -> Result<ReservationStatus> {
  ReservationStatus::from_str(s)
    .map_err(|_| Error::Decode(format!("unknown reservation status: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw values read directly from a `members` row.
pub struct RawMember {
  pub member_id:     i64,
  pub name:          String,
  pub phone:         Option<String>,
  pub email:         Option<String>,
  pub address:       Option<String>,
  pub tier:          String,
  pub registered_at: String,
}

impl RawMember {
  /// Assemble the member together with its already-decoded children.
  pub fn into_member(
    self,
    transactions: Vec<Transaction>,
    reservations: Vec<Reservation>,
  ) -> Result<Member> {
    let mut member = Member::new(
      decode_id(self.member_id)?,
      self.name,
      decode_tier(&self.tier)?,
      decode_dt(&self.registered_at)?,
    );
    member.phone = self.phone;
    member.email = self.email;
    member.address = self.address;
    Ok(
      member
        .with_transactions_added(transactions)
        .with_reservations_added(reservations),
    )
  }
}

/// Raw values read directly from a `transactions` row.
pub struct RawTransaction {
  pub transaction_id: String,
  pub member_id:      i64,
  pub amount:         String,
  pub at:             String,
}

impl RawTransaction {
  pub fn into_transaction(self) -> Result<Transaction> {
    Ok(Transaction::with_id(
      TransactionId(decode_uuid(&self.transaction_id)?),
      decode_amount(&self.amount)?,
      decode_dt(&self.at)?,
    )?)
  }
}

/// Raw values read directly from a `reservations` row.
pub struct RawReservation {
  pub reservation_id: String,
  pub member_id:      i64,
  pub at:             String,
  pub status:         String,
  pub remark:         Option<String>,
}

impl RawReservation {
  pub fn into_reservation(self) -> Result<Reservation> {
    Ok(Reservation {
      id:     ReservationId(decode_uuid(&self.reservation_id)?),
      at:     decode_dt(&self.at)?,
      status: decode_status(&self.status)?,
      remark: self.remark,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;

  use super::*;

  #[test]
  fn amounts_keep_their_scale() {
    let amount = Decimal::new(1050, 2);
    assert_eq!(encode_amount(amount), "10.50");
    assert_eq!(decode_amount("10.50").unwrap(), amount);
  }

  #[test]
  fn tier_and_status_text() {
    assert_eq!(encode_tier(Tier::Platinum), "Platinum");
    assert_eq!(decode_tier("Platinum").unwrap(), Tier::Platinum);
    assert!(decode_tier("Diamond").is_err());
    assert_eq!(encode_status(ReservationStatus::Cancelled), "cancelled");
    assert_eq!(
      decode_status("cancelled").unwrap(),
      ReservationStatus::Cancelled
    );
  }

  #[test]
  fn ids_outside_u32_are_rejected() {
    assert_eq!(decode_id(12).unwrap(), Id::new(12));
    assert!(decode_id(-1).is_err());
    assert!(decode_id(i64::from(u32::MAX) + 1).is_err());
  }

  #[test]
  fn timestamps_round_trip() {
    let dt = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap();
    assert_eq!(decode_dt(&encode_dt(dt)).unwrap(), dt);
    assert!(decode_dt("yesterday").is_err());
  }

  #[test]
  fn negative_stored_amount_is_rejected() {
    let raw = RawTransaction {
      transaction_id: encode_uuid(Uuid::new_v4()),
      member_id:      1,
      amount:         "-3".into(),
      at:             encode_dt(Utc::now()),
    };
    assert!(matches!(
      raw.into_transaction(),
      Err(Error::Core(perk_core::Error::NegativeAmount(_)))
    ));
  }
}
