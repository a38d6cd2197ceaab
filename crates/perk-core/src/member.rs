//! Member entity — the unit of identity in the Perk store.
//!
//! A member is a value. Changing one means building a new value and handing it
//! to the store; nothing here mutates a member that is already stored.

use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Identity ────────────────────────────────────────────────────────────────

/// The immutable key of a member. Assigned once, never reassigned.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id(u32);

impl Id {
  pub const fn new(value: u32) -> Self { Self(value) }

  pub const fn value(self) -> u32 { self.0 }

  /// The id following this one, or `None` at `u32::MAX`.
  pub const fn next(self) -> Option<Self> {
    match self.0.checked_add(1) {
      Some(value) => Some(Self(value)),
      None => None,
    }
  }
}

impl fmt::Display for Id {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl FromStr for Id {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    s.trim()
      .parse::<u32>()
      .map(Self)
      .map_err(|_| Error::InvalidId(s.to_owned()))
  }
}

// ─── Tier ────────────────────────────────────────────────────────────────────

/// Loyalty level, ordered from lowest to highest.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[strum(ascii_case_insensitive)]
pub enum Tier {
  #[default]
  Bronze,
  Silver,
  Gold,
  Platinum,
}

// ─── Transactions ────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TransactionId(pub Uuid);

impl TransactionId {
  pub fn new_v4() -> Self { Self(Uuid::new_v4()) }
}

impl fmt::Display for TransactionId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

/// A purchase made by a member. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TransactionRecord")]
pub struct Transaction {
  id:     TransactionId,
  amount: Decimal,
  at:     DateTime<Utc>,
}

impl Transaction {
  /// Create a transaction with a fresh id.
  pub fn new(amount: Decimal, at: DateTime<Utc>) -> Result<Self> {
    Self::with_id(TransactionId::new_v4(), amount, at)
  }

  /// Rebuild a transaction with a known id, e.g. when loading from storage.
  pub fn with_id(
    id: TransactionId,
    amount: Decimal,
    at: DateTime<Utc>,
  ) -> Result<Self> {
    if amount.is_sign_negative() && !amount.is_zero() {
      return Err(Error::NegativeAmount(amount));
    }
    Ok(Self { id, amount, at })
  }

  pub fn id(&self) -> TransactionId { self.id }

  pub fn amount(&self) -> Decimal { self.amount }

  pub fn at(&self) -> DateTime<Utc> { self.at }
}

#[derive(Deserialize)]
struct TransactionRecord {
  id:     TransactionId,
  amount: Decimal,
  at:     DateTime<Utc>,
}

impl TryFrom<TransactionRecord> for Transaction {
  type Error = Error;

  fn try_from(r: TransactionRecord) -> Result<Self> {
    Self::with_id(r.id, r.amount, r.at)
  }
}

// ─── Reservations ────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ReservationId(pub Uuid);

impl ReservationId {
  pub fn new_v4() -> Self { Self(Uuid::new_v4()) }
}

impl fmt::Display for ReservationId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    fmt::Display::fmt(&self.0, f)
  }
}

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  Display,
  EnumString,
  EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ReservationStatus {
  #[default]
  Pending,
  Confirmed,
  Cancelled,
  Completed,
}

/// A table booking held by a member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
  pub id:     ReservationId,
  pub at:     DateTime<Utc>,
  pub status: ReservationStatus,
  /// Free-text note, e.g. "window seat".
  pub remark: Option<String>,
}

impl Reservation {
  /// A pending reservation with a fresh id.
  pub fn new(at: DateTime<Utc>, remark: Option<String>) -> Self {
    Self {
      id: ReservationId::new_v4(),
      at,
      status: ReservationStatus::Pending,
      remark,
    }
  }
}

// ─── Member ──────────────────────────────────────────────────────────────────

/// A loyalty member with their transactions and reservations.
///
/// Two equivalences apply:
/// [`Member::is_same_member`] compares identity only and governs uniqueness
/// and lookup; [`Member::is_identical`] compares every field and governs
/// exact-match removal and replacement targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MemberRecord", into = "MemberRecord")]
pub struct Member {
  id:                Id,
  pub name:          String,
  pub phone:         Option<String>,
  pub email:         Option<String>,
  pub address:       Option<String>,
  pub tier:          Tier,
  pub registered_at: DateTime<Utc>,
  transactions:      BTreeMap<TransactionId, Transaction>,
  reservations:      BTreeMap<ReservationId, Reservation>,
}

impl Member {
  /// A member with no contact details, transactions or reservations.
  pub fn new(
    id: Id,
    name: impl Into<String>,
    tier: Tier,
    registered_at: DateTime<Utc>,
  ) -> Self {
    Self {
      id,
      name: name.into(),
      phone: None,
      email: None,
      address: None,
      tier,
      registered_at,
      transactions: BTreeMap::new(),
      reservations: BTreeMap::new(),
    }
  }

  pub fn id(&self) -> Id { self.id }

  pub fn transactions(&self) -> impl Iterator<Item = &Transaction> {
    self.transactions.values()
  }

  pub fn transaction_count(&self) -> usize { self.transactions.len() }

  pub fn reservations(&self) -> impl Iterator<Item = &Reservation> {
    self.reservations.values()
  }

  /// Lifetime spend across every transaction.
  pub fn total_spent(&self) -> Decimal {
    self.transactions.values().map(Transaction::amount).sum()
  }

  /// Identity equivalence: same [`Id`], regardless of any other field.
  pub fn is_same_member(&self, other: &Member) -> bool { self.id == other.id }

  /// Full equivalence: every field matches.
  pub fn is_identical(&self, other: &Member) -> bool { self == other }

  /// A copy of this member with `transactions` added. Entries whose id is
  /// already present are ignored; stored transactions are never replaced.
  pub fn with_transactions_added(
    &self,
    transactions: impl IntoIterator<Item = Transaction>,
  ) -> Member {
    let mut out = self.clone();
    for txn in transactions {
      out.transactions.entry(txn.id()).or_insert(txn);
    }
    out
  }

  /// A copy of this member with `reservations` added, with the same
  /// additive-only rule as [`Member::with_transactions_added`].
  pub fn with_reservations_added(
    &self,
    reservations: impl IntoIterator<Item = Reservation>,
  ) -> Member {
    let mut out = self.clone();
    for r in reservations {
      out.reservations.entry(r.id).or_insert(r);
    }
    out
  }
}

/// Serialised form of a [`Member`]. Children are listed rather than keyed so
/// each entry's own id is the only key.
#[derive(Serialize, Deserialize)]
struct MemberRecord {
  id:            Id,
  name:          String,
  phone:         Option<String>,
  email:         Option<String>,
  address:       Option<String>,
  tier:          Tier,
  registered_at: DateTime<Utc>,
  #[serde(default)]
  transactions:  Vec<Transaction>,
  #[serde(default)]
  reservations:  Vec<Reservation>,
}

impl From<Member> for MemberRecord {
  fn from(m: Member) -> Self {
    Self {
      id:            m.id,
      name:          m.name,
      phone:         m.phone,
      email:         m.email,
      address:       m.address,
      tier:          m.tier,
      registered_at: m.registered_at,
      transactions:  m.transactions.into_values().collect(),
      reservations:  m.reservations.into_values().collect(),
    }
  }
}

impl TryFrom<MemberRecord> for Member {
  type Error = Error;

  fn try_from(r: MemberRecord) -> Result<Self> {
    let mut transactions = BTreeMap::new();
    for txn in r.transactions {
      let id = txn.id();
      if transactions.insert(id, txn).is_some() {
        return Err(Error::DuplicateTransaction(id));
      }
    }

    let mut reservations = BTreeMap::new();
    for res in r.reservations {
      let id = res.id;
      if reservations.insert(id, res).is_some() {
        return Err(Error::DuplicateReservation(id));
      }
    }

    Ok(Self {
      id: r.id,
      name: r.name,
      phone: r.phone,
      email: r.email,
      address: r.address,
      tier: r.tier,
      registered_at: r.registered_at,
      transactions,
      reservations,
    })
  }
}

#[cfg(test)]
mod tests {
  use chrono::TimeZone;
  use rust_decimal::Decimal;

  use super::*;

  fn at(day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, day, 12, 0, 0).unwrap()
  }

  fn alice() -> Member { Member::new(Id::new(1), "Alice", Tier::Gold, at(1)) }

  #[test]
  fn id_parses_and_displays() {
    let id: Id = " 42 ".parse().unwrap();
    assert_eq!(id, Id::new(42));
    assert_eq!(id.to_string(), "42");
    assert_eq!(id.next(), Some(Id::new(43)));
    assert_eq!(Id::new(u32::MAX).next(), None);
  }

  #[test]
  fn id_rejects_garbage() {
    assert_eq!("abc".parse::<Id>(), Err(Error::InvalidId("abc".into())));
    assert!("-1".parse::<Id>().is_err());
  }

  #[test]
  fn tier_parses_case_insensitively() {
    assert_eq!("gold".parse::<Tier>().unwrap(), Tier::Gold);
    assert_eq!("PLATINUM".parse::<Tier>().unwrap(), Tier::Platinum);
    assert_eq!(Tier::Silver.to_string(), "Silver");
    assert!(Tier::Bronze < Tier::Platinum);
  }

  #[test]
  fn negative_amount_rejected() {
    let err = Transaction::new(Decimal::new(-1, 0), at(2)).unwrap_err();
    assert_eq!(err, Error::NegativeAmount(Decimal::new(-1, 0)));
    assert!(Transaction::new(Decimal::ZERO, at(2)).is_ok());
  }

  #[test]
  fn same_member_ignores_profile_fields() {
    let a = alice();
    let mut b = a.clone();
    b.name = "Alicia".into();
    b.tier = Tier::Bronze;

    assert!(a.is_same_member(&b));
    assert!(!a.is_identical(&b));
    assert!(a.is_identical(&a.clone()));
  }

  #[test]
  fn different_ids_are_different_members() {
    let a = alice();
    let b = Member::new(Id::new(2), "Alice", Tier::Gold, at(1));
    assert!(!a.is_same_member(&b));
  }

  #[test]
  fn with_transactions_added_leaves_original_untouched() {
    let a = alice();
    let t1 = Transaction::new(Decimal::new(1050, 2), at(3)).unwrap();
    let t2 = Transaction::new(Decimal::new(5, 0), at(4)).unwrap();

    let b = a.with_transactions_added([t1.clone(), t2]);
    assert_eq!(a.transaction_count(), 0);
    assert_eq!(b.transaction_count(), 2);
    assert_eq!(b.total_spent(), Decimal::new(1550, 2));
    assert!(a.is_same_member(&b));
    assert!(!a.is_identical(&b));

    // Re-adding a known id never overwrites the stored entry.
    let forged = Transaction::with_id(t1.id(), Decimal::new(999, 0), at(5))
      .unwrap();
    let c = b.with_transactions_added([forged]);
    assert_eq!(c.transaction_count(), 2);
    assert_eq!(c.total_spent(), Decimal::new(1550, 2));
  }

  #[test]
  fn with_reservations_added_is_additive() {
    let r = Reservation::new(at(10), Some("window seat".into()));
    let b = alice().with_reservations_added([r.clone(), r.clone()]);
    let stored: Vec<_> = b.reservations().collect();
    assert_eq!(stored, vec![&r]);
    assert_eq!(stored[0].status, ReservationStatus::Pending);
  }

  #[test]
  fn member_json_round_trips() {
    let m = alice()
      .with_transactions_added([
        Transaction::new(Decimal::new(7, 0), at(3)).unwrap(),
      ])
      .with_reservations_added([Reservation::new(at(9), None)]);
    let json = serde_json::to_string(&m).unwrap();
    let back: Member = serde_json::from_str(&json).unwrap();
    assert!(back.is_identical(&m));
  }

  #[test]
  fn member_json_with_repeated_transaction_id_is_rejected() {
    let json = r#"{
      "id": 1,
      "name": "Alice",
      "phone": null,
      "email": null,
      "address": null,
      "tier": "Gold",
      "registered_at": "2024-05-01T12:00:00Z",
      "transactions": [
        {"id": "00000000-0000-0000-0000-000000000002", "amount": "5", "at": "2024-05-02T12:00:00Z"},
        {"id": "00000000-0000-0000-0000-000000000002", "amount": "7", "at": "2024-05-03T12:00:00Z"}
      ]
    }"#;
    let err = serde_json::from_str::<Member>(json).unwrap_err();
    assert!(err.to_string().contains("duplicate transaction id"));
  }

  #[test]
  fn member_json_with_negative_amount_is_rejected() {
    let json = r#"{
      "id": 1,
      "name": "Alice",
      "phone": null,
      "email": null,
      "address": null,
      "tier": "Gold",
      "registered_at": "2024-05-01T12:00:00Z",
      "transactions": [
        {"id": "00000000-0000-0000-0000-000000000002", "amount": "-5", "at": "2024-05-02T12:00:00Z"}
      ]
    }"#;
    assert!(serde_json::from_str::<Member>(json).is_err());
  }
}
