//! Statistics over the member list.
//!
//! Always computed fresh from the members passed in; nothing is cached or
//! maintained incrementally.

use std::collections::BTreeMap;

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::member::{Member, Tier, Transaction};

// ─── Window ──────────────────────────────────────────────────────────────────

/// A trailing period used to scope transaction aggregates.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  PartialOrd,
  Ord,
  Hash,
  Serialize,
  Deserialize,
  Display,
  EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Window {
  All,
  PastMonth,
  PastThreeMonths,
  PastSixMonths,
}

impl Window {
  /// Length in calendar months, or `None` for [`Window::All`].
  pub fn months(self) -> Option<u32> {
    match self {
      Self::All => None,
      Self::PastMonth => Some(1),
      Self::PastThreeMonths => Some(3),
      Self::PastSixMonths => Some(6),
    }
  }

  /// Earliest instant inside the window ending at `now`.
  ///
  /// Calendar subtraction: a day that does not exist in the target month is
  /// clamped to that month's last day, so one month before March 31 is the
  /// end of February.
  pub fn lower_bound(self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let months = self.months()?;
    Some(
      now
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC),
    )
  }

  /// True if `at` lies in `[lower_bound, now]`. [`Window::All`] accepts any
  /// instant.
  pub fn contains(self, at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    match self.lower_bound(now) {
      None => true,
      Some(from) => from <= at && at <= now,
    }
  }
}

// ─── Facade ──────────────────────────────────────────────────────────────────

/// Read-only aggregate queries over a member slice at a fixed `now`.
#[derive(Debug, Clone, Copy)]
pub struct Statistics<'a> {
  members: &'a [Member],
  now:     DateTime<Utc>,
}

impl<'a> Statistics<'a> {
  pub fn new(members: &'a [Member], now: DateTime<Utc>) -> Self {
    Self { members, now }
  }

  pub fn now(&self) -> DateTime<Utc> { self.now }

  /// Member count per tier. Tiers with no members are absent.
  pub fn member_count_by_tier(&self) -> BTreeMap<Tier, usize> {
    let mut counts = BTreeMap::new();
    for m in self.members {
      *counts.entry(m.tier).or_insert(0) += 1;
    }
    counts
  }

  pub fn total_member_count(&self) -> usize { self.members.len() }

  fn transactions_in(
    &self,
    window: Window,
  ) -> impl Iterator<Item = &'a Transaction> + '_ {
    self
      .members
      .iter()
      .flat_map(Member::transactions)
      .filter(move |t| window.contains(t.at(), self.now))
  }

  pub fn transaction_count(&self, window: Window) -> usize {
    self.transactions_in(window).count()
  }

  pub fn transaction_sum(&self, window: Window) -> Decimal {
    self.transactions_in(window).map(Transaction::amount).sum()
  }

  /// Every figure above in one serialisable value.
  pub fn summary(&self) -> Summary {
    Summary {
      as_of:           self.now,
      total_members:   self.total_member_count(),
      members_by_tier: self.member_count_by_tier(),
      windows:         Window::iter()
        .map(|window| WindowSummary {
          window,
          transactions: self.transaction_count(window),
          amount: self.transaction_sum(window),
        })
        .collect(),
    }
  }
}

// ─── Summary ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowSummary {
  pub window:       Window,
  pub transactions: usize,
  pub amount:       Decimal,
}

/// A point-in-time snapshot of all statistics, for display or export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
  pub as_of:           DateTime<Utc>,
  pub total_members:   usize,
  pub members_by_tier: BTreeMap<Tier, usize>,
  /// One entry per [`Window`], in declaration order.
  pub windows:         Vec<WindowSummary>,
}

impl Summary {
  pub fn window(&self, window: Window) -> Option<&WindowSummary> {
    self.windows.iter().find(|w| w.window == window)
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Duration, TimeZone};

  use super::*;
  use crate::member::Id;

  fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
  }

  fn dollars(n: i64) -> Decimal { Decimal::new(n, 0) }

  fn member_with(
    id: u32,
    tier: Tier,
    txns: &[(i64, DateTime<Utc>)],
  ) -> Member {
    let base = Member::new(Id::new(id), format!("m{id}"), tier, utc(2020, 1, 1));
    base.with_transactions_added(
      txns
        .iter()
        .map(|(amount, at)| Transaction::new(dollars(*amount), *at).unwrap()),
    )
  }

  #[test]
  fn one_month_before_march_31_is_end_of_february() {
    assert_eq!(
      Window::PastMonth.lower_bound(utc(2023, 3, 31)),
      Some(utc(2023, 2, 28))
    );
    assert_eq!(
      Window::PastMonth.lower_bound(utc(2024, 3, 31)),
      Some(utc(2024, 2, 29))
    );
    assert_eq!(
      Window::PastSixMonths.lower_bound(utc(2024, 8, 31)),
      Some(utc(2024, 2, 29))
    );
    assert_eq!(Window::All.lower_bound(utc(2024, 8, 31)), None);
  }

  #[test]
  fn window_bounds_are_inclusive() {
    let now = utc(2024, 5, 15);
    let from = utc(2024, 4, 15);
    assert!(Window::PastMonth.contains(from, now));
    assert!(Window::PastMonth.contains(now, now));
    assert!(!Window::PastMonth.contains(from - Duration::seconds(1), now));
    assert!(!Window::PastMonth.contains(now + Duration::seconds(1), now));
    assert!(Window::All.contains(now + Duration::days(365), now));
  }

  #[test]
  fn empty_slice_yields_zeros() {
    let stats = Statistics::new(&[], utc(2024, 1, 1));
    assert!(stats.member_count_by_tier().is_empty());
    assert_eq!(stats.total_member_count(), 0);
    for w in Window::iter() {
      assert_eq!(stats.transaction_count(w), 0);
      assert_eq!(stats.transaction_sum(w), Decimal::ZERO);
    }
  }

  #[test]
  fn gold_and_silver_scenario() {
    let now = utc(2024, 6, 30);
    let members = vec![
      member_with(1, Tier::Gold, &[
        (10, now - Duration::days(10)),
        (5, now - Duration::days(40)),
      ]),
      member_with(2, Tier::Silver, &[(20, now - Duration::days(200))]),
    ];
    let stats = Statistics::new(&members, now);

    let tiers = stats.member_count_by_tier();
    assert_eq!(tiers.len(), 2);
    assert_eq!(tiers[&Tier::Gold], 1);
    assert_eq!(tiers[&Tier::Silver], 1);

    assert_eq!(stats.transaction_count(Window::PastMonth), 1);
    assert_eq!(stats.transaction_sum(Window::PastMonth), dollars(10));
    assert_eq!(stats.transaction_count(Window::PastThreeMonths), 2);
    assert_eq!(stats.transaction_sum(Window::PastThreeMonths), dollars(15));
    assert_eq!(stats.transaction_count(Window::PastSixMonths), 2);
    assert_eq!(stats.transaction_count(Window::All), 3);
    assert_eq!(stats.transaction_sum(Window::All), dollars(35));
  }

  #[test]
  fn sums_are_exact() {
    let now = utc(2024, 6, 30);
    let base = member_with(1, Tier::Bronze, &[]);
    let m = base.with_transactions_added(
      (0..10).map(|_| Transaction::new(Decimal::new(10, 2), now).unwrap()),
    );
    let stats = Statistics::new(std::slice::from_ref(&m), now);
    assert_eq!(stats.transaction_sum(Window::All), Decimal::ONE);
    assert_eq!(stats.transaction_count(Window::All), 10);
  }

  #[test]
  fn summary_covers_every_window() {
    let now = utc(2024, 6, 30);
    let members = vec![member_with(1, Tier::Platinum, &[(7, now)])];
    let summary = Statistics::new(&members, now).summary();

    assert_eq!(summary.total_members, 1);
    assert_eq!(summary.windows.len(), 4);
    assert_eq!(summary.window(Window::PastMonth).unwrap().amount, dollars(7));
    assert_eq!(summary.members_by_tier.get(&Tier::Gold), None);
  }
}
