//! [`Model`] — the aggregate the command layer works against.
//!
//! Composes the [`MemberStore`], the user's [`Preferences`], and the two
//! display filters: the main member list and the narrower "view" list used
//! when a single member's details are on screen.

use std::{
  cell::RefCell,
  collections::BTreeMap,
  path::{Path, PathBuf},
  rc::Rc,
};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
  Error, Result,
  member::{Id, Member, Reservation, Tier, Transaction},
  stats::{Statistics, Window},
  store::MemberStore,
  view::{
    ChangeListener, FilteredView, MemberPredicate, SubscriptionId, project,
    show_all,
  },
};

// ─── Preferences ─────────────────────────────────────────────────────────────

/// Settings persisted alongside, but separately from, the member data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
  /// Where the member data lives.
  pub store_path: PathBuf,
}

impl Default for Preferences {
  fn default() -> Self {
    Self {
      store_path: PathBuf::from("data/perk.sqlite3"),
    }
  }
}

// ─── Model ───────────────────────────────────────────────────────────────────

type SharedPredicate = Rc<RefCell<MemberPredicate>>;

pub struct Model {
  store:            MemberStore,
  preferences:      Preferences,
  list_filter:      SharedPredicate,
  view_filter:      SharedPredicate,
  /// Subscribers of the main filtered list.
  list_subscribers: Vec<SubscriptionId>,
  /// Subscribers of the "view" list.
  view_subscribers: Vec<SubscriptionId>,
}

impl Model {
  /// Build a model over `members`, which must be unique by identity.
  pub fn new(members: Vec<Member>, preferences: Preferences) -> Result<Self> {
    let mut store = MemberStore::new();
    store.reset_all(members)?;
    info!(members = store.len(), "model initialised");
    Ok(Self {
      store,
      preferences,
      list_filter: Rc::new(RefCell::new(show_all())),
      view_filter: Rc::new(RefCell::new(show_all())),
      list_subscribers: Vec::new(),
      view_subscribers: Vec::new(),
    })
  }

  // ── Preferences ───────────────────────────────────────────────────────────

  pub fn preferences(&self) -> &Preferences { &self.preferences }

  pub fn set_preferences(&mut self, preferences: Preferences) {
    self.preferences = preferences;
  }

  pub fn store_path(&self) -> &Path { &self.preferences.store_path }

  pub fn set_store_path(&mut self, path: impl Into<PathBuf>) {
    self.preferences.store_path = path.into();
  }

  // ── Members ───────────────────────────────────────────────────────────────

  pub fn store(&self) -> &MemberStore { &self.store }

  pub fn members(&self) -> &[Member] { self.store.members() }

  /// True if a member with the same identity as `member` exists.
  pub fn has_member(&self, member: &Member) -> bool {
    self.store.contains(member)
  }

  /// True if a member with the same identity as `member` is in the currently
  /// filtered member list.
  pub fn has_member_in_filtered_list(&self, member: &Member) -> bool {
    let filter = self.list_filter.borrow();
    self.store.contains_where(member, |m| (**filter)(m))
  }

  pub fn member_by_id(&self, id: Id) -> Result<&Member> {
    self.store.find_by_id(id)
  }

  /// The id to assign to the next new member: one past the highest in use.
  /// Fails with [`Error::IdsExhausted`] once the highest id is `u32::MAX`.
  pub fn next_id(&self) -> Result<Id> {
    match self.store.iter().map(Member::id).max() {
      None => Ok(Id::new(1)),
      Some(highest) => highest.next().ok_or(Error::IdsExhausted),
    }
  }

  pub fn add_member(&mut self, member: Member) -> Result<()> {
    let id = member.id();
    self.store.add(member)?;
    info!(%id, "added member");
    Ok(())
  }

  /// Replace `target` with `edited`.
  pub fn set_member(&mut self, target: &Member, edited: Member) -> Result<()> {
    self.store.replace(target, edited)?;
    info!(id = %target.id(), "updated member");
    Ok(())
  }

  pub fn delete_member(&mut self, target: &Member) -> Result<Member> {
    let removed = self.store.remove(target)?;
    info!(id = %removed.id(), "deleted member");
    Ok(removed)
  }

  /// Record `transactions` against member `id` and return the updated member.
  pub fn add_transactions(
    &mut self,
    id: Id,
    transactions: impl IntoIterator<Item = Transaction>,
  ) -> Result<&Member> {
    let current = self.store.find_by_id(id)?.clone();
    let updated = current.with_transactions_added(transactions);
    let added = updated.transaction_count() - current.transaction_count();
    if added == 0 {
      return self.store.find_by_id(id);
    }
    self.store.replace(&current, updated)?;
    info!(%id, added, "recorded transactions");
    self.store.find_by_id(id)
  }

  /// Record `reservations` against member `id` and return the updated member.
  pub fn add_reservations(
    &mut self,
    id: Id,
    reservations: impl IntoIterator<Item = Reservation>,
  ) -> Result<&Member> {
    let current = self.store.find_by_id(id)?.clone();
    let updated = current.with_reservations_added(reservations);
    if updated.is_identical(&current) {
      return self.store.find_by_id(id);
    }
    self.store.replace(&current, updated)?;
    info!(%id, "recorded reservations");
    self.store.find_by_id(id)
  }

  /// Swap in a whole new member list, e.g. after loading from storage.
  pub fn reset_members(&mut self, members: Vec<Member>) -> Result<()> {
    self.store.reset_all(members)
  }

  // ── Display lists ─────────────────────────────────────────────────────────

  /// Change the predicate of the main member list.
  pub fn update_filtered_member_list(&mut self, predicate: MemberPredicate) {
    *self.list_filter.borrow_mut() = predicate;
    for id in &self.list_subscribers {
      self.store.refresh_subscriber(*id);
    }
  }

  /// Change the predicate of the "view" list.
  pub fn update_member_list_for_view(&mut self, predicate: MemberPredicate) {
    *self.view_filter.borrow_mut() = predicate;
    for id in &self.view_subscribers {
      self.store.refresh_subscriber(*id);
    }
  }

  pub fn filtered_members(&self) -> Vec<&Member> {
    project(&**self.list_filter.borrow(), self.store.members())
  }

  pub fn members_for_view(&self) -> Vec<&Member> {
    project(&**self.view_filter.borrow(), self.store.members())
  }

  /// Listen to every change of the full member list.
  pub fn subscribe<L>(&mut self, listener: L) -> SubscriptionId
  where
    L: ChangeListener + 'static,
  {
    self.store.subscribe(listener)
  }

  /// Listen to the main filtered list. Follows later predicate changes.
  pub fn subscribe_filtered_list<L>(&mut self, listener: L) -> SubscriptionId
  where
    L: ChangeListener + 'static,
  {
    let view = FilteredView::new(live(&self.list_filter), listener);
    let id = self.store.subscribe(view);
    self.list_subscribers.push(id);
    id
  }

  /// Listen to the "view" list. Follows later predicate changes.
  pub fn subscribe_view_list<L>(&mut self, listener: L) -> SubscriptionId
  where
    L: ChangeListener + 'static,
  {
    let view = FilteredView::new(live(&self.view_filter), listener);
    let id = self.store.subscribe(view);
    self.view_subscribers.push(id);
    id
  }

  pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
    self.list_subscribers.retain(|v| *v != id);
    self.view_subscribers.retain(|v| *v != id);
    self.store.unsubscribe(id)
  }

  // ── Statistics ────────────────────────────────────────────────────────────

  /// Statistics as of right now.
  pub fn statistics(&self) -> Statistics<'_> { self.statistics_at(Utc::now()) }

  pub fn statistics_at(&self, now: DateTime<Utc>) -> Statistics<'_> {
    Statistics::new(self.store.members(), now)
  }

  pub fn number_of_members(&self) -> usize { self.store.len() }

  pub fn number_of_members_by_tier(&self) -> BTreeMap<Tier, usize> {
    self.statistics().member_count_by_tier()
  }

  pub fn number_of_transactions(&self, window: Window) -> usize {
    self.statistics().transaction_count(window)
  }

  pub fn total_amount_of_transactions(&self, window: Window) -> Decimal {
    self.statistics().transaction_sum(window)
  }
}

/// A predicate that always defers to whatever `cell` currently holds.
fn live(cell: &SharedPredicate) -> MemberPredicate {
  let cell = Rc::clone(cell);
  Rc::new(move |m: &Member| (**cell.borrow())(m))
}
