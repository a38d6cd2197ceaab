//! [`MemberStore`] — the ordered, identity-unique member collection.
//!
//! Adding and replacing use [`Member::is_same_member`] so that no two stored
//! members ever share an identity. Removal and replacement targets use
//! [`Member::is_identical`] so that only a member with exactly the given
//! fields is touched.

use std::fmt;

use tracing::{debug, warn};

use crate::{
  Error, Result,
  member::{Id, Member},
  view::{ChangeListener, ListChange, SubscriptionId},
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// An ordered list of members, unique by identity.
///
/// Every mutation either succeeds completely or fails with the store
/// unchanged, and listeners are only notified after a successful mutation has
/// been applied, so they never observe an invalid state.
///
/// The store is single-threaded and does no locking. A multi-threaded host
/// must serialise `add`, `replace`, `remove` and `reset_all` behind its own
/// mutex and read a consistent snapshot for statistics.
#[derive(Default)]
pub struct MemberStore {
  members:           Vec<Member>,
  listeners:         Vec<(SubscriptionId, Box<dyn ChangeListener>)>,
  next_subscription: u64,
}

impl MemberStore {
  pub fn new() -> Self { Self::default() }

  // ── Queries ───────────────────────────────────────────────────────────────

  /// The member whose id is `id`.
  pub fn find_by_id(&self, id: Id) -> Result<&Member> {
    self
      .members
      .iter()
      .find(|m| m.id() == id)
      .ok_or(Error::MemberNotFound(id))
  }

  /// True if a stored member has the same identity as `candidate`.
  pub fn contains(&self, candidate: &Member) -> bool {
    self.members.iter().any(|m| candidate.is_same_member(m))
  }

  /// Like [`MemberStore::contains`], but only among members accepted by
  /// `predicate` (e.g. the members currently on display).
  pub fn contains_where<P>(&self, candidate: &Member, predicate: P) -> bool
  where
    P: Fn(&Member) -> bool,
  {
    self
      .members
      .iter()
      .filter(|m| predicate(*m))
      .any(|m| candidate.is_same_member(m))
  }

  /// Read-only view of the current sequence.
  pub fn members(&self) -> &[Member] { &self.members }

  pub fn iter(&self) -> std::slice::Iter<'_, Member> { self.members.iter() }

  pub fn len(&self) -> usize { self.members.len() }

  pub fn is_empty(&self) -> bool { self.members.is_empty() }

  // ── Mutations ─────────────────────────────────────────────────────────────

  /// Append `member`. Fails if a member with the same identity exists.
  pub fn add(&mut self, member: Member) -> Result<()> {
    if self.contains(&member) {
      warn!(id = %member.id(), "rejected duplicate member");
      return Err(Error::DuplicateMember(member.id()));
    }
    let index = self.members.len();
    debug!(id = %member.id(), index, "member added");
    self.members.push(member.clone());
    self.emit(ListChange::Inserted { index, member });
    Ok(())
  }

  /// Put `replacement` in the slot held by the member identical to `target`.
  ///
  /// Fails if no stored member is identical to `target`, or if `replacement`
  /// carries a different identity that is already taken by another member.
  pub fn replace(&mut self, target: &Member, replacement: Member) -> Result<()> {
    let index = self
      .position_of(target)
      .ok_or(Error::MemberNotFound(target.id()))?;

    if !target.is_same_member(&replacement) && self.contains(&replacement) {
      warn!(id = %replacement.id(), "rejected replacement with a taken id");
      return Err(Error::DuplicateMember(replacement.id()));
    }

    debug!(
      old = %target.id(),
      new = %replacement.id(),
      index,
      "member replaced"
    );
    let old = std::mem::replace(&mut self.members[index], replacement.clone());
    self.emit(ListChange::Replaced {
      index,
      old,
      new: replacement,
    });
    Ok(())
  }

  /// Remove the first member identical to `exact` and return it.
  pub fn remove(&mut self, exact: &Member) -> Result<Member> {
    let index = self
      .position_of(exact)
      .ok_or(Error::MemberNotFound(exact.id()))?;
    let member = self.members.remove(index);
    debug!(id = %member.id(), index, "member removed");
    self.emit(ListChange::Removed {
      index,
      member: member.clone(),
    });
    Ok(member)
  }

  /// Replace the whole sequence with `members`, keeping their order. Fails if
  /// any two of them share an identity.
  pub fn reset_all(&mut self, members: Vec<Member>) -> Result<()> {
    if let Some(dup) = first_duplicate(&members) {
      warn!(id = %dup, "rejected member list with duplicates");
      return Err(Error::DuplicateMember(dup));
    }
    debug!(count = members.len(), "member list reset");
    self.members = members;
    self.emit(ListChange::Reset {
      members: self.members.clone(),
    });
    Ok(())
  }

  /// Re-announce the current contents as a [`ListChange::Reset`] without
  /// changing them, e.g. after a view's filter changed.
  pub fn refresh(&mut self) {
    self.emit(ListChange::Reset {
      members: self.members.clone(),
    });
  }

  /// Like [`MemberStore::refresh`], but only for the listener registered as
  /// `id`. Returns `false` if it is not registered.
  pub fn refresh_subscriber(&mut self, id: SubscriptionId) -> bool {
    let Some((_, listener)) =
      self.listeners.iter_mut().find(|(sid, _)| *sid == id)
    else {
      return false;
    };
    let change = ListChange::Reset {
      members: self.members.clone(),
    };
    listener.on_change(&change, &self.members);
    true
  }

    // ── Subscriptions ─────────────────────────────────────────────────────────

  /// Register `listener` for every subsequent change. Listeners are called
  /// in subscription order.
  pub fn subscribe<L>(&mut self, listener: L) -> SubscriptionId
  where
    L: ChangeListener + 'static,
  {
    let id = SubscriptionId(self.next_subscription);
    self.next_subscription += 1;
    self.listeners.push((id, Box::new(listener)));
    id
  }

  /// Drop a listener. Returns `false` if it was not registered.
  pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
    let before = self.listeners.len();
    self.listeners.retain(|(sid, _)| *sid != id);
    self.listeners.len() != before
  }

  // ── Internals ─────────────────────────────────────────────────────────────

  fn position_of(&self, exact: &Member) -> Option<usize> {
    self.members.iter().position(|m| m.is_identical(exact))
  }

  fn emit(&mut self, change: ListChange) {
    for (_, listener) in &mut self.listeners {
      listener.on_change(&change, &self.members);
    }
  }
}

/// The id of the first pair of same-identity members, if any. Pairwise; the
/// lists involved are small.
fn first_duplicate(members: &[Member]) -> Option<Id> {
  for (i, a) in members.iter().enumerate() {
    if members[i + 1..].iter().any(|b| a.is_same_member(b)) {
      return Some(a.id());
    }
  }
  None
}

impl fmt::Debug for MemberStore {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("MemberStore")
      .field("members", &self.members)
      .field("listeners", &self.listeners.len())
      .finish()
  }
}

impl PartialEq for MemberStore {
  fn eq(&self, other: &Self) -> bool { self.members == other.members }
}

impl<'a> IntoIterator for &'a MemberStore {
  type IntoIter = std::slice::Iter<'a, Member>;
  type Item = &'a Member;

  fn into_iter(self) -> Self::IntoIter { self.members.iter() }
}
