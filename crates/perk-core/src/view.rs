//! Structural change events and filtered live views.
//!
//! [`MemberStore`](crate::store::MemberStore) publishes one [`ListChange`] per
//! successful mutation to every registered [`ChangeListener`]. A display layer
//! subscribes and re-renders; a [`FilteredView`] re-expresses the same events
//! in terms of a filtered subsequence.

use crate::member::Member;

// ─── Events ──────────────────────────────────────────────────────────────────

/// A structural change to an ordered member list. Indices refer to the list
/// the event was emitted for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListChange {
  Inserted {
    index:  usize,
    member: Member,
  },
  Removed {
    index:  usize,
    member: Member,
  },
  Replaced {
    index: usize,
    old:   Member,
    new:   Member,
  },
  /// The whole list was swapped out.
  Reset { members: Vec<Member> },
}

/// Handle returned by `subscribe`; pass it back to `unsubscribe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub(crate) u64);

// ─── Listener trait ──────────────────────────────────────────────────────────

/// Receives change events, in emission order, after each mutation has been
/// applied. `current` is the list as it stands after the change.
pub trait ChangeListener {
  fn on_change(&mut self, change: &ListChange, current: &[Member]);
}

/// Adapter for closures that only care about the event itself.
pub struct FnListener<F>(F);

impl<F> ChangeListener for FnListener<F>
where
  F: FnMut(&ListChange),
{
  fn on_change(&mut self, change: &ListChange, _current: &[Member]) {
    (self.0)(change)
  }
}

/// Wrap a closure as a [`ChangeListener`].
pub fn listener_fn<F>(f: F) -> FnListener<F>
where
  F: FnMut(&ListChange),
{
  FnListener(f)
}

// ─── Filtering ───────────────────────────────────────────────────────────────

/// A shareable member predicate.
pub type MemberPredicate = std::rc::Rc<dyn Fn(&Member) -> bool>;

/// A predicate that accepts every member.
pub fn show_all() -> MemberPredicate { std::rc::Rc::new(|_: &Member| true) }

/// The members of `members` accepted by `predicate`, in order.
pub fn project<'a>(
  predicate: &dyn Fn(&Member) -> bool,
  members: &'a [Member],
) -> Vec<&'a Member> {
  members.iter().filter(|m| predicate(*m)).collect()
}

/// A live view over the subsequence of members matching a predicate.
///
/// Subscribe it to a store; it forwards index-correct events for the filtered
/// subsequence to `inner`. Events that do not touch the subsequence are
/// dropped.
pub struct FilteredView<L> {
  predicate: MemberPredicate,
  inner:     L,
}

impl<L: ChangeListener> FilteredView<L> {
  pub fn new(predicate: MemberPredicate, inner: L) -> Self {
    Self { predicate, inner }
  }

  /// Number of matching members strictly before `index` in `members`.
  fn filtered_index(&self, members: &[Member], index: usize) -> usize {
    members[..index.min(members.len())]
      .iter()
      .filter(|m| (self.predicate)(*m))
      .count()
  }

  /// Translate a store-level change into a change on the filtered list.
  pub fn translate(
    &self,
    change: &ListChange,
    current: &[Member],
  ) -> Option<ListChange> {
    let keep = |m: &Member| (self.predicate)(m);
    match change {
      ListChange::Inserted { index, member } => keep(member).then(|| {
        ListChange::Inserted {
          index:  self.filtered_index(current, *index),
          member: member.clone(),
        }
      }),
      // Everything before a removed slot is untouched, so counting over the
      // post-removal list gives the pre-removal filtered index.
      ListChange::Removed { index, member } => keep(member).then(|| {
        ListChange::Removed {
          index:  self.filtered_index(current, *index),
          member: member.clone(),
        }
      }),
      ListChange::Replaced { index, old, new } => {
        let index = self.filtered_index(current, *index);
        match (keep(old), keep(new)) {
          (true, true) => Some(ListChange::Replaced {
            index,
            old: old.clone(),
            new: new.clone(),
          }),
          (true, false) => Some(ListChange::Removed {
            index,
            member: old.clone(),
          }),
          (false, true) => Some(ListChange::Inserted {
            index,
            member: new.clone(),
          }),
          (false, false) => None,
        }
      }
      ListChange::Reset { members } => Some(ListChange::Reset {
        members: members.iter().filter(|m| keep(*m)).cloned().collect(),
      }),
    }
  }
}

impl<L: ChangeListener> ChangeListener for FilteredView<L> {
  fn on_change(&mut self, change: &ListChange, current: &[Member]) {
    let Some(translated) = self.translate(change, current) else {
      return;
    };
    let filtered: Vec<Member> = current
      .iter()
      .filter(|m| (self.predicate)(*m))
      .cloned()
      .collect();
    self.inner.on_change(&translated, &filtered);
  }
}
