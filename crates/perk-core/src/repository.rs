//! The `MemberRepository` trait — the persistence boundary.
//!
//! Implemented by storage backends (e.g. `perk-store-sqlite`). The on-disk
//! format belongs entirely to the backend; the core only hands over and takes
//! back the ordered member sequence.

use crate::member::Member;

/// Durable storage for the member list.
pub trait MemberRepository {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Load the saved sequence, in saved order. Returns `None` if nothing has
  /// been saved yet, so callers can tell a fresh store from an empty one.
  fn load(&self) -> Result<Option<Vec<Member>>, Self::Error>;

  /// Persist `members`, replacing whatever was saved before.
  fn save(&self, members: &[Member]) -> Result<(), Self::Error>;
}
