//! SQLite backend for the Perk member store.
//!
//! Implements [`perk_core::repository::MemberRepository`] on top of a single
//! [`rusqlite`] connection. Every save rewrites the member list inside one
//! SQLite transaction, so a crash mid-save leaves the previous list intact.

mod encode;
mod repository;
mod schema;

pub mod error;

pub use error::{Error, Result};
pub use repository::SqliteRepository;
