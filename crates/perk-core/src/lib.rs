//! Core types for the Perk loyalty store.
//!
//! This crate holds the member entity, the identity-enforcing
//! [`store::MemberStore`], the statistics facade and the [`model::Model`] that
//! ties them together. It is free of database and CLI dependencies; storage
//! backends implement [`repository::MemberRepository`].

pub mod error;
pub mod member;
pub mod model;
pub mod repository;
pub mod stats;
pub mod store;
pub mod view;

pub use error::{Error, Result};
