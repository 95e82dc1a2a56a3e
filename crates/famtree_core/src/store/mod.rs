//! In-memory member store.
//!
//! # Responsibility
//! - Own the member collection and its view state.
//! - Enforce relation integrity on delete through one repair pass.
//!
//! # Invariants
//! - Store writes never leave a partially applied mutation behind.
//! - Persistence is orchestrated by the service layer, not by the store.

pub mod member_store;
