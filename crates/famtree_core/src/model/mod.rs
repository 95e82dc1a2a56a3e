//! Domain model for the family tree.
//!
//! # Responsibility
//! - Define canonical data structures used by core business logic.
//! - Keep relations as plain id references so the store owns integrity.
//!
//! # Invariants
//! - Every member is identified by a stable `MemberId`.
//! - View state never owns member data; it only references ids.

pub mod member;
pub mod view_state;
