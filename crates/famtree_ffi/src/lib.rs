//! Flutter bridge crate for the family tree core.

pub mod api;
