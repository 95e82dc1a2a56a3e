//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and persistence calls into use-case level APIs.
//! - Keep UI/FFI layers decoupled from storage details.

pub mod family_service;
