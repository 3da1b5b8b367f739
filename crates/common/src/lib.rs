//! Common types and utilities for the settlement ledger
//!
//! This crate provides shared types used across all ledger crates.
//!
//! # Modules
//!
//! - [`error`] - Common error types
//! - [`types`] - Shared domain types (Role, Caller)
//! - [`args`] - Parsing of decimal-text arguments

pub mod args;
pub mod error;
pub mod types;

pub use args::{parse_u64, require_non_empty};
pub use error::{Error, Result};
pub use types::*;
