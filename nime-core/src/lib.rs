//! # NIME Core
//!
//! Core types, errors, and traits shared by every NIME crate.
//!
//! - **Types**: cache envelopes, release records and release channels
//! - **Errors**: one error taxonomy for cache, upstream and webhook failures
//! - **Constants**: TTLs, sentinel keys, retry defaults and header names
//! - **Traits**: the store, upstream and clock seams used for injection
//!
//! ## Example
//!
//! ```rust
//! use nime_core::{CacheEnvelope, CACHE_TTL_MS};
//!
//! let envelope = CacheEnvelope::new(serde_json::json!({ "mal_id": 1 }), 1_000);
//! assert_eq!(envelope.expiry, 1_000 + CACHE_TTL_MS);
//! assert!(envelope.is_fresh(1_000));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, clippy::all)]

pub mod constants;
pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used items at crate root
pub use constants::*;
pub use error::{NimeError, Result};
pub use traits::*;
pub use types::*;
