//! # NIME KV
//!
//! Typed cache client over an external key-value store.
//!
//! - [`WireKvsStore`]: the HTTP key-value service used in production
//! - [`MemoryStore`]: in-process store for development and tests
//! - [`CacheClient`]: envelope-aware `lookup`/`get`/`put` on top of either
//!
//! Reads are best-effort: [`CacheClient::get`] never fails, it logs and
//! reports a miss. Writes are not: [`CacheClient::put`] returns the error.

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod client;
mod memory;
mod wire;

pub use client::CacheClient;
pub use memory::MemoryStore;
pub use wire::{KvsConfig, WireKvsStore};
