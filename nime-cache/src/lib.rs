//! # NIME Cache
//!
//! Cache-aside resolution of upstream documents.
//!
//! A resolution reads the envelope stored under the key, serves it when it
//! is still fresh, and otherwise asks the upstream, repopulates the store
//! and serves the fetched value. Store trouble degrades to an upstream call;
//! upstream trouble is surfaced, never papered over with stale data.
//!
//! ## Example
//!
//! ```rust,ignore
//! use nime_cache::CacheAside;
//!
//! let resolver = CacheAside::new(cache_client, Arc::new(jikan));
//! let resolved = resolver.resolve("52991").await?;
//!
//! if resolved.served_from_cache {
//!     println!("hit, expires at {:?}", resolved.expiry);
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod aside;

pub use aside::CacheAside;
