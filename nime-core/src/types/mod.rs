//! Domain types for NIME.
//!
//! - [`CacheEnvelope`]: payload stored with its expiry and cached flag
//! - [`CacheLookup`]: outcome of a cache read before it collapses to a miss
//! - [`Resolved`]: payload handed back by the cache-aside pipeline
//! - [`ReleaseRecord`]: one entry of the release index
//! - [`Channel`]: stable or prerelease update channel

mod envelope;
mod release;

pub use envelope::*;
pub use release::*;
