//! # NIME Releases
//!
//! Keeps the "latest" and "latest-pre" cache slots in step with the
//! release index, and answers update checks from them.
//!
//! - [`select_channels`]: picks the newest published release per channel
//! - [`ReleaseSynchronizer`]: writes the selection and reads it back with
//!   cross-channel fallback
//! - [`ReleaseService`]: ties the synchronizer to a [`ReleaseIndex`] for
//!   webhook-triggered refreshes and manifest downloads
//!
//! [`ReleaseIndex`]: nime_core::traits::ReleaseIndex

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod select;
mod service;
mod sync;

pub use select::{select_channels, ChannelSelection};
pub use service::ReleaseService;
pub use sync::{ChannelOutcome, ReleaseSynchronizer, SyncReport};
