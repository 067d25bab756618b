//! # NIME Upstream
//!
//! Clients for the slow, rate-limited services NIME sits in front of.
//!
//! - [`RetryPolicy`]: fixed-interval, bounded retry on HTTP 429
//! - [`JikanClient`]: anime metadata by id ([`UpstreamSource`])
//! - [`GitHubReleases`]: release index and asset downloads ([`ReleaseIndex`])
//!
//! Only rate limiting is retried. Every other failure is returned on the
//! first attempt.
//!
//! [`UpstreamSource`]: nime_core::UpstreamSource
//! [`ReleaseIndex`]: nime_core::ReleaseIndex

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod github;
mod http;
mod jikan;
mod retry;

pub use github::{GitHubConfig, GitHubReleases};
pub use http::build_client;
pub use jikan::{JikanClient, JikanConfig};
pub use retry::RetryPolicy;
