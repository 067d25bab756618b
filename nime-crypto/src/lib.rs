//! # NIME Crypto
//!
//! Authenticity checks for inbound webhooks.
//!
//! Deliveries are signed with HMAC-SHA256 over the raw request body using a
//! secret shared with the sender. The signature travels hex-encoded in a
//! header, optionally prefixed with `sha256=`.
//!
//! ## Example
//!
//! ```rust
//! use nime_crypto::{sign, verify_signature, WebhookSecret};
//!
//! let secret = WebhookSecret::new("It's a Secret to Everybody");
//! let body = b"Hello, World!";
//! let header = sign(&secret, body);
//! assert!(verify_signature(&secret, &header, body));
//! assert!(!verify_signature(&secret, &header, b"Hello, World?"));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms)]

mod secret;
pub mod signature;

pub use secret::WebhookSecret;
pub use signature::{check_signature, compute_mac, sign, verify_signature, SignatureError};
