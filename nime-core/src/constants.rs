//! Service constants for NIME.
//!
//! Values that define wire formats or cache semantics live here so the
//! client, orchestrator and HTTP layer agree on them.

// ═══════════════════════════════════════════════════════════════════════════════
// CACHE
// ═══════════════════════════════════════════════════════════════════════════════

/// Lifetime of a cache envelope in milliseconds (24 hours).
pub const CACHE_TTL_MS: i64 = 86_400_000;

/// Cache key holding the newest stable release.
pub const LATEST_KEY: &str = "latest";

/// Cache key holding the newest prerelease.
pub const LATEST_PRE_KEY: &str = "latest-pre";

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAM RETRY POLICY
// ═══════════════════════════════════════════════════════════════════════════════

/// Default upper bound on attempts against a rate-limited upstream.
pub const DEFAULT_MAX_RETRIES: u32 = 10;

/// Fixed wait between attempts after an HTTP 429, in milliseconds.
/// The metadata API resets its rate-limit window roughly every second.
pub const RETRY_INTERVAL_MS: u64 = 1_000;

/// Default per-request transport timeout in seconds.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// User agent sent to every upstream. GitHub rejects requests without one.
pub const USER_AGENT: &str = "a.ni.me-api";

// ═══════════════════════════════════════════════════════════════════════════════
// WEBHOOKS
// ═══════════════════════════════════════════════════════════════════════════════

/// Header carrying the webhook event type.
pub const EVENT_HEADER: &str = "x-github-event";

/// Header carrying the HMAC-SHA256 signature of the raw body.
pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// Optional prefix in front of the hex signature.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Event type that is acknowledged without verification.
pub const PING_EVENT: &str = "ping";

// ═══════════════════════════════════════════════════════════════════════════════
// RELEASES
// ═══════════════════════════════════════════════════════════════════════════════

/// Release asset holding the updater manifest.
pub const MANIFEST_ASSET: &str = "latest.json";

/// Repository whose releases feed the update channels.
pub const DEFAULT_RELEASE_REPO: &str = "Waradu/a.ni.me";

// ═══════════════════════════════════════════════════════════════════════════════
// UPSTREAM ENDPOINTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Key-value store base URL.
pub const DEFAULT_KVS_API_URL: &str = "https://kvs.wireway.ch";

/// Anime metadata API base URL.
pub const DEFAULT_JIKAN_API_URL: &str = "https://api.jikan.moe/v4";

/// GitHub REST API base URL.
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";

/// AniList OAuth base URL.
pub const DEFAULT_ANILIST_API_URL: &str = "https://anilist.co/api/v2";

/// Only images below this prefix are proxied.
pub const IMAGE_CDN_PREFIX: &str = "https://cdn.myanimelist.net/images/anime/";

/// Deep link the desktop client registers for the OAuth callback.
pub const APP_CALLBACK_URL: &str = "a.ni.me://callback";
