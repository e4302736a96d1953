//! Centralized default constants for the larder system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// AGGREGATION
// =============================================================================

/// Separator used when combining multiple quantity strings in default mode
/// (e.g. `"1 cup + 2 cups"`).
pub const QUANTITY_SEPARATOR: &str = " + ";

/// Sort-order stride per category: `sort_order = priority * 1000 + index`.
/// Supports up to 999 distinct ingredients per category without collision.
pub const SORT_ORDER_STRIDE: i32 = 1000;

/// Maximum accepted length for an assisted-combiner reply. Longer replies
/// are treated as malformed and trigger the default-mode fallback.
pub const COMBINER_MAX_REPLY_LEN: usize = 120;

// =============================================================================
// SHARE LINKS
// =============================================================================

/// Random bytes per share-link code (48 bits of entropy, ~8 chars base64url).
pub const LINK_CODE_BYTES: usize = 6;

/// Maximum regeneration attempts on a link-code collision before treating
/// the situation as an entropy/configuration failure.
pub const LINK_CODE_MAX_RETRIES: u32 = 5;

/// Default share-link lifetime in days.
pub const LINK_EXPIRY_DAYS: i64 = 7;

// =============================================================================
// PRICING
// =============================================================================

/// Maximum product matches requested per ingredient lookup.
pub const PRICE_LOOKUP_LIMIT: usize = 5;

/// Concurrent in-flight price lookups per comparison (external rate limits).
pub const PRICE_LOOKUP_CONCURRENCY: usize = 4;

/// Timeout for a single price-source HTTP request (seconds).
pub const PRICE_TIMEOUT_SECS: u64 = 30;

/// Buffer subtracted from OAuth token lifetime before refresh (seconds).
pub const TOKEN_EXPIRY_BUFFER_SECS: u64 = 60;

// =============================================================================
// INFERENCE
// =============================================================================

/// Default Ollama endpoint for the assisted quantity combiner.
pub const OLLAMA_URL: &str = "http://localhost:11434";

/// Default generation model for quantity combination. Small and fast:
/// the task is a one-line text rewrite.
pub const GEN_MODEL: &str = "llama3.2:3b";

/// Timeout for combiner generation requests (seconds).
pub const GEN_TIMEOUT_SECS: u64 = 30;
