//! Structured logging schema and field name constants for larder.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Correlation ID propagated across request → sub-calls. Format: UUIDv7.
pub const REQUEST_ID: &str = "request_id";

/// Subsystem originating the log event.
/// Values: "api", "aggregate", "db", "inference", "pricing"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "aggregator", "kroger", "pool", "share_links"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "aggregate", "regenerate_items", "search_products"
pub const OPERATION: &str = "op";

// ─── Entity fields ─────────────────────────────────────────────────────────

/// Shopping list UUID being operated on.
pub const LIST_ID: &str = "list_id";

/// List item UUID being operated on.
pub const ITEM_ID: &str = "item_id";

/// Ingredient UUID being operated on.
pub const INGREDIENT_ID: &str = "ingredient_id";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Number of recipes feeding an aggregation.
pub const RECIPE_COUNT: &str = "recipe_count";

/// Number of distinct ingredients produced by an aggregation.
pub const INGREDIENT_COUNT: &str = "ingredient_count";

/// Number of product matches returned by a price lookup.
pub const RESULT_COUNT: &str = "result_count";
