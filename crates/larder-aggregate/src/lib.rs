//! # larder-aggregate
//!
//! Ingredient aggregation engine for larder.
//!
//! This crate turns raw per-recipe ingredient occurrences into one
//! deduplicated, categorized, stably-ordered ingredient set:
//! - Identity-based grouping (ingredient id, never name)
//! - Free-text quantity combination, default or collaborator-assisted
//! - Category assignment and collision-free sort-order computation
//!
//! ## Example
//!
//! ```ignore
//! use larder_aggregate::Aggregator;
//! use larder_core::AggregationMode;
//!
//! let aggregator = Aggregator::new(source).with_combiner(combiner);
//! let ingredients = aggregator
//!     .aggregate(&recipe_ids, AggregationMode::Assisted)
//!     .await?;
//! ```

pub mod aggregator;
pub mod quantity;

// Re-export core types
pub use larder_core::*;

pub use aggregator::Aggregator;
pub use quantity::combine_default;
