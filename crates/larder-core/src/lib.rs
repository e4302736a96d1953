//! # larder-core
//!
//! Core types, traits, and abstractions for the larder shopping-list engine.
//!
//! This crate provides the foundational data structures and trait definitions
//! that other larder crates depend on.

pub mod categories;
pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use categories::{categorize, category_priority, CATEGORY_KEYWORDS, CATEGORY_ORDER};
pub use error::{Error, Result};
pub use models::*;
pub use traits::*;
pub use uuid_utils::new_v7;
