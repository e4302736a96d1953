//! # larder-inference
//!
//! LLM-assisted quantity combination for larder.
//!
//! This crate provides:
//! - Ollama implementation of the [`larder_core::QuantityCombiner`] trait
//! - A deterministic mock combiner for tests
//!
//! # Feature Flags
//!
//! - `ollama` (default): Enable the Ollama combiner
//!
//! # Example
//!
//! ```rust,no_run
//! use larder_inference::OllamaCombiner;
//! use larder_core::QuantityCombiner;
//!
//! #[tokio::main]
//! async fn main() {
//!     let combiner = OllamaCombiner::from_env();
//!     let quantities = vec!["2 cloves".to_string(), "3 cloves".to_string()];
//!     let combined = combiner.combine("garlic", &quantities).await.unwrap();
//!     println!("{combined}");
//! }
//! ```

#[cfg(feature = "ollama")]
pub mod combiner;

pub mod mock;

#[cfg(feature = "ollama")]
pub use combiner::{OllamaCombiner, DEFAULT_GEN_MODEL, DEFAULT_OLLAMA_URL, GEN_TIMEOUT_SECS};
pub use mock::MockCombiner;

pub use larder_core::QuantityCombiner;
