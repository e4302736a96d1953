//! # larder-pricing
//!
//! Grocery price sources and price reconciliation for larder.
//!
//! This crate provides:
//! - Kroger implementation of the [`larder_core::PriceSource`] trait
//!   (OAuth2 client-credentials with in-memory token caching)
//! - A deterministic mock price source for tests
//! - The session fulfillment overlay (removed / pinned / cached state)
//! - Concurrency-capped price reconciliation producing an effective total
//!
//! # Example
//!
//! ```rust,no_run
//! use larder_pricing::{KrogerClient, PriceComparison, PricingConfig, SessionOverlay};
//!
//! # async fn example(items: Vec<larder_core::ShoppingListItem>) {
//! let source = KrogerClient::from_env();
//! let mut overlay = SessionOverlay::new();
//! let comparison =
//!     PriceComparison::compute(&items, &mut overlay, &source, &PricingConfig::default()).await;
//! println!("total: {:.2}", comparison.effective_total);
//! # }
//! ```

pub mod kroger;
pub mod mock;
pub mod overlay;
pub mod reconcile;

pub use kroger::{KrogerClient, DEFAULT_KROGER_URL};
pub use mock::MockPriceSource;
pub use overlay::SessionOverlay;
pub use reconcile::{ItemPricing, PriceComparison, PricingConfig, PricingStatus};

pub use larder_core::{PriceResult, PriceSource, ProductMatch};
