//! Price reconciliation: persisted items + session overlay + live lookups.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, instrument};
use uuid::Uuid;

use larder_core::defaults::{PRICE_LOOKUP_CONCURRENCY, PRICE_LOOKUP_LIMIT};
use larder_core::{PriceResult, PriceSource, ProductMatch, ShoppingListItem};

use crate::overlay::SessionOverlay;

/// Tunables for a price comparison run.
#[derive(Debug, Clone)]
pub struct PricingConfig {
    /// Maximum product matches requested per ingredient.
    pub lookup_limit: usize,
    /// Maximum lookups in flight at once.
    pub concurrency: usize,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            lookup_limit: PRICE_LOOKUP_LIMIT,
            concurrency: PRICE_LOOKUP_CONCURRENCY,
        }
    }
}

/// How one item's price was determined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingStatus {
    /// Shopper pinned a specific product.
    Pinned,
    /// Top-ranked lookup result.
    BestMatch,
    /// Lookup succeeded but found nothing.
    Unpriced,
    /// Lookup failed; also counts as unpriced for the total.
    Error,
}

/// Per-item row of a price comparison.
#[derive(Debug, Clone, Serialize)]
pub struct ItemPricing {
    pub item_id: Uuid,
    pub ingredient_name: String,
    pub status: PricingStatus,
    pub product: Option<ProductMatch>,
    pub price: Option<f64>,
    pub error: Option<String>,
}

/// A reconciled price view of one list for one session.
#[derive(Debug, Clone, Serialize)]
pub struct PriceComparison {
    pub store_name: String,
    pub items: Vec<ItemPricing>,
    /// Sum of pinned-or-best-match prices over included items.
    pub effective_total: f64,
    /// Included items that contributed nothing to the total.
    pub unpriced_count: usize,
}

impl PriceComparison {
    /// Reconcile `items` against the overlay and the price source.
    ///
    /// Removed items are excluded entirely. Pinned items take their pinned
    /// price without a lookup. Everything else resolves through the
    /// overlay's result cache, falling back to a live lookup; lookups run
    /// concurrently under the configured cap, and results are cached back
    /// into the overlay for the rest of the session.
    #[instrument(skip_all, fields(subsystem = "pricing", component = "reconcile", item_count = items.len()))]
    pub async fn compute(
        items: &[ShoppingListItem],
        overlay: &mut SessionOverlay,
        source: &dyn PriceSource,
        config: &PricingConfig,
    ) -> Self {
        let included: Vec<&ShoppingListItem> = items
            .iter()
            .filter(|item| !overlay.is_removed(item.id))
            .collect();

        // One lookup per distinct uncached ingredient, not per item.
        let mut to_look_up: Vec<String> = Vec::new();
        for item in &included {
            if overlay.pinned_product(item.id).is_some() {
                continue;
            }
            if overlay.cached_result(&item.ingredient_name).is_some() {
                continue;
            }
            if !to_look_up.contains(&item.ingredient_name) {
                to_look_up.push(item.ingredient_name.clone());
            }
        }

        let lookups: Vec<PriceResult> = stream::iter(to_look_up)
            .map(|name| async move { source.search_products(&name, config.lookup_limit).await })
            .buffer_unordered(config.concurrency.max(1))
            .collect()
            .await;
        for result in lookups {
            overlay.cache_result(result.ingredient_name.clone(), result);
        }

        let mut rows = Vec::with_capacity(included.len());
        let mut effective_total = 0.0;
        let mut unpriced_count = 0;

        for item in included {
            let row = if let Some(pinned) = overlay.pinned_product(item.id) {
                effective_total += pinned.price;
                ItemPricing {
                    item_id: item.id,
                    ingredient_name: item.ingredient_name.clone(),
                    status: PricingStatus::Pinned,
                    product: Some(pinned.clone()),
                    price: Some(pinned.price),
                    error: None,
                }
            } else {
                // Cache is fully populated above; a miss means the source
                // skipped the name, which reads as a failed lookup.
                let result = overlay.cached_result(&item.ingredient_name);
                match result {
                    Some(result) if result.success => match result.best_match() {
                        Some(best) => {
                            effective_total += best.price;
                            ItemPricing {
                                item_id: item.id,
                                ingredient_name: item.ingredient_name.clone(),
                                status: PricingStatus::BestMatch,
                                product: Some(best.clone()),
                                price: Some(best.price),
                                error: None,
                            }
                        }
                        None => {
                            unpriced_count += 1;
                            ItemPricing {
                                item_id: item.id,
                                ingredient_name: item.ingredient_name.clone(),
                                status: PricingStatus::Unpriced,
                                product: None,
                                price: None,
                                error: None,
                            }
                        }
                    },
                    other => {
                        unpriced_count += 1;
                        ItemPricing {
                            item_id: item.id,
                            ingredient_name: item.ingredient_name.clone(),
                            status: PricingStatus::Error,
                            product: None,
                            price: None,
                            error: other
                                .and_then(|r| r.error.clone())
                                .or_else(|| Some("lookup skipped".to_string())),
                        }
                    }
                }
            };
            rows.push(row);
        }

        debug!(
            effective_total,
            unpriced_count,
            result_count = rows.len(),
            "Price comparison complete"
        );

        Self {
            store_name: source.store_name().to_string(),
            items: rows,
            effective_total,
            unpriced_count,
        }
    }
}
