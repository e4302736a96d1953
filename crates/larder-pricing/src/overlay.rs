//! Session-scoped fulfillment overlay.
//!
//! Overlay state is one viewer's ephemeral modifications to a list:
//! removed items, pinned product choices, and cached lookup results. It
//! is never persisted and never shared between sessions, so two viewers
//! of the same shared list each see their own overlay.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use larder_core::{PriceResult, ProductMatch};

/// Per-session view state for one shopping list.
///
/// All mutators are idempotent; none of them touch the persisted items.
#[derive(Debug, Clone, Default)]
pub struct SessionOverlay {
    removed: HashSet<Uuid>,
    pinned: HashMap<Uuid, ProductMatch>,
    cached_results: HashMap<String, PriceResult>,
}

impl SessionOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exclude an item from the pricing view.
    pub fn remove_item(&mut self, item_id: Uuid) {
        self.removed.insert(item_id);
    }

    /// Undo a removal. No-op if the item was never removed.
    pub fn restore_item(&mut self, item_id: Uuid) {
        self.removed.remove(&item_id);
    }

    pub fn is_removed(&self, item_id: Uuid) -> bool {
        self.removed.contains(&item_id)
    }

    /// Pin a specific product choice for an item, overriding the best match.
    pub fn pin_product(&mut self, item_id: Uuid, product: ProductMatch) {
        self.pinned.insert(item_id, product);
    }

    /// Undo a pin. No-op if nothing was pinned.
    pub fn unpin_product(&mut self, item_id: Uuid) {
        self.pinned.remove(&item_id);
    }

    pub fn pinned_product(&self, item_id: Uuid) -> Option<&ProductMatch> {
        self.pinned.get(&item_id)
    }

    /// Cache a lookup result for an ingredient name.
    pub fn cache_result(&mut self, ingredient_name: impl Into<String>, result: PriceResult) {
        self.cached_results.insert(ingredient_name.into(), result);
    }

    pub fn cached_result(&self, ingredient_name: &str) -> Option<&PriceResult> {
        self.cached_results.get(ingredient_name)
    }

    /// Drop all cached lookup results, keeping removals and pins.
    pub fn clear_cache(&mut self) {
        self.cached_results.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(price: f64) -> ProductMatch {
        ProductMatch {
            store_name: "MockMart".to_string(),
            product_id: "p1".to_string(),
            product_name: "Thing".to_string(),
            price,
            unit: "each".to_string(),
            size: None,
            image_url: None,
            product_url: None,
        }
    }

    #[test]
    fn test_remove_and_restore_are_idempotent() {
        let mut overlay = SessionOverlay::new();
        let id = Uuid::new_v4();

        overlay.remove_item(id);
        overlay.remove_item(id);
        assert!(overlay.is_removed(id));

        overlay.restore_item(id);
        overlay.restore_item(id);
        assert!(!overlay.is_removed(id));
    }

    #[test]
    fn test_pin_replaces_and_unpins_cleanly() {
        let mut overlay = SessionOverlay::new();
        let id = Uuid::new_v4();

        overlay.pin_product(id, product(3.00));
        overlay.pin_product(id, product(2.00));
        assert_eq!(overlay.pinned_product(id).unwrap().price, 2.00);

        overlay.unpin_product(id);
        overlay.unpin_product(id);
        assert!(overlay.pinned_product(id).is_none());
    }

    #[test]
    fn test_cache_round_trip_and_clear() {
        let mut overlay = SessionOverlay::new();
        overlay.cache_result("garlic", PriceResult::ok("garlic", vec![product(0.79)]));

        assert!(overlay.cached_result("garlic").is_some());
        assert!(overlay.cached_result("onion").is_none());

        overlay.clear_cache();
        assert!(overlay.cached_result("garlic").is_none());
    }
}
