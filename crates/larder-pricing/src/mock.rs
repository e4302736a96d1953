//! Mock price source for deterministic testing.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use larder_core::{PriceResult, PriceSource, ProductMatch};

/// Mock price source for testing.
///
/// Ingredients without a configured fixture resolve to a successful
/// empty result (a "no match" lookup).
#[derive(Clone)]
pub struct MockPriceSource {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<String>>>,
}

#[derive(Debug, Clone, Default)]
struct MockConfig {
    products: HashMap<String, Vec<ProductMatch>>,
    failing_ingredients: HashSet<String>,
    configured: bool,
}

impl MockPriceSource {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig {
                configured: true,
                ..MockConfig::default()
            }),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Build a simple fixture product.
    pub fn product(name: &str, price: f64) -> ProductMatch {
        ProductMatch {
            store_name: "MockMart".to_string(),
            product_id: format!("mock-{}", name.to_lowercase().replace(' ', "-")),
            product_name: name.to_string(),
            price,
            unit: "each".to_string(),
            size: None,
            image_url: None,
            product_url: None,
        }
    }

    /// Map an ingredient to fixture matches, best first.
    pub fn with_products(
        mut self,
        ingredient: impl Into<String>,
        products: Vec<ProductMatch>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .products
            .insert(ingredient.into(), products);
        self
    }

    /// Make lookups for an ingredient fail.
    pub fn with_failure(mut self, ingredient: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config)
            .failing_ingredients
            .insert(ingredient.into());
        self
    }

    /// Report the source as unconfigured.
    pub fn unconfigured(mut self) -> Self {
        Arc::make_mut(&mut self.config).configured = false;
        self
    }

    /// Ingredients looked up so far, in order.
    pub fn lookups(&self) -> Vec<String> {
        self.call_log.lock().unwrap().clone()
    }
}

impl Default for MockPriceSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PriceSource for MockPriceSource {
    fn store_name(&self) -> &str {
        "MockMart"
    }

    fn is_configured(&self) -> bool {
        self.config.configured
    }

    async fn search_products(&self, ingredient: &str, limit: usize) -> PriceResult {
        self.call_log.lock().unwrap().push(ingredient.to_string());

        if !self.config.configured {
            return PriceResult::failed(ingredient, "mock source not configured");
        }
        if self.config.failing_ingredients.contains(ingredient) {
            return PriceResult::failed(ingredient, format!("mock failure for {ingredient}"));
        }

        let products = self
            .config
            .products
            .get(ingredient)
            .map(|p| p.iter().take(limit).cloned().collect())
            .unwrap_or_default();
        PriceResult::ok(ingredient, products)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fixture_products_are_returned_in_order() {
        let source = MockPriceSource::new().with_products(
            "garlic",
            vec![
                MockPriceSource::product("Garlic Bulb", 0.79),
                MockPriceSource::product("Garlic Jar", 3.49),
            ],
        );

        let result = source.search_products("garlic", 5).await;
        assert!(result.success);
        assert_eq!(result.best_match().unwrap().price, 0.79);
        assert_eq!(source.lookups(), vec!["garlic".to_string()]);
    }

    #[tokio::test]
    async fn test_unknown_ingredient_is_a_clean_miss() {
        let source = MockPriceSource::new();
        let result = source.search_products("dragonfruit", 5).await;
        assert!(result.success);
        assert!(result.products.is_empty());
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let source = MockPriceSource::new().with_failure("garlic");
        let result = source.search_products("garlic", 5).await;
        assert!(!result.success);
        assert!(result.error.is_some());
    }
}
