//! Recipe ingredient source backed by the recipe catalog tables.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, instrument};
use uuid::Uuid;

use larder_core::{Error, IngredientOccurrence, IngredientSource, Result};

/// PostgreSQL implementation of [`IngredientSource`].
#[derive(Clone)]
pub struct PgIngredientSource {
    pool: Pool<Postgres>,
}

impl PgIngredientSource {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl IngredientSource for PgIngredientSource {
    /// Fetch every ingredient occurrence for the given recipes.
    ///
    /// Rows come back in selection order, then recipe order, which the
    /// aggregator relies on for stable first-seen naming.
    #[instrument(skip(self, recipe_ids), fields(subsystem = "db", component = "ingredients", op = "occurrences", recipe_count = recipe_ids.len()))]
    async fn occurrences_for_recipes(
        &self,
        recipe_ids: &[Uuid],
    ) -> Result<Vec<IngredientOccurrence>> {
        if recipe_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT ri.recipe_id, r.name AS recipe_name,
                    ri.ingredient_id, i.name AS ingredient_name,
                    COALESCE(ri.quantity, '') AS quantity_text,
                    COALESCE(u.name, '') AS unit_text,
                    ri.order_index
             FROM recipe_ingredient ri
             JOIN recipe r ON r.id = ri.recipe_id
             JOIN ingredient i ON i.id = ri.ingredient_id
             LEFT JOIN unit_of_measure u ON u.id = ri.unit_id
             WHERE ri.recipe_id = ANY($1)
             ORDER BY array_position($1::uuid[], ri.recipe_id), ri.order_index",
        )
        .bind(recipe_ids)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        let occurrences: Vec<IngredientOccurrence> = rows
            .iter()
            .map(|row| IngredientOccurrence {
                recipe_id: row.get("recipe_id"),
                recipe_name: row.get("recipe_name"),
                ingredient_id: row.get("ingredient_id"),
                ingredient_name: row.get("ingredient_name"),
                quantity_text: row.get("quantity_text"),
                unit_text: row.get("unit_text"),
                order_index: row.get("order_index"),
            })
            .collect();

        debug!(result_count = occurrences.len(), "Occurrences fetched");
        Ok(occurrences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{
        add_recipe_ingredient, connect_test_pool, delete_recipe, seed_ingredient, seed_recipe,
        seed_unit,
    };

    #[tokio::test]
    async fn test_empty_recipe_list_yields_no_rows() {
        let source = PgIngredientSource::new(connect_test_pool().await);
        assert!(source.occurrences_for_recipes(&[]).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_occurrences_follow_selection_order() {
        let pool = connect_test_pool().await;
        let source = PgIngredientSource::new(pool.clone());

        let garlic = seed_ingredient(&pool, "garlic").await;
        let onion = seed_ingredient(&pool, "onion").await;
        let cloves = seed_unit(&pool, "cloves").await;

        let pasta = seed_recipe(&pool, "Pasta").await;
        let soup = seed_recipe(&pool, "Soup").await;
        add_recipe_ingredient(&pool, pasta, garlic, Some(cloves), "2", 0).await;
        add_recipe_ingredient(&pool, soup, onion, None, "1", 0).await;
        add_recipe_ingredient(&pool, soup, garlic, Some(cloves), "3", 1).await;

        // Selection order wins over insertion order.
        let occurrences = source
            .occurrences_for_recipes(&[soup, pasta])
            .await
            .unwrap();
        assert_eq!(occurrences.len(), 3);
        assert_eq!(occurrences[0].recipe_name, "Soup");
        assert_eq!(occurrences[0].ingredient_name, "onion");
        assert_eq!(occurrences[1].ingredient_name, "garlic");
        assert_eq!(occurrences[1].quantity_text, "3");
        assert_eq!(occurrences[1].unit_text, "cloves");
        assert_eq!(occurrences[2].recipe_name, "Pasta");

        delete_recipe(&pool, pasta).await;
        delete_recipe(&pool, soup).await;
    }

    #[tokio::test]
    async fn test_missing_quantity_and_unit_become_empty_strings() {
        let pool = connect_test_pool().await;
        let source = PgIngredientSource::new(pool.clone());

        let salt = seed_ingredient(&pool, "salt").await;
        let recipe = seed_recipe(&pool, "Plain").await;
        add_recipe_ingredient(&pool, recipe, salt, None, "", 0).await;

        let occurrences = source.occurrences_for_recipes(&[recipe]).await.unwrap();
        assert_eq!(occurrences.len(), 1);
        assert_eq!(occurrences[0].quantity_text, "");
        assert_eq!(occurrences[0].unit_text, "");

        delete_recipe(&pool, recipe).await;
    }
}
