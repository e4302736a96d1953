//! Shopping list repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use larder_core::{
    new_v7, AggregatedIngredient, Error, ListStatus, ListSummary, RecipeSelection, Result,
    ShoppingList, ShoppingListItem, ShoppingListRepository,
};

/// PostgreSQL implementation of [`ShoppingListRepository`].
#[derive(Clone)]
pub struct PgShoppingListRepository {
    pool: Pool<Postgres>,
}

impl PgShoppingListRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn parse_list_row(row: &sqlx::postgres::PgRow) -> Result<ShoppingList> {
        let status: String = row.get("status");
        Ok(ShoppingList {
            id: row.get("id"),
            name: row.get("name"),
            status: status.parse()?,
            created_at: row.get("created_at"),
        })
    }

    /// Append recipe links inside an open transaction, positions continuing
    /// from any recipes already linked to the list.
    async fn insert_recipe_links(
        tx: &mut sqlx::Transaction<'_, Postgres>,
        list_id: Uuid,
        recipes: &[RecipeSelection],
    ) -> Result<()> {
        let next_position: i32 = sqlx::query_scalar(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM shopping_list_recipe
             WHERE shopping_list_id = $1",
        )
        .bind(list_id)
        .fetch_one(&mut **tx)
        .await
        .map_err(Error::Database)?;

        for (offset, selection) in recipes.iter().enumerate() {
            sqlx::query(
                "INSERT INTO shopping_list_recipe
                     (id, shopping_list_id, recipe_id, position, servings, planned_date, meal_type)
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(new_v7())
            .bind(list_id)
            .bind(selection.recipe_id)
            .bind(next_position + offset as i32)
            .bind(selection.servings)
            .bind(selection.planned_date)
            .bind(&selection.meal_type)
            .execute(&mut **tx)
            .await
            .map_err(Error::Database)?;
        }
        Ok(())
    }

    fn parse_item_row(row: &sqlx::postgres::PgRow) -> ShoppingListItem {
        ShoppingListItem {
            id: row.get("id"),
            list_id: row.get("shopping_list_id"),
            ingredient_id: row.get("ingredient_id"),
            ingredient_name: row.get("ingredient_name"),
            aggregated_quantity: row.get("aggregated_quantity"),
            category: row.get("category"),
            checked: row.get("is_checked"),
            sort_order: row.get("sort_order"),
        }
    }
}

#[async_trait]
impl ShoppingListRepository for PgShoppingListRepository {
    async fn create(&self, name: Option<String>) -> Result<ShoppingList> {
        let id = new_v7();
        let row = sqlx::query(
            "INSERT INTO shopping_list (id, name, status)
             VALUES ($1, $2, 'active')
             RETURNING id, name, status, created_at",
        )
        .bind(id)
        .bind(&name)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        Self::parse_list_row(&row)
    }

    /// Create a list and its recipe links in one transaction.
    ///
    /// Any link failure (an unknown recipe id hits the foreign key) rolls
    /// the list row back with it, so the caller never observes a list that
    /// was created but only partially linked.
    #[instrument(skip(self, recipes), fields(subsystem = "db", component = "lists", op = "create_with_recipes", recipe_count = recipes.len()))]
    async fn create_with_recipes(
        &self,
        name: Option<String>,
        recipes: &[RecipeSelection],
    ) -> Result<ShoppingList> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query(
            "INSERT INTO shopping_list (id, name, status)
             VALUES ($1, $2, 'active')
             RETURNING id, name, status, created_at",
        )
        .bind(new_v7())
        .bind(&name)
        .fetch_one(&mut *tx)
        .await
        .map_err(Error::Database)?;
        let list = Self::parse_list_row(&row)?;

        Self::insert_recipe_links(&mut tx, list.id, recipes).await?;

        tx.commit().await.map_err(Error::Database)?;
        debug!(list_id = %list.id, "List created with recipe links");
        Ok(list)
    }

    async fn get(&self, list_id: Uuid) -> Result<ShoppingList> {
        let row = sqlx::query("SELECT id, name, status, created_at FROM shopping_list WHERE id = $1")
            .bind(list_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?
            .ok_or(Error::ListNotFound(list_id))?;

        Self::parse_list_row(&row)
    }

    async fn exists(&self, list_id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT 1 AS one FROM shopping_list WHERE id = $1")
            .bind(list_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(row.is_some())
    }

    async fn list_active(&self) -> Result<Vec<ListSummary>> {
        let rows = sqlx::query(
            "SELECT sl.id, sl.name, sl.status,
                    (SELECT COUNT(*) FROM shopping_list_item i
                      WHERE i.shopping_list_id = sl.id) AS item_count,
                    (SELECT COUNT(*) FROM shopping_list_item i
                      WHERE i.shopping_list_id = sl.id AND i.is_checked) AS checked_count,
                    (SELECT COUNT(*) FROM shopping_list_recipe slr
                      WHERE slr.shopping_list_id = sl.id) AS recipe_count
             FROM shopping_list sl
             WHERE sl.status = 'active'
             ORDER BY sl.created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        rows.iter()
            .map(|row| {
                let status: String = row.get("status");
                Ok(ListSummary {
                    id: row.get("id"),
                    name: row.get("name"),
                    item_count: row.get("item_count"),
                    checked_count: row.get("checked_count"),
                    recipe_count: row.get("recipe_count"),
                    status: status.parse()?,
                })
            })
            .collect()
    }

    async fn link_recipes(&self, list_id: Uuid, recipes: &[RecipeSelection]) -> Result<()> {
        if recipes.is_empty() {
            return Ok(());
        }
        if !self.exists(list_id).await? {
            return Err(Error::ListNotFound(list_id));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;
        Self::insert_recipe_links(&mut tx, list_id, recipes).await?;
        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn linked_recipe_ids(&self, list_id: Uuid) -> Result<Vec<Uuid>> {
        let rows = sqlx::query(
            "SELECT recipe_id FROM shopping_list_recipe
             WHERE shopping_list_id = $1
             ORDER BY position",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(|r| r.get("recipe_id")).collect())
    }

    /// Replace all items of a list as one atomic unit.
    ///
    /// The whole delete-then-insert runs inside a transaction holding a
    /// per-list advisory lock, so concurrent regenerations of the same list
    /// (e.g. a double submit) are serialized: the loser gets a retryable
    /// `Conflict`, never an interleaved item set. Different lists take
    /// different locks and proceed independently.
    #[instrument(skip(self, items), fields(subsystem = "db", component = "lists", op = "regenerate_items", list_id = %list_id, item_count = items.len()))]
    async fn regenerate_items(
        &self,
        list_id: Uuid,
        items: &[AggregatedIngredient],
    ) -> Result<usize> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let locked: bool =
            sqlx::query_scalar("SELECT pg_try_advisory_xact_lock(hashtextextended($1::text, 0))")
                .bind(list_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;
        if !locked {
            warn!("Concurrent regeneration detected, surfacing conflict");
            return Err(Error::Conflict("list is being updated".to_string()));
        }

        let exists = sqlx::query("SELECT 1 AS one FROM shopping_list WHERE id = $1")
            .bind(list_id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if exists.is_none() {
            return Err(Error::ListNotFound(list_id));
        }

        sqlx::query("DELETE FROM shopping_list_item WHERE shopping_list_id = $1")
            .bind(list_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        for item in items {
            sqlx::query(
                "INSERT INTO shopping_list_item
                     (id, shopping_list_id, ingredient_id, aggregated_quantity,
                      category, is_checked, sort_order)
                 VALUES ($1, $2, $3, $4, $5, false, $6)",
            )
            .bind(new_v7())
            .bind(list_id)
            .bind(item.ingredient_id)
            .bind(&item.aggregated_quantity)
            .bind(&item.category)
            .bind(item.sort_order)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        debug!(inserted = items.len(), "Items regenerated");
        Ok(items.len())
    }

    async fn toggle_item(&self, item_id: Uuid) -> Result<bool> {
        let row = sqlx::query(
            "UPDATE shopping_list_item
             SET is_checked = NOT is_checked
             WHERE id = $1
             RETURNING is_checked",
        )
        .bind(item_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or(Error::ItemNotFound(item_id))?;

        Ok(row.get("is_checked"))
    }

    async fn set_item_checked(&self, item_id: Uuid, checked: bool) -> Result<()> {
        let result = sqlx::query("UPDATE shopping_list_item SET is_checked = $1 WHERE id = $2")
            .bind(checked)
            .bind(item_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::ItemNotFound(item_id));
        }
        Ok(())
    }

    async fn items(&self, list_id: Uuid) -> Result<Vec<ShoppingListItem>> {
        // sort_order already encodes (category priority, first-seen index),
        // so a single ORDER BY yields the full shopping-route order.
        let rows = sqlx::query(
            "SELECT i.id, i.shopping_list_id, i.ingredient_id, ing.name AS ingredient_name,
                    i.aggregated_quantity, i.category, i.is_checked, i.sort_order
             FROM shopping_list_item i
             JOIN ingredient ing ON ing.id = i.ingredient_id
             WHERE i.shopping_list_id = $1
             ORDER BY i.sort_order",
        )
        .bind(list_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.iter().map(Self::parse_item_row).collect())
    }

    async fn items_by_category(
        &self,
        list_id: Uuid,
    ) -> Result<Vec<(String, Vec<ShoppingListItem>)>> {
        let items = self.items(list_id).await?;

        let mut grouped: Vec<(String, Vec<ShoppingListItem>)> = Vec::new();
        for item in items {
            match grouped.last_mut() {
                Some((category, bucket)) if *category == item.category => bucket.push(item),
                _ => grouped.push((item.category.clone(), vec![item])),
            }
        }
        Ok(grouped)
    }

    async fn update_status(&self, list_id: Uuid, status: ListStatus) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let result = sqlx::query("UPDATE shopping_list SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(list_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;
        if result.rows_affected() == 0 {
            return Err(Error::ListNotFound(list_id));
        }

        // Archiving invalidates any outstanding share links.
        if status == ListStatus::Archived {
            sqlx::query("DELETE FROM share_link WHERE shopping_list_id = $1")
                .bind(list_id)
                .execute(&mut *tx)
                .await
                .map_err(Error::Database)?;
        }

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn delete(&self, list_id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM shopping_list WHERE id = $1")
            .bind(list_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if result.rows_affected() == 0 {
            return Err(Error::ListNotFound(list_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingredients::PgIngredientSource;
    use crate::test_fixtures::{connect_test_pool, seed_ingredient, seed_recipe};

    async fn setup() -> (PgShoppingListRepository, PgIngredientSource) {
        let pool = connect_test_pool().await;
        (
            PgShoppingListRepository::new(pool.clone()),
            PgIngredientSource::new(pool),
        )
    }

    fn agg(ingredient_id: Uuid, name: &str, quantity: &str, sort_order: i32) -> AggregatedIngredient {
        AggregatedIngredient {
            ingredient_id,
            name: name.to_string(),
            source_quantities: vec![quantity.to_string()],
            aggregated_quantity: quantity.to_string(),
            category: larder_core::categorize(name).to_string(),
            sort_order,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_list() {
        let (repo, _) = setup().await;
        let list = repo.create(Some("Week 12".to_string())).await.unwrap();

        assert_eq!(list.status, ListStatus::Active);
        assert_eq!(list.name.as_deref(), Some("Week 12"));

        let fetched = repo.get(list.id).await.unwrap();
        assert_eq!(fetched.id, list.id);

        repo.delete(list.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_unknown_list_is_not_found() {
        let (repo, _) = setup().await;
        let err = repo.get(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::ListNotFound(_)));
    }

    #[tokio::test]
    async fn test_regenerate_replaces_items_atomically() {
        let (repo, source) = setup().await;
        let pool = source.pool().clone();
        let list = repo.create(None).await.unwrap();

        let garlic = seed_ingredient(&pool, "garlic").await;
        let flour = seed_ingredient(&pool, "flour").await;

        let first = vec![agg(garlic, "garlic", "2 cloves", 1000)];
        assert_eq!(repo.regenerate_items(list.id, &first).await.unwrap(), 1);

        // Regeneration fully replaces the previous set.
        let second = vec![
            agg(garlic, "garlic", "5 cloves", 1000),
            agg(flour, "flour", "1 cup", 9001),
        ];
        assert_eq!(repo.regenerate_items(list.id, &second).await.unwrap(), 2);

        let items = repo.items(list.id).await.unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].ingredient_name, "garlic");
        assert_eq!(items[0].aggregated_quantity, "5 cloves");
        assert!(!items[0].checked);
        assert_eq!(items[1].ingredient_name, "flour");

        repo.delete(list.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_regenerate_unknown_list_is_not_found() {
        let (repo, _) = setup().await;
        let err = repo.regenerate_items(Uuid::new_v4(), &[]).await.unwrap_err();
        assert!(matches!(err, Error::ListNotFound(_)));
    }

    #[tokio::test]
    async fn test_toggle_and_set_checked() {
        let (repo, source) = setup().await;
        let pool = source.pool().clone();
        let list = repo.create(None).await.unwrap();
        let garlic = seed_ingredient(&pool, "garlic").await;
        repo.regenerate_items(list.id, &[agg(garlic, "garlic", "2 cloves", 1000)])
            .await
            .unwrap();
        let item_id = repo.items(list.id).await.unwrap()[0].id;

        assert!(repo.toggle_item(item_id).await.unwrap());
        assert!(!repo.toggle_item(item_id).await.unwrap());

        repo.set_item_checked(item_id, true).await.unwrap();
        assert!(repo.items(list.id).await.unwrap()[0].checked);

        repo.delete(list.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_toggle_unknown_item_is_not_found() {
        let (repo, _) = setup().await;
        let err = repo.toggle_item(Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, Error::ItemNotFound(_)));
    }

    #[tokio::test]
    async fn test_items_by_category_groups_in_priority_order() {
        let (repo, source) = setup().await;
        let pool = source.pool().clone();
        let list = repo.create(None).await.unwrap();

        let onion = seed_ingredient(&pool, "onion").await;
        let garlic = seed_ingredient(&pool, "garlic").await;
        let flour = seed_ingredient(&pool, "flour").await;
        repo.regenerate_items(
            list.id,
            &[
                agg(onion, "onion", "1", 1000),
                agg(garlic, "garlic", "2 cloves", 1001),
                agg(flour, "flour", "1 cup", 9002),
            ],
        )
        .await
        .unwrap();

        let grouped = repo.items_by_category(list.id).await.unwrap();
        assert_eq!(grouped.len(), 2);
        assert_eq!(grouped[0].0, "Produce");
        assert_eq!(grouped[0].1.len(), 2);
        assert_eq!(grouped[0].1[0].ingredient_name, "onion");
        assert_eq!(grouped[1].0, "Pantry");

        repo.delete(list.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_link_recipes_and_linked_ids() {
        let (repo, source) = setup().await;
        let pool = source.pool().clone();
        let list = repo.create(None).await.unwrap();
        let r1 = seed_recipe(&pool, "Pasta Night").await;
        let r2 = seed_recipe(&pool, "Taco Tuesday").await;

        repo.link_recipes(
            list.id,
            &[RecipeSelection::new(r1), RecipeSelection::new(r2)],
        )
        .await
        .unwrap();

        assert_eq!(repo.linked_recipe_ids(list.id).await.unwrap(), vec![r1, r2]);

        repo.delete(list.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_linked_ids_follow_selection_order_not_id_order() {
        let (repo, source) = setup().await;
        let pool = source.pool().clone();
        let r1 = seed_recipe(&pool, "Monday Curry").await;
        let r2 = seed_recipe(&pool, "Tuesday Soup").await;
        let r3 = seed_recipe(&pool, "Wednesday Stir-fry").await;

        // Selection order deliberately disagrees with creation order.
        let list = repo
            .create_with_recipes(
                None,
                &[
                    RecipeSelection::new(r3),
                    RecipeSelection::new(r1),
                ],
            )
            .await
            .unwrap();
        assert_eq!(repo.linked_recipe_ids(list.id).await.unwrap(), vec![r3, r1]);

        // A later link appends after the existing selection.
        repo.link_recipes(list.id, &[RecipeSelection::new(r2)])
            .await
            .unwrap();
        assert_eq!(
            repo.linked_recipe_ids(list.id).await.unwrap(),
            vec![r3, r1, r2]
        );

        repo.delete(list.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_with_unknown_recipe_leaves_no_list_behind() {
        let (repo, source) = setup().await;
        let pool = source.pool().clone();
        let known = seed_recipe(&pool, "Pasta Night").await;
        let name = format!("rollback-{}", Uuid::new_v4());

        let err = repo
            .create_with_recipes(
                Some(name.clone()),
                &[RecipeSelection::new(known), RecipeSelection::new(Uuid::new_v4())],
            )
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Database(_)));

        // The list row rolled back with the failed link.
        let active = repo.list_active().await.unwrap();
        assert!(active.iter().all(|l| l.name.as_deref() != Some(name.as_str())));
    }

    #[tokio::test]
    async fn test_delete_cascades_to_items_and_links() {
        let (repo, source) = setup().await;
        let pool = source.pool().clone();
        let list = repo.create(None).await.unwrap();
        let garlic = seed_ingredient(&pool, "garlic").await;
        repo.regenerate_items(list.id, &[agg(garlic, "garlic", "2 cloves", 1000)])
            .await
            .unwrap();
        let item_id = repo.items(list.id).await.unwrap()[0].id;

        repo.delete(list.id).await.unwrap();

        assert!(matches!(
            repo.get(list.id).await.unwrap_err(),
            Error::ListNotFound(_)
        ));
        assert!(matches!(
            repo.toggle_item(item_id).await.unwrap_err(),
            Error::ItemNotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_update_status_transitions() {
        let (repo, _) = setup().await;
        let list = repo.create(None).await.unwrap();

        repo.update_status(list.id, ListStatus::Completed)
            .await
            .unwrap();
        assert_eq!(
            repo.get(list.id).await.unwrap().status,
            ListStatus::Completed
        );

        repo.delete(list.id).await.unwrap();
    }
}
