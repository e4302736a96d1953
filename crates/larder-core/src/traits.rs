//! Core traits for larder abstractions.
//!
//! These traits define the exact capability surfaces of the storage layer
//! and the external collaborators (ingredient source, quantity combiner,
//! price source), enabling pluggable backends and offline testability.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// SHOPPING LIST REPOSITORY
// =============================================================================

/// One recipe in a confirmed selection, with optional meal-plan context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeSelection {
    pub recipe_id: Uuid,
    #[serde(default)]
    pub servings: Option<i32>,
    #[serde(default)]
    pub planned_date: Option<chrono::NaiveDate>,
    #[serde(default)]
    pub meal_type: Option<String>,
}

impl RecipeSelection {
    pub fn new(recipe_id: Uuid) -> Self {
        Self {
            recipe_id,
            servings: None,
            planned_date: None,
            meal_type: None,
        }
    }
}

/// Repository for shopping list persistence.
///
/// Implementable against any storage engine; the PostgreSQL implementation
/// lives in `larder-db`.
#[async_trait]
pub trait ShoppingListRepository: Send + Sync {
    /// Create a new list with status `active`.
    async fn create(&self, name: Option<String>) -> Result<ShoppingList>;

    /// Create a list and link its recipes as one atomic operation.
    ///
    /// A failure on any link (e.g. an unknown recipe id) rolls the whole
    /// creation back; no empty list row is left behind.
    async fn create_with_recipes(
        &self,
        name: Option<String>,
        recipes: &[RecipeSelection],
    ) -> Result<ShoppingList>;

    /// Fetch a list by id.
    async fn get(&self, list_id: Uuid) -> Result<ShoppingList>;

    /// Check whether a list exists.
    async fn exists(&self, list_id: Uuid) -> Result<bool>;

    /// Summaries of all active lists, newest first.
    async fn list_active(&self) -> Result<Vec<ListSummary>>;

    /// Associate recipes with a list. The store does not dedup
    /// `recipes`; callers must pass a deduplicated selection.
    async fn link_recipes(&self, list_id: Uuid, recipes: &[RecipeSelection]) -> Result<()>;

    /// Recipe ids currently linked to a list, ordered by link position.
    async fn linked_recipe_ids(&self, list_id: Uuid) -> Result<Vec<Uuid>>;

    /// Atomically replace all items of a list with the given aggregated set.
    ///
    /// No caller may observe a mix of old and new items. A concurrent
    /// regeneration of the same list fails with [`crate::Error::Conflict`];
    /// regenerations of different lists are independent. Returns the number
    /// of items inserted.
    async fn regenerate_items(&self, list_id: Uuid, items: &[AggregatedIngredient])
        -> Result<usize>;

    /// Flip an item's checked state; returns the new value.
    async fn toggle_item(&self, item_id: Uuid) -> Result<bool>;

    /// Set an item's checked state explicitly.
    async fn set_item_checked(&self, item_id: Uuid, checked: bool) -> Result<()>;

    /// All items of a list in shopping-route order
    /// (category priority, then stored sort order).
    async fn items(&self, list_id: Uuid) -> Result<Vec<ShoppingListItem>>;

    /// Items grouped by category, categories in priority order, items in
    /// stored sort order within each category.
    async fn items_by_category(&self, list_id: Uuid)
        -> Result<Vec<(String, Vec<ShoppingListItem>)>>;

    /// Update list status.
    async fn update_status(&self, list_id: Uuid, status: ListStatus) -> Result<()>;

    /// Delete a list; cascades to items, recipe links, and share links.
    async fn delete(&self, list_id: Uuid) -> Result<()>;
}

// =============================================================================
// SHARE LINK REPOSITORY
// =============================================================================

/// Repository for shareable list links.
#[async_trait]
pub trait ShareLinkRepository: Send + Sync {
    /// Return the list's existing unexpired link, or issue a new one.
    ///
    /// `expires_days = None` issues a link that never expires.
    async fn get_or_create(&self, list_id: Uuid, expires_days: Option<i64>) -> Result<ShareLink>;

    /// The list's current unexpired link, if any.
    async fn active_link(&self, list_id: Uuid) -> Result<Option<ShareLink>>;

    /// Resolve a code to its shopping list.
    ///
    /// Succeeds only while the link is unexpired; expired and nonexistent
    /// codes both fail with the same `NotFound` error, leaking nothing.
    async fn resolve(&self, code: &str) -> Result<ShoppingList>;

    /// Invalidate (delete) all links for a list.
    async fn delete_for_list(&self, list_id: Uuid) -> Result<()>;
}

// =============================================================================
// EXTERNAL COLLABORATORS
// =============================================================================

/// Source of raw ingredient occurrences for a set of recipes.
#[async_trait]
pub trait IngredientSource: Send + Sync {
    /// Per-recipe ordered occurrences for the given recipes. Quantity text
    /// is opaque free text.
    async fn occurrences_for_recipes(
        &self,
        recipe_ids: &[Uuid],
    ) -> Result<Vec<IngredientOccurrence>>;
}

/// Best-effort text collaborator that merges a group of quantity strings
/// into one shopping quantity.
///
/// Treated as untrusted: callers wrap every invocation with a fallback and
/// never let an error abort the surrounding aggregation.
#[async_trait]
pub trait QuantityCombiner: Send + Sync {
    /// Combine `quantities` for `ingredient_name` into a single quantity
    /// string (e.g. `["1 cup", "2 cups"]` → `"3 cups"`).
    async fn combine(&self, ingredient_name: &str, quantities: &[String]) -> Result<String>;
}

/// External grocery price source.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Store name, e.g. "Kroger".
    fn store_name(&self) -> &str;

    /// Whether credentials are configured.
    fn is_configured(&self) -> bool;

    /// Search for products matching an ingredient, best match first.
    ///
    /// Infallible by contract: every failure class is reported as an
    /// unsuccessful [`PriceResult`] so one bad lookup can never abort a
    /// whole price comparison.
    async fn search_products(&self, ingredient: &str, limit: usize) -> PriceResult;
}
