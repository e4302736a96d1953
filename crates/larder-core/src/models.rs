//! Core data models for larder.
//!
//! These types are shared across all larder crates and represent the core
//! domain entities: shopping lists, their items, recipe links, share links,
//! and the transient aggregation/pricing values that never hit the database.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// SHOPPING LIST
// =============================================================================

/// Lifecycle status of a shopping list.
///
/// `Completed` and `Archived` are terminal for shopping purposes but remain
/// readable until deleted. Whether a terminal list may reopen to `Active`
/// is a deployment policy, not a property of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStatus {
    Active,
    Completed,
    Archived,
}

impl ListStatus {
    /// Database text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Completed => "completed",
            Self::Archived => "archived",
        }
    }

    /// Whether the list is still being shopped.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }
}

impl std::str::FromStr for ListStatus {
    type Err = crate::error::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            "archived" => Ok(Self::Archived),
            other => Err(crate::error::Error::InvalidInput(format!(
                "unknown list status: {}",
                other
            ))),
        }
    }
}

impl std::fmt::Display for ListStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A shopping list. Owns its items, recipe links, and share links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingList {
    pub id: Uuid,
    pub name: Option<String>,
    pub status: ListStatus,
    pub created_at: DateTime<Utc>,
}

/// Association between a shopping list and a recipe that fed it.
///
/// Servings, planned date, and meal type are carried through from meal
/// planning when present; they do not affect aggregation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeLink {
    pub id: Uuid,
    pub list_id: Uuid,
    pub recipe_id: Uuid,
    pub servings: Option<i32>,
    pub planned_date: Option<NaiveDate>,
    pub meal_type: Option<String>,
}

/// One deduplicated row on a shopping list.
///
/// Invariant: at most one item per `(list_id, ingredient_id)` pair, enforced
/// by a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShoppingListItem {
    pub id: Uuid,
    pub list_id: Uuid,
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    /// Combined quantity, free text (e.g. `"2 cloves + 3 cloves"`). Never
    /// interpreted numerically.
    pub aggregated_quantity: String,
    pub category: String,
    pub checked: bool,
    pub sort_order: i32,
}

/// A shareable link granting read/check-off access to a list.
///
/// The code is a bearer credential: whoever holds it can open the list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLink {
    pub id: Uuid,
    pub list_id: Uuid,
    pub code: String,
    pub created_at: DateTime<Utc>,
    /// `None` means the link never expires.
    pub expires_at: Option<DateTime<Utc>>,
}

// =============================================================================
// AGGREGATION TYPES (transient)
// =============================================================================

/// How quantities are combined during aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// Join quantities verbatim with a fixed separator. This is the
    /// documented behavior, not a placeholder: no numeric or unit-aware
    /// summation is attempted anywhere in the system.
    #[default]
    Default,
    /// Delegate multi-quantity groups to the quantity-combination
    /// collaborator, falling back to default mode per ingredient on any
    /// failure.
    Assisted,
}

/// A raw ingredient occurrence as reported by the Ingredient Source.
///
/// `quantity_text` is opaque free text; larder never assumes it is numeric
/// or unit-normalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngredientOccurrence {
    pub recipe_id: Uuid,
    pub recipe_name: String,
    pub ingredient_id: Uuid,
    pub ingredient_name: String,
    pub quantity_text: String,
    pub unit_text: String,
    pub order_index: i32,
}

/// A deduplicated ingredient produced by aggregation.
///
/// Generation-time only: consumed by `regenerate_items` to produce
/// [`ShoppingListItem`] rows, never persisted directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedIngredient {
    pub ingredient_id: Uuid,
    pub name: String,
    /// Original quantity strings in source order.
    pub source_quantities: Vec<String>,
    pub aggregated_quantity: String,
    pub category: String,
    pub sort_order: i32,
}

// =============================================================================
// PRICING TYPES
// =============================================================================

/// A product matched from a grocery store search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductMatch {
    pub store_name: String,
    pub product_id: String,
    pub product_name: String,
    pub price: f64,
    /// "each", "per lb", "per oz", …
    pub unit: String,
    /// "16 oz", "1 lb", …
    pub size: Option<String>,
    pub image_url: Option<String>,
    pub product_url: Option<String>,
}

/// Result of a price lookup for one ingredient.
///
/// "No match" and "error" both count as unpriced for totals, but carry a
/// distinguishing reason for the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceResult {
    pub success: bool,
    pub ingredient_name: String,
    /// Ranked matches, best first.
    pub products: Vec<ProductMatch>,
    pub error: Option<String>,
}

impl PriceResult {
    /// Successful lookup (possibly with zero matches).
    pub fn ok(ingredient_name: impl Into<String>, products: Vec<ProductMatch>) -> Self {
        Self {
            success: true,
            ingredient_name: ingredient_name.into(),
            products,
            error: None,
        }
    }

    /// Failed lookup with a reason.
    pub fn failed(ingredient_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            success: false,
            ingredient_name: ingredient_name.into(),
            products: Vec::new(),
            error: Some(error.into()),
        }
    }

    /// The top-ranked match, if any.
    pub fn best_match(&self) -> Option<&ProductMatch> {
        self.products.first()
    }
}

// =============================================================================
// EXPOSED REPRESENTATIONS
// =============================================================================

/// One item row in the exposed list representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListItemView {
    pub item_id: Uuid,
    pub ingredient_name: String,
    pub aggregated_quantity: String,
    pub category: String,
    pub checked: bool,
    pub sort_order: i32,
}

impl From<ShoppingListItem> for ListItemView {
    fn from(item: ShoppingListItem) -> Self {
        Self {
            item_id: item.id,
            ingredient_name: item.ingredient_name,
            aggregated_quantity: item.aggregated_quantity,
            category: item.category,
            checked: item.checked,
            sort_order: item.sort_order,
        }
    }
}

/// Share-link details in the exposed list representation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLinkView {
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// The full exposed list representation: list metadata plus items in
/// category-walk order and the active share link, when one exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListView {
    pub list_id: Uuid,
    pub name: Option<String>,
    pub status: ListStatus,
    pub items: Vec<ListItemView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub share_link: Option<ShareLinkView>,
}

/// Summary of a shopping list for index views.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub item_count: i64,
    pub checked_count: i64,
    pub recipe_count: i64,
    pub status: ListStatus,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_list_status_round_trip() {
        for status in [
            ListStatus::Active,
            ListStatus::Completed,
            ListStatus::Archived,
        ] {
            assert_eq!(ListStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_list_status_unknown_is_invalid_input() {
        assert!(ListStatus::from_str("paused").is_err());
    }

    #[test]
    fn test_list_status_terminal() {
        assert!(!ListStatus::Active.is_terminal());
        assert!(ListStatus::Completed.is_terminal());
        assert!(ListStatus::Archived.is_terminal());
    }

    #[test]
    fn test_price_result_best_match_order() {
        let result = PriceResult::ok(
            "garlic",
            vec![
                ProductMatch {
                    store_name: "Kroger".into(),
                    product_id: "1".into(),
                    product_name: "Garlic Bulb".into(),
                    price: 0.79,
                    unit: "each".into(),
                    size: None,
                    image_url: None,
                    product_url: None,
                },
                ProductMatch {
                    store_name: "Kroger".into(),
                    product_id: "2".into(),
                    product_name: "Minced Garlic Jar".into(),
                    price: 3.49,
                    unit: "each".into(),
                    size: Some("8 oz".into()),
                    image_url: None,
                    product_url: None,
                },
            ],
        );
        assert_eq!(result.best_match().unwrap().product_id, "1");
    }

    #[test]
    fn test_price_result_failed_has_reason() {
        let result = PriceResult::failed("saffron", "timeout");
        assert!(!result.success);
        assert!(result.best_match().is_none());
        assert_eq!(result.error.as_deref(), Some("timeout"));
    }
}
