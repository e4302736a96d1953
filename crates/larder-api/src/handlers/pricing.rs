//! Price comparison HTTP handlers.

use std::collections::HashMap;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiError, AppState};
use larder_core::{ProductMatch, ShoppingListRepository};
use larder_pricing::{PriceComparison, PricingConfig, SessionOverlay};

/// The caller's session overlay for one comparison run.
///
/// Overlay state lives in the request/response cycle only; it is never
/// persisted and never shared across viewers of the same list.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct PriceComparisonRequest {
    /// Item ids excluded from the comparison.
    pub removed: Vec<Uuid>,
    /// Shopper-chosen products overriding the best match, per item.
    pub pinned: HashMap<Uuid, ProductMatch>,
}

/// Reconcile a list's items against the price source under the caller's
/// overlay and report per-item pricing plus the effective total.
pub async fn compute_prices(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<PriceComparisonRequest>,
) -> Result<Json<PriceComparison>, ApiError> {
    // 404 before pricing an empty item set for an unknown list.
    let list = state.db.lists.get(id).await?;
    let items = state.db.lists.items(list.id).await?;

    let mut overlay = SessionOverlay::new();
    for item_id in request.removed {
        overlay.remove_item(item_id);
    }
    for (item_id, product) in request.pinned {
        overlay.pin_product(item_id, product);
    }

    let comparison = PriceComparison::compute(
        &items,
        &mut overlay,
        state.price_source.as_ref(),
        &PricingConfig::default(),
    )
    .await;

    Ok(Json(comparison))
}
