//! Shopping list item HTTP handlers.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ApiError, AppState};
use larder_core::ShoppingListRepository;

/// Checked-state payload, used in both directions.
#[derive(Debug, Serialize, Deserialize)]
pub struct CheckedState {
    pub checked: bool,
}

/// Flip an item's checked state.
pub async fn toggle_item(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CheckedState>, ApiError> {
    let checked = state.db.lists.toggle_item(id).await?;
    Ok(Json(CheckedState { checked }))
}

/// Set an item's checked state explicitly.
pub async fn set_item_checked(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CheckedState>,
) -> Result<Json<CheckedState>, ApiError> {
    state.db.lists.set_item_checked(id, request.checked).await?;
    Ok(Json(CheckedState {
        checked: request.checked,
    }))
}
