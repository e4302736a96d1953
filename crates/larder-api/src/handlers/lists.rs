//! Shopping list HTTP handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{ApiError, AppState};
use larder_aggregate::Aggregator;
use larder_core::{
    AggregationMode, ListItemView, ListStatus, ListSummary, ListView, RecipeSelection,
    ShareLinkRepository, ShareLinkView, ShoppingList, ShoppingListRepository,
};

/// Request body for creating a list from a recipe selection.
#[derive(Debug, Deserialize)]
pub struct CreateListRequest {
    pub name: Option<String>,
    pub recipe_ids: Vec<Uuid>,
    /// Use the assisted quantity combiner where an ingredient has more
    /// than one source quantity.
    #[serde(default)]
    pub assisted: bool,
}

/// Request body for re-running aggregation over the linked recipes.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct RegenerateRequest {
    pub assisted: bool,
}

/// Request body for a status transition.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: ListStatus,
}

/// Assemble the exposed list representation: metadata, items in
/// category-walk order, and the active share link when one exists.
pub(crate) async fn build_list_view(
    state: &AppState,
    list: &ShoppingList,
) -> Result<ListView, ApiError> {
    let items = state.db.lists.items(list.id).await?;
    let share_link = state
        .db
        .share_links
        .active_link(list.id)
        .await?
        .map(|link| ShareLinkView {
            code: link.code,
            expires_at: link.expires_at,
        });

    Ok(ListView {
        list_id: list.id,
        name: list.name.clone(),
        status: list.status,
        items: items.into_iter().map(ListItemView::from).collect(),
        share_link,
    })
}

async fn aggregate_into(
    state: &AppState,
    list_id: Uuid,
    recipe_ids: &[Uuid],
    assisted: bool,
) -> Result<usize, ApiError> {
    let mut aggregator = Aggregator::new(state.db.ingredients.clone());
    if assisted {
        aggregator = aggregator.with_combiner(state.combiner.clone());
    }
    let mode = if assisted {
        AggregationMode::Assisted
    } else {
        AggregationMode::Default
    };

    let aggregated = aggregator.aggregate(recipe_ids, mode).await?;
    let count = state.db.lists.regenerate_items(list_id, &aggregated).await?;
    Ok(count)
}

/// Create a list from a confirmed recipe selection.
pub async fn create_list(
    State(state): State<AppState>,
    Json(request): Json<CreateListRequest>,
) -> Result<(StatusCode, Json<ListView>), ApiError> {
    // Duplicate selections of the same recipe collapse to one link.
    let mut recipe_ids: Vec<Uuid> = Vec::new();
    for id in request.recipe_ids {
        if !recipe_ids.contains(&id) {
            recipe_ids.push(id);
        }
    }
    if recipe_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "recipe_ids must not be empty".to_string(),
        ));
    }

    // List row and recipe links commit together; an unknown recipe id
    // rolls the whole creation back.
    let selections: Vec<RecipeSelection> = recipe_ids
        .iter()
        .map(|id| RecipeSelection::new(*id))
        .collect();
    let list = state
        .db
        .lists
        .create_with_recipes(request.name, &selections)
        .await?;

    let item_count = match aggregate_into(&state, list.id, &recipe_ids, request.assisted).await {
        Ok(count) => count,
        Err(err) => {
            // Creation is all-or-nothing from the caller's view; drop the
            // list rather than hand back a half-built one.
            if let Err(cleanup_err) = state.db.lists.delete(list.id).await {
                warn!(list_id = %list.id, error = %cleanup_err, "Failed to remove list after aggregation error");
            }
            return Err(err);
        }
    };
    info!(
        list_id = %list.id,
        recipe_count = recipe_ids.len(),
        item_count,
        "Shopping list created"
    );

    let view = build_list_view(&state, &list).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Summaries of all active lists, newest first.
pub async fn list_lists(
    State(state): State<AppState>,
) -> Result<Json<Vec<ListSummary>>, ApiError> {
    Ok(Json(state.db.lists.list_active().await?))
}

/// Full view of one list.
pub async fn get_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ListView>, ApiError> {
    let list = state.db.lists.get(id).await?;
    Ok(Json(build_list_view(&state, &list).await?))
}

/// Delete a list; items, recipe links, and share links cascade.
pub async fn delete_list(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.db.lists.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Transition a list's status.
///
/// `completed` and `archived` are terminal; moving back to `active` is a
/// deployment policy (`LARDER_ALLOW_REOPEN`), disabled by default.
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<ListView>, ApiError> {
    let list = state.db.lists.get(id).await?;

    if list.status.is_terminal() && request.status == ListStatus::Active && !state.allow_reopen {
        return Err(ApiError::BadRequest(format!(
            "cannot reopen a {} list",
            list.status
        )));
    }

    state.db.lists.update_status(id, request.status).await?;
    let updated = state.db.lists.get(id).await?;
    Ok(Json(build_list_view(&state, &updated).await?))
}

/// Re-run aggregation over the recipes currently linked to a list.
pub async fn regenerate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RegenerateRequest>,
) -> Result<Json<ListView>, ApiError> {
    let list = state.db.lists.get(id).await?;

    let recipe_ids = state.db.lists.linked_recipe_ids(id).await?;
    if recipe_ids.is_empty() {
        return Err(ApiError::BadRequest(
            "list has no linked recipes".to_string(),
        ));
    }

    let item_count = aggregate_into(&state, id, &recipe_ids, request.assisted).await?;
    info!(list_id = %id, item_count, "Shopping list regenerated");

    Ok(Json(build_list_view(&state, &list).await?))
}
