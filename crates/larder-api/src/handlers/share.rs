//! Share link HTTP handlers.
//!
//! The share code is a bearer credential: knowing it is sufficient to read
//! the list and check items off, with no further authentication.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::handlers::items::CheckedState;
use crate::handlers::lists::build_list_view;
use crate::{ApiError, AppState};
use larder_core::defaults::LINK_EXPIRY_DAYS;
use larder_core::{ListView, ShareLinkRepository, ShoppingListRepository};

/// Request body for issuing a share link.
///
/// An omitted `expires_days` gets the default window; an explicit `null`
/// issues a link that never expires.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct CreateShareRequest {
    #[serde(deserialize_with = "present_or_null")]
    pub expires_days: Option<Option<i64>>,
}

impl CreateShareRequest {
    /// Expiry to store: the supplied value, `None` for an explicit null,
    /// the default window when the field was omitted.
    fn effective_expiry(&self) -> Option<i64> {
        self.expires_days.unwrap_or(Some(LINK_EXPIRY_DAYS))
    }
}

// Distinguishes a missing field (outer None, via Default) from an
// explicit JSON null (Some(None)).
fn present_or_null<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<i64>::deserialize(deserializer).map(Some)
}

/// A freshly issued (or reused) share link.
#[derive(Debug, Serialize)]
pub struct ShareResponse {
    pub code: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
}

/// Issue a share link for a list, reusing the live one when present.
pub async fn create_share_link(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<CreateShareRequest>,
) -> Result<Json<ShareResponse>, ApiError> {
    let link = state
        .db
        .share_links
        .get_or_create(id, request.effective_expiry())
        .await?;

    let url = format!(
        "{}/shared/{}",
        state.app_base_url.trim_end_matches('/'),
        link.code
    );
    info!(list_id = %id, code = %link.code, "Share link issued");

    Ok(Json(ShareResponse {
        code: link.code,
        url,
        expires_at: link.expires_at,
    }))
}

/// Resolve a share code to the list view. Expired and unknown codes both
/// yield 404.
pub async fn get_shared_list(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ListView>, ApiError> {
    let list = state.db.share_links.resolve(&code).await?;
    Ok(Json(build_list_view(&state, &list).await?))
}

/// Check an item off through a share link.
pub async fn toggle_shared_item(
    State(state): State<AppState>,
    Path((code, item_id)): Path<(String, Uuid)>,
) -> Result<Json<CheckedState>, ApiError> {
    let list = state.db.share_links.resolve(&code).await?;

    // The code only grants access to its own list's items.
    let items = state.db.lists.items(list.id).await?;
    if !items.iter().any(|item| item.id == item_id) {
        return Err(ApiError::NotFound(format!("Item {item_id} not found")));
    }

    let checked = state.db.lists.toggle_item(item_id).await?;
    Ok(Json(CheckedState { checked }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_omitted_expiry_uses_default_window() {
        let request: CreateShareRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.effective_expiry(), Some(LINK_EXPIRY_DAYS));
    }

    #[test]
    fn test_null_expiry_means_never_expires() {
        let request: CreateShareRequest =
            serde_json::from_str(r#"{"expires_days": null}"#).unwrap();
        assert_eq!(request.effective_expiry(), None);
    }

    #[test]
    fn test_explicit_expiry_is_passed_through() {
        let request: CreateShareRequest =
            serde_json::from_str(r#"{"expires_days": 30}"#).unwrap();
        assert_eq!(request.effective_expiry(), Some(30));
    }
}
