//! Share link repository implementation.

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use chrono::{Duration, Utc};
use rand::RngCore;
use sqlx::{Pool, Postgres, Row};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use larder_core::defaults::{LINK_CODE_BYTES, LINK_CODE_MAX_RETRIES};
use larder_core::{new_v7, Error, Result, ShareLink, ShareLinkRepository, ShoppingList};

/// PostgreSQL implementation of [`ShareLinkRepository`].
///
/// Codes are short URL-safe random strings. Uniqueness is enforced by the
/// database, not by the generator: inserts that collide retry with a fresh
/// code rather than pre-checking.
#[derive(Clone)]
pub struct PgShareLinkRepository {
    pool: Pool<Postgres>,
}

impl PgShareLinkRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    fn generate_code() -> String {
        let mut bytes = [0u8; LINK_CODE_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }

    fn parse_link_row(row: &sqlx::postgres::PgRow) -> ShareLink {
        ShareLink {
            id: row.get("id"),
            list_id: row.get("shopping_list_id"),
            code: row.get("code"),
            created_at: row.get("created_at"),
            expires_at: row.get("expires_at"),
        }
    }

    fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
    }
}

#[async_trait]
impl ShareLinkRepository for PgShareLinkRepository {
    /// Return the list's live link, creating one if none exists.
    ///
    /// Repeated calls for the same list hand out the same code until it
    /// expires, so resharing never invalidates a previously sent URL.
    #[instrument(skip(self), fields(subsystem = "db", component = "share_links", op = "get_or_create", list_id = %list_id))]
    async fn get_or_create(&self, list_id: Uuid, expires_days: Option<i64>) -> Result<ShareLink> {
        if let Some(existing) = self.active_link(list_id).await? {
            debug!(code = %existing.code, "Reusing existing share link");
            return Ok(existing);
        }

        let list_exists = sqlx::query("SELECT 1 AS one FROM shopping_list WHERE id = $1")
            .bind(list_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;
        if list_exists.is_none() {
            return Err(Error::ListNotFound(list_id));
        }

        // NULL expiry means the link never expires.
        let expires_at = expires_days.map(|days| Utc::now() + Duration::days(days));

        for attempt in 1..=LINK_CODE_MAX_RETRIES {
            let code = Self::generate_code();
            let result = sqlx::query(
                "INSERT INTO share_link (id, shopping_list_id, code, expires_at)
                 VALUES ($1, $2, $3, $4)
                 RETURNING id, shopping_list_id, code, created_at, expires_at",
            )
            .bind(new_v7())
            .bind(list_id)
            .bind(&code)
            .bind(expires_at)
            .fetch_one(&self.pool)
            .await;

            match result {
                Ok(row) => {
                    debug!(code = %code, attempt, "Share link created");
                    return Ok(Self::parse_link_row(&row));
                }
                Err(err) if Self::is_unique_violation(&err) => {
                    warn!(attempt, "Share code collision, regenerating");
                }
                Err(err) => return Err(Error::Database(err)),
            }
        }

        Err(Error::Internal(format!(
            "failed to generate a unique share code after {LINK_CODE_MAX_RETRIES} attempts"
        )))
    }

    async fn active_link(&self, list_id: Uuid) -> Result<Option<ShareLink>> {
        let row = sqlx::query(
            "SELECT id, shopping_list_id, code, created_at, expires_at
             FROM share_link
             WHERE shopping_list_id = $1
               AND (expires_at IS NULL OR expires_at > now())
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(list_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.as_ref().map(Self::parse_link_row))
    }

    /// Resolve a share code to its list. Expired and unknown codes are
    /// indistinguishable to the caller.
    async fn resolve(&self, code: &str) -> Result<ShoppingList> {
        let row = sqlx::query(
            "SELECT sl.id, sl.name, sl.status, sl.created_at
             FROM share_link l
             JOIN shopping_list sl ON sl.id = l.shopping_list_id
             WHERE l.code = $1
               AND (l.expires_at IS NULL OR l.expires_at > now())",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| Error::NotFound("share link".to_string()))?;

        let status: String = row.get("status");
        Ok(ShoppingList {
            id: row.get("id"),
            name: row.get("name"),
            status: status.parse()?,
            created_at: row.get("created_at"),
        })
    }

    async fn delete_for_list(&self, list_id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM share_link WHERE shopping_list_id = $1")
            .bind(list_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lists::PgShoppingListRepository;
    use crate::test_fixtures::connect_test_pool;
    use larder_core::ShoppingListRepository;

    async fn setup() -> (PgShareLinkRepository, PgShoppingListRepository) {
        let pool = connect_test_pool().await;
        (
            PgShareLinkRepository::new(pool.clone()),
            PgShoppingListRepository::new(pool),
        )
    }

    #[test]
    fn test_generated_codes_are_url_safe() {
        for _ in 0..32 {
            let code = PgShareLinkRepository::generate_code();
            assert_eq!(code.len(), 8);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        }
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (links, lists) = setup().await;
        let list = lists.create(None).await.unwrap();

        let first = links.get_or_create(list.id, Some(7)).await.unwrap();
        let second = links.get_or_create(list.id, Some(7)).await.unwrap();
        assert_eq!(first.code, second.code);
        assert!(first.expires_at.is_some());

        lists.delete(list.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_link_without_expiry_never_expires() {
        let (links, lists) = setup().await;
        let list = lists.create(None).await.unwrap();

        let link = links.get_or_create(list.id, None).await.unwrap();
        assert!(link.expires_at.is_none());
        assert!(links.active_link(list.id).await.unwrap().is_some());
        assert_eq!(links.resolve(&link.code).await.unwrap().id, list.id);

        lists.delete(list.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_round_trip() {
        let (links, lists) = setup().await;
        let list = lists.create(Some("Shared".to_string())).await.unwrap();

        let link = links.get_or_create(list.id, None).await.unwrap();
        let resolved = links.resolve(&link.code).await.unwrap();
        assert_eq!(resolved.id, list.id);
        assert_eq!(resolved.name.as_deref(), Some("Shared"));

        lists.delete(list.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_resolve_unknown_code_is_not_found() {
        let (links, _) = setup().await;
        let err = links.resolve("nope-nope").await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn test_expired_link_is_invisible() {
        let (links, lists) = setup().await;
        let list = lists.create(None).await.unwrap();

        // Zero-day expiry lands in the past immediately.
        let link = links.get_or_create(list.id, Some(0)).await.unwrap();
        assert!(links.active_link(list.id).await.unwrap().is_none());
        assert!(matches!(
            links.resolve(&link.code).await.unwrap_err(),
            Error::NotFound(_)
        ));

        lists.delete(list.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_or_create_unknown_list_is_not_found() {
        let (links, _) = setup().await;
        let err = links.get_or_create(Uuid::new_v4(), None).await.unwrap_err();
        assert!(matches!(err, Error::ListNotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_for_list_removes_links() {
        let (links, lists) = setup().await;
        let list = lists.create(None).await.unwrap();

        links.get_or_create(list.id, None).await.unwrap();
        links.delete_for_list(list.id).await.unwrap();
        assert!(links.active_link(list.id).await.unwrap().is_none());

        lists.delete(list.id).await.unwrap();
    }
}
