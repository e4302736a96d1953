//! Kroger product search client.
//!
//! Authentication uses the OAuth2 client-credentials flow. Tokens are
//! valid for 30 minutes; the client caches the token in memory and
//! refreshes it slightly early so an in-flight request never carries an
//! expired token.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, instrument, warn};

use larder_core::defaults::{PRICE_TIMEOUT_SECS, TOKEN_EXPIRY_BUFFER_SECS};
use larder_core::{PriceResult, PriceSource, ProductMatch};

/// Default Kroger API base URL.
pub const DEFAULT_KROGER_URL: &str = "https://api.kroger.com/v1";

/// Maximum results per product search accepted by the API.
const SEARCH_LIMIT_CAP: usize = 50;

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Kroger implementation of [`PriceSource`].
///
/// Every failure class (missing credentials, auth, connect, timeout,
/// decode) is reported as an unsuccessful [`PriceResult`] carrying the
/// reason, so one bad lookup never aborts a whole price comparison.
pub struct KrogerClient {
    client: Client,
    base_url: String,
    client_id: Option<String>,
    client_secret: Option<String>,
    location_id: Option<String>,
    token: Mutex<Option<CachedToken>>,
}

impl KrogerClient {
    /// Create a client with explicit credentials.
    pub fn with_config(
        base_url: String,
        client_id: Option<String>,
        client_secret: Option<String>,
        location_id: Option<String>,
    ) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(PRICE_TIMEOUT_SECS))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            base_url,
            // Whitespace in pasted credentials is a recurring support issue.
            client_id: client_id.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
            client_secret: client_secret
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            location_id: location_id.filter(|v| !v.is_empty()),
            token: Mutex::new(None),
        }
    }

    /// Create from environment variables.
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("KROGER_BASE_URL").unwrap_or_else(|_| DEFAULT_KROGER_URL.to_string());
        Self::with_config(
            base_url,
            std::env::var("KROGER_CLIENT_ID").ok(),
            std::env::var("KROGER_CLIENT_SECRET").ok(),
            std::env::var("KROGER_LOCATION_ID").ok(),
        )
    }

    /// Get a valid access token, refreshing when within the expiry buffer.
    async fn access_token(&self) -> std::result::Result<String, String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if token.expires_at > Instant::now() + Duration::from_secs(TOKEN_EXPIRY_BUFFER_SECS) {
                return Ok(token.access_token.clone());
            }
        }

        let (Some(client_id), Some(client_secret)) = (&self.client_id, &self.client_secret) else {
            return Err("Kroger API credentials not configured".to_string());
        };

        let credentials = STANDARD.encode(format!("{client_id}:{client_secret}"));
        let response = self
            .client
            .post(format!("{}/connect/oauth2/token", self.base_url))
            .header("Authorization", format!("Basic {credentials}"))
            .form(&[("grant_type", "client_credentials"), ("scope", "product.compact")])
            .send()
            .await
            .map_err(|e| {
                error!("Kroger auth request failed: {}", e);
                if e.is_timeout() {
                    "Kroger API request timed out".to_string()
                } else if e.is_connect() {
                    "Could not connect to Kroger API".to_string()
                } else {
                    format!("Kroger authentication error: {e}")
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!("Kroger auth failed: {} - {}", status, body);
            let reason = match status.as_u16() {
                401 => "Invalid Kroger API credentials".to_string(),
                400 => "Bad request to Kroger API; credentials may be malformed".to_string(),
                code => format!("Kroger API error (HTTP {code})"),
            };
            return Err(reason);
        }

        let token_data: TokenResponse = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse Kroger token response: {e}"))?;

        // expires_in is seconds, typically 1800.
        let expires_at = Instant::now() + Duration::from_secs(token_data.expires_in.unwrap_or(1800));
        let access_token = token_data.access_token;
        *cached = Some(CachedToken {
            access_token: access_token.clone(),
            expires_at,
        });
        info!("Kroger access token obtained");
        Ok(access_token)
    }

    fn parse_product(&self, item: &KrogerProduct) -> Option<ProductMatch> {
        // The items array holds one entry per package size; the first is
        // the primary size.
        let first = item.items.first()?;
        let price = first
            .price
            .as_ref()
            .and_then(|p| p.regular.or(p.promo))?;

        let unit = match first.sold_by.as_deref() {
            Some("WEIGHT") => "per lb",
            _ => "each",
        };

        let image_url = item
            .images
            .iter()
            .find(|img| img.perspective.as_deref() == Some("front"))
            .and_then(|img| {
                img.sizes
                    .iter()
                    .find(|s| s.size.as_deref() == Some("thumbnail"))
                    .and_then(|s| s.url.clone())
            });

        Some(ProductMatch {
            store_name: self.store_name().to_string(),
            product_id: item.product_id.clone(),
            product_name: item.description.clone().unwrap_or_default(),
            price,
            unit: unit.to_string(),
            size: first.size.clone(),
            image_url,
            product_url: Some(format!("https://www.kroger.com/p/{}", item.product_id)),
        })
    }
}

#[async_trait]
impl PriceSource for KrogerClient {
    fn store_name(&self) -> &str {
        "Kroger"
    }

    fn is_configured(&self) -> bool {
        self.client_id.is_some() && self.client_secret.is_some()
    }

    #[instrument(skip(self), fields(subsystem = "pricing", component = "kroger", ingredient = %ingredient))]
    async fn search_products(&self, ingredient: &str, limit: usize) -> PriceResult {
        if !self.is_configured() {
            return PriceResult::failed(ingredient, "Kroger API credentials not configured");
        }

        let token = match self.access_token().await {
            Ok(token) => token,
            Err(reason) => return PriceResult::failed(ingredient, reason),
        };

        let limit = limit.min(SEARCH_LIMIT_CAP);
        let mut request = self
            .client
            .get(format!("{}/products", self.base_url))
            .header("Accept", "application/json")
            .bearer_auth(token)
            .query(&[
                ("filter.term", ingredient),
                ("filter.limit", &limit.to_string()),
            ]);
        // Location filter yields store-local prices.
        if let Some(location_id) = &self.location_id {
            request = request.query(&[("filter.locationId", location_id)]);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!("Kroger search request failed: {}", e);
                return PriceResult::failed(ingredient, format!("Kroger search failed: {e}"));
            }
        };

        if !response.status().is_success() {
            let status = response.status();
            warn!("Kroger search returned {}", status);
            return PriceResult::failed(ingredient, format!("Kroger API error: {status}"));
        }

        let data: SearchResponse = match response.json().await {
            Ok(data) => data,
            Err(e) => {
                return PriceResult::failed(
                    ingredient,
                    format!("Failed to parse Kroger response: {e}"),
                )
            }
        };

        let products: Vec<ProductMatch> = data
            .data
            .iter()
            .filter_map(|item| self.parse_product(item))
            .collect();

        debug!(result_count = products.len(), "Kroger search complete");
        PriceResult::ok(ingredient, products)
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<u64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct SearchResponse {
    data: Vec<KrogerProduct>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct KrogerProduct {
    #[serde(rename = "productId")]
    product_id: String,
    description: Option<String>,
    items: Vec<KrogerItem>,
    images: Vec<KrogerImage>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct KrogerItem {
    price: Option<KrogerPrice>,
    size: Option<String>,
    #[serde(rename = "soldBy")]
    sold_by: Option<String>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct KrogerPrice {
    regular: Option<f64>,
    promo: Option<f64>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct KrogerImage {
    perspective: Option<String>,
    sizes: Vec<KrogerImageSize>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct KrogerImageSize {
    size: Option<String>,
    url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: String) -> KrogerClient {
        KrogerClient::with_config(
            base_url,
            Some("client".to_string()),
            Some("secret".to_string()),
            None,
        )
    }

    fn token_body() -> serde_json::Value {
        serde_json::json!({"access_token": "tok-123", "expires_in": 1800, "token_type": "bearer"})
    }

    fn product_body() -> serde_json::Value {
        serde_json::json!({
            "data": [
                {
                    "productId": "0001111041700",
                    "description": "Kroger Garlic Bulb",
                    "items": [
                        {
                            "price": {"regular": 0.79, "promo": 0.59},
                            "size": "1 ct",
                            "soldBy": "UNIT"
                        }
                    ],
                    "images": [
                        {
                            "perspective": "front",
                            "sizes": [
                                {"size": "thumbnail", "url": "https://img.kroger.com/garlic.jpg"}
                            ]
                        }
                    ]
                },
                {
                    "productId": "0001111091188",
                    "description": "Ground Beef",
                    "items": [
                        {"price": {"promo": 4.99}, "size": "1 lb", "soldBy": "WEIGHT"}
                    ],
                    "images": []
                },
                {
                    "productId": "0001111099999",
                    "description": "No price entry",
                    "items": [{"size": "1 ct"}],
                    "images": []
                }
            ]
        })
    }

    #[tokio::test]
    async fn test_unconfigured_client_reports_failure_without_io() {
        let client = KrogerClient::with_config(
            "http://127.0.0.1:9".to_string(),
            None,
            None,
            None,
        );
        assert!(!client.is_configured());

        let result = client.search_products("garlic", 5).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn test_search_maps_products() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .and(query_param("filter.term", "garlic"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_body()))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let result = client.search_products("garlic", 5).await;
        assert!(result.success);
        // The priceless third entry is dropped.
        assert_eq!(result.products.len(), 2);

        let best = result.best_match().unwrap();
        assert_eq!(best.product_name, "Kroger Garlic Bulb");
        assert_eq!(best.price, 0.79);
        assert_eq!(best.unit, "each");
        assert_eq!(best.size.as_deref(), Some("1 ct"));
        assert_eq!(
            best.image_url.as_deref(),
            Some("https://img.kroger.com/garlic.jpg")
        );
        assert_eq!(
            best.product_url.as_deref(),
            Some("https://www.kroger.com/p/0001111041700")
        );

        let beef = &result.products[1];
        assert_eq!(beef.price, 4.99);
        assert_eq!(beef.unit, "per lb");
    }

    #[tokio::test]
    async fn test_token_is_cached_across_searches() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(200).set_body_json(product_body()))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        assert!(client.search_products("garlic", 5).await.success);
        assert!(client.search_products("onion", 5).await.success);
    }

    #[tokio::test]
    async fn test_auth_rejection_becomes_unsuccessful_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/oauth2/token"))
            .respond_with(ResponseTemplate::new(401).set_body_string("denied"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let result = client.search_products("garlic", 5).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Invalid Kroger API credentials"));
    }

    #[tokio::test]
    async fn test_search_error_becomes_unsuccessful_result() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/connect/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(token_body()))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/products"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&server)
            .await;

        let client = test_client(server.uri());
        let result = client.search_products("garlic", 5).await;
        assert!(!result.success);
        assert!(result.error.unwrap().contains("Kroger API error"));
        assert!(result.products.is_empty());
    }
}
