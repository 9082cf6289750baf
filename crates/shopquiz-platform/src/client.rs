//! [`ShopifyClient`]: the reqwest-backed [`CommercePlatform`].

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use shopquiz_core::{
  platform::{AccessGrant, CollectionMeta, CommercePlatform},
  shop::ShopDomain,
};
use url::Url;

use crate::{Error, Result, graphql};

/// App credentials and API version for the platform.
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformConfig {
  pub api_key:     String,
  pub api_secret:  String,
  /// Admin API version segment, e.g. `2024-10`.
  pub api_version: String,
}

/// Admin API client shared by every shop.
///
/// Cheap to clone; the inner [`reqwest::Client`] is `Arc`-based.
#[derive(Clone)]
pub struct ShopifyClient {
  client: Client,
  config: PlatformConfig,
}

#[derive(Serialize)]
struct TokenRequest<'a> {
  client_id:     &'a str,
  client_secret: &'a str,
  code:          &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
  access_token: String,
  #[serde(default)]
  scope:        Option<String>,
}

impl ShopifyClient {
  pub fn new(config: PlatformConfig) -> Result<Self> {
    let client = Client::builder()
      .timeout(Duration::from_secs(30))
      .build()?;
    Ok(Self { client, config })
  }

  fn shop_url(shop: &ShopDomain, path: &str) -> Result<Url> {
    Ok(Url::parse(&format!("https://{shop}/"))?.join(path)?)
  }

  /// `POST https://{shop}/admin/oauth/access_token`
  pub fn token_url(shop: &ShopDomain) -> Result<Url> {
    Self::shop_url(shop, "admin/oauth/access_token")
  }

  /// `POST https://{shop}/admin/api/{version}/graphql.json`
  pub fn graphql_url(&self, shop: &ShopDomain) -> Result<Url> {
    Self::shop_url(shop, &format!("admin/api/{}/graphql.json", self.config.api_version))
  }

  async fn check(endpoint: &'static str, resp: reqwest::Response) -> Result<reqwest::Response> {
    let status = resp.status();
    if status.is_success() {
      return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(Error::Status { endpoint, status: status.as_u16(), body })
  }
}

// ─── CommercePlatform impl ───────────────────────────────────────────────────

impl CommercePlatform for ShopifyClient {
  type Error = Error;

  async fn exchange_code(&self, shop: ShopDomain, code: String) -> Result<AccessGrant> {
    let resp = self
      .client
      .post(Self::token_url(&shop)?)
      .json(&TokenRequest {
        client_id:     &self.config.api_key,
        client_secret: &self.config.api_secret,
        code:          &code,
      })
      .send()
      .await?;
    let token: TokenResponse = Self::check("oauth access_token", resp).await?.json().await?;

    if token.access_token.trim().is_empty() {
      return Err(Error::InvalidResponse("empty access token".into()));
    }

    tracing::debug!(%shop, scope = ?token.scope, "authorization code exchanged");
    Ok(AccessGrant { access_token: token.access_token, scope: token.scope })
  }

  async fn fetch_collections(
    &self,
    shop: ShopDomain,
    access_token: String,
    ids: Vec<String>,
  ) -> Result<Vec<CollectionMeta>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }

    let resp = self
      .client
      .post(self.graphql_url(&shop)?)
      .header("X-Shopify-Access-Token", access_token)
      .json(&json!({
        "query":     graphql::COLLECTIONS_BY_ID,
        "variables": { "ids": ids },
      }))
      .send()
      .await?;
    let body: serde_json::Value = Self::check("admin graphql", resp).await?.json().await?;

    let found = graphql::parse_collections(body)?;
    tracing::debug!(%shop, requested = ids.len(), found = found.len(), "collections fetched");
    Ok(found)
  }
}
