//! The `CommercePlatform` trait: the narrow slice of the e-commerce platform
//! API this system calls.
//!
//! Implemented by `shopquiz-platform` over HTTP; tests substitute stubs.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::shop::ShopDomain;

/// Display metadata for one catalog collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionMeta {
  pub id:          String,
  pub title:       String,
  pub handle:      Option<String>,
  pub description: Option<String>,
}

/// The result of an OAuth authorization-code exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessGrant {
  pub access_token: String,
  pub scope:        Option<String>,
}

pub trait CommercePlatform: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Exchange an OAuth authorization code for an offline access token.
  fn exchange_code(
    &self,
    shop: ShopDomain,
    code: String,
  ) -> impl Future<Output = Result<AccessGrant, Self::Error>> + Send + '_;

  /// Fetch metadata for `ids` in a single catalog request.
  ///
  /// Ids the catalog does not know are simply absent from the result. Callers
  /// keep `ids` within [`crate::enrich::MAX_COLLECTIONS_PER_QUERY`].
  fn fetch_collections(
    &self,
    shop: ShopDomain,
    access_token: String,
    ids: Vec<String>,
  ) -> impl Future<Output = Result<Vec<CollectionMeta>, Self::Error>> + Send + '_;
}
