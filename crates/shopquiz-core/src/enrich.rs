//! Collection enrichment: stored collection ids → live display metadata.
//!
//! Enrichment is best-effort. It never fails a read; every id handed in comes
//! back with either catalog metadata or the placeholder from [`placeholder`].

use std::collections::{BTreeSet, HashMap};

use crate::{
  platform::{CollectionMeta, CommercePlatform},
  shop::ShopDomain,
};

/// Page-size cap of a single catalog query.
pub const MAX_COLLECTIONS_PER_QUERY: usize = 250;

/// Title reported for collections the catalog could not describe.
pub const UNKNOWN_COLLECTION_TITLE: &str = "Unknown Collection";

/// Collection id → metadata.
pub type CollectionIndex = HashMap<String, CollectionMeta>;

/// Metadata for a collection the catalog did not (or could not) describe.
pub fn placeholder(id: &str) -> CollectionMeta {
  CollectionMeta {
    id:          id.to_string(),
    title:       UNKNOWN_COLLECTION_TITLE.to_string(),
    handle:      None,
    description: None,
  }
}

/// Resolve `ids` against the catalog with one batched query.
///
/// Without a usable `access_token` the catalog is not called at all. Ids past
/// [`MAX_COLLECTIONS_PER_QUERY`] are not queried and resolve to placeholders.
pub async fn enrich_collections<P>(
  platform:     &P,
  shop:         &ShopDomain,
  access_token: Option<&str>,
  ids:          &BTreeSet<String>,
) -> CollectionIndex
where
  P: CommercePlatform,
{
  let mut index: CollectionIndex =
    ids.iter().map(|id| (id.clone(), placeholder(id))).collect();

  if ids.is_empty() {
    return index;
  }

  let Some(token) = access_token else {
    tracing::warn!(%shop, "no usable access token; skipping collection enrichment");
    return index;
  };

  if ids.len() > MAX_COLLECTIONS_PER_QUERY {
    tracing::warn!(
      %shop,
      requested = ids.len(),
      cap = MAX_COLLECTIONS_PER_QUERY,
      "collection ids beyond the query cap resolve to placeholders"
    );
  }

  let batch: Vec<String> =
    ids.iter().take(MAX_COLLECTIONS_PER_QUERY).cloned().collect();

  match platform
    .fetch_collections(shop.clone(), token.to_string(), batch)
    .await
  {
    Ok(found) => {
      for meta in found {
        if let Some(slot) = index.get_mut(&meta.id) {
          *slot = meta;
        }
      }
    }
    Err(e) => {
      tracing::warn!(%shop, error = %e, "collection enrichment failed; using placeholders");
    }
  }

  index
}
