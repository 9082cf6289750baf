//! The catalog query and its response decoding.

use serde::Deserialize;
use shopquiz_core::platform::CollectionMeta;

use crate::{Error, Result};

/// Looks collections up by global id. Nodes that are not collections come
/// back as empty objects; unknown ids come back as `null`.
pub const COLLECTIONS_BY_ID: &str = "query CollectionsById($ids: [ID!]!) {
  nodes(ids: $ids) {
    ... on Collection {
      id
      title
      handle
      description
    }
  }
}";

#[derive(Debug, Deserialize)]
struct Response {
  data:   Option<Data>,
  #[serde(default)]
  errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct Data {
  #[serde(default)]
  nodes: Vec<Option<Node>>,
}

#[derive(Debug, Deserialize)]
struct Node {
  id:          Option<String>,
  title:       Option<String>,
  handle:      Option<String>,
  description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
  message: String,
}

/// Decode a `nodes(ids:)` response body into collection metadata.
///
/// Top-level GraphQL errors fail the whole call only when no data came back;
/// partial data is kept.
pub fn parse_collections(body: serde_json::Value) -> Result<Vec<CollectionMeta>> {
  let response: Response = serde_json::from_value(body)
    .map_err(|e| Error::InvalidResponse(e.to_string()))?;

  let Some(data) = response.data else {
    let messages: Vec<String> = response.errors.into_iter().map(|e| e.message).collect();
    return Err(if messages.is_empty() {
      Error::InvalidResponse("response has neither data nor errors".into())
    } else {
      Error::GraphQl(messages.join("; "))
    });
  };

  if !response.errors.is_empty() {
    tracing::warn!(count = response.errors.len(), "catalog query returned partial errors");
  }

  Ok(
    data
      .nodes
      .into_iter()
      .flatten()
      .filter_map(|node| {
        Some(CollectionMeta {
          id:          node.id?,
          title:       node.title?,
          handle:      node.handle,
          description: node.description.filter(|d| !d.is_empty()),
        })
      })
      .collect(),
  )
}
