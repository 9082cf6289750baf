//! Authenticated-session extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use shopquiz_core::{
  platform::CommercePlatform,
  shop::ShopDomain,
  store::{QuizStore, ShopStore},
};

use crate::{AppState, error::ApiError, shop_context::resolve};

/// Present in a handler means the request resolved to a shop that holds a
/// usable access token.
#[derive(Debug, Clone)]
pub struct ShopSession {
  pub shop:         ShopDomain,
  pub access_token: String,
}

impl<S, P> FromRequestParts<AppState<S, P>> for ShopSession
where
  S: QuizStore + ShopStore + 'static,
  P: CommercePlatform + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    state: &AppState<S, P>,
  ) -> Result<Self, Self::Rejection> {
    let resolved = resolve(&parts.headers, parts.uri.query()).ok_or(ApiError::Unauthenticated)?;
    let shop = resolved.domain;

    let record = ShopStore::get_shop(&*state.store, shop.clone())
      .await
      .map_err(ApiError::upstream)?
      .ok_or(ApiError::Unauthenticated)?;

    let Some(token) = record.usable_token() else {
      tracing::warn!(%shop, "stored access token is a placeholder; re-install required");
      return Err(ApiError::Unauthenticated);
    };

    Ok(ShopSession { access_token: token.to_owned(), shop })
  }
}
