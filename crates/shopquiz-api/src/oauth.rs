//! `GET /auth/callback`: finish an install by exchanging the authorization
//! code and storing the resulting token.

use axum::{
  Json,
  extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use shopquiz_core::{
  platform::CommercePlatform,
  shop::ShopDomain,
  store::{QuizStore, ShopStore},
};

use crate::{AppState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
  pub shop: Option<String>,
  pub code: Option<String>,
}

/// `GET /auth/callback?shop=<domain>&code=<code>`
pub async fn callback<S, P>(
  State(state): State<AppState<S, P>>,
  Query(params): Query<CallbackParams>,
) -> Result<Json<Value>, ApiError>
where
  S: QuizStore + ShopStore + 'static,
  P: CommercePlatform + 'static,
{
  let (Some(shop), Some(code)) = (params.shop, params.code.filter(|c| !c.is_empty())) else {
    return Err(ApiError::BadRequest("missing shop or code".into()));
  };
  let shop = ShopDomain::parse(&shop)
    .ok_or_else(|| ApiError::BadRequest(format!("invalid shop domain: {shop:?}")))?;

  let grant = state
    .platform
    .exchange_code(shop.clone(), code)
    .await
    .map_err(ApiError::upstream)?;

  let stored = state
    .store
    .upsert_shop(shop.clone(), grant.access_token, grant.scope)
    .await
    .map_err(ApiError::upstream)?;

  tracing::info!(%shop, scope = ?stored.scope, "shop installed");
  Ok(Json(json!({ "shop": stored.shop_domain, "scope": stored.scope })))
}
