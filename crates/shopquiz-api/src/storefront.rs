//! `GET /storefront/quizzes/{id}`: the shopper-facing read.
//!
//! No session is required; the tenant comes from the resolver alone. Inactive
//! quizzes are reported as absent, and are turned away before the graph is
//! read or the catalog is called.

use axum::{
  Json,
  extract::{Path, State},
};
use shopquiz_core::{
  editor::EditorQuiz,
  engine,
  platform::CommercePlatform,
  store::{QuizStore, ShopStore},
};

use crate::{AppState, error::ApiError, quizzes::parse_id, shop_context::TenantShop};

pub async fn get_one<S, P>(
  State(state): State<AppState<S, P>>,
  TenantShop(resolved): TenantShop,
  Path(id): Path<String>,
) -> Result<Json<EditorQuiz>, ApiError>
where
  S: QuizStore + ShopStore + 'static,
  P: CommercePlatform + 'static,
{
  let id = parse_id(&id)?;
  let shop = resolved.domain;

  let active = QuizStore::get_quiz(&*state.store, id, shop.clone())
    .await
    .map_err(ApiError::upstream)?
    .is_some_and(|quiz| quiz.fields.is_active);
  if !active {
    return Err(ApiError::NotFound);
  }

  let token = match ShopStore::get_shop(&*state.store, shop.clone()).await {
    Ok(record) => record.and_then(|r| r.usable_token().map(str::to_owned)),
    Err(e) => {
      tracing::warn!(%shop, error = %e, "token lookup failed; serving placeholders");
      None
    }
  };

  let quiz =
    engine::read_quiz(&*state.store, &*state.platform, &shop, token.as_deref(), id).await?;
  Ok(Json(quiz))
}
