//! Handlers for `/api/quizzes` endpoints.
//!
//! | Method   | Path                 | Notes |
//! |----------|----------------------|-------|
//! | `GET`    | `/api/quizzes`       | Summaries with question/answer counts |
//! | `POST`   | `/api/quizzes`       | Body: nested editor quiz |
//! | `GET`    | `/api/quizzes/{id}`  | Nested editor quiz, collections enriched |
//! | `PUT`    | `/api/quizzes/{id}`  | Destructive replace of the whole graph |
//! | `DELETE` | `/api/quizzes/{id}`  | Cascades |

use axum::{
  Json,
  extract::{Path, State, rejection::JsonRejection},
};
use serde_json::{Value, json};
use shopquiz_core::{
  editor::{EditorQuiz, QuizListItem},
  engine,
  platform::CommercePlatform,
  store::{QuizStore, ShopStore},
};
use uuid::Uuid;

use crate::{AppState, auth::ShopSession, error::ApiError};

/// Ids that are not UUIDs cannot name a quiz.
pub(crate) fn parse_id(raw: &str) -> Result<Uuid, ApiError> {
  Uuid::parse_str(raw).map_err(|_| ApiError::NotFound)
}

/// `GET /api/quizzes`
pub async fn list<S, P>(
  State(state): State<AppState<S, P>>,
  session: ShopSession,
) -> Result<Json<Vec<QuizListItem>>, ApiError>
where
  S: QuizStore + ShopStore + 'static,
  P: CommercePlatform + 'static,
{
  Ok(Json(engine::list_quizzes(&*state.store, &session.shop).await?))
}

/// `POST /api/quizzes`
pub async fn create<S, P>(
  State(state): State<AppState<S, P>>,
  session: ShopSession,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: QuizStore + ShopStore + 'static,
  P: CommercePlatform + 'static,
{
  let Json(body) = body?;
  let payload = EditorQuiz::from_json(body)?;
  let id = engine::create_quiz(&*state.store, &session.shop, payload).await?;
  Ok(Json(json!({ "id": id })))
}

/// `GET /api/quizzes/{id}`
pub async fn get_one<S, P>(
  State(state): State<AppState<S, P>>,
  session: ShopSession,
  Path(id): Path<String>,
) -> Result<Json<EditorQuiz>, ApiError>
where
  S: QuizStore + ShopStore + 'static,
  P: CommercePlatform + 'static,
{
  let id = parse_id(&id)?;
  let quiz = engine::read_quiz(
    &*state.store,
    &*state.platform,
    &session.shop,
    Some(&session.access_token),
    id,
  )
  .await?;
  Ok(Json(quiz))
}

/// `PUT /api/quizzes/{id}`
pub async fn update<S, P>(
  State(state): State<AppState<S, P>>,
  session: ShopSession,
  Path(id): Path<String>,
  body: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Value>, ApiError>
where
  S: QuizStore + ShopStore + 'static,
  P: CommercePlatform + 'static,
{
  let id = parse_id(&id)?;
  let Json(body) = body?;
  let payload = EditorQuiz::from_json(body)?;
  let id = engine::update_quiz(&*state.store, &session.shop, id, payload).await?;
  Ok(Json(json!({ "id": id })))
}

/// `DELETE /api/quizzes/{id}`
pub async fn delete<S, P>(
  State(state): State<AppState<S, P>>,
  session: ShopSession,
  Path(id): Path<String>,
) -> Result<Json<Value>, ApiError>
where
  S: QuizStore + ShopStore + 'static,
  P: CommercePlatform + 'static,
{
  let id = parse_id(&id)?;
  engine::delete_quiz(&*state.store, &session.shop, id).await?;
  Ok(Json(json!({ "id": id, "deleted": true })))
}
