//! Storage traits.
//!
//! [`QuizStore`] is a row-level client over the six quiz tables: every method
//! is one independent datastore round-trip, and nothing spans calls. Ordering
//! and id remapping across calls is the job of [`crate::engine`]. Backends
//! must configure cascading deletes (`quizzes` → `questions` → `answers` →
//! conditions / collection links) themselves.
//!
//! [`ShopStore`] is the access-token store keyed by shop domain.

use std::future::Future;

use uuid::Uuid;

use crate::{
  quiz::{
    AnswerRecord, CollectionLink, NewAnswer, NewCondition, NewQuestion, NewQuiz,
    Question, Quiz, QuizFields, QuizSummary,
  },
  shop::{Shop, ShopDomain},
};

// ─── Quiz graph ──────────────────────────────────────────────────────────────

pub trait QuizStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── quizzes ───────────────────────────────────────────────────────────

  /// Insert a quiz row. Timestamps are set by the store.
  fn insert_quiz(
    &self,
    quiz: NewQuiz,
  ) -> impl Future<Output = Result<Quiz, Self::Error>> + Send + '_;

  /// Fetch a quiz row scoped to its shop. `None` if absent or owned by a
  /// different shop.
  fn get_quiz(
    &self,
    id: Uuid,
    shop: ShopDomain,
  ) -> impl Future<Output = Result<Option<Quiz>, Self::Error>> + Send + '_;

  /// Overwrite the editable columns of a quiz row and bump `updated_at`.
  /// Returns `false` if no row matched `(id, shop)`.
  fn update_quiz(
    &self,
    id: Uuid,
    shop: ShopDomain,
    fields: QuizFields,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Replace the cached collection-id aggregate on a quiz row.
  fn set_quiz_collection_ids(
    &self,
    id: Uuid,
    collection_ids: Vec<String>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Delete a quiz row scoped to its shop; descendants go with it. Returns
  /// `false` if no row matched.
  fn delete_quiz(
    &self,
    id: Uuid,
    shop: ShopDomain,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Summary columns for every quiz of a shop, newest first.
  fn list_quizzes(
    &self,
    shop: ShopDomain,
  ) -> impl Future<Output = Result<Vec<QuizSummary>, Self::Error>> + Send + '_;

  fn count_questions(
    &self,
    quiz_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Count answers belonging to the quiz's questions.
  fn count_answers(
    &self,
    quiz_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  // ── questions ─────────────────────────────────────────────────────────

  /// Insert question rows for a quiz.
  ///
  /// The returned ids are in the same order as `rows`; the engine maps client
  /// ids onto them by position.
  fn insert_questions(
    &self,
    quiz_id: Uuid,
    rows: Vec<NewQuestion>,
  ) -> impl Future<Output = Result<Vec<i64>, Self::Error>> + Send + '_;

  /// Delete every question of a quiz; answers, conditions and collection
  /// links cascade.
  fn delete_questions(
    &self,
    quiz_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Question rows of a quiz ordered by `order_index`.
  fn list_questions(
    &self,
    quiz_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Question>, Self::Error>> + Send + '_;

  // ── answers and their sub-rows ────────────────────────────────────────

  /// Insert answer rows. Returned ids are in the same order as `rows`.
  fn insert_answers(
    &self,
    rows: Vec<NewAnswer>,
  ) -> impl Future<Output = Result<Vec<i64>, Self::Error>> + Send + '_;

  /// Answers of the given questions, each joined with its conditions and
  /// collection links, ordered by question position then `order_index`.
  fn list_answers(
    &self,
    question_ids: Vec<i64>,
  ) -> impl Future<Output = Result<Vec<AnswerRecord>, Self::Error>> + Send + '_;

  fn insert_conditions(
    &self,
    rows: Vec<NewCondition>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn insert_collection_links(
    &self,
    rows: Vec<CollectionLink>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Access tokens ───────────────────────────────────────────────────────────

pub trait ShopStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  /// Single-row lookup by shop domain.
  fn get_shop(
    &self,
    shop: ShopDomain,
  ) -> impl Future<Output = Result<Option<Shop>, Self::Error>> + Send + '_;

  /// Insert or replace the credential for a shop. Re-installs overwrite the
  /// token and scope and keep the original `installed_at`.
  fn upsert_shop(
    &self,
    shop: ShopDomain,
    access_token: String,
    scope: Option<String>,
  ) -> impl Future<Output = Result<Shop, Self::Error>> + Send + '_;
}
