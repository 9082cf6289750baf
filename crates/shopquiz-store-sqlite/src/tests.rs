//! Integration tests for `SqliteStore` against an in-memory database, plus
//! end-to-end runs of the persistence engine on top of it.

use std::sync::{
  Mutex,
  atomic::{AtomicBool, Ordering},
};

use serde_json::json;
use shopquiz_core::{
  Error as CoreError,
  codec::default_style,
  editor::EditorQuiz,
  engine,
  enrich::UNKNOWN_COLLECTION_TITLE,
  platform::{AccessGrant, CollectionMeta, CommercePlatform},
  quiz::{
    AnswerRecord, CollectionLink, NewAnswer, NewCondition, NewQuestion, NewQuiz,
    Question, Quiz, QuizFields, QuizSummary,
  },
  shop::ShopDomain,
  store::{QuizStore, ShopStore},
};
use uuid::Uuid;

use crate::SqliteStore;

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn shop(name: &str) -> ShopDomain {
  ShopDomain::from_store_name(name).expect("valid shop name")
}

fn payload(value: serde_json::Value) -> EditorQuiz {
  EditorQuiz::from_json(value).expect("valid editor payload")
}

fn fields(title: &str) -> QuizFields {
  QuizFields {
    title:                title.into(),
    internal_title:       None,
    internal_description: None,
    image_url:            None,
    is_active:            false,
    style_settings:       serde_json::Value::Null,
  }
}

// ─── Catalog stub ────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
#[error("catalog offline")]
struct Offline;

/// Answers every lookup with `Collection <id>`, or fails when `offline`.
#[derive(Default)]
struct Catalog {
  offline: bool,
}

impl CommercePlatform for Catalog {
  type Error = Offline;

  async fn exchange_code(&self, _: ShopDomain, _: String) -> Result<AccessGrant, Offline> {
    Err(Offline)
  }

  async fn fetch_collections(
    &self,
    _shop: ShopDomain,
    _token: String,
    ids: Vec<String>,
  ) -> Result<Vec<CollectionMeta>, Offline> {
    if self.offline {
      return Err(Offline);
    }
    Ok(
      ids
        .into_iter()
        .map(|id| CollectionMeta {
          title:       format!("Collection {id}"),
          handle:      None,
          description: None,
          id,
        })
        .collect(),
    )
  }
}

// ─── Quiz rows ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn insert_and_get_quiz() {
  let s = store().await;
  let acme = shop("acme");
  let id = Uuid::new_v4();

  let mut f = fields("Find your tent");
  f.style_settings = json!({ "primaryColor": "#000" });
  s.insert_quiz(NewQuiz { id, shop_domain: acme.clone(), fields: f.clone() })
    .await
    .unwrap();

  let fetched = s.get_quiz(id, acme).await.unwrap().expect("quiz exists");
  assert_eq!(fetched.id, id);
  assert_eq!(fetched.fields, f);
  assert!(fetched.collection_ids.is_empty());
}

#[tokio::test]
async fn quiz_rows_are_scoped_to_their_shop() {
  let s = store().await;
  let id = Uuid::new_v4();
  s.insert_quiz(NewQuiz { id, shop_domain: shop("acme"), fields: fields("T") })
    .await
    .unwrap();

  let other = shop("globex");
  assert!(s.get_quiz(id, other.clone()).await.unwrap().is_none());
  assert!(!s.update_quiz(id, other.clone(), fields("stolen")).await.unwrap());
  assert!(!s.delete_quiz(id, other).await.unwrap());

  let kept = s.get_quiz(id, shop("acme")).await.unwrap().unwrap();
  assert_eq!(kept.fields.title, "T");
}

#[tokio::test]
async fn list_quizzes_is_newest_first_and_per_shop() {
  let s = store().await;
  let acme = shop("acme");
  let first = Uuid::new_v4();
  let second = Uuid::new_v4();
  for (id, title) in [(first, "first"), (second, "second")] {
    s.insert_quiz(NewQuiz { id, shop_domain: acme.clone(), fields: fields(title) })
      .await
      .unwrap();
  }
  s.insert_quiz(NewQuiz { id: Uuid::new_v4(), shop_domain: shop("globex"), fields: fields("x") })
    .await
    .unwrap();

  let listed: Vec<QuizSummary> = s.list_quizzes(acme).await.unwrap();
  let ids: Vec<Uuid> = listed.iter().map(|q| q.id).collect();
  assert_eq!(ids, vec![second, first]);
}

#[tokio::test]
async fn collection_id_cache_round_trips() {
  let s = store().await;
  let acme = shop("acme");
  let id = Uuid::new_v4();
  s.insert_quiz(NewQuiz { id, shop_domain: acme.clone(), fields: fields("T") })
    .await
    .unwrap();

  s.set_quiz_collection_ids(id, vec!["c1".into(), "c2".into()]).await.unwrap();

  let quiz: Quiz = s.get_quiz(id, acme).await.unwrap().unwrap();
  assert_eq!(quiz.collection_ids, vec!["c1", "c2"]);
}

// ─── Child rows ──────────────────────────────────────────────────────────────

async fn quiz_with_question(s: &SqliteStore) -> (Uuid, i64) {
  let id = Uuid::new_v4();
  s.insert_quiz(NewQuiz { id, shop_domain: shop("acme"), fields: fields("T") })
    .await
    .unwrap();
  let ids = s
    .insert_questions(id, vec![NewQuestion {
      fields:      shopquiz_core::quiz::QuestionFields {
        text:           "Q".into(),
        image_url:      None,
        show_images:    false,
        allow_multiple: false,
      },
      order_index: 1,
    }])
    .await
    .unwrap();
  (id, ids[0])
}

fn answer(question_id: i64, text: &str, order_index: i64) -> NewAnswer {
  NewAnswer {
    question_id,
    fields: shopquiz_core::quiz::AnswerFields {
      text:          text.into(),
      image_url:     None,
      redirect_url:  None,
      redirect_type: None,
      weight:        1,
      is_default:    false,
    },
    order_index,
  }
}

#[tokio::test]
async fn batch_inserts_return_ids_in_input_order() {
  let s = store().await;
  let (quiz_id, question_id) = quiz_with_question(&s).await;

  let ids = s
    .insert_answers(vec![answer(question_id, "b", 2), answer(question_id, "a", 1)])
    .await
    .unwrap();
  assert_eq!(ids.len(), 2);

  let records: Vec<AnswerRecord> = s.list_answers(vec![question_id]).await.unwrap();
  // Listed by order_index, so the second inserted row comes first.
  assert_eq!(records[0].answer.id, ids[1]);
  assert_eq!(records[0].answer.fields.text, "a");
  assert_eq!(records[1].answer.id, ids[0]);
  assert_eq!(s.count_answers(quiz_id).await.unwrap(), 2);
}

#[tokio::test]
async fn list_answers_joins_conditions_and_links() {
  let s = store().await;
  let (_, question_id) = quiz_with_question(&s).await;
  let ids = s.insert_answers(vec![answer(question_id, "a", 1)]).await.unwrap();

  s.insert_conditions(vec![NewCondition {
    answer_id: ids[0],
    fields:    shopquiz_core::quiz::ConditionFields {
      namespace:      "custom".into(),
      key:            "size".into(),
      display_name:   Some("Size".into()),
      metafield_type: None,
      operator:       shopquiz_core::quiz::ConditionOperator::NotEquals,
      value:          "XL".into(),
      weight:         3,
    },
  }])
  .await
  .unwrap();
  s.insert_collection_links(vec![
    CollectionLink { answer_id: ids[0], collection_id: "c2".into(), order_index: 2 },
    CollectionLink { answer_id: ids[0], collection_id: "c1".into(), order_index: 1 },
  ])
  .await
  .unwrap();

  let records = s.list_answers(vec![question_id]).await.unwrap();
  assert_eq!(records.len(), 1);
  assert_eq!(records[0].conditions[0].fields.value, "XL");
  let linked: Vec<&str> =
    records[0].collections.iter().map(|l| l.collection_id.as_str()).collect();
  assert_eq!(linked, vec!["c1", "c2"]);
}

#[tokio::test]
async fn deleting_a_quiz_cascades() {
  let s = store().await;
  let (quiz_id, question_id) = quiz_with_question(&s).await;
  s.insert_answers(vec![answer(question_id, "a", 1)]).await.unwrap();

  assert!(s.delete_quiz(quiz_id, shop("acme")).await.unwrap());

  assert_eq!(s.count_questions(quiz_id).await.unwrap(), 0);
  assert!(s.list_answers(vec![question_id]).await.unwrap().is_empty());
}

#[tokio::test]
async fn list_answers_with_no_questions_is_empty() {
  let s = store().await;
  assert!(s.list_answers(Vec::new()).await.unwrap().is_empty());
}

// ─── Shops ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn get_shop_missing_returns_none() {
  let s = store().await;
  assert!(s.get_shop(shop("nobody")).await.unwrap().is_none());
}

#[tokio::test]
async fn upsert_shop_overwrites_token_and_keeps_install_time() {
  let s = store().await;
  let acme = shop("acme");

  let first = s
    .upsert_shop(acme.clone(), "shpat_1".into(), Some("read_products".into()))
    .await
    .unwrap();
  let second = s.upsert_shop(acme.clone(), "shpat_2".into(), None).await.unwrap();

  assert_eq!(second.access_token, "shpat_2");
  assert_eq!(second.scope, None);
  assert_eq!(second.installed_at, first.installed_at);
  assert!(second.updated_at >= first.updated_at);

  let stored = s.get_shop(acme).await.unwrap().unwrap();
  assert_eq!(stored.usable_token(), Some("shpat_2"));
}

// ─── Engine over SQLite ──────────────────────────────────────────────────────

#[tokio::test]
async fn create_then_read_flat_payload() {
  let s = store().await;
  let acme = shop("acme");

  let id = engine::create_quiz(
    &s,
    &acme,
    payload(json!({
      "title": "T",
      "questions": [{ "id": "q1", "text": "Q1?" }],
      "answers": [{ "id": "a1", "questionId": "q1", "text": "A1" }]
    })),
  )
  .await
  .unwrap();

  let quiz = engine::read_quiz(&s, &Catalog::default(), &acme, Some("tok"), id)
    .await
    .unwrap();

  assert_eq!(quiz.id, Some(id.to_string()));
  assert_eq!(quiz.questions.len(), 1);
  let question = &quiz.questions[0];
  assert_eq!(question.text, "Q1?");
  assert_eq!(question.answers.len(), 1);
  assert_eq!(question.answers[0].text, "A1");
  assert_eq!(question.answers[0].question_id.as_deref(), Some(question.id.as_str()));
  assert_eq!(quiz.style_settings, Some(default_style()));
}

fn nested_payload() -> serde_json::Value {
  json!({
    "title": "Gear finder",
    "internalTitle": "gear-v2",
    "isActive": true,
    "styleSettings": { "primaryColor": "#123456" },
    "questions": [
      {
        "id": "tmp-1",
        "text": "Where do you camp?",
        "showImages": true,
        "answers": [
          {
            "id": "tmp-a",
            "text": "Mountains",
            "weight": 2,
            "conditions": [{
              "metafield": { "namespace": "custom", "key": "terrain", "name": "Terrain" },
              "operator": "equals",
              "value": "alpine",
              "weight": 4
            }],
            "collections": [{ "id": "gid://shopify/Collection/2" }, { "id": "gid://shopify/Collection/1" }]
          },
          { "id": "tmp-b", "text": "Beach", "isDefault": true }
        ]
      },
      {
        "id": "tmp-2",
        "text": "How many people?",
        "allowMultiple": true,
        "answers": [
          { "id": "tmp-c", "text": "One" },
          { "id": "tmp-d", "text": "Two" },
          { "id": "tmp-e", "text": "More", "redirectUrl": "/pages/groups", "redirectType": "page" }
        ]
      }
    ]
  })
}

#[tokio::test]
async fn nested_payload_round_trips() {
  let s = store().await;
  let acme = shop("acme");
  let sent = payload(nested_payload());

  let id = engine::create_quiz(&s, &acme, sent.clone()).await.unwrap();
  let got = engine::read_quiz(&s, &Catalog::default(), &acme, Some("tok"), id)
    .await
    .unwrap();

  assert_eq!(got.title, sent.title);
  assert_eq!(got.internal_title, sent.internal_title);
  assert_eq!(got.is_active, sent.is_active);
  assert_eq!(got.style_settings, sent.style_settings);
  assert_eq!(got.questions.len(), sent.questions.len());
  for (g, w) in got.questions.iter().zip(&sent.questions) {
    assert_eq!(g.text, w.text);
    assert_eq!(g.show_images, w.show_images);
    assert_eq!(g.allow_multiple, w.allow_multiple);
    let got_answers: Vec<(&str, i64, bool)> =
      g.answers.iter().map(|a| (a.text.as_str(), a.weight, a.is_default)).collect();
    let sent_answers: Vec<(&str, i64, bool)> =
      w.answers.iter().map(|a| (a.text.as_str(), a.weight, a.is_default)).collect();
    assert_eq!(got_answers, sent_answers);
  }

  let mountains = &got.questions[0].answers[0];
  assert_eq!(mountains.conditions[0].value.as_deref(), Some("alpine"));
  assert_eq!(mountains.conditions[0].weight, 4);
  let titles: Vec<&str> = mountains
    .collections
    .iter()
    .filter_map(|c| c.title.as_deref())
    .collect();
  assert_eq!(titles, vec![
    "Collection gid://shopify/Collection/2",
    "Collection gid://shopify/Collection/1",
  ]);
  assert_eq!(got.collection_ids, vec![
    "gid://shopify/Collection/1",
    "gid://shopify/Collection/2",
  ]);
  assert_eq!(
    got.questions[1].answers[2].redirect_url.as_deref(),
    Some("/pages/groups")
  );
}

#[tokio::test]
async fn order_indices_are_contiguous() {
  let s = store().await;
  let acme = shop("acme");
  let id = engine::create_quiz(&s, &acme, payload(nested_payload())).await.unwrap();

  let questions: Vec<Question> = s.list_questions(id).await.unwrap();
  let positions: Vec<i64> = questions.iter().map(|q| q.order_index).collect();
  assert_eq!(positions, vec![1, 2]);

  for q in &questions {
    let records = s.list_answers(vec![q.id]).await.unwrap();
    let positions: Vec<i64> = records.iter().map(|r| r.answer.order_index).collect();
    let expected: Vec<i64> = (1..=records.len() as i64).collect();
    assert_eq!(positions, expected);
  }
}

#[tokio::test]
async fn other_shops_see_not_found() {
  let s = store().await;
  let id = engine::create_quiz(&s, &shop("acme"), payload(nested_payload())).await.unwrap();
  let intruder = shop("globex");

  let read = engine::read_quiz(&s, &Catalog::default(), &intruder, None, id).await;
  assert!(matches!(read, Err(CoreError::NotFound)));

  let update = engine::update_quiz(&s, &intruder, id, payload(json!({ "title": "mine" }))).await;
  assert!(matches!(update, Err(CoreError::NotFound)));

  // Ownership is settled before the body is validated.
  let invalid = engine::update_quiz(&s, &intruder, id, payload(json!({ "title": "" }))).await;
  assert!(matches!(invalid, Err(CoreError::NotFound)));
  let dangling = engine::update_quiz(
    &s,
    &intruder,
    id,
    payload(json!({ "title": "T", "answers": [{ "questionId": "ghost" }] })),
  )
  .await;
  assert!(matches!(dangling, Err(CoreError::NotFound)));

  let delete = engine::delete_quiz(&s, &intruder, id).await;
  assert!(matches!(delete, Err(CoreError::NotFound)));

  let owner_view = engine::read_quiz(&s, &Catalog::default(), &shop("acme"), None, id)
    .await
    .unwrap();
  assert_eq!(owner_view.title, "Gear finder");
}

#[tokio::test]
async fn update_replaces_the_whole_graph() {
  let s = store().await;
  let acme = shop("acme");
  let id = engine::create_quiz(&s, &acme, payload(nested_payload())).await.unwrap();
  let old_questions = s.list_questions(id).await.unwrap();

  engine::update_quiz(
    &s,
    &acme,
    id,
    payload(json!({
      "title": "Smaller",
      "questions": [{ "id": "n1", "text": "Only one", "answers": [{ "text": "Yes" }] }]
    })),
  )
  .await
  .unwrap();

  let got = engine::read_quiz(&s, &Catalog::default(), &acme, None, id).await.unwrap();
  assert_eq!(got.title, "Smaller");
  assert_eq!(got.questions.len(), 1);
  assert_eq!(got.questions[0].answers.len(), 1);
  assert_eq!(got.questions[0].answers[0].text, "Yes");
  // Style was omitted, so it falls back to the default.
  assert_eq!(got.style_settings, Some(default_style()));
  assert!(got.collection_ids.is_empty());

  assert_eq!(s.count_questions(id).await.unwrap(), 1);
  assert_eq!(s.count_answers(id).await.unwrap(), 1);
  let stale_ids: Vec<i64> = old_questions.iter().map(|q| q.id).collect();
  assert!(s.list_answers(stale_ids).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_of_missing_quiz_is_not_found() {
  let s = store().await;
  let result =
    engine::update_quiz(&s, &shop("acme"), Uuid::new_v4(), payload(json!({ "title": "T" }))).await;
  assert!(matches!(result, Err(CoreError::NotFound)));
}

#[tokio::test]
async fn delete_removes_the_quiz_and_its_rows() {
  let s = store().await;
  let acme = shop("acme");
  let id = engine::create_quiz(&s, &acme, payload(nested_payload())).await.unwrap();
  let question_ids: Vec<i64> = s.list_questions(id).await.unwrap().iter().map(|q| q.id).collect();

  engine::delete_quiz(&s, &acme, id).await.unwrap();

  assert!(s.get_quiz(id, acme.clone()).await.unwrap().is_none());
  assert!(s.list_answers(question_ids).await.unwrap().is_empty());
  assert!(matches!(engine::delete_quiz(&s, &acme, id).await, Err(CoreError::NotFound)));
}

#[tokio::test]
async fn list_reports_counts() {
  let s = store().await;
  let acme = shop("acme");
  let id = engine::create_quiz(&s, &acme, payload(nested_payload())).await.unwrap();
  engine::create_quiz(&s, &shop("globex"), payload(json!({ "title": "elsewhere" })))
    .await
    .unwrap();

  let items = engine::list_quizzes(&s, &acme).await.unwrap();
  assert_eq!(items.len(), 1);
  assert_eq!(items[0].id, id.to_string());
  assert_eq!(items[0].question_count, 2);
  assert_eq!(items[0].answer_count, 5);
  assert!(items[0].is_active);
}

#[tokio::test]
async fn catalog_failure_yields_placeholder_collections() {
  let s = store().await;
  let acme = shop("acme");
  let id = engine::create_quiz(&s, &acme, payload(nested_payload())).await.unwrap();

  let got = engine::read_quiz(&s, &Catalog { offline: true }, &acme, Some("tok"), id)
    .await
    .unwrap();

  let collections = &got.questions[0].answers[0].collections;
  assert_eq!(collections.len(), 2);
  assert_eq!(collections[0].id.as_deref(), Some("gid://shopify/Collection/2"));
  assert!(collections.iter().all(|c| c.title.as_deref() == Some(UNKNOWN_COLLECTION_TITLE)));
}

#[tokio::test]
async fn client_ids_shaped_like_anonymous_keys_keep_their_rows() {
  let s = store().await;
  let acme = shop("acme");
  let id = engine::create_quiz(
    &s,
    &acme,
    payload(json!({
      "title": "T",
      "questions": [{ "id": "q1", "answers": [
        { "id": "#answer-1", "text": "x", "collections": [{ "id": "gid://shopify/Collection/1" }] },
        { "text": "y", "collections": [{ "id": "gid://shopify/Collection/2" }] },
        { "text": "z", "conditions": [{
          "metafield": { "namespace": "custom", "key": "fit" }, "value": "slim"
        }] }
      ]}]
    })),
  )
  .await
  .unwrap();

  let got = engine::read_quiz(&s, &Catalog::default(), &acme, None, id).await.unwrap();
  let answers = &got.questions[0].answers;
  let linked: Vec<(&str, Vec<&str>, usize)> = answers
    .iter()
    .map(|a| {
      let ids = a.collections.iter().filter_map(|c| c.id.as_deref()).collect();
      (a.text.as_str(), ids, a.conditions.len())
    })
    .collect();
  assert_eq!(linked, vec![
    ("x", vec!["gid://shopify/Collection/1"], 0),
    ("y", vec!["gid://shopify/Collection/2"], 0),
    ("z", vec![], 1),
  ]);
}

#[tokio::test]
async fn rejected_payload_writes_nothing() {
  let s = store().await;
  let acme = shop("acme");

  let result = engine::create_quiz(
    &s,
    &acme,
    payload(json!({ "title": "T", "answers": [{ "questionId": "ghost", "text": "A" }] })),
  )
  .await;

  assert!(matches!(result, Err(CoreError::InvalidInput(_))));
  assert!(s.list_quizzes(acme).await.unwrap().is_empty());
}

// ─── Fault injection ─────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
enum Fault {
  #[error("injected failure")]
  Injected,
  #[error(transparent)]
  Store(#[from] crate::Error),
}

/// Delegates to a real store, failing selected calls on demand.
struct Faulty {
  inner:           SqliteStore,
  fail_answers:    AtomicBool,
  fail_cache:      AtomicBool,
  /// Answer counts fail for this quiz only.
  fail_counts_for: Mutex<Option<Uuid>>,
}

impl Faulty {
  fn new(inner: SqliteStore) -> Self {
    Self {
      inner,
      fail_answers:    AtomicBool::new(false),
      fail_cache:      AtomicBool::new(false),
      fail_counts_for: Mutex::new(None),
    }
  }

  fn check(flag: &AtomicBool) -> Result<(), Fault> {
    if flag.load(Ordering::SeqCst) { Err(Fault::Injected) } else { Ok(()) }
  }
}

impl QuizStore for Faulty {
  type Error = Fault;

  async fn insert_quiz(&self, quiz: NewQuiz) -> Result<Quiz, Fault> {
    Ok(self.inner.insert_quiz(quiz).await?)
  }

  async fn get_quiz(&self, id: Uuid, shop: ShopDomain) -> Result<Option<Quiz>, Fault> {
    Ok(self.inner.get_quiz(id, shop).await?)
  }

  async fn update_quiz(&self, id: Uuid, shop: ShopDomain, fields: QuizFields) -> Result<bool, Fault> {
    Ok(self.inner.update_quiz(id, shop, fields).await?)
  }

  async fn set_quiz_collection_ids(&self, id: Uuid, ids: Vec<String>) -> Result<(), Fault> {
    Self::check(&self.fail_cache)?;
    Ok(self.inner.set_quiz_collection_ids(id, ids).await?)
  }

  async fn delete_quiz(&self, id: Uuid, shop: ShopDomain) -> Result<bool, Fault> {
    Ok(self.inner.delete_quiz(id, shop).await?)
  }

  async fn list_quizzes(&self, shop: ShopDomain) -> Result<Vec<QuizSummary>, Fault> {
    Ok(self.inner.list_quizzes(shop).await?)
  }

  async fn count_questions(&self, quiz_id: Uuid) -> Result<u64, Fault> {
    Ok(self.inner.count_questions(quiz_id).await?)
  }

  async fn count_answers(&self, quiz_id: Uuid) -> Result<u64, Fault> {
    if *self.fail_counts_for.lock().unwrap() == Some(quiz_id) {
      return Err(Fault::Injected);
    }
    Ok(self.inner.count_answers(quiz_id).await?)
  }

  async fn insert_questions(&self, quiz_id: Uuid, rows: Vec<NewQuestion>) -> Result<Vec<i64>, Fault> {
    Ok(self.inner.insert_questions(quiz_id, rows).await?)
  }

  async fn delete_questions(&self, quiz_id: Uuid) -> Result<(), Fault> {
    Ok(self.inner.delete_questions(quiz_id).await?)
  }

  async fn list_questions(&self, quiz_id: Uuid) -> Result<Vec<Question>, Fault> {
    Ok(self.inner.list_questions(quiz_id).await?)
  }

  async fn insert_answers(&self, rows: Vec<NewAnswer>) -> Result<Vec<i64>, Fault> {
    Self::check(&self.fail_answers)?;
    Ok(self.inner.insert_answers(rows).await?)
  }

  async fn list_answers(&self, question_ids: Vec<i64>) -> Result<Vec<AnswerRecord>, Fault> {
    Ok(self.inner.list_answers(question_ids).await?)
  }

  async fn insert_conditions(&self, rows: Vec<NewCondition>) -> Result<(), Fault> {
    Ok(self.inner.insert_conditions(rows).await?)
  }

  async fn insert_collection_links(&self, rows: Vec<CollectionLink>) -> Result<(), Fault> {
    Ok(self.inner.insert_collection_links(rows).await?)
  }
}

#[tokio::test]
async fn failed_step_leaves_earlier_rows_in_place() {
  let s = Faulty::new(store().await);
  s.fail_answers.store(true, Ordering::SeqCst);
  let acme = shop("acme");

  let result = engine::create_quiz(&s, &acme, payload(nested_payload())).await;
  assert!(matches!(result, Err(CoreError::Store { step: "insert answers", .. })));

  let quizzes = s.inner.list_quizzes(acme.clone()).await.unwrap();
  assert_eq!(quizzes.len(), 1);
  assert_eq!(s.inner.count_questions(quizzes[0].id).await.unwrap(), 2);
  assert_eq!(s.inner.count_answers(quizzes[0].id).await.unwrap(), 0);

  // Reissuing as an update repairs the graph.
  s.fail_answers.store(false, Ordering::SeqCst);
  engine::update_quiz(&s, &acme, quizzes[0].id, payload(nested_payload()))
    .await
    .unwrap();
  assert_eq!(s.inner.count_answers(quizzes[0].id).await.unwrap(), 5);
}

#[tokio::test]
async fn cache_write_back_failure_is_not_fatal() {
  let s = Faulty::new(store().await);
  s.fail_cache.store(true, Ordering::SeqCst);
  let acme = shop("acme");

  let id = engine::create_quiz(&s, &acme, payload(nested_payload())).await.unwrap();

  let got = engine::read_quiz(&s, &Catalog::default(), &acme, None, id).await.unwrap();
  // The cache never landed, but the authoritative link rows did.
  assert!(got.collection_ids.is_empty());
  assert_eq!(got.questions.len(), 2);
  let linked: Vec<&str> = got.questions[0].answers[0]
    .collections
    .iter()
    .filter_map(|c| c.id.as_deref())
    .collect();
  assert_eq!(linked, vec!["gid://shopify/Collection/2", "gid://shopify/Collection/1"]);
  assert_eq!(s.inner.count_answers(id).await.unwrap(), 5);
}

#[tokio::test]
async fn count_failure_degrades_to_zero() {
  let s = Faulty::new(store().await);
  let acme = shop("acme");
  let broken = engine::create_quiz(&s, &acme, payload(nested_payload())).await.unwrap();
  let healthy = engine::create_quiz(&s, &acme, payload(nested_payload())).await.unwrap();
  *s.fail_counts_for.lock().unwrap() = Some(broken);

  let items = engine::list_quizzes(&s, &acme).await.unwrap();
  assert_eq!(items.len(), 2);

  let counts = |id: Uuid| {
    let item = items.iter().find(|i| i.id == id.to_string()).unwrap();
    (item.question_count, item.answer_count)
  };
  assert_eq!(counts(broken), (0, 0));
  assert_eq!(counts(healthy), (2, 5));
}
