//! [`SqliteStore`]: the SQLite implementation of [`QuizStore`] and
//! [`ShopStore`].
//!
//! Each trait method is one `Connection::call`. Multi-row inserts run row by
//! row inside that call and return rowids in input order.

use std::{collections::HashMap, path::Path};

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use shopquiz_core::{
  quiz::{
    AnswerRecord, CollectionLink, NewAnswer, NewCondition, NewQuestion, NewQuiz,
    Question, Quiz, QuizFields, QuizSummary,
  },
  shop::{Shop, ShopDomain},
  store::{QuizStore, ShopStore},
};

use crate::{
  encode::{
    QUIZ_COLUMNS, RawCondition, RawQuestion, RawQuiz, RawQuizSummary, RawShop,
    answer_from_row, encode_dt, encode_ids, encode_style, encode_uuid, link_from_row,
  },
  schema::SCHEMA,
  Result,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// Quiz and shop storage backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

/// `?, ?, …` with `n` placeholders.
fn placeholders(n: usize) -> String { vec!["?"; n].join(", ") }

// ─── QuizStore impl ──────────────────────────────────────────────────────────

impl QuizStore for SqliteStore {
  type Error = crate::Error;

  // ── Quizzes ───────────────────────────────────────────────────────────────

  async fn insert_quiz(&self, quiz: NewQuiz) -> Result<Quiz> {
    let now = Utc::now();

    let id_str    = encode_uuid(quiz.id);
    let shop_str  = quiz.shop_domain.as_str().to_owned();
    let style_str = encode_style(&quiz.fields.style_settings)?;
    let now_str   = encode_dt(now);
    let fields    = quiz.fields.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO quizzes (
             id, shop_domain, title, internal_title, internal_description,
             image_url, is_active, style_settings, collection_ids,
             created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, '[]', ?9, ?9)",
          rusqlite::params![
            id_str,
            shop_str,
            fields.title,
            fields.internal_title,
            fields.internal_description,
            fields.image_url,
            fields.is_active,
            style_str,
            now_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(Quiz {
      id:             quiz.id,
      shop_domain:    quiz.shop_domain,
      fields:         quiz.fields,
      collection_ids: Vec::new(),
      created_at:     now,
      updated_at:     now,
    })
  }

  async fn get_quiz(&self, id: Uuid, shop: ShopDomain) -> Result<Option<Quiz>> {
    let id_str   = encode_uuid(id);
    let shop_str = shop.as_str().to_owned();

    let raw: Option<RawQuiz> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            &format!("SELECT {QUIZ_COLUMNS} FROM quizzes WHERE id = ?1 AND shop_domain = ?2"),
            rusqlite::params![id_str, shop_str],
            RawQuiz::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawQuiz::into_quiz).transpose()
  }

  async fn update_quiz(&self, id: Uuid, shop: ShopDomain, fields: QuizFields) -> Result<bool> {
    let id_str    = encode_uuid(id);
    let shop_str  = shop.as_str().to_owned();
    let style_str = encode_style(&fields.style_settings)?;
    let now_str   = encode_dt(Utc::now());

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE quizzes
              SET title = ?3, internal_title = ?4, internal_description = ?5,
                  image_url = ?6, is_active = ?7, style_settings = ?8,
                  updated_at = ?9
            WHERE id = ?1 AND shop_domain = ?2",
          rusqlite::params![
            id_str,
            shop_str,
            fields.title,
            fields.internal_title,
            fields.internal_description,
            fields.image_url,
            fields.is_active,
            style_str,
            now_str,
          ],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn set_quiz_collection_ids(&self, id: Uuid, collection_ids: Vec<String>) -> Result<()> {
    let id_str  = encode_uuid(id);
    let ids_str = encode_ids(&collection_ids)?;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "UPDATE quizzes SET collection_ids = ?2 WHERE id = ?1",
          rusqlite::params![id_str, ids_str],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn delete_quiz(&self, id: Uuid, shop: ShopDomain) -> Result<bool> {
    let id_str   = encode_uuid(id);
    let shop_str = shop.as_str().to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM quizzes WHERE id = ?1 AND shop_domain = ?2",
          rusqlite::params![id_str, shop_str],
        )?)
      })
      .await?;

    Ok(changed > 0)
  }

  async fn list_quizzes(&self, shop: ShopDomain) -> Result<Vec<QuizSummary>> {
    let shop_str = shop.as_str().to_owned();

    let raws: Vec<RawQuizSummary> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, title, internal_title, is_active, created_at, updated_at
             FROM quizzes
            WHERE shop_domain = ?1
            ORDER BY created_at DESC, rowid DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![shop_str], |row| {
            Ok(RawQuizSummary {
              id:             row.get(0)?,
              title:          row.get(1)?,
              internal_title: row.get(2)?,
              is_active:      row.get(3)?,
              created_at:     row.get(4)?,
              updated_at:     row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQuizSummary::into_summary).collect()
  }

  async fn count_questions(&self, quiz_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(quiz_id);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM questions WHERE quiz_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(n.max(0) as u64)
  }

  async fn count_answers(&self, quiz_id: Uuid) -> Result<u64> {
    let id_str = encode_uuid(quiz_id);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*)
             FROM answers a
             JOIN questions q ON q.id = a.question_id
            WHERE q.quiz_id = ?1",
          rusqlite::params![id_str],
          |r| r.get(0),
        )?)
      })
      .await?;

    Ok(n.max(0) as u64)
  }

  // ── Questions ─────────────────────────────────────────────────────────────

  async fn insert_questions(&self, quiz_id: Uuid, rows: Vec<NewQuestion>) -> Result<Vec<i64>> {
    let id_str = encode_uuid(quiz_id);

    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "INSERT INTO questions (
             quiz_id, question_text, image_url, show_images, allow_multiple, order_index
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
          ids.push(stmt.insert(rusqlite::params![
            id_str,
            row.fields.text,
            row.fields.image_url,
            row.fields.show_images,
            row.fields.allow_multiple,
            row.order_index,
          ])?);
        }
        Ok(ids)
      })
      .await?;

    Ok(ids)
  }

  async fn delete_questions(&self, quiz_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(quiz_id);

    self
      .conn
      .call(move |conn| {
        conn.execute("DELETE FROM questions WHERE quiz_id = ?1", rusqlite::params![id_str])?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn list_questions(&self, quiz_id: Uuid) -> Result<Vec<Question>> {
    let id_str = encode_uuid(quiz_id);

    let raws: Vec<RawQuestion> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, quiz_id, question_text, image_url, show_images, allow_multiple, order_index
             FROM questions
            WHERE quiz_id = ?1
            ORDER BY order_index, id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| {
            Ok(RawQuestion {
              id:             row.get(0)?,
              quiz_id:        row.get(1)?,
              text:           row.get(2)?,
              image_url:      row.get(3)?,
              show_images:    row.get(4)?,
              allow_multiple: row.get(5)?,
              order_index:    row.get(6)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawQuestion::into_question).collect()
  }

  // ── Answers and sub-rows ──────────────────────────────────────────────────

  async fn insert_answers(&self, rows: Vec<NewAnswer>) -> Result<Vec<i64>> {
    let ids = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "INSERT INTO answers (
             question_id, answer_text, image_url, redirect_url, redirect_type,
             order_index, weight, is_default
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
          ids.push(stmt.insert(rusqlite::params![
            row.question_id,
            row.fields.text,
            row.fields.image_url,
            row.fields.redirect_url,
            row.fields.redirect_type,
            row.order_index,
            row.fields.weight,
            row.fields.is_default,
          ])?);
        }
        Ok(ids)
      })
      .await?;

    Ok(ids)
  }

  async fn list_answers(&self, question_ids: Vec<i64>) -> Result<Vec<AnswerRecord>> {
    if question_ids.is_empty() {
      return Ok(Vec::new());
    }

    let (answers, raw_conditions, links) = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT a.id, a.question_id, a.answer_text, a.image_url, a.redirect_url,
                  a.redirect_type, a.order_index, a.weight, a.is_default
             FROM answers a
             JOIN questions q ON q.id = a.question_id
            WHERE a.question_id IN ({})
            ORDER BY q.order_index, q.id, a.order_index, a.id",
          placeholders(question_ids.len()),
        ))?;
        let answers = stmt
          .query_map(rusqlite::params_from_iter(question_ids.iter()), answer_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        if answers.is_empty() {
          return Ok((answers, Vec::new(), Vec::new()));
        }
        let answer_ids: Vec<i64> = answers.iter().map(|a| a.id).collect();

        let mut stmt = conn.prepare(&format!(
          "SELECT id, answer_id, namespace, key, display_name, metafield_type,
                  operator, value, weight
             FROM metafield_conditions
            WHERE answer_id IN ({})
            ORDER BY id",
          placeholders(answer_ids.len()),
        ))?;
        let conditions = stmt
          .query_map(rusqlite::params_from_iter(answer_ids.iter()), |row| {
            Ok(RawCondition {
              id:             row.get(0)?,
              answer_id:      row.get(1)?,
              namespace:      row.get(2)?,
              key:            row.get(3)?,
              display_name:   row.get(4)?,
              metafield_type: row.get(5)?,
              operator:       row.get(6)?,
              value:          row.get(7)?,
              weight:         row.get(8)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(&format!(
          "SELECT answer_id, external_collection_id, order_index
             FROM answer_collections
            WHERE answer_id IN ({})
            ORDER BY answer_id, order_index",
          placeholders(answer_ids.len()),
        ))?;
        let links = stmt
          .query_map(rusqlite::params_from_iter(answer_ids.iter()), link_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((answers, conditions, links))
      })
      .await?;

    let mut conditions_by_answer: HashMap<i64, Vec<_>> = HashMap::new();
    for raw in raw_conditions {
      let condition = raw.into_condition()?;
      conditions_by_answer.entry(condition.answer_id).or_default().push(condition);
    }

    let mut links_by_answer: HashMap<i64, Vec<CollectionLink>> = HashMap::new();
    for link in links {
      links_by_answer.entry(link.answer_id).or_default().push(link);
    }

    Ok(
      answers
        .into_iter()
        .map(|answer| AnswerRecord {
          conditions:  conditions_by_answer.remove(&answer.id).unwrap_or_default(),
          collections: links_by_answer.remove(&answer.id).unwrap_or_default(),
          answer,
        })
        .collect(),
    )
  }

  async fn insert_conditions(&self, rows: Vec<NewCondition>) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "INSERT INTO metafield_conditions (
             answer_id, namespace, key, display_name, metafield_type,
             operator, value, weight
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for row in rows {
          stmt.execute(rusqlite::params![
            row.answer_id,
            row.fields.namespace,
            row.fields.key,
            row.fields.display_name,
            row.fields.metafield_type,
            row.fields.operator.as_str(),
            row.fields.value,
            row.fields.weight,
          ])?;
        }
        Ok(())
      })
      .await?;
    Ok(())
  }

  async fn insert_collection_links(&self, rows: Vec<CollectionLink>) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "INSERT INTO answer_collections (answer_id, external_collection_id, order_index)
           VALUES (?1, ?2, ?3)",
        )?;
        for row in rows {
          stmt.execute(rusqlite::params![row.answer_id, row.collection_id, row.order_index])?;
        }
        Ok(())
      })
      .await?;
    Ok(())
  }
}

// ─── ShopStore impl ──────────────────────────────────────────────────────────

impl ShopStore for SqliteStore {
  type Error = crate::Error;

  async fn get_shop(&self, shop: ShopDomain) -> Result<Option<Shop>> {
    let shop_str = shop.as_str().to_owned();

    let raw: Option<RawShop> = self
      .conn
      .call(move |conn| {
        Ok(conn
          .query_row(
            "SELECT shop_domain, access_token, scope, installed_at, updated_at
               FROM shops WHERE shop_domain = ?1",
            rusqlite::params![shop_str],
            RawShop::from_row,
          )
          .optional()?)
      })
      .await?;

    raw.map(RawShop::into_shop).transpose()
  }

  async fn upsert_shop(
    &self,
    shop: ShopDomain,
    access_token: String,
    scope: Option<String>,
  ) -> Result<Shop> {
    let shop_str = shop.as_str().to_owned();
    let now_str  = encode_dt(Utc::now());

    let raw: RawShop = self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO shops (shop_domain, access_token, scope, installed_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)
           ON CONFLICT(shop_domain) DO UPDATE
              SET access_token = excluded.access_token,
                  scope        = excluded.scope,
                  updated_at   = excluded.updated_at",
          rusqlite::params![shop_str, access_token, scope, now_str],
        )?;
        Ok(conn.query_row(
          "SELECT shop_domain, access_token, scope, installed_at, updated_at
             FROM shops WHERE shop_domain = ?1",
          rusqlite::params![shop_str],
          RawShop::from_row,
        )?)
      })
      .await?;

    raw.into_shop()
  }
}
