//! Encoding and decoding helpers between the core row types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings in UTC with microsecond precision, so they
//! sort lexically. UUIDs are hyphenated lowercase strings. The style blob and
//! the collection-id cache are compact JSON.

use chrono::{DateTime, SecondsFormat, Utc};
use shopquiz_core::{
  quiz::{
    Answer, AnswerFields, CollectionLink, ConditionFields, ConditionOperator,
    MetafieldCondition, Question, QuestionFields, Quiz, QuizFields, QuizSummary,
  },
  shop::{Shop, ShopDomain},
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_shop(s: String) -> Result<ShopDomain> {
  ShopDomain::parse(&s).ok_or(Error::ShopDomain(s))
}

/// A JSON `null` style blob is stored as SQL `NULL`.
pub fn encode_style(style: &serde_json::Value) -> Result<Option<String>> {
  if style.is_null() {
    Ok(None)
  } else {
    Ok(Some(serde_json::to_string(style)?))
  }
}

pub fn decode_style(s: Option<&str>) -> Result<serde_json::Value> {
  match s {
    Some(s) => Ok(serde_json::from_str(s)?),
    None => Ok(serde_json::Value::Null),
  }
}

pub fn encode_ids(ids: &[String]) -> Result<String> { Ok(serde_json::to_string(ids)?) }

pub fn decode_ids(s: &str) -> Result<Vec<String>> { Ok(serde_json::from_str(s)?) }

pub fn decode_operator(s: &str) -> Result<ConditionOperator> {
  ConditionOperator::parse(s).ok_or_else(|| Error::UnknownOperator(s.to_owned()))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Column list matching [`RawQuiz`]'s field order.
pub const QUIZ_COLUMNS: &str = "id, shop_domain, title, internal_title, internal_description,
  image_url, is_active, style_settings, collection_ids, created_at, updated_at";

/// Raw values read directly from a `quizzes` row.
pub struct RawQuiz {
  pub id:                   String,
  pub shop_domain:          String,
  pub title:                String,
  pub internal_title:       Option<String>,
  pub internal_description: Option<String>,
  pub image_url:            Option<String>,
  pub is_active:            bool,
  pub style_settings:       Option<String>,
  pub collection_ids:       String,
  pub created_at:           String,
  pub updated_at:           String,
}

impl RawQuiz {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      id:                   row.get(0)?,
      shop_domain:          row.get(1)?,
      title:                row.get(2)?,
      internal_title:       row.get(3)?,
      internal_description: row.get(4)?,
      image_url:            row.get(5)?,
      is_active:            row.get(6)?,
      style_settings:       row.get(7)?,
      collection_ids:       row.get(8)?,
      created_at:           row.get(9)?,
      updated_at:           row.get(10)?,
    })
  }

  pub fn into_quiz(self) -> Result<Quiz> {
    Ok(Quiz {
      id:             decode_uuid(&self.id)?,
      shop_domain:    decode_shop(self.shop_domain)?,
      fields:         QuizFields {
        title:                self.title,
        internal_title:       self.internal_title,
        internal_description: self.internal_description,
        image_url:            self.image_url,
        is_active:            self.is_active,
        style_settings:       decode_style(self.style_settings.as_deref())?,
      },
      collection_ids: decode_ids(&self.collection_ids)?,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawQuizSummary {
  pub id:             String,
  pub title:          String,
  pub internal_title: Option<String>,
  pub is_active:      bool,
  pub created_at:     String,
  pub updated_at:     String,
}

impl RawQuizSummary {
  pub fn into_summary(self) -> Result<QuizSummary> {
    Ok(QuizSummary {
      id:             decode_uuid(&self.id)?,
      title:          self.title,
      internal_title: self.internal_title,
      is_active:      self.is_active,
      created_at:     decode_dt(&self.created_at)?,
      updated_at:     decode_dt(&self.updated_at)?,
    })
  }
}

pub struct RawQuestion {
  pub id:             i64,
  pub quiz_id:        String,
  pub text:           String,
  pub image_url:      Option<String>,
  pub show_images:    bool,
  pub allow_multiple: bool,
  pub order_index:    i64,
}

impl RawQuestion {
  pub fn into_question(self) -> Result<Question> {
    Ok(Question {
      id:          self.id,
      quiz_id:     decode_uuid(&self.quiz_id)?,
      fields:      QuestionFields {
        text:           self.text,
        image_url:      self.image_url,
        show_images:    self.show_images,
        allow_multiple: self.allow_multiple,
      },
      order_index: self.order_index,
    })
  }
}

/// Answers carry no encoded columns, so they decode straight from the row.
pub fn answer_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Answer> {
  Ok(Answer {
    id:          row.get(0)?,
    question_id: row.get(1)?,
    fields:      AnswerFields {
      text:          row.get(2)?,
      image_url:     row.get(3)?,
      redirect_url:  row.get(4)?,
      redirect_type: row.get(5)?,
      weight:        row.get(7)?,
      is_default:    row.get(8)?,
    },
    order_index: row.get(6)?,
  })
}

pub fn link_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<CollectionLink> {
  Ok(CollectionLink {
    answer_id:     row.get(0)?,
    collection_id: row.get(1)?,
    order_index:   row.get(2)?,
  })
}

pub struct RawCondition {
  pub id:             i64,
  pub answer_id:      i64,
  pub namespace:      String,
  pub key:            String,
  pub display_name:   Option<String>,
  pub metafield_type: Option<String>,
  pub operator:       String,
  pub value:          String,
  pub weight:         i64,
}

impl RawCondition {
  pub fn into_condition(self) -> Result<MetafieldCondition> {
    Ok(MetafieldCondition {
      id:        self.id,
      answer_id: self.answer_id,
      fields:    ConditionFields {
        namespace:      self.namespace,
        key:            self.key,
        display_name:   self.display_name,
        metafield_type: self.metafield_type,
        operator:       decode_operator(&self.operator)?,
        value:          self.value,
        weight:         self.weight,
      },
    })
  }
}

pub struct RawShop {
  pub shop_domain:  String,
  pub access_token: String,
  pub scope:        Option<String>,
  pub installed_at: String,
  pub updated_at:   String,
}

impl RawShop {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      shop_domain:  row.get(0)?,
      access_token: row.get(1)?,
      scope:        row.get(2)?,
      installed_at: row.get(3)?,
      updated_at:   row.get(4)?,
    })
  }

  pub fn into_shop(self) -> Result<Shop> {
    Ok(Shop {
      shop_domain:  decode_shop(self.shop_domain)?,
      access_token: self.access_token,
      scope:        self.scope,
      installed_at: decode_dt(&self.installed_at)?,
      updated_at:   decode_dt(&self.updated_at)?,
    })
  }
}
