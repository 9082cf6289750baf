//! Storage-side types for the quiz graph.
//!
//! These mirror the normalised rows in the `quizzes`, `questions`, `answers`,
//! `metafield_conditions` and `answer_collections` tables. The nested shape the
//! editor works with lives in [`crate::editor`]; [`crate::codec`] translates
//! between the two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shop::ShopDomain;

// ─── Quiz ────────────────────────────────────────────────────────────────────

/// The editable, tenant-independent columns of a quiz row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizFields {
  pub title:                String,
  pub internal_title:       Option<String>,
  pub internal_description: Option<String>,
  pub image_url:            Option<String>,
  pub is_active:            bool,
  /// Opaque style blob owned by the editor; stored verbatim.
  pub style_settings:       serde_json::Value,
}

/// A `quizzes` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
  pub id:             Uuid,
  /// Tenant key; never changes after insert.
  pub shop_domain:    ShopDomain,
  pub fields:         QuizFields,
  /// Denormalised union of every collection id referenced by the quiz's
  /// answers. A cache only; the `answer_collections` rows are authoritative.
  pub collection_ids: Vec<String>,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

/// Input to [`crate::store::QuizStore::insert_quiz`]. The store sets the
/// timestamps.
#[derive(Debug, Clone)]
pub struct NewQuiz {
  pub id:          Uuid,
  pub shop_domain: ShopDomain,
  pub fields:      QuizFields,
}

/// Summary columns returned by [`crate::store::QuizStore::list_quizzes`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizSummary {
  pub id:             Uuid,
  pub title:          String,
  pub internal_title: Option<String>,
  pub is_active:      bool,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}

// ─── Question ────────────────────────────────────────────────────────────────

/// The content columns of a question row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionFields {
  pub text:           String,
  pub image_url:      Option<String>,
  /// Show answer images in the widget.
  pub show_images:    bool,
  /// Shopper may select more than one answer.
  pub allow_multiple: bool,
}

/// A `questions` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
  pub id:          i64,
  pub quiz_id:     Uuid,
  pub fields:      QuestionFields,
  /// 1-based; contiguous within the quiz.
  pub order_index: i64,
}

/// Input row for [`crate::store::QuizStore::insert_questions`].
#[derive(Debug, Clone)]
pub struct NewQuestion {
  pub fields:      QuestionFields,
  pub order_index: i64,
}

// ─── Answer ──────────────────────────────────────────────────────────────────

/// The content columns of an answer row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerFields {
  pub text:          String,
  pub image_url:     Option<String>,
  pub redirect_url:  Option<String>,
  pub redirect_type: Option<String>,
  pub weight:        i64,
  pub is_default:    bool,
}

/// An `answers` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
  pub id:          i64,
  pub question_id: i64,
  pub fields:      AnswerFields,
  /// 1-based; contiguous within the owning question.
  pub order_index: i64,
}

/// Input row for [`crate::store::QuizStore::insert_answers`].
#[derive(Debug, Clone)]
pub struct NewAnswer {
  pub question_id: i64,
  pub fields:      AnswerFields,
  pub order_index: i64,
}

// ─── Metafield conditions ────────────────────────────────────────────────────

/// Comparison applied to a product metafield downstream. Never evaluated here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
  #[default]
  Equals,
  NotEquals,
}

impl ConditionOperator {
  pub fn as_str(self) -> &'static str {
    match self {
      Self::Equals => "equals",
      Self::NotEquals => "not_equals",
    }
  }

  pub fn parse(s: &str) -> Option<Self> {
    match s {
      "equals" => Some(Self::Equals),
      "not_equals" => Some(Self::NotEquals),
      _ => None,
    }
  }
}

/// The rule columns of a `metafield_conditions` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionFields {
  pub namespace:      String,
  pub key:            String,
  pub display_name:   Option<String>,
  pub metafield_type: Option<String>,
  pub operator:       ConditionOperator,
  pub value:          String,
  pub weight:         i64,
}

/// A `metafield_conditions` row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetafieldCondition {
  pub id:        i64,
  pub answer_id: i64,
  pub fields:    ConditionFields,
}

/// Input row for [`crate::store::QuizStore::insert_conditions`].
#[derive(Debug, Clone)]
pub struct NewCondition {
  pub answer_id: i64,
  pub fields:    ConditionFields,
}

// ─── Collection associations ─────────────────────────────────────────────────

/// An `answer_collections` row. Also the insert shape: the table has no
/// surrogate key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionLink {
  pub answer_id:     i64,
  /// Platform id of a collection owned by the external catalog.
  pub collection_id: String,
  /// 1-based position within the answer's collection list.
  pub order_index:   i64,
}

// ─── Joined read model ───────────────────────────────────────────────────────

/// An answer together with its condition and collection sub-rows, as returned
/// by [`crate::store::QuizStore::list_answers`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
  pub answer:      Answer,
  pub conditions:  Vec<MetafieldCondition>,
  /// Ordered by `order_index`.
  pub collections: Vec<CollectionLink>,
}
