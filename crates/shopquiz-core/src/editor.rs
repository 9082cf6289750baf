//! The nested JSON model exchanged with the quiz editor.
//!
//! Ids in this model are strings. On the way in they are transient client ids
//! (`"q1"`, `"tmp-3"`, …) that only correlate entities within one payload; on
//! the way out they are server ids rendered as strings. Storage internals such
//! as order indices and foreign keys never appear here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result, quiz::ConditionOperator};

fn default_weight() -> i64 { 1 }

/// A whole quiz graph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorQuiz {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub id:                   Option<String>,
  #[serde(default)]
  pub title:                String,
  #[serde(default)]
  pub internal_title:       Option<String>,
  #[serde(default)]
  pub internal_description: Option<String>,
  #[serde(default)]
  pub image_url:            Option<String>,
  #[serde(default)]
  pub is_active:            bool,
  #[serde(default)]
  pub style_settings:       Option<serde_json::Value>,
  /// Output only: the cached union of referenced collection ids.
  #[serde(default)]
  pub collection_ids:       Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub created_at:           Option<DateTime<Utc>>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub updated_at:           Option<DateTime<Utc>>,
  #[serde(default)]
  pub questions:            Vec<EditorQuestion>,
  /// Flat answers, each naming its question through `questionId`. Accepted on
  /// input alongside answers nested in [`EditorQuestion::answers`]; always
  /// empty on output.
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub answers:              Vec<EditorAnswer>,
}

impl EditorQuiz {
  /// Parse a request body into the editor model.
  ///
  /// The quiz and every nested question, answer, condition, metafield and
  /// collection must be a JSON object. Derived deserializers would otherwise
  /// read an array positionally into the struct fields.
  pub fn from_json(body: Value) -> Result<Self> {
    require_object(&body, "quiz")?;
    for (i, question) in entries(&body, "questions") {
      let path = format!("questions[{i}]");
      require_object(question, &path)?;
      require_answers(question, &format!("{path}."))?;
    }
    require_answers(&body, "")?;

    serde_json::from_value(body).map_err(|e| Error::InvalidInput(e.to_string()))
  }
}

fn entries<'a>(parent: &'a Value, key: &'static str) -> impl Iterator<Item = (usize, &'a Value)> {
  parent.get(key).and_then(Value::as_array).into_iter().flatten().enumerate()
}

fn require_object(value: &Value, path: &str) -> Result<()> {
  if value.is_object() {
    Ok(())
  } else {
    Err(Error::InvalidInput(format!("{path} must be an object")))
  }
}

fn require_answers(parent: &Value, prefix: &str) -> Result<()> {
  for (i, answer) in entries(parent, "answers") {
    let path = format!("{prefix}answers[{i}]");
    require_object(answer, &path)?;
    for (j, condition) in entries(answer, "conditions") {
      let path = format!("{path}.conditions[{j}]");
      require_object(condition, &path)?;
      if let Some(metafield) = condition.get("metafield").filter(|m| !m.is_null()) {
        require_object(metafield, &format!("{path}.metafield"))?;
      }
    }
    for (j, collection) in entries(answer, "collections") {
      require_object(collection, &format!("{path}.collections[{j}]"))?;
    }
  }
  Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorQuestion {
  #[serde(default)]
  pub id:             String,
  #[serde(default)]
  pub text:           String,
  #[serde(default)]
  pub image_url:      Option<String>,
  #[serde(default)]
  pub show_images:    bool,
  #[serde(default)]
  pub allow_multiple: bool,
  #[serde(default)]
  pub answers:        Vec<EditorAnswer>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorAnswer {
  #[serde(default)]
  pub id:            Option<String>,
  #[serde(default)]
  pub question_id:   Option<String>,
  #[serde(default)]
  pub text:          String,
  #[serde(default)]
  pub image_url:     Option<String>,
  #[serde(default)]
  pub redirect_url:  Option<String>,
  #[serde(default)]
  pub redirect_type: Option<String>,
  #[serde(default = "default_weight")]
  pub weight:        i64,
  #[serde(default)]
  pub is_default:    bool,
  #[serde(default)]
  pub conditions:    Vec<EditorCondition>,
  #[serde(default)]
  pub collections:   Vec<EditorCollection>,
}

impl Default for EditorAnswer {
  fn default() -> Self {
    Self {
      id:            None,
      question_id:   None,
      text:          String::new(),
      image_url:     None,
      redirect_url:  None,
      redirect_type: None,
      weight:        default_weight(),
      is_default:    false,
      conditions:    Vec::new(),
      collections:   Vec::new(),
    }
  }
}

/// The product metafield a condition inspects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorMetafield {
  pub namespace: String,
  pub key:       String,
  #[serde(default)]
  pub name:      Option<String>,
  #[serde(default, rename = "type")]
  pub kind:      Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorCondition {
  #[serde(default)]
  pub id:        Option<String>,
  #[serde(default)]
  pub metafield: Option<EditorMetafield>,
  #[serde(default)]
  pub operator:  ConditionOperator,
  #[serde(default)]
  pub value:     Option<String>,
  #[serde(default = "default_weight")]
  pub weight:    i64,
}

/// A collection reference. Only `id` is meaningful on input; the display
/// fields are filled from the catalog on output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditorCollection {
  #[serde(default)]
  pub id:          Option<String>,
  #[serde(default)]
  pub title:       Option<String>,
  #[serde(default)]
  pub handle:      Option<String>,
  #[serde(default)]
  pub description: Option<String>,
}

/// One row of `GET /api/quizzes`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizListItem {
  pub id:             String,
  pub title:          String,
  pub internal_title: Option<String>,
  pub is_active:      bool,
  pub question_count: u64,
  pub answer_count:   u64,
  pub created_at:     DateTime<Utc>,
  pub updated_at:     DateTime<Utc>,
}
