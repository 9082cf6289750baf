//! Translation between the nested editor model and normalised storage rows.
//!
//! [`decode`] flattens an [`EditorQuiz`] into row payloads. Questions are
//! keyed by the editor's client ids; answers carry their own conditions and
//! collection ids and are matched to server ids by position.
//! [`encode`] rebuilds the nested model from stored rows plus enriched
//! collection metadata.

use std::collections::{HashMap, HashSet};

use serde_json::json;

use crate::{
  Error, Result,
  editor::{
    EditorAnswer, EditorCollection, EditorCondition, EditorMetafield,
    EditorQuestion, EditorQuiz,
  },
  enrich::{CollectionIndex, placeholder},
  quiz::{
    AnswerFields, AnswerRecord, ConditionFields, Question, QuestionFields,
    Quiz, QuizFields,
  },
};

// ─── Default style ───────────────────────────────────────────────────────────

/// The style record used whenever a quiz has none of its own. Always applied
/// wholesale; it is never merged into a partial blob.
pub fn default_style() -> serde_json::Value {
  json!({
    "primaryColor":    "#000000",
    "secondaryColor":  "#ffffff",
    "backgroundColor": "#ffffff",
    "textColor":       "#1a1a1a",
    "fontFamily":      "inherit",
    "buttonStyle":     "rounded",
    "showProgressBar": true,
    "layout":          "centered"
  })
}

// ─── Decode ──────────────────────────────────────────────────────────────────

/// A question row payload, still carrying the editor's id.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionPayload {
  pub client_id: String,
  pub fields:    QuestionFields,
}

/// An answer row payload tagged with the client id of its question, along
/// with the rows that hang off it.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerPayload {
  /// `None` when the editor sent no id.
  pub client_id:          Option<String>,
  pub client_question_id: String,
  pub fields:             AnswerFields,
  /// Usable conditions, in submission order.
  pub conditions:         Vec<ConditionFields>,
  /// Collection ids, in submission order.
  pub collections:        Vec<String>,
}

/// Everything needed to write one quiz graph, in write order.
#[derive(Debug, Clone)]
pub struct DecodedQuiz {
  pub quiz:        QuizFields,
  /// In submission order.
  pub questions:   Vec<QuestionPayload>,
  /// Grouped by question in question order; submission order within each
  /// question.
  pub answers:     Vec<AnswerPayload>,
}

fn non_empty(s: Option<&str>) -> Option<&str> {
  s.map(str::trim).filter(|s| !s.is_empty())
}

/// Flatten an editor payload into storage payloads.
///
/// Answers may arrive nested under their question or flat at the top level
/// with a `questionId`. Conditions without a metafield or value, and
/// collection entries without an id, are dropped here.
pub fn decode(payload: EditorQuiz) -> Result<DecodedQuiz> {
  if payload.title.trim().is_empty() {
    return Err(Error::MissingInput("title".to_string()));
  }

  let quiz = QuizFields {
    title:                payload.title,
    internal_title:       payload.internal_title,
    internal_description: payload.internal_description,
    image_url:            payload.image_url,
    is_active:            payload.is_active,
    style_settings:       payload
      .style_settings
      .filter(|s| !s.is_null())
      .unwrap_or_else(default_style),
  };

  // Questions, and the answers bucketed under each.
  let mut questions = Vec::with_capacity(payload.questions.len());
  let mut buckets: Vec<Vec<EditorAnswer>> = Vec::with_capacity(payload.questions.len());
  let mut position: HashMap<String, usize> = HashMap::new();

  for (i, q) in payload.questions.into_iter().enumerate() {
    let EditorQuestion { id, text, image_url, show_images, allow_multiple, answers } = q;
    let client_id = id.trim().to_string();
    if client_id.is_empty() {
      return Err(Error::MissingInput(format!("questions[{i}].id")));
    }
    if position.insert(client_id.clone(), i).is_some() {
      return Err(Error::InvalidInput(format!("duplicate question id {client_id:?}")));
    }
    questions.push(QuestionPayload {
      client_id,
      fields: QuestionFields { text, image_url, show_images, allow_multiple },
    });
    buckets.push(answers);
  }

  for (i, a) in payload.answers.into_iter().enumerate() {
    let question_id = non_empty(a.question_id.as_deref())
      .ok_or_else(|| Error::MissingInput(format!("answers[{i}].questionId")))?;
    let slot = *position.get(question_id).ok_or_else(|| {
      Error::InvalidInput(format!("answers[{i}] references unknown question {question_id:?}"))
    })?;
    buckets[slot].push(a);
  }

  // Flatten.
  let mut answers = Vec::new();
  let mut seen    = HashSet::new();

  for (question, bucket) in questions.iter().zip(buckets) {
    for a in bucket {
      // Only ids the editor actually sent take part in the duplicate check.
      let client_id = non_empty(a.id.as_deref()).map(str::to_string);
      if let Some(id) = &client_id {
        if !seen.insert(id.clone()) {
          return Err(Error::InvalidInput(format!("duplicate answer id {id:?}")));
        }
      }

      let conditions = a.conditions.into_iter().filter_map(decode_condition).collect();
      let collections = a
        .collections
        .into_iter()
        .filter_map(|c| non_empty(c.id.as_deref()).map(str::to_string))
        .collect();

      answers.push(AnswerPayload {
        client_id,
        client_question_id: question.client_id.clone(),
        fields: AnswerFields {
          text:          a.text,
          image_url:     a.image_url,
          redirect_url:  a.redirect_url,
          redirect_type: a.redirect_type,
          weight:        a.weight,
          is_default:    a.is_default,
        },
        conditions,
        collections,
      });
    }
  }

  Ok(DecodedQuiz { quiz, questions, answers })
}

/// `None` for conditions lacking a metafield (namespace and key) or a value.
fn decode_condition(c: EditorCondition) -> Option<ConditionFields> {
  let metafield = c.metafield?;
  let namespace = non_empty(Some(metafield.namespace.as_str()))?.to_string();
  let key       = non_empty(Some(metafield.key.as_str()))?.to_string();
  let value     = non_empty(c.value.as_deref())?.to_string();
  Some(ConditionFields {
    namespace,
    key,
    display_name: metafield.name,
    metafield_type: metafield.kind,
    operator: c.operator,
    value,
    weight: c.weight,
  })
}

// ─── Encode ──────────────────────────────────────────────────────────────────

/// Rebuild the nested editor model.
///
/// `questions` and `answers` are expected in order-index order, as the store
/// returns them. Answers are nested under their question and carry the
/// question's server id in `questionId`. Answers whose question is not in
/// `questions` are dropped. Collections missing from `collection_meta` get
/// placeholder metadata.
pub fn encode(
  quiz:            &Quiz,
  questions:       &[Question],
  answers:         &[AnswerRecord],
  collection_meta: &CollectionIndex,
) -> EditorQuiz {
  let mut by_question: HashMap<i64, Vec<EditorAnswer>> = HashMap::new();
  for record in answers {
    by_question
      .entry(record.answer.question_id)
      .or_default()
      .push(encode_answer(record, collection_meta));
  }

  let style = if quiz.fields.style_settings.is_null() {
    default_style()
  } else {
    quiz.fields.style_settings.clone()
  };

  EditorQuiz {
    id:                   Some(quiz.id.to_string()),
    title:                quiz.fields.title.clone(),
    internal_title:       quiz.fields.internal_title.clone(),
    internal_description: quiz.fields.internal_description.clone(),
    image_url:            quiz.fields.image_url.clone(),
    is_active:            quiz.fields.is_active,
    style_settings:       Some(style),
    collection_ids:       quiz.collection_ids.clone(),
    created_at:           Some(quiz.created_at),
    updated_at:           Some(quiz.updated_at),
    questions:            questions
      .iter()
      .map(|q| EditorQuestion {
        id:             q.id.to_string(),
        text:           q.fields.text.clone(),
        image_url:      q.fields.image_url.clone(),
        show_images:    q.fields.show_images,
        allow_multiple: q.fields.allow_multiple,
        answers:        by_question.remove(&q.id).unwrap_or_default(),
      })
      .collect(),
    answers:              Vec::new(),
  }
}

fn encode_answer(record: &AnswerRecord, collection_meta: &CollectionIndex) -> EditorAnswer {
  let a = &record.answer;
  EditorAnswer {
    id:            Some(a.id.to_string()),
    question_id:   Some(a.question_id.to_string()),
    text:          a.fields.text.clone(),
    image_url:     a.fields.image_url.clone(),
    redirect_url:  a.fields.redirect_url.clone(),
    redirect_type: a.fields.redirect_type.clone(),
    weight:        a.fields.weight,
    is_default:    a.fields.is_default,
    conditions:    record
      .conditions
      .iter()
      .map(|c| EditorCondition {
        id:        Some(c.id.to_string()),
        metafield: Some(EditorMetafield {
          namespace: c.fields.namespace.clone(),
          key:       c.fields.key.clone(),
          name:      c.fields.display_name.clone(),
          kind:      c.fields.metafield_type.clone(),
        }),
        operator:  c.fields.operator,
        value:     Some(c.fields.value.clone()),
        weight:    c.fields.weight,
      })
      .collect(),
    collections:   record
      .collections
      .iter()
      .map(|link| {
        let meta = collection_meta
          .get(&link.collection_id)
          .cloned()
          .unwrap_or_else(|| placeholder(&link.collection_id));
        EditorCollection {
          id:          Some(meta.id),
          title:       Some(meta.title),
          handle:      meta.handle,
          description: meta.description,
        }
      })
      .collect(),
  }
}
