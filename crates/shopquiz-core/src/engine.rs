//! The persistence engine: ordered, non-transactional writes and reads of a
//! whole quiz graph over any [`QuizStore`].
//!
//! Every write step is its own store call and is checked before the next one
//! runs. The first failure aborts the operation and is returned; rows written
//! by earlier steps stay where they are, and reissuing the operation is the
//! recovery path. The one exception is the collection-id cache write-back at
//! the end of a write, whose failure is only logged.
//!
//! Client ids never reach storage. Each batch insert returns server ids in
//! input order, and the engine pairs them with the submitted rows by position
//! to resolve foreign keys for the next table down.

use std::collections::{BTreeSet, HashMap};

use futures_util::future::{join, join_all};
use uuid::Uuid;

use crate::{
  Error, Result,
  codec::{self, AnswerPayload, DecodedQuiz},
  editor::{EditorQuiz, QuizListItem},
  enrich::enrich_collections,
  platform::CommercePlatform,
  quiz::{CollectionLink, NewAnswer, NewCondition, NewQuestion, NewQuiz},
  shop::ShopDomain,
  store::QuizStore,
};

// ─── Create ──────────────────────────────────────────────────────────────────

/// Create a quiz graph for `shop` and return the new quiz id.
///
/// The payload is fully validated before the first write.
pub async fn create_quiz<S>(
  store:   &S,
  shop:    &ShopDomain,
  payload: EditorQuiz,
) -> Result<Uuid>
where
  S: QuizStore,
{
  let decoded = codec::decode(payload)?;

  let quiz = store
    .insert_quiz(NewQuiz {
      id:          Uuid::new_v4(),
      shop_domain: shop.clone(),
      fields:      decoded.quiz.clone(),
    })
    .await
    .map_err(|e| Error::store("insert quiz", e))?;

  write_descendants(store, quiz.id, decoded).await?;

  tracing::info!(%shop, quiz_id = %quiz.id, "quiz created");
  Ok(quiz.id)
}

// ─── Update ──────────────────────────────────────────────────────────────────

/// Replace a quiz graph wholesale.
///
/// Ownership is checked before the payload is validated, so another tenant's
/// quiz is `NotFound` whatever the body holds. The quiz row is updated in place; every question (and, by cascade, every
/// answer, condition and collection link) is deleted and rebuilt from
/// `payload`. Entities the client does not send back are gone afterwards. An
/// omitted style blob resets to [`codec::default_style`].
pub async fn update_quiz<S>(
  store:   &S,
  shop:    &ShopDomain,
  id:      Uuid,
  payload: EditorQuiz,
) -> Result<Uuid>
where
  S: QuizStore,
{
  store
    .get_quiz(id, shop.clone())
    .await
    .map_err(|e| Error::store("fetch quiz", e))?
    .ok_or(Error::NotFound)?;

  let decoded = codec::decode(payload)?;

  let updated = store
    .update_quiz(id, shop.clone(), decoded.quiz.clone())
    .await
    .map_err(|e| Error::store("update quiz", e))?;
  if !updated {
    return Err(Error::NotFound);
  }

  store
    .delete_questions(id)
    .await
    .map_err(|e| Error::store("delete questions", e))?;

  write_descendants(store, id, decoded).await?;

  tracing::info!(%shop, quiz_id = %id, "quiz updated");
  Ok(id)
}

// ─── Shared write path ───────────────────────────────────────────────────────

/// Insert questions, answers, conditions and collection links under an
/// existing quiz row, then refresh its collection-id cache.
async fn write_descendants<S>(store: &S, quiz_id: Uuid, decoded: DecodedQuiz) -> Result<()>
where
  S: QuizStore,
{
  let DecodedQuiz { questions, answers, .. } = decoded;

  // Questions, positioned 1..=N in submission order.
  let question_rows: Vec<NewQuestion> = questions
    .iter()
    .enumerate()
    .map(|(i, q)| NewQuestion { fields: q.fields.clone(), order_index: i as i64 + 1 })
    .collect();
  let question_ids = if question_rows.is_empty() {
    Vec::new()
  } else {
    store
      .insert_questions(quiz_id, question_rows)
      .await
      .map_err(|e| Error::store("insert questions", e))?
  };
  let question_map = correlate(
    "insert questions",
    questions.iter().map(|q| q.client_id.as_str()),
    &question_ids,
  )?;

  // Answers, positioned 1..=M within their question.
  let mut next_position: HashMap<i64, i64> = HashMap::new();
  let mut answer_rows = Vec::with_capacity(answers.len());
  for a in &answers {
    let question_id = *question_map.get(a.client_question_id.as_str()).ok_or_else(|| {
      Error::InvalidInput(format!("answer references unknown question {:?}", a.client_question_id))
    })?;
    let position = next_position.entry(question_id).or_insert(0);
    *position += 1;
    answer_rows.push(NewAnswer {
      question_id,
      fields: a.fields.clone(),
      order_index: *position,
    });
  }
  let answer_ids = if answer_rows.is_empty() {
    Vec::new()
  } else {
    store
      .insert_answers(answer_rows)
      .await
      .map_err(|e| Error::store("insert answers", e))?
  };
  check_count("insert answers", answers.len(), answer_ids.len())?;
  let answered: Vec<(&AnswerPayload, i64)> =
    answers.iter().zip(answer_ids.iter().copied()).collect();

  // Conditions.
  let mut condition_rows = Vec::new();
  for &(a, answer_id) in &answered {
    condition_rows.extend(
      a.conditions
        .iter()
        .cloned()
        .map(|fields| NewCondition { answer_id, fields }),
    );
  }
  if !condition_rows.is_empty() {
    store
      .insert_conditions(condition_rows)
      .await
      .map_err(|e| Error::store("insert conditions", e))?;
  }

  // Collection links, positioned within each answer's list.
  let mut link_rows  = Vec::new();
  let mut referenced = BTreeSet::new();
  for &(a, answer_id) in &answered {
    for (i, collection_id) in a.collections.iter().enumerate() {
      referenced.insert(collection_id.clone());
      link_rows.push(CollectionLink {
        answer_id,
        collection_id: collection_id.clone(),
        order_index: i as i64 + 1,
      });
    }
  }
  if !link_rows.is_empty() {
    store
      .insert_collection_links(link_rows)
      .await
      .map_err(|e| Error::store("insert collection links", e))?;
  }

  // Cache write-back; best-effort.
  if let Err(e) = store
    .set_quiz_collection_ids(quiz_id, referenced.into_iter().collect())
    .await
  {
    tracing::warn!(%quiz_id, error = %e, "failed to cache quiz collection ids");
  }

  Ok(())
}

/// Pair client ids with the server ids a batch insert returned, by position.
fn correlate<'a>(
  step:       &'static str,
  client_ids: impl ExactSizeIterator<Item = &'a str>,
  server_ids: &[i64],
) -> Result<HashMap<&'a str, i64>> {
  check_count(step, client_ids.len(), server_ids.len())?;
  Ok(client_ids.zip(server_ids.iter().copied()).collect())
}

fn check_count(step: &'static str, expected: usize, actual: usize) -> Result<()> {
  if expected != actual {
    return Err(Error::IdRemap { step, expected, actual });
  }
  Ok(())
}

// ─── Read ────────────────────────────────────────────────────────────────────

/// Read one quiz graph as the nested editor model.
///
/// Collection metadata comes from the platform when `access_token` is usable;
/// otherwise, or if the catalog call fails, collections carry placeholder
/// metadata. Enrichment never fails the read.
pub async fn read_quiz<S, P>(
  store:        &S,
  platform:     &P,
  shop:         &ShopDomain,
  access_token: Option<&str>,
  id:           Uuid,
) -> Result<EditorQuiz>
where
  S: QuizStore,
  P: CommercePlatform,
{
  let quiz = store
    .get_quiz(id, shop.clone())
    .await
    .map_err(|e| Error::store("fetch quiz", e))?
    .ok_or(Error::NotFound)?;

  let questions = store
    .list_questions(id)
    .await
    .map_err(|e| Error::store("fetch questions", e))?;

  let answers = if questions.is_empty() {
    Vec::new()
  } else {
    store
      .list_answers(questions.iter().map(|q| q.id).collect())
      .await
      .map_err(|e| Error::store("fetch answers", e))?
  };

  let referenced: BTreeSet<String> = answers
    .iter()
    .flat_map(|r| r.collections.iter().map(|l| l.collection_id.clone()))
    .collect();
  let collection_meta = enrich_collections(platform, shop, access_token, &referenced).await;

  Ok(codec::encode(&quiz, &questions, &answers, &collection_meta))
}

// ─── List ────────────────────────────────────────────────────────────────────

/// Summaries of every quiz of `shop` with question and answer counts.
///
/// Counts are fetched per quiz, concurrently. If either count for a quiz
/// fails, both of that quiz's counts are reported as zero.
pub async fn list_quizzes<S>(store: &S, shop: &ShopDomain) -> Result<Vec<QuizListItem>>
where
  S: QuizStore,
{
  let summaries = store
    .list_quizzes(shop.clone())
    .await
    .map_err(|e| Error::store("list quizzes", e))?;

  let items = join_all(summaries.into_iter().map(|s| async move {
    let (questions, answers) =
      join(store.count_questions(s.id), store.count_answers(s.id)).await;
    let (question_count, answer_count) = match (questions, answers) {
      (Ok(q), Ok(a)) => (q, a),
      (q, a) => {
        let error = q.err().or(a.err()).map(|e| e.to_string());
        tracing::warn!(quiz_id = %s.id, ?error, "count query failed; reporting zero");
        (0, 0)
      }
    };
    QuizListItem {
      id: s.id.to_string(),
      title: s.title,
      internal_title: s.internal_title,
      is_active: s.is_active,
      question_count,
      answer_count,
      created_at: s.created_at,
      updated_at: s.updated_at,
    }
  }))
  .await;

  Ok(items)
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// Delete a quiz and, by cascade, its whole graph.
pub async fn delete_quiz<S>(store: &S, shop: &ShopDomain, id: Uuid) -> Result<()>
where
  S: QuizStore,
{
  store
    .get_quiz(id, shop.clone())
    .await
    .map_err(|e| Error::store("fetch quiz", e))?
    .ok_or(Error::NotFound)?;

  let deleted = store
    .delete_quiz(id, shop.clone())
    .await
    .map_err(|e| Error::store("delete quiz", e))?;
  if !deleted {
    return Err(Error::NotFound);
  }

  tracing::info!(%shop, quiz_id = %id, "quiz deleted");
  Ok(())
}
