//! Error types for `shopquiz-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  /// The request payload lacks something the operation cannot proceed
  /// without.
  #[error("missing input: {0}")]
  MissingInput(String),

  /// The payload is present but malformed or internally inconsistent
  /// (non-object entities, mistyped fields, duplicate or dangling client ids).
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// No resolvable shop, or no usable access token for it.
  #[error("unauthenticated")]
  Unauthenticated,

  /// Absent, or owned by another shop. The two are deliberately the same.
  #[error("not found")]
  NotFound,

  /// A batch insert returned a different number of ids than rows submitted,
  /// so client ids cannot be mapped onto server ids.
  #[error("{step}: submitted {expected} rows but the store returned {actual} ids")]
  IdRemap {
    step:     &'static str,
    expected: usize,
    actual:   usize,
  },

  /// A datastore call failed. `step` names the persistence step that issued
  /// it; rows written by earlier steps are left in place.
  #[error("{step} failed: {source}")]
  Store {
    step:   &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl Error {
  /// Wrap a backend error, tagging it with the step that produced it.
  pub fn store<E>(step: &'static str, source: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store { step, source: Box::new(source) }
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
