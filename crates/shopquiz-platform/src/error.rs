//! Error type for `shopquiz-platform`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("http error: {0}")]
  Http(#[from] reqwest::Error),

  #[error("invalid endpoint url: {0}")]
  Url(#[from] url::ParseError),

  #[error("{endpoint} returned {status}: {body}")]
  Status {
    endpoint: &'static str,
    status:   u16,
    body:     String,
  },

  #[error("graphql error: {0}")]
  GraphQl(String),

  #[error("invalid response: {0}")]
  InvalidResponse(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
