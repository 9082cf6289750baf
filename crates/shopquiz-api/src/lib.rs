//! HTTP layer for shopquiz.
//!
//! Exposes an axum [`Router`] over any store implementing both
//! [`QuizStore`] and [`ShopStore`] and any [`CommercePlatform`].
//!
//! | Method   | Path                       | Auth |
//! |----------|----------------------------|------|
//! | `GET`    | `/api/quizzes`             | session |
//! | `POST`   | `/api/quizzes`             | session |
//! | `GET`    | `/api/quizzes/{id}`        | session |
//! | `PUT`    | `/api/quizzes/{id}`        | session |
//! | `DELETE` | `/api/quizzes/{id}`        | session |
//! | `GET`    | `/auth/callback`           | none |
//! | `GET`    | `/storefront/quizzes/{id}` | resolved shop |

pub mod auth;
pub mod error;
pub mod oauth;
pub mod quizzes;
pub mod shop_context;
pub mod storefront;

pub use error::ApiError;

use std::{path::PathBuf, sync::Arc};

use axum::{Router, routing::get};
use serde::Deserialize;
use shopquiz_core::{
  platform::CommercePlatform,
  store::{QuizStore, ShopStore},
};
use tower_http::trace::TraceLayer;

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_api_version() -> String { "2024-10".to_string() }

/// Runtime server configuration, deserialised from `config.toml` and
/// `SHOPQUIZ_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  pub host:        String,
  pub port:        u16,
  pub store_path:  PathBuf,
  pub api_key:     String,
  pub api_secret:  String,
  #[serde(default = "default_api_version")]
  pub api_version: String,
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S, P> {
  pub store:    Arc<S>,
  pub platform: Arc<P>,
}

impl<S, P> Clone for AppState<S, P> {
  fn clone(&self) -> Self {
    Self { store: self.store.clone(), platform: self.platform.clone() }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build the application [`Router`].
pub fn router<S, P>(state: AppState<S, P>) -> Router
where
  S: QuizStore + ShopStore + 'static,
  P: CommercePlatform + 'static,
{
  Router::new()
    .route(
      "/api/quizzes",
      get(quizzes::list::<S, P>).post(quizzes::create::<S, P>),
    )
    .route(
      "/api/quizzes/{id}",
      get(quizzes::get_one::<S, P>)
        .put(quizzes::update::<S, P>)
        .delete(quizzes::delete::<S, P>),
    )
    .route("/auth/callback", get(oauth::callback::<S, P>))
    .route("/storefront/quizzes/{id}", get(storefront::get_one::<S, P>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ───────────────────────────────────────────────────────
