//! Core types and trait definitions for shopquiz.
//!
//! This crate is deliberately free of HTTP and database dependencies. It owns
//! the quiz graph model, the editor wire model and the codec between them, the
//! storage and platform traits, and the persistence engine that sequences
//! writes against any [`store::QuizStore`].

// Store and platform traits use native `async fn` with `Send` futures spelled
// out in the trait declarations.
#![allow(async_fn_in_trait)]

pub mod codec;
pub mod editor;
pub mod engine;
pub mod enrich;
pub mod error;
pub mod platform;
pub mod quiz;
pub mod shop;
pub mod store;

pub use error::{Error, Result};
