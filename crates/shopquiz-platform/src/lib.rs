//! HTTP client for the e-commerce platform's Admin API.
//!
//! Implements [`shopquiz_core::platform::CommercePlatform`]: the OAuth
//! authorization-code exchange and the batched collection lookup used for
//! enrichment.

mod client;
mod graphql;

pub mod error;

pub use client::{PlatformConfig, ShopifyClient};
pub use error::{Error, Result};
