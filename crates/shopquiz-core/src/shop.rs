//! Shops: the tenant partition every quiz belongs to.

use std::{fmt, sync::LazyLock};

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Token value written by installs that never completed the code exchange.
/// It must never be sent upstream as a credential.
pub const PLACEHOLDER_ACCESS_TOKEN: &str = "placeholder";

static SHOP_DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^[a-z0-9][a-z0-9-]*\.myshopify\.com$")
    .expect("shop domain pattern is valid")
});

// ─── ShopDomain ──────────────────────────────────────────────────────────────

/// A validated tenant key such as `acme-outdoors.myshopify.com`.
///
/// Construction goes through [`ShopDomain::parse`], so holding one means the
/// value matched the strict domain pattern. It says nothing about whether the
/// shop is installed; pair it with a [`crate::store::ShopStore`] lookup
/// before trusting a request.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ShopDomain(String);

impl ShopDomain {
  /// Trim, lowercase and validate `candidate`. Returns `None` for anything
  /// that is not a `<name>.myshopify.com` domain.
  pub fn parse(candidate: &str) -> Option<Self> {
    let normalised = candidate.trim().to_ascii_lowercase();
    SHOP_DOMAIN_RE
      .is_match(&normalised)
      .then_some(Self(normalised))
  }

  /// Build the domain for a bare store handle (`acme` → `acme.myshopify.com`).
  pub fn from_store_name(name: &str) -> Option<Self> {
    Self::parse(&format!("{}.myshopify.com", name.trim()))
  }

  pub fn as_str(&self) -> &str { &self.0 }
}

impl fmt::Display for ShopDomain {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl TryFrom<String> for ShopDomain {
  type Error = String;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    Self::parse(&value).ok_or_else(|| format!("invalid shop domain: {value:?}"))
  }
}

impl From<ShopDomain> for String {
  fn from(d: ShopDomain) -> Self { d.0 }
}

// ─── Shop ────────────────────────────────────────────────────────────────────

/// One row of the `shops` table: the stored OAuth credential for a tenant.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shop {
  pub shop_domain:  ShopDomain,
  pub access_token: String,
  pub scope:        Option<String>,
  pub installed_at: DateTime<Utc>,
  pub updated_at:   DateTime<Utc>,
}

impl Shop {
  /// The access token, unless it is empty or the placeholder sentinel.
  pub fn usable_token(&self) -> Option<&str> {
    let token = self.access_token.trim();
    if token.is_empty() || token == PLACEHOLDER_ACCESS_TOKEN {
      None
    } else {
      Some(token)
    }
  }
}
