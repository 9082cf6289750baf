//! Tenant resolution: which shop is this request for?
//!
//! Strategies are tried in a fixed order and the first candidate that passes
//! [`ShopDomain::parse`] wins; malformed candidates are skipped. The result is
//! a hint only. Pair it with a [`shopquiz_core::store::ShopStore`] lookup (see
//! [`crate::auth::ShopSession`]) before treating the request as authenticated.

use std::sync::LazyLock;

use axum::{
  extract::FromRequestParts,
  http::{HeaderMap, header, request::Parts},
};
use axum_extra::extract::CookieJar;
use base64::{
  Engine as _,
  engine::general_purpose::{STANDARD, STANDARD_NO_PAD, URL_SAFE, URL_SAFE_NO_PAD},
};
use regex::Regex;
use shopquiz_core::shop::ShopDomain;
use url::{Url, form_urlencoded};

use crate::error::ApiError;

pub const PRIMARY_COOKIE: &str = "shopify_shop";
pub const SECONDARY_COOKIE: &str = "shop";
pub const SHOP_HEADER: &str = "x-shopify-shop-domain";

static ADMIN_STORE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"admin\.shopify\.com/store/([a-z0-9][a-z0-9-]*)")
    .expect("admin store pattern is valid")
});

static MYSHOPIFY_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"([a-z0-9][a-z0-9-]*\.myshopify\.com)")
    .expect("myshopify pattern is valid")
});

/// Which strategy produced the tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShopSource {
  PrimaryCookie,
  SecondaryCookie,
  QueryShop,
  QueryHost,
  Header,
  BearerToken,
  Referer,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedShop {
  pub domain: ShopDomain,
  pub source: ShopSource,
}

/// Resolve the tenant from request headers and the raw query string.
pub fn resolve(headers: &HeaderMap, query: Option<&str>) -> Option<ResolvedShop> {
  let jar = CookieJar::from_headers(headers);
  let params = query.map(query_pairs).unwrap_or_default();

  let found = jar
    .get(PRIMARY_COOKIE)
    .and_then(|c| ShopDomain::parse(c.value()))
    .map(|d| (d, ShopSource::PrimaryCookie))
    .or_else(|| {
      jar
        .get(SECONDARY_COOKIE)
        .and_then(|c| ShopDomain::parse(c.value()))
        .map(|d| (d, ShopSource::SecondaryCookie))
    })
    .or_else(|| {
      param(&params, "shop")
        .and_then(ShopDomain::parse)
        .map(|d| (d, ShopSource::QueryShop))
    })
    .or_else(|| {
      param(&params, "host")
        .and_then(shop_from_host)
        .map(|d| (d, ShopSource::QueryHost))
    })
    .or_else(|| {
      header_str(headers, SHOP_HEADER)
        .and_then(ShopDomain::parse)
        .map(|d| (d, ShopSource::Header))
    })
    .or_else(|| {
      header_str(headers, header::AUTHORIZATION.as_str())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(shop_from_bearer)
        .map(|d| (d, ShopSource::BearerToken))
    })
    .or_else(|| {
      header_str(headers, header::REFERER.as_str())
        .and_then(shop_from_referer)
        .map(|d| (d, ShopSource::Referer))
    });

  let (domain, source) = found?;
  tracing::debug!(shop = %domain, ?source, "shop resolved");
  Some(ResolvedShop { domain, source })
}

fn query_pairs(query: &str) -> Vec<(String, String)> {
  form_urlencoded::parse(query.as_bytes()).into_owned().collect()
}

fn param<'a>(params: &'a [(String, String)], name: &str) -> Option<&'a str> {
  params
    .iter()
    .find(|(k, _)| k == name)
    .map(|(_, v)| v.as_str())
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
  headers.get(name).and_then(|v| v.to_str().ok())
}

/// Decode base64 in any of the common alphabets, with or without padding.
fn decode_base64(raw: &str) -> Option<Vec<u8>> {
  let raw = raw.trim();
  [STANDARD, URL_SAFE, STANDARD_NO_PAD, URL_SAFE_NO_PAD]
    .iter()
    .find_map(|engine| engine.decode(raw).ok())
}

/// The opaque `host` parameter: base64 of `admin.shopify.com/store/<name>`
/// or of `<name>.myshopify.com/admin`.
pub fn shop_from_host(raw: &str) -> Option<ShopDomain> {
  let decoded = String::from_utf8(decode_base64(raw)?).ok()?.to_ascii_lowercase();

  if let Some(name) = ADMIN_STORE_RE.captures(&decoded).and_then(|c| c.get(1)) {
    return ShopDomain::from_store_name(name.as_str());
  }
  MYSHOPIFY_RE
    .captures(&decoded)
    .and_then(|c| c.get(1))
    .and_then(|m| ShopDomain::parse(m.as_str()))
}

/// Read (without verifying) a session token's `dest` or `shop` claim.
fn shop_from_bearer(token: &str) -> Option<ShopDomain> {
  let payload = token.trim().split('.').nth(1)?;
  let claims: serde_json::Value = serde_json::from_slice(&decode_base64(payload)?).ok()?;

  let from_dest = claims
    .get("dest")
    .and_then(|v| v.as_str())
    .and_then(|dest| Url::parse(dest).ok())
    .and_then(|url| url.host_str().and_then(ShopDomain::parse));

  from_dest.or_else(|| {
    claims
      .get("shop")
      .and_then(|v| v.as_str())
      .and_then(ShopDomain::parse)
  })
}

fn shop_from_referer(referer: &str) -> Option<ShopDomain> {
  let url = Url::parse(referer).ok()?;
  let lookup = |name: &str| {
    url
      .query_pairs()
      .find(|(k, _)| k == name)
      .map(|(_, v)| v.into_owned())
  };

  lookup("shop")
    .and_then(|s| ShopDomain::parse(&s))
    .or_else(|| lookup("host").and_then(|h| shop_from_host(&h)))
}

// ─── Extractor ───────────────────────────────────────────────────────────────

/// The resolved tenant, without any credential check. Rejects with 401 when
/// no strategy matches.
pub struct TenantShop(pub ResolvedShop);

impl<S: Send + Sync> FromRequestParts<S> for TenantShop {
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    resolve(&parts.headers, parts.uri.query())
      .map(TenantShop)
      .ok_or(ApiError::Unauthenticated)
  }
}
