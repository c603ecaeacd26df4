//! Well-known request headers
//!
//! Clients describe themselves through a fixed set of headers (request id,
//! client version, device, ...). Each header has a configurable name and a
//! required flag. [`RequestHeadersExtractor`] parses them once per request and
//! caches the result on the [`RequestContext`].
//!
//! # Example
//!
//! ```rust,no_run
//! use orz_web::headers::RequestHeaders;
//!
//! async fn handler(headers: RequestHeaders) -> String {
//!     headers.request_id.unwrap_or_default()
//! }
//! ```

use std::str::FromStr;
use std::sync::Arc;

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::trace;

use crate::context::RequestContext;
use crate::error::Error;

/// Header consulted for the client IP when the configured header is absent
pub const FORWARDED_FOR: &str = "x-forwarded-for";

/// Parsed well-known request headers
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RequestHeaders {
    pub request_id: Option<String>,
    pub request_time: Option<DateTime<Utc>>,
    pub user_id: Option<i64>,
    pub client_ip: Option<String>,
    pub client_type: Option<String>,
    pub client_version: Option<i32>,
    pub client_channel: Option<String>,
    pub initial_time: Option<DateTime<Utc>>,
    pub launch_time: Option<DateTime<Utc>>,
    pub launch_scene: Option<i32>,
    pub device_id: Option<String>,
    pub device_brand: Option<String>,
    pub device_model: Option<String>,
    pub os_type: Option<String>,
    pub os_name: Option<String>,
    pub platform_version: Option<String>,
    pub platform_sdk_version: Option<String>,
}

/// A header that is missing or cannot be parsed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeaderError {
    #[error("header not found: {header}")]
    Missing { header: String },

    #[error("header is invalid: {header}={value}")]
    Invalid { header: String, value: String },
}

/// Name and required flag of one header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderRule {
    pub name: String,
    #[serde(default)]
    pub required: bool,
}

impl HeaderRule {
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            required: false,
        }
    }
}

/// Rules for every well-known header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestHeaderRules {
    pub request_id: HeaderRule,
    pub request_time: HeaderRule,
    pub user_id: HeaderRule,
    pub client_ip: HeaderRule,
    pub client_type: HeaderRule,
    pub client_version: HeaderRule,
    pub client_channel: HeaderRule,
    pub initial_time: HeaderRule,
    pub launch_time: HeaderRule,
    pub launch_scene: HeaderRule,
    pub device_id: HeaderRule,
    pub device_brand: HeaderRule,
    pub device_model: HeaderRule,
    pub os_type: HeaderRule,
    pub os_name: HeaderRule,
    pub platform_version: HeaderRule,
    pub platform_sdk_version: HeaderRule,
}

impl Default for RequestHeaderRules {
    fn default() -> Self {
        Self {
            request_id: HeaderRule::required("Orz-Request-Id"),
            request_time: HeaderRule::required("Orz-Request-Time"),
            user_id: HeaderRule::optional("Orz-User-Id"),
            client_ip: HeaderRule::required("Orz-Client-Ip"),
            client_type: HeaderRule::required("Orz-Client-Type"),
            client_version: HeaderRule::required("Orz-Client-Version"),
            client_channel: HeaderRule::optional("Orz-Client-Channel"),
            initial_time: HeaderRule::required("Orz-Initial-Time"),
            launch_time: HeaderRule::required("Orz-Launch-Time"),
            launch_scene: HeaderRule::optional("Orz-Launch-Scene"),
            device_id: HeaderRule::required("Orz-Device-Id"),
            device_brand: HeaderRule::optional("Orz-Device-Brand"),
            device_model: HeaderRule::optional("Orz-Device-Model"),
            os_type: HeaderRule::optional("Orz-OS-Type"),
            os_name: HeaderRule::optional("Orz-OS-Name"),
            platform_version: HeaderRule::optional("Orz-Platform-Version"),
            platform_sdk_version: HeaderRule::optional("Orz-Platform-SDK-Version"),
        }
    }
}

/// Parses [`RequestHeaders`] according to [`RequestHeaderRules`]
#[derive(Debug, Clone, Default)]
pub struct RequestHeadersExtractor {
    rules: RequestHeaderRules,
}

impl RequestHeadersExtractor {
    pub fn new(rules: RequestHeaderRules) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RequestHeaderRules {
        &self.rules
    }

    /// Headers of the request, parsed on first use and cached on `ctx`
    pub fn extract(&self, ctx: &RequestContext) -> Result<Arc<RequestHeaders>, HeaderError> {
        if let Some(cached) = ctx.cached_headers() {
            return Ok(cached);
        }
        let parsed = self.parse(ctx)?;
        trace!(path = ctx.path(), "request headers parsed");
        Ok(ctx.cache_headers(parsed))
    }

    fn parse(&self, ctx: &RequestContext) -> Result<RequestHeaders, HeaderError> {
        let r = &self.rules;
        Ok(RequestHeaders {
            request_id: text(ctx, &r.request_id)?,
            request_time: timestamp(ctx, &r.request_time)?,
            user_id: number(ctx, &r.user_id)?,
            client_ip: client_ip(ctx, &r.client_ip)?,
            client_type: text(ctx, &r.client_type)?,
            client_version: number(ctx, &r.client_version)?,
            client_channel: text(ctx, &r.client_channel)?,
            initial_time: timestamp(ctx, &r.initial_time)?,
            launch_time: timestamp(ctx, &r.launch_time)?,
            launch_scene: number(ctx, &r.launch_scene)?,
            device_id: text(ctx, &r.device_id)?,
            device_brand: text(ctx, &r.device_brand)?,
            device_model: text(ctx, &r.device_model)?,
            os_type: text(ctx, &r.os_type)?,
            os_name: text(ctx, &r.os_name)?,
            platform_version: text(ctx, &r.platform_version)?,
            platform_sdk_version: text(ctx, &r.platform_sdk_version)?,
        })
    }
}

/// Non-blank raw value of `name`
fn raw(ctx: &RequestContext, name: &str) -> Result<Option<String>, HeaderError> {
    let Some(value) = ctx.header_map().get(name) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| HeaderError::Invalid {
        header: name.to_string(),
        value: String::from_utf8_lossy(value.as_bytes()).into_owned(),
    })?;
    let value = value.trim();
    Ok((!value.is_empty()).then(|| value.to_string()))
}

fn missing(rule: &HeaderRule) -> Result<(), HeaderError> {
    if rule.required {
        Err(HeaderError::Missing {
            header: rule.name.clone(),
        })
    } else {
        Ok(())
    }
}

fn text(ctx: &RequestContext, rule: &HeaderRule) -> Result<Option<String>, HeaderError> {
    match raw(ctx, &rule.name)? {
        Some(value) => Ok(Some(value)),
        None => missing(rule).map(|_| None),
    }
}

fn number<T: FromStr>(ctx: &RequestContext, rule: &HeaderRule) -> Result<Option<T>, HeaderError> {
    let Some(value) = text(ctx, rule)? else {
        return Ok(None);
    };
    value
        .parse::<T>()
        .map(Some)
        .map_err(|_| HeaderError::Invalid {
            header: rule.name.clone(),
            value,
        })
}

fn timestamp(
    ctx: &RequestContext,
    rule: &HeaderRule,
) -> Result<Option<DateTime<Utc>>, HeaderError> {
    let Some(value) = text(ctx, rule)? else {
        return Ok(None);
    };
    value
        .parse::<i64>()
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(Some)
        .ok_or(HeaderError::Invalid {
            header: rule.name.clone(),
            value,
        })
}

fn client_ip(ctx: &RequestContext, rule: &HeaderRule) -> Result<Option<String>, HeaderError> {
    if let Some(ip) = raw(ctx, &rule.name)? {
        return Ok(Some(ip));
    }
    let forwarded = raw(ctx, FORWARDED_FOR)?.and_then(|value| {
        value
            .split(',')
            .map(str::trim)
            .find(|ip| !ip.is_empty())
            .map(str::to_string)
    });
    if let Some(ip) = forwarded {
        return Ok(Some(ip));
    }
    if let Some(addr) = ctx.remote_addr() {
        return Ok(Some(addr.ip().to_string()));
    }
    missing(rule).map(|_| None)
}

impl<S> FromRequestParts<S> for RequestHeaders
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ctx = match RequestContext::from_request_parts(parts, state).await {
            Ok(ctx) => ctx,
            Err(never) => match never {},
        };
        let headers = ctx.headers()?;
        Ok(RequestHeaders::clone(&headers))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, Method};
    use std::net::SocketAddr;

    fn full_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        for (name, value) in [
            ("Orz-Request-Id", "req-1"),
            ("Orz-Request-Time", "1700000000000"),
            ("Orz-User-Id", "42"),
            ("Orz-Client-Ip", "10.0.0.1"),
            ("Orz-Client-Type", "ios"),
            ("Orz-Client-Version", "7"),
            ("Orz-Initial-Time", "1600000000000"),
            ("Orz-Launch-Time", "1700000000000"),
            ("Orz-Device-Id", "dev-1"),
            ("Orz-OS-Name", "iOS"),
        ] {
            headers.insert(name, HeaderValue::from_static(value));
        }
        headers
    }

    fn ctx(headers: HeaderMap) -> RequestContext {
        RequestContext::new(Method::POST, "/Test/FindV1", headers)
    }

    #[test]
    fn test_parses_all_kinds() {
        let extractor = RequestHeadersExtractor::default();
        let parsed = extractor.extract(&ctx(full_headers())).unwrap();
        assert_eq!(parsed.request_id.as_deref(), Some("req-1"));
        assert_eq!(parsed.user_id, Some(42));
        assert_eq!(parsed.client_version, Some(7));
        assert_eq!(
            parsed.request_time.map(|t| t.timestamp_millis()),
            Some(1_700_000_000_000)
        );
        assert_eq!(parsed.os_name.as_deref(), Some("iOS"));
        assert!(parsed.launch_scene.is_none());
        assert!(parsed.device_brand.is_none());
    }

    #[test]
    fn test_cached_per_context() {
        let extractor = RequestHeadersExtractor::default();
        let ctx = ctx(full_headers());
        let first = extractor.extract(&ctx).unwrap();
        let second = extractor.extract(&ctx).unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let clone = ctx.clone();
        assert!(Arc::ptr_eq(&first, &extractor.extract(&clone).unwrap()));
    }

    #[test]
    fn test_missing_required() {
        let mut headers = full_headers();
        headers.remove("Orz-Device-Id");
        let err = RequestHeadersExtractor::default()
            .extract(&ctx(headers))
            .unwrap_err();
        assert_eq!(
            err,
            HeaderError::Missing {
                header: "Orz-Device-Id".to_string()
            }
        );
    }

    #[test]
    fn test_blank_counts_as_missing() {
        let mut headers = full_headers();
        headers.insert("Orz-Request-Id", HeaderValue::from_static("  "));
        let err = RequestHeadersExtractor::default()
            .extract(&ctx(headers))
            .unwrap_err();
        assert!(matches!(err, HeaderError::Missing { ref header } if header == "Orz-Request-Id"));
    }

    #[test]
    fn test_invalid_optional_integer() {
        let mut headers = full_headers();
        headers.insert("Orz-User-Id", HeaderValue::from_static("abc"));
        let err = RequestHeadersExtractor::default()
            .extract(&ctx(headers))
            .unwrap_err();
        assert_eq!(
            err,
            HeaderError::Invalid {
                header: "Orz-User-Id".to_string(),
                value: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_timestamp() {
        let mut headers = full_headers();
        headers.insert("Orz-Launch-Time", HeaderValue::from_static("yesterday"));
        let err = RequestHeadersExtractor::default()
            .extract(&ctx(headers))
            .unwrap_err();
        assert!(matches!(err, HeaderError::Invalid { .. }));
    }

    #[test]
    fn test_client_ip_fallbacks() {
        let mut headers = full_headers();
        headers.remove("Orz-Client-Ip");
        headers.insert(FORWARDED_FOR, HeaderValue::from_static("1.2.3.4, 10.0.0.2"));
        let parsed = RequestHeadersExtractor::default()
            .extract(&ctx(headers))
            .unwrap();
        assert_eq!(parsed.client_ip.as_deref(), Some("1.2.3.4"));

        let mut headers = full_headers();
        headers.remove("Orz-Client-Ip");
        let addr: SocketAddr = "192.168.1.9:5000".parse().unwrap();
        let parsed = RequestHeadersExtractor::default()
            .extract(&ctx(headers).with_remote_addr(addr))
            .unwrap();
        assert_eq!(parsed.client_ip.as_deref(), Some("192.168.1.9"));

        let mut headers = full_headers();
        headers.remove("Orz-Client-Ip");
        let err = RequestHeadersExtractor::default()
            .extract(&ctx(headers))
            .unwrap_err();
        assert!(matches!(err, HeaderError::Missing { ref header } if header == "Orz-Client-Ip"));
    }

    #[test]
    fn test_relaxed_rules() {
        let mut rules = RequestHeaderRules::default();
        for rule in [
            &mut rules.request_id,
            &mut rules.request_time,
            &mut rules.client_ip,
            &mut rules.client_type,
            &mut rules.client_version,
            &mut rules.initial_time,
            &mut rules.launch_time,
            &mut rules.device_id,
        ] {
            rule.required = false;
        }
        let parsed = RequestHeadersExtractor::new(rules)
            .extract(&ctx(HeaderMap::new()))
            .unwrap();
        assert_eq!(*parsed, RequestHeaders::default());
    }

    #[test]
    fn test_renamed_header() {
        let mut rules = RequestHeaderRules::default();
        rules.request_id = HeaderRule::required("X-Request-Id");
        let mut headers = full_headers();
        headers.insert("X-Request-Id", HeaderValue::from_static("renamed"));
        let parsed = RequestHeadersExtractor::new(rules)
            .extract(&ctx(headers))
            .unwrap();
        assert_eq!(parsed.request_id.as_deref(), Some("renamed"));
    }

    #[test]
    fn test_failure_is_not_cached() {
        let mut headers = full_headers();
        headers.remove("Orz-Request-Id");
        let ctx = ctx(headers);
        let extractor = RequestHeadersExtractor::default();
        assert!(extractor.extract(&ctx).is_err());
        assert!(ctx.cached_headers().is_none());
    }
}
