//! Path-scoped CORS rules
//!
//! Rules are keyed by path pattern. `*` matches one path segment and `**`
//! matches any remainder:
//!
//! ```toml
//! [web.cors."/**"]
//! allowed_origins = ["https://app.example.com"]
//! allowed_methods = ["PUT", "POST"]
//! allowed_headers = ["*"]
//! max_age_secs = 3600
//! ```
//!
//! The origin of a request is checked against the most specific rule whose
//! pattern matches the request path. Methods and headers are the union of all
//! rules. The protocol response headers are always exposed so browser clients
//! can read the outcome of a call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{request::Parts, HeaderName, HeaderValue, Method};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::response::ResponseHeaderNames;

/// Wildcard accepted in origin, method and header lists
pub const WILDCARD: &str = "*";

/// CORS settings for one path pattern
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsRule {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub exposed_headers: Vec<String>,
    pub max_age_secs: Option<u64>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    pattern: String,
    regex: Regex,
    specificity: usize,
    origins: Vec<String>,
}

impl CompiledRule {
    fn allows(&self, origin: &str) -> bool {
        self.origins.iter().any(|o| o == WILDCARD || o == origin)
    }
}

/// Path patterns compiled for origin checks, most specific first
#[derive(Debug, Clone, Default)]
pub struct CorsRules {
    rules: Vec<CompiledRule>,
}

impl CorsRules {
    pub fn compile(rules: &HashMap<String, CorsRule>) -> Result<Self> {
        let mut compiled = rules
            .iter()
            .map(|(pattern, rule)| {
                Ok(CompiledRule {
                    pattern: pattern.clone(),
                    regex: compile_pattern(pattern)?,
                    specificity: specificity(pattern),
                    origins: rule.allowed_origins.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        compiled.sort_by(|a, b| {
            b.specificity
                .cmp(&a.specificity)
                .then_with(|| a.pattern.cmp(&b.pattern))
        });
        Ok(Self { rules: compiled })
    }

    /// Whether `origin` may call `path`
    pub fn allows(&self, path: &str, origin: &str) -> bool {
        self.rules
            .iter()
            .find(|rule| rule.regex.is_match(path))
            .is_some_and(|rule| rule.allows(origin))
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

/// Build the CORS layer for `rules`, `None` when no rule is configured
pub fn cors_layer(
    rules: &HashMap<String, CorsRule>,
    protocol_headers: &ResponseHeaderNames,
) -> Result<Option<CorsLayer>> {
    if rules.is_empty() {
        debug!("no CORS rules configured");
        return Ok(None);
    }

    let compiled = Arc::new(CorsRules::compile(rules)?);
    let origin_rules = Arc::clone(&compiled);
    let mut layer = CorsLayer::new().allow_origin(AllowOrigin::predicate(
        move |origin: &HeaderValue, parts: &Parts| {
            origin
                .to_str()
                .is_ok_and(|origin| origin_rules.allows(parts.uri.path(), origin))
        },
    ));

    let methods: Vec<&String> = rules.values().flat_map(|r| &r.allowed_methods).collect();
    layer = if methods.iter().any(|m| *m == WILDCARD) {
        layer.allow_methods(Any)
    } else {
        layer.allow_methods(parse_all(methods, |m| Method::from_bytes(m.as_bytes()).ok()))
    };

    let headers: Vec<&String> = rules.values().flat_map(|r| &r.allowed_headers).collect();
    layer = if headers.iter().any(|h| *h == WILDCARD) {
        layer.allow_headers(Any)
    } else {
        layer.allow_headers(parse_all(headers, |h| HeaderName::try_from(h).ok()))
    };

    let exposed = rules
        .values()
        .flat_map(|r| &r.exposed_headers)
        .chain([
            &protocol_headers.version,
            &protocol_headers.code,
            &protocol_headers.notice,
        ])
        .filter(|h| *h != WILDCARD);
    let mut exposed: Vec<HeaderName> = parse_all(exposed, |h| HeaderName::try_from(h).ok());
    exposed.sort_by(|a, b| a.as_str().cmp(b.as_str()));
    exposed.dedup();
    layer = layer.expose_headers(exposed);

    if let Some(max_age) = rules.values().filter_map(|r| r.max_age_secs).max() {
        layer = layer.max_age(Duration::from_secs(max_age));
    }

    debug!(rules = compiled.rules.len(), "CORS rules compiled");
    Ok(Some(layer))
}

fn parse_all<'a, T>(
    values: impl IntoIterator<Item = &'a String>,
    parse: impl Fn(&str) -> Option<T>,
) -> Vec<T> {
    values
        .into_iter()
        .filter_map(|value| {
            let parsed = parse(value);
            if parsed.is_none() {
                warn!(value = %value, "ignoring invalid CORS entry");
            }
            parsed
        })
        .collect()
}

/// Translate a path pattern into an anchored regex
fn compile_pattern(pattern: &str) -> Result<Regex> {
    let mut regex = String::from("^");
    let mut literal = String::new();
    let mut chars = pattern.trim().chars().peekable();
    while let Some(c) = chars.next() {
        if c != '*' {
            literal.push(c);
            continue;
        }
        regex.push_str(&regex::escape(&literal));
        literal.clear();
        if chars.peek() == Some(&'*') {
            chars.next();
            regex.push_str(".*");
        } else {
            regex.push_str("[^/]+");
        }
    }
    regex.push_str(&regex::escape(&literal));
    regex.push('$');

    Regex::new(&regex).map_err(|e| Error::Internal(format!("invalid CORS pattern {pattern}: {e}")))
}

/// Higher is more specific
fn specificity(pattern: &str) -> usize {
    let segments: usize = pattern
        .split('/')
        .filter(|s| !s.is_empty())
        .map(|segment| match segment {
            "**" => 1,
            "*" => 5,
            _ => 10,
        })
        .sum();
    segments + pattern.len()
}
