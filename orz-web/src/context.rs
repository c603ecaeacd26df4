//! Per-request context
//!
//! A [`RequestContext`] is captured once per request and stored in the
//! request extensions. Clones share the parsed header cache, so every
//! extractor of the same request sees the headers parsed at most once.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::{Arc, OnceLock};

use axum::{
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, Extensions, HeaderMap, Method, Uri},
};

use crate::headers::{HeaderError, RequestHeaders, RequestHeadersExtractor};

/// What the dispatcher and the header extractor know about a request
#[derive(Debug, Clone)]
pub struct RequestContext {
    method: Method,
    path: String,
    endpoint: String,
    headers: HeaderMap,
    remote_addr: Option<SocketAddr>,
    extractor: Arc<RequestHeadersExtractor>,
    parsed: Arc<OnceLock<Arc<RequestHeaders>>>,
}

impl RequestContext {
    /// Context for a request without context path or remote address
    pub fn new(method: Method, path: impl Into<String>, headers: HeaderMap) -> Self {
        let path = path.into();
        Self {
            method,
            endpoint: path.clone(),
            path,
            headers,
            remote_addr: None,
            extractor: Arc::new(RequestHeadersExtractor::default()),
            parsed: Arc::new(OnceLock::new()),
        }
    }

    /// Capture the context of an incoming request
    ///
    /// The remote address is taken from [`ConnectInfo`] when the server
    /// provides it.
    pub fn capture(
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        extensions: &Extensions,
    ) -> Self {
        let ctx = Self::new(method.clone(), uri.path(), headers.clone());
        match extensions.get::<ConnectInfo<SocketAddr>>() {
            Some(ConnectInfo(addr)) => ctx.with_remote_addr(*addr),
            None => ctx,
        }
    }

    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = Some(addr);
        self
    }

    /// Strip `context_path` from the endpoint reported in traces
    #[must_use]
    pub fn with_context_path(mut self, context_path: &str) -> Self {
        self.endpoint = strip_context_path(&self.path, context_path).to_string();
        self
    }

    #[must_use]
    pub fn with_extractor(mut self, extractor: Arc<RequestHeadersExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Request path as received
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Request path without the context path
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn header_map(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn remote_addr(&self) -> Option<SocketAddr> {
        self.remote_addr
    }

    /// Well-known headers, parsed on first call
    pub fn headers(&self) -> Result<Arc<RequestHeaders>, HeaderError> {
        self.extractor.extract(self)
    }

    pub(crate) fn cached_headers(&self) -> Option<Arc<RequestHeaders>> {
        self.parsed.get().cloned()
    }

    pub(crate) fn cache_headers(&self, headers: RequestHeaders) -> Arc<RequestHeaders> {
        self.parsed.get_or_init(|| Arc::new(headers)).clone()
    }
}

fn strip_context_path<'a>(path: &'a str, context_path: &str) -> &'a str {
    let context_path = context_path.trim_end_matches('/');
    if context_path.is_empty() {
        return path;
    }
    match path.strip_prefix(context_path) {
        Some(rest) if rest.is_empty() => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<RequestContext>() {
            return Ok(ctx.clone());
        }
        let ctx = RequestContext::capture(&parts.method, &parts.uri, &parts.headers, &parts.extensions);
        parts.extensions.insert(ctx.clone());
        Ok(ctx)
    }
}
