//! Protocol response assembly
//!
//! Successful responses pass the handler's JSON through and only gain the
//! version header. Error responses are always answered with `200 OK`: the
//! outcome travels in the version, code and notice headers, and the body is
//! reserved for diagnostics the service chose to expose.

use std::error::Error as StdError;

use axum::{
    http::{HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::context::RequestContext;
use crate::error::Result;
use crate::protocol::{ErrorBody, ErrorTrace, Protocol, CODE_UNDEFINED};
use crate::reporter::render_chain;

/// Names of the protocol response headers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponseHeaderNames {
    pub version: String,
    pub code: String,
    pub notice: String,
}

impl Default for ResponseHeaderNames {
    fn default() -> Self {
        Self {
            version: "Orz-Version".to_string(),
            code: "Orz-Code".to_string(),
            notice: "Orz-Notice".to_string(),
        }
    }
}

/// Which diagnostics error responses may carry
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExposurePolicy {
    pub expose_reason: bool,
    pub expose_traces: bool,
}

/// Builds protocol responses
#[derive(Debug, Clone)]
pub struct ResponseAssembler {
    service: String,
    policy: ExposurePolicy,
    version_header: HeaderName,
    code_header: HeaderName,
    notice_header: HeaderName,
}

impl ResponseAssembler {
    /// Fails when a configured header name is not a valid HTTP header name
    pub fn new(
        service: impl Into<String>,
        policy: ExposurePolicy,
        names: &ResponseHeaderNames,
    ) -> Result<Self> {
        Ok(Self {
            service: service.into(),
            policy,
            version_header: header_name(&names.version)?,
            code_header: header_name(&names.code)?,
            notice_header: header_name(&names.notice)?,
        })
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn policy(&self) -> ExposurePolicy {
        self.policy
    }

    /// Name of the version header, lowercased
    pub fn version_header(&self) -> &HeaderName {
        &self.version_header
    }

    /// JSON body unchanged, with the version header
    pub fn success<T: Serialize>(&self, body: T) -> Response {
        let headers = self.protocol_headers(&Protocol::success());
        (StatusCode::OK, headers, Json(body)).into_response()
    }

    /// Error envelope for `protocol`
    ///
    /// The first trace describes `cause` at the endpoint of `ctx`. Reason and
    /// traces are only included as the exposure policy allows.
    pub fn error(
        &self,
        protocol: &Protocol,
        reason: Option<&str>,
        extra_traces: Vec<ErrorTrace>,
        cause: &(dyn StdError + 'static),
        ctx: &RequestContext,
    ) -> Response {
        let headers = self.protocol_headers(protocol);

        let reason = reason
            .filter(|_| self.policy.expose_reason)
            .filter(|r| !r.trim().is_empty())
            .map(str::to_string);
        let traces = self.policy.expose_traces.then(|| {
            let mut traces = Vec::with_capacity(extra_traces.len() + 1);
            traces.push(ErrorTrace::new(
                self.service.clone(),
                ctx.endpoint(),
                render_chain(cause),
            ));
            traces.extend(extra_traces);
            traces
        });

        if reason.is_none() && traces.is_none() {
            return (StatusCode::OK, headers).into_response();
        }

        let body = ErrorBody {
            code: protocol.code().unwrap_or(CODE_UNDEFINED).to_string(),
            reason,
            traces,
        };
        (StatusCode::OK, headers, Json(body)).into_response()
    }

    fn protocol_headers(&self, protocol: &Protocol) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            self.version_header.clone(),
            HeaderValue::from(protocol.version()),
        );

        if let Some(code) = protocol.code() {
            let value = HeaderValue::from_str(code).unwrap_or_else(|_| {
                warn!(code, "error code is not a valid header value");
                HeaderValue::from_static(CODE_UNDEFINED)
            });
            headers.insert(self.code_header.clone(), value);
        }

        if let Some(notice) = protocol.notice() {
            match HeaderValue::try_from(encode_notice(notice)) {
                Ok(value) => {
                    headers.insert(self.notice_header.clone(), value);
                }
                Err(e) => warn!(error = %e, "notice could not be encoded"),
            }
        }

        headers
    }
}

/// `application/x-www-form-urlencoded` encoding of a notice
pub fn encode_notice(notice: &str) -> String {
    url::form_urlencoded::byte_serialize(notice.as_bytes()).collect()
}

fn header_name(name: &str) -> Result<HeaderName> {
    Ok(HeaderName::try_from(name).map_err(axum::http::Error::from)?)
}
