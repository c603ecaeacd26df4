//! Wire protocol envelope
//!
//! Every response carries a protocol version. Error responses add a code and,
//! optionally, a notice meant for the end user. Internal reason and traces go
//! into an [`ErrorBody`] only when the service is configured to expose them.

use serde::{Deserialize, Serialize};

/// Protocol version stamped on every answered response
pub const VERSION_CURRENT: u32 = 2;

/// Code answered for errors whose code was not declared by the operation
pub const CODE_UNDEFINED: &str = "undefined";

/// Version, code and notice of a response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Protocol {
    version: u32,
    code: Option<String>,
    notice: Option<String>,
}

impl Protocol {
    /// Successful response
    pub fn success() -> Self {
        Self {
            version: VERSION_CURRENT,
            code: None,
            notice: None,
        }
    }

    /// Error response
    ///
    /// A blank code becomes [`CODE_UNDEFINED`], a blank notice is dropped.
    ///
    /// ```rust
    /// use orz_web::protocol::{Protocol, CODE_UNDEFINED};
    ///
    /// let protocol = Protocol::error(" ", "");
    /// assert_eq!(protocol.code(), Some(CODE_UNDEFINED));
    /// assert_eq!(protocol.notice(), None);
    /// ```
    pub fn error(code: impl Into<String>, notice: impl Into<String>) -> Self {
        let code = code.into();
        let notice = notice.into();
        Self {
            version: VERSION_CURRENT,
            code: Some(if code.trim().is_empty() {
                CODE_UNDEFINED.to_string()
            } else {
                code
            }),
            notice: (!notice.trim().is_empty()).then_some(notice),
        }
    }

    /// Error response for an undeclared code
    pub fn error_undefined() -> Self {
        Self::error(CODE_UNDEFINED, "")
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn is_success(&self) -> bool {
        self.code.is_none()
    }
}

/// JSON body of an error response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traces: Option<Vec<ErrorTrace>>,
}

/// One diagnostic trace entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorTrace {
    /// Service that produced the trace
    pub service: String,
    /// Endpoint path without the context path
    pub endpoint: String,
    /// Rendering of the error and its causes
    pub details: String,
}

impl ErrorTrace {
    pub fn new(
        service: impl Into<String>,
        endpoint: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            service: service.into(),
            endpoint: endpoint.into(),
            details: details.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success() {
        let protocol = Protocol::success();
        assert_eq!(protocol.version(), VERSION_CURRENT);
        assert!(protocol.is_success());
        assert!(protocol.code().is_none());
        assert!(protocol.notice().is_none());
    }

    #[test]
    fn test_error_keeps_code_and_notice() {
        let protocol = Protocol::error("1", "try again later");
        assert_eq!(protocol.code(), Some("1"));
        assert_eq!(protocol.notice(), Some("try again later"));
        assert!(!protocol.is_success());
    }

    #[test]
    fn test_error_undefined() {
        let protocol = Protocol::error_undefined();
        assert_eq!(protocol.code(), Some(CODE_UNDEFINED));
        assert!(protocol.notice().is_none());
    }

    #[test]
    fn test_error_body_skips_absent_fields() {
        let body = ErrorBody {
            code: "1".to_string(),
            reason: None,
            traces: None,
        };
        assert_eq!(serde_json::to_string(&body).unwrap(), r#"{"code":"1"}"#);

        let body = ErrorBody {
            code: "1".to_string(),
            reason: Some("r".to_string()),
            traces: Some(vec![ErrorTrace::new("svc", "/A/B", "boom")]),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["reason"], "r");
        assert_eq!(json["traces"][0]["endpoint"], "/A/B");
    }
}
