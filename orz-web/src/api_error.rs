//! Application error raised by API handlers
//!
//! Handlers reject a request by returning an [`ApiError`] (usually through
//! `anyhow`). The dispatcher locates it in the error's cause chain, matches
//! its `code` against the contracts declared for the operation and answers
//! with the protocol envelope.
//!
//! ```rust
//! use orz_web::api_error::ApiError;
//! use orz_web::description::Description;
//!
//! let err = ApiError::with_description("1", Description::new().with("order", 9));
//! assert_eq!(err.code(), "1");
//! assert_eq!(err.to_string(), "code=1, order=9");
//! ```

use std::error::Error as StdError;
use std::fmt;

use crate::description::Description;
use crate::protocol::ErrorTrace;

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Business error carrying a protocol code and structured context
#[derive(Debug)]
pub struct ApiError {
    code: String,
    description: Description,
    source: Option<BoxError>,
    traces: Vec<ErrorTrace>,
}

impl ApiError {
    /// Error with a code and no context
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            description: Description::new(),
            source: None,
            traces: Vec::new(),
        }
    }

    /// Error with a code and structured context
    pub fn with_description(code: impl Into<String>, description: Description) -> Self {
        Self {
            code: code.into(),
            description,
            source: None,
            traces: Vec::new(),
        }
    }

    /// Error with a code, structured context and the error that caused it
    pub fn with_source(
        code: impl Into<String>,
        description: Description,
        source: impl Into<BoxError>,
    ) -> Self {
        Self {
            code: code.into(),
            description,
            source: Some(source.into()),
            traces: Vec::new(),
        }
    }

    /// Attach traces received from a downstream service
    ///
    /// They are appended after the local trace when traces are exposed.
    #[must_use]
    pub fn with_traces(mut self, traces: Vec<ErrorTrace>) -> Self {
        self.traces = traces;
        self
    }

    /// The protocol code
    pub fn code(&self) -> &str {
        &self.code
    }

    /// The structured context
    pub fn description(&self) -> &Description {
        &self.description
    }

    pub fn traces(&self) -> &[ErrorTrace] {
        &self.traces
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = Description::new()
            .with("code", &self.code)
            .merge(&self.description);
        write!(f, "{message}")
    }
}

impl StdError for ApiError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn StdError + 'static))
    }
}
