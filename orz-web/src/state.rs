//! Application state management

use std::sync::Arc;

use crate::{
    config::Config,
    error::Result,
    headers::RequestHeadersExtractor,
    pagination::adjust_page_size,
    reporter::{ErrorReporter, TracingReporter},
    response::ResponseAssembler,
    route::RouteConvention,
};

/// State shared by every API handler
///
/// Built once at startup and never mutated afterwards. Cloning is cheap.
#[derive(Clone)]
pub struct WebState {
    inner: Arc<Inner>,
}

struct Inner {
    config: Config,
    assembler: ResponseAssembler,
    extractor: Arc<RequestHeadersExtractor>,
    reporter: Arc<dyn ErrorReporter>,
}

impl WebState {
    /// State with the tracing reporter
    pub fn new(config: Config) -> Result<Self> {
        Self::builder().config(config).build()
    }

    pub fn builder() -> WebStateBuilder {
        WebStateBuilder::new()
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn assembler(&self) -> &ResponseAssembler {
        &self.inner.assembler
    }

    pub fn extractor(&self) -> Arc<RequestHeadersExtractor> {
        Arc::clone(&self.inner.extractor)
    }

    pub fn reporter(&self) -> &dyn ErrorReporter {
        self.inner.reporter.as_ref()
    }

    pub fn convention(&self) -> &RouteConvention {
        &self.inner.config.web.route
    }

    /// Context path without trailing slash, empty when routes are served at the root
    pub fn context_path(&self) -> &str {
        self.inner.config.web.context_path.trim_end_matches('/')
    }

    /// Page size normalized against the configured bounds
    pub fn page_size(&self, requested: Option<i64>) -> i64 {
        adjust_page_size(requested, &self.inner.config.web.page)
    }
}

/// Builder for [`WebState`]
pub struct WebStateBuilder {
    config: Option<Config>,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl WebStateBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            reporter: None,
        }
    }

    /// Set the configuration, defaults to [`Config::default`]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the error reporter, defaults to [`TracingReporter`]
    pub fn reporter(mut self, reporter: Arc<dyn ErrorReporter>) -> Self {
        self.reporter = Some(reporter);
        self
    }

    /// Fails when the configured response header names are invalid
    pub fn build(self) -> Result<WebState> {
        let config = self.config.unwrap_or_default();
        let assembler = ResponseAssembler::new(
            config.service_name(),
            config.web.exposure(),
            &config.web.response_headers,
        )?;
        let extractor = Arc::new(RequestHeadersExtractor::new(
            config.web.request_headers.clone(),
        ));
        let reporter = self
            .reporter
            .unwrap_or_else(|| Arc::new(TracingReporter));

        tracing::debug!(
            service = assembler.service(),
            context_path = %config.web.context_path,
            "web state built"
        );

        Ok(WebState {
            inner: Arc::new(Inner {
                config,
                assembler,
                extractor,
                reporter,
            }),
        })
    }
}

impl Default for WebStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = WebState::new(Config::named("orders")).unwrap();
        assert_eq!(state.assembler().service(), "orders");
        assert_eq!(state.context_path(), "");
        assert_eq!(state.convention().sentinel, "api");
        assert_eq!(state.page_size(None), 50);
        assert_eq!(state.page_size(Some(1000)), 100);
    }

    #[test]
    fn test_context_path_trailing_slash() {
        let mut config = Config::default();
        config.web.context_path = "/shop/".to_string();
        let state = WebState::new(config).unwrap();
        assert_eq!(state.context_path(), "/shop");
    }

    #[test]
    fn test_invalid_response_header_is_rejected() {
        let mut config = Config::default();
        config.web.response_headers.code = "bad header".to_string();
        assert!(WebState::new(config).is_err());
    }

    #[test]
    fn test_clones_share_extractor() {
        let state = WebState::new(Config::default()).unwrap();
        let clone = state.clone();
        assert!(Arc::ptr_eq(&state.extractor(), &clone.extractor()));
    }
}
