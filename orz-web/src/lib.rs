//! # orz-web
//!
//! API conventions for axum services.
//!
//! ## Features
//!
//! - **Protocol envelope**: every response carries a protocol version; errors
//!   answer `200 OK` with a code and an optional URL-encoded notice in headers
//! - **Declared error contracts**: each operation lists the codes it may
//!   answer with, their notice, internal reason and reporting flags
//! - **Cause-chain resolution**: business errors are found through `anyhow`
//!   context and wrapping errors
//! - **Convention-derived routes**: method and path come from the operation's
//!   declared identity, names are validated before serving
//! - **Well-known request headers**: parsed lazily, once per request
//! - **Ambient stack**: figment configuration, JSON tracing, CORS rules,
//!   timeouts, body limits, panic recovery and graceful shutdown
//!
//! ## Example
//!
//! ```rust,no_run
//! use orz_web::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     let config = Config::load()?;
//!     init_tracing(&config)?;
//!
//!     let state = WebState::new(config.clone())?;
//!     let app = ApiRouter::new(state)
//!         // .api(OrderFindV1Api)
//!         .build()?;
//!
//!     Server::new(config).serve(app).await
//! }
//! ```

pub mod api_error;
pub mod chain;
pub mod config;
pub mod context;
pub mod contract;
pub mod cors;
pub mod description;
pub mod error;
pub mod headers;
pub mod observability;
pub mod pagination;
pub mod protocol;
pub mod reporter;
pub mod response;
pub mod route;
pub mod router;
pub mod server;
pub mod state;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::api_error::ApiError;
    pub use crate::config::{Config, ServiceConfig, WebConfig};
    pub use crate::context::RequestContext;
    pub use crate::contract::{ErrorContract, ErrorContracts};
    pub use crate::description::Description;
    pub use crate::error::{Error, Result};
    pub use crate::headers::{HeaderError, RequestHeaders};
    pub use crate::observability::init_tracing;
    pub use crate::pagination::adjust_page_size;
    pub use crate::protocol::{Protocol, CODE_UNDEFINED, VERSION_CURRENT};
    pub use crate::reporter::{ErrorReport, ErrorReporter, TracingReporter};
    pub use crate::route::{RouteConvention, RouteSpec};
    pub use crate::router::{ApiRouter, Validate, WebApi};
    pub use crate::server::Server;
    pub use crate::state::{WebState, WebStateBuilder};

    pub use axum::{
        extract::State,
        response::{IntoResponse, Response},
        Json, Router,
    };
    pub use serde::{Deserialize, Serialize};
}
