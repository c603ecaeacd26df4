//! API registration and error dispatch
//!
//! An API operation is a type implementing [`WebApi`]. It declares its
//! identity as a [`RouteSpec`], the error codes it may answer with and a
//! single `request` entry point. [`ApiRouter`] derives the route of every
//! registered operation, validates naming conventions and wires the protocol
//! answer around the handler.
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use orz_web::prelude::*;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Deserialize)]
//! pub struct OrderFindV1Req {
//!     pub id: i64,
//! }
//!
//! impl Validate for OrderFindV1Req {}
//!
//! #[derive(Serialize)]
//! pub struct OrderFindV1Rsp {
//!     pub state: String,
//! }
//!
//! pub struct OrderFindV1Api;
//!
//! #[async_trait]
//! impl WebApi for OrderFindV1Api {
//!     type Req = OrderFindV1Req;
//!     type Rsp = OrderFindV1Rsp;
//!
//!     const SPEC: RouteSpec = RouteSpec::new("order", "find").variant(1);
//!
//!     fn errors() -> ErrorContracts {
//!         ErrorContracts::from(ErrorContract::new("1").with_notice("order not found"))
//!     }
//!
//!     async fn request(&self, _ctx: &RequestContext, req: OrderFindV1Req) -> anyhow::Result<OrderFindV1Rsp> {
//!         if req.id <= 0 {
//!             return Err(ApiError::with_description("1", Description::new().with("id", req.id)).into());
//!         }
//!         Ok(OrderFindV1Rsp { state: "open".to_string() })
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> orz_web::error::Result<()> {
//!     let config = Config::load()?;
//!     let state = WebState::new(config.clone())?;
//!     let app = ApiRouter::new(state).api(OrderFindV1Api).build()?;
//!     Server::new(config).serve(app).await
//! }
//! ```

use std::error::Error as StdError;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    middleware::{from_fn_with_state, Next},
    response::{IntoResponse, Response},
    routing::{post, put},
    Json, Router,
};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{error, info, Level};

use crate::{
    api_error::ApiError,
    chain::find_in_anyhow,
    context::RequestContext,
    contract::ErrorContracts,
    description::Description,
    error::{Error, Result},
    headers::HeaderError,
    protocol::Protocol,
    reporter::{report_safely, ErrorReport},
    route::{
        derive_handler_route, module_path, simple_name, ApiDescriptor, EntryPoint, HttpMethod,
        Param, ParamMarker, Route, RouteError, RouteSpec, TypeRef, ENTRY_POINT,
    },
    state::WebState,
};

/// Request payload check run before the handler
///
/// The default accepts everything.
pub trait Validate {
    fn validate(&self) -> std::result::Result<(), String> {
        Ok(())
    }
}

/// An API operation
#[async_trait]
pub trait WebApi: Send + Sync + 'static {
    /// Request body, named `{Pattern}Req`
    type Req: DeserializeOwned + Validate + Send + 'static;

    /// Response body, named `{Pattern}Rsp`
    type Rsp: Serialize + Send + 'static;

    /// Declared identity the route is derived from
    const SPEC: RouteSpec;

    /// Error codes this operation answers with
    fn errors() -> ErrorContracts {
        ErrorContracts::none()
    }

    /// Serve one request
    ///
    /// Return an [`ApiError`] (possibly wrapped in context) to answer with a
    /// declared code. Any other error is left to the transport layer.
    async fn request(&self, ctx: &RequestContext, req: Self::Req) -> anyhow::Result<Self::Rsp>;
}

/// Describe a handler for route derivation
pub fn describe<A: WebApi>() -> ApiDescriptor {
    let full = std::any::type_name::<A>();
    ApiDescriptor {
        handler: simple_name(full).to_string(),
        module_path: module_path(full).to_string(),
        spec: A::SPEC,
        methods: vec![EntryPoint {
            name: ENTRY_POINT.to_string(),
            public: true,
            params: vec![Param {
                markers: vec![ParamMarker::Validated, ParamMarker::Body],
                ty: TypeRef::of_request::<A::Req>(),
            }],
            returns: TypeRef::of::<A::Rsp>(),
        }],
    }
}

/// A registered operation
#[derive(Debug, Clone)]
pub struct RegisteredApi {
    pub handler: String,
    pub route: Route,
    pub contracts: ErrorContracts,
}

/// Collects API handlers into an axum router
pub struct ApiRouter {
    state: WebState,
    router: Router<WebState>,
    apis: Vec<RegisteredApi>,
    defects: Vec<RouteError>,
}

impl ApiRouter {
    pub fn new(state: WebState) -> Self {
        Self {
            state,
            router: Router::new(),
            apis: Vec::new(),
            defects: Vec::new(),
        }
    }

    /// Register a handler
    ///
    /// Convention defects are collected and reported by [`build`](Self::build).
    pub fn api<A: WebApi>(mut self, handler: A) -> Self {
        match self.register(handler) {
            Ok(api) => {
                info!(handler = %api.handler, route = %api.route, "api registered");
                self.apis.push(api);
            }
            Err(defect) => {
                error!(error = %defect, "api rejected");
                self.defects.push(defect);
            }
        }
        self
    }

    fn register<A: WebApi>(&mut self, handler: A) -> std::result::Result<RegisteredApi, RouteError> {
        let descriptor = describe::<A>();
        let route = derive_handler_route(self.state.convention(), &descriptor)?;
        let contracts = A::errors();
        contracts.validate(&descriptor.handler)?;

        if self.apis.iter().any(|api| api.route == route) {
            return Err(RouteError::DuplicateRoute {
                method: route.method,
                path: route.path,
            });
        }

        let handler = Arc::new(handler);
        let shared_contracts = Arc::new(contracts.clone());
        let operation: Arc<str> = Arc::from(route.path.as_str());
        let endpoint = move |State(state): State<WebState>,
                             ctx: RequestContext,
                             Json(req): Json<A::Req>| {
            let handler = Arc::clone(&handler);
            let contracts = Arc::clone(&shared_contracts);
            let operation = Arc::clone(&operation);
            async move { dispatch(&state, handler.as_ref(), &contracts, &operation, &ctx, req).await }
        };

        let method_router = match route.method {
            HttpMethod::Put => put(endpoint),
            HttpMethod::Post => post(endpoint),
        };
        self.router = std::mem::take(&mut self.router).route(&route.path, method_router);

        Ok(RegisteredApi {
            handler: descriptor.handler,
            route,
            contracts,
        })
    }

    /// Operations registered so far
    pub fn apis(&self) -> &[RegisteredApi] {
        &self.apis
    }

    /// Finish registration
    ///
    /// Fails with the first convention defect found. Routes are served under
    /// the configured context path.
    pub fn build(self) -> Result<Router> {
        if let Some(defect) = self.defects.into_iter().next() {
            return Err(Error::Route(defect));
        }

        let context_path = self.state.context_path().to_string();
        let router = if context_path.is_empty() {
            self.router
        } else {
            let prefix = if context_path.starts_with('/') {
                context_path
            } else {
                format!("/{context_path}")
            };
            Router::new().nest(&prefix, self.router)
        };

        Ok(router
            .layer(from_fn_with_state(self.state.clone(), attach_context))
            .with_state(self.state))
    }
}

/// Store the request context, configured from the state, in the extensions
async fn attach_context(State(state): State<WebState>, mut request: Request, next: Next) -> Response {
    let ctx = RequestContext::capture(
        request.method(),
        request.uri(),
        request.headers(),
        request.extensions(),
    )
    .with_context_path(state.context_path())
    .with_extractor(state.extractor());
    request.extensions_mut().insert(ctx);
    next.run(request).await
}

async fn dispatch<A: WebApi>(
    state: &WebState,
    handler: &A,
    contracts: &ErrorContracts,
    operation: &str,
    ctx: &RequestContext,
    req: A::Req,
) -> Response {
    if let Err(message) = req.validate() {
        return Error::ValidationError(message).into_response();
    }
    match handler.request(ctx, req).await {
        Ok(rsp) => state.assembler().success(rsp),
        Err(err) => error_response(state, contracts, operation, ctx, err),
    }
}

/// Protocol answer and reporting flags for a raised [`ApiError`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub protocol: Protocol,
    pub reason: Option<String>,
    pub alarm: bool,
    pub logging: bool,
}

/// Match `error` against the declared contracts
pub fn resolve(contracts: &ErrorContracts, error: &ApiError) -> Resolution {
    match contracts.lookup(error.code()) {
        Some(contract) => {
            let reason = if contract.reason().trim().is_empty() {
                Description::summary(contract.description())
                    .merge(error.description())
                    .to_string()
            } else {
                error.description().render(contract.reason())
            };
            Resolution {
                protocol: Protocol::error(contract.code(), contract.notice()),
                reason: Some(reason).filter(|r| !r.trim().is_empty()),
                alarm: contract.alarm(),
                logging: contract.logging(),
            }
        }
        None => {
            let mut context = Description::summary("undefined error").with("code", error.code());
            if let Some(summary) = error.description().summary_text() {
                context = context.with("summary", summary);
            }
            Resolution {
                protocol: Protocol::error_undefined(),
                reason: Some(context.merge(error.description()).to_string()),
                alarm: true,
                logging: true,
            }
        }
    }
}

/// Answer a failed handler call
///
/// Errors carrying an [`ApiError`] get the protocol envelope. Anything else
/// is answered by the transport layer without protocol headers.
pub fn error_response(
    state: &WebState,
    contracts: &ErrorContracts,
    operation: &str,
    ctx: &RequestContext,
    err: anyhow::Error,
) -> Response {
    let Some(api_error) = find_in_anyhow::<ApiError>(&err) else {
        return transport_response(err);
    };

    let resolution = resolve(contracts, api_error);
    let cause: &(dyn StdError + 'static) = err.as_ref();

    report_safely(
        state.reporter(),
        &ErrorReport {
            alarm: resolution.alarm,
            logging: resolution.logging,
            reason: resolution.reason.as_deref(),
            cause,
            operation,
            level: Level::ERROR,
        },
    );

    state.assembler().error(
        &resolution.protocol,
        resolution.reason.as_deref(),
        api_error.traces().to_vec(),
        cause,
        ctx,
    )
}

fn transport_response(err: anyhow::Error) -> Response {
    let err = match err.downcast::<Error>() {
        Ok(err) => return err.into_response(),
        Err(err) => err,
    };
    match err.downcast::<HeaderError>() {
        Ok(header) => Error::Header(header).into_response(),
        Err(err) => Error::Internal(format!("{err:#}")).into_response(),
    }
}
