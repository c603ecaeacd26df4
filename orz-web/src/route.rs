//! Convention-derived routes
//!
//! An API handler never spells out its URL. It declares what it does (domain,
//! optional resource, action, variant and whether it is idempotent) and the
//! HTTP method and path are derived from that declaration:
//!
//! - idempotent operations are served with `PUT`, all others with `POST`
//! - the path is `/{Scope}/{Domain}/{Resource}{Action}V{variant}`
//!
//! The scope comes from the handler's module path: the module following the
//! last `api` module, with `snake_case` parts capitalized (`api::scope_v1`
//! gives `ScopeV1`). Handler, request and response type names must follow
//! the same pattern (`TestFindV1Api`, `TestFindV1Req`, `TestFindV1Rsp`).
//! Violations are reported when the router is built, never at request time.
//!
//! ```rust
//! use orz_web::route::{capitalize, scope_from_module_path};
//!
//! assert_eq!(scope_from_module_path("shop::api::scope_v1", "api"), Some("ScopeV1".to_string()));
//! assert_eq!(scope_from_module_path("shop::api", "api"), None);
//! assert_eq!(capitalize("find"), "Find");
//! ```

use std::fmt;

use axum::http::Method;
use serde::de::{self, DeserializeOwned, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

/// Identity an API handler declares
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteSpec {
    pub domain: &'static str,
    pub resource: Option<&'static str>,
    pub action: &'static str,
    pub variant: u32,
    pub idempotent: bool,
}

impl RouteSpec {
    /// Non-idempotent operation without resource and variant
    pub const fn new(domain: &'static str, action: &'static str) -> Self {
        Self {
            domain,
            resource: None,
            action,
            variant: 0,
            idempotent: false,
        }
    }

    #[must_use]
    pub const fn resource(mut self, resource: &'static str) -> Self {
        self.resource = Some(resource);
        self
    }

    #[must_use]
    pub const fn variant(mut self, variant: u32) -> Self {
        self.variant = variant;
        self
    }

    #[must_use]
    pub const fn idempotent(mut self, idempotent: bool) -> Self {
        self.idempotent = idempotent;
        self
    }
}

/// Name of the handler method serving requests, fixed by [`WebApi`](crate::router::WebApi)
pub const ENTRY_POINT: &str = "request";

/// Naming convention applied when deriving routes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteConvention {
    /// Module name whose child module names the scope
    pub sentinel: String,
    /// Omit the `V0` suffix for variant zero
    pub suppress_zero_variant: bool,
    /// Reject handlers without a scope
    pub require_scope: bool,
}

impl Default for RouteConvention {
    fn default() -> Self {
        Self {
            sentinel: "api".to_string(),
            suppress_zero_variant: true,
            require_scope: false,
        }
    }
}

/// HTTP method of a derived route
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Put,
    Post,
}

impl HttpMethod {
    pub fn as_method(self) -> Method {
        match self {
            HttpMethod::Put => Method::PUT,
            HttpMethod::Post => Method::POST,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HttpMethod::Put => write!(f, "PUT"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// A derived route
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub method: HttpMethod,
    pub path: String,
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.path)
    }
}

/// Broad category of a type taking part in an operation signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Struct,
    Enum,
    Primitive,
    Array,
    Interface,
    Annotation,
}

impl fmt::Display for TypeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TypeKind::Struct => "struct",
            TypeKind::Enum => "enum",
            TypeKind::Primitive => "primitive",
            TypeKind::Array => "array",
            TypeKind::Interface => "interface",
            TypeKind::Annotation => "annotation",
        };
        f.write_str(name)
    }
}

const PRIMITIVES: &[&str] = &[
    "bool", "char", "str", "()", "i8", "i16", "i32", "i64", "i128", "isize", "u8", "u16", "u32",
    "u64", "u128", "usize", "f32", "f64",
];

/// Simple name and kind of a type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeRef {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Describe `T` from its type name
    ///
    /// Slices, arrays and `Vec` are arrays, trait objects are interfaces,
    /// builtin scalars are primitives and everything else is a struct.
    pub fn of<T: ?Sized>() -> Self {
        Self::parse(std::any::type_name::<T>())
    }

    /// Describe a request type from the shape its `Deserialize` impl asks for
    ///
    /// Unlike [`TypeRef::of`] this tells enums apart from structs. Enums
    /// serde deserializes without a tag (`untagged`, internally tagged) are
    /// reported as primitives.
    pub fn of_request<T: DeserializeOwned>() -> Self {
        let kind = match T::deserialize(ShapeReader) {
            Err(Shape(kind)) => kind,
            Ok(_) => TypeKind::Struct,
        };
        Self::new(simple_name(std::any::type_name::<T>()), kind)
    }

    fn parse(full: &str) -> Self {
        let kind = if full.starts_with('[')
            || full.starts_with("&[")
            || full.starts_with("alloc::vec::Vec<")
        {
            TypeKind::Array
        } else if full.starts_with("dyn ") || full.starts_with("&dyn ") {
            TypeKind::Interface
        } else if full.starts_with('(') || PRIMITIVES.contains(&full.trim_start_matches('&')) {
            TypeKind::Primitive
        } else {
            TypeKind::Struct
        };
        Self::new(simple_name(full), kind)
    }
}

/// Kind reported by [`ShapeReader`], carried as its error
#[derive(Debug)]
struct Shape(TypeKind);

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "shape is {}", self.0)
    }
}

impl std::error::Error for Shape {}

impl de::Error for Shape {
    fn custom<T: fmt::Display>(_msg: T) -> Self {
        Shape(TypeKind::Struct)
    }
}

/// Deserializer that fails on the first request, naming what was asked for
struct ShapeReader;

impl<'de> Deserializer<'de> for ShapeReader {
    type Error = Shape;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Shape> {
        Err(Shape(TypeKind::Primitive))
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Shape> {
        visitor.visit_some(self)
    }

    fn deserialize_newtype_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        visitor: V,
    ) -> Result<V::Value, Shape> {
        visitor.visit_newtype_struct(self)
    }

    fn deserialize_unit_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _visitor: V,
    ) -> Result<V::Value, Shape> {
        Err(Shape(TypeKind::Struct))
    }

    fn deserialize_tuple_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Shape> {
        Err(Shape(TypeKind::Struct))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Shape> {
        Err(Shape(TypeKind::Struct))
    }

    fn deserialize_map<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Shape> {
        Err(Shape(TypeKind::Struct))
    }

    fn deserialize_enum<V: Visitor<'de>>(
        self,
        _name: &'static str,
        _variants: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Shape> {
        Err(Shape(TypeKind::Enum))
    }

    fn deserialize_seq<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Shape> {
        Err(Shape(TypeKind::Array))
    }

    fn deserialize_tuple<V: Visitor<'de>>(
        self,
        _len: usize,
        _visitor: V,
    ) -> Result<V::Value, Shape> {
        Err(Shape(TypeKind::Array))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit identifier ignored_any
    }
}

/// Last path segment of a type name, generics removed
pub fn simple_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Module path of a fully qualified type name
pub fn module_path(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit_once("::").map(|(module, _)| module).unwrap_or("")
}

/// Marker carried by an entry-point parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamMarker {
    /// The parameter is validated before the handler runs
    Validated,
    /// The parameter is the request body
    Body,
}

impl fmt::Display for ParamMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamMarker::Validated => f.write_str("validated"),
            ParamMarker::Body => f.write_str("body"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    pub markers: Vec<ParamMarker>,
    pub ty: TypeRef,
}

/// A method declared by a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryPoint {
    pub name: String,
    pub public: bool,
    pub params: Vec<Param>,
    pub returns: TypeRef,
}

/// Everything route derivation needs to know about a handler
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiDescriptor {
    /// Simple type name of the handler
    pub handler: String,
    /// Module path of the handler, `::`-separated
    pub module_path: String,
    pub spec: RouteSpec,
    pub methods: Vec<EntryPoint>,
}

/// Defects found while registering a handler
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteError {
    #[error("{handler} declares no `{entry_point}` entry point")]
    MissingEntryPoint { handler: String, entry_point: String },

    #[error("{handler} has no scope, its module path contains no child of the `{sentinel}` module")]
    BlankScope { handler: String, sentinel: String },

    #[error("{handler} declares a blank domain")]
    BlankDomain { handler: String },

    #[error("{handler} declares a blank action")]
    BlankAction { handler: String },

    #[error("handler is named {actual}, expected {expected}")]
    HandlerName { actual: String, expected: String },

    #[error("{handler} entry point is not public")]
    EntryPointNotPublic { handler: String },

    #[error("{handler} entry point takes {count} parameters, expected exactly one")]
    ParameterCount { handler: String, count: usize },

    #[error("{handler} entry point parameter is not marked {marker}")]
    MissingMarker { handler: String, marker: ParamMarker },

    #[error("{handler} request type is {kind}, expected a struct")]
    ParameterKind { handler: String, kind: TypeKind },

    #[error("{handler} request type is named {actual}, expected {expected}")]
    ParameterName {
        handler: String,
        actual: String,
        expected: String,
    },

    #[error("{handler} response type is {kind}, expected a struct")]
    ReturnKind { handler: String, kind: TypeKind },

    #[error("{handler} response type is named {actual}, expected {expected}")]
    ReturnName {
        handler: String,
        actual: String,
        expected: String,
    },

    #[error("{handler} declares an error contract with a blank code")]
    BlankErrorCode { handler: String },

    #[error("{handler} declares error code {code} more than once")]
    DuplicateErrorCode { handler: String, code: String },

    #[error("route {method} {path} is served by more than one handler")]
    DuplicateRoute { method: HttpMethod, path: String },
}

/// Uppercase the first character
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Scope named by the module following the last `sentinel` module
pub fn scope_from_module_path(module_path: &str, sentinel: &str) -> Option<String> {
    let segments: Vec<&str> = module_path.split("::").collect();
    if segments.len() < 2 {
        return None;
    }
    let index = segments.iter().rposition(|s| *s == sentinel)?;
    let scope_segment = segments.get(index + 1)?;
    let scope: String = scope_segment
        .split('_')
        .filter(|part| !part.is_empty())
        .map(capitalize)
        .collect();
    (!scope.is_empty()).then_some(scope)
}

/// Name shared by the handler, request and response types, without suffix
pub fn name_pattern(convention: &RouteConvention, spec: &RouteSpec) -> String {
    let mut pattern = capitalize(spec.domain);
    if let Some(resource) = spec.resource {
        pattern.push_str(&capitalize(resource));
    }
    pattern.push_str(&capitalize(spec.action));
    pattern.push_str(&variant_suffix(convention, spec.variant));
    pattern
}

fn variant_suffix(convention: &RouteConvention, variant: u32) -> String {
    if variant == 0 && convention.suppress_zero_variant {
        String::new()
    } else {
        format!("V{variant}")
    }
}

/// Derive the route served by `method` of the described handler
///
/// Returns `Ok(None)` when `method` is not [`ENTRY_POINT`]. The visibility,
/// parameter count and marker checks only matter for descriptors supplied
/// from outside; [`describe`](crate::router::describe) always satisfies them.
pub fn derive_route(
    convention: &RouteConvention,
    descriptor: &ApiDescriptor,
    method: &EntryPoint,
) -> Result<Option<Route>, RouteError> {
    if method.name != ENTRY_POINT {
        return Ok(None);
    }

    let handler = descriptor.handler.as_str();
    let spec = &descriptor.spec;

    let scope = scope_from_module_path(&descriptor.module_path, &convention.sentinel);
    if scope.is_none() && convention.require_scope {
        return Err(RouteError::BlankScope {
            handler: handler.to_string(),
            sentinel: convention.sentinel.clone(),
        });
    }
    if spec.domain.trim().is_empty() {
        return Err(RouteError::BlankDomain {
            handler: handler.to_string(),
        });
    }
    if spec.action.trim().is_empty() {
        return Err(RouteError::BlankAction {
            handler: handler.to_string(),
        });
    }

    let pattern = name_pattern(convention, spec);
    let expected = format!("{pattern}Api");
    if handler != expected {
        return Err(RouteError::HandlerName {
            actual: handler.to_string(),
            expected,
        });
    }

    if !method.public {
        return Err(RouteError::EntryPointNotPublic {
            handler: handler.to_string(),
        });
    }

    let [param] = method.params.as_slice() else {
        return Err(RouteError::ParameterCount {
            handler: handler.to_string(),
            count: method.params.len(),
        });
    };
    for marker in [ParamMarker::Validated, ParamMarker::Body] {
        if !param.markers.contains(&marker) {
            return Err(RouteError::MissingMarker {
                handler: handler.to_string(),
                marker,
            });
        }
    }
    if param.ty.kind != TypeKind::Struct {
        return Err(RouteError::ParameterKind {
            handler: handler.to_string(),
            kind: param.ty.kind,
        });
    }
    let expected = format!("{pattern}Req");
    if param.ty.name != expected {
        return Err(RouteError::ParameterName {
            handler: handler.to_string(),
            actual: param.ty.name.clone(),
            expected,
        });
    }

    if method.returns.kind != TypeKind::Struct {
        return Err(RouteError::ReturnKind {
            handler: handler.to_string(),
            kind: method.returns.kind,
        });
    }
    let expected = format!("{pattern}Rsp");
    if method.returns.name != expected {
        return Err(RouteError::ReturnName {
            handler: handler.to_string(),
            actual: method.returns.name.clone(),
            expected,
        });
    }

    let mut path = String::from("/");
    if let Some(scope) = scope {
        path.push_str(&scope);
        path.push('/');
    }
    path.push_str(&capitalize(spec.domain));
    path.push('/');
    if let Some(resource) = spec.resource {
        path.push_str(&capitalize(resource));
    }
    path.push_str(&capitalize(spec.action));
    path.push_str(&variant_suffix(convention, spec.variant));

    let method = if spec.idempotent {
        HttpMethod::Put
    } else {
        HttpMethod::Post
    };

    debug!(handler, %method, path = %path, "route derived");
    Ok(Some(Route { method, path }))
}

/// Derive the single route of a handler
///
/// Fails with [`RouteError::MissingEntryPoint`] when no declared method is the
/// entry point.
pub fn derive_handler_route(
    convention: &RouteConvention,
    descriptor: &ApiDescriptor,
) -> Result<Route, RouteError> {
    for method in &descriptor.methods {
        if let Some(route) = derive_route(convention, descriptor, method)? {
            return Ok(route);
        }
    }
    Err(RouteError::MissingEntryPoint {
        handler: descriptor.handler.clone(),
        entry_point: ENTRY_POINT.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(req: &str, rsp: &str) -> EntryPoint {
        EntryPoint {
            name: ENTRY_POINT.to_string(),
            public: true,
            params: vec![Param {
                markers: vec![ParamMarker::Validated, ParamMarker::Body],
                ty: TypeRef::new(req, TypeKind::Struct),
            }],
            returns: TypeRef::new(rsp, TypeKind::Struct),
        }
    }

    fn descriptor(module_path: &str, spec: RouteSpec, prefix: &str) -> ApiDescriptor {
        ApiDescriptor {
            handler: format!("{prefix}Api"),
            module_path: module_path.to_string(),
            spec,
            methods: vec![entry(&format!("{prefix}Req"), &format!("{prefix}Rsp"))],
        }
    }

    fn find_v1() -> ApiDescriptor {
        descriptor(
            "shop::api::scope_v1",
            RouteSpec::new("Test", "Find").variant(1),
            "TestFindV1",
        )
    }

    #[allow(dead_code)]
    #[derive(Deserialize)]
    struct ShapeReq {
        id: i64,
    }

    #[allow(dead_code)]
    #[derive(Deserialize)]
    enum ShapeEnumReq {
        A,
        B(i64),
    }

    #[test]
    fn test_request_shapes() {
        let struct_ref = TypeRef::of_request::<ShapeReq>();
        assert_eq!(struct_ref.kind, TypeKind::Struct);
        assert_eq!(struct_ref.name, "ShapeReq");

        assert_eq!(TypeRef::of_request::<ShapeEnumReq>().kind, TypeKind::Enum);
        assert_eq!(TypeRef::of_request::<Option<ShapeEnumReq>>().kind, TypeKind::Enum);
        assert_eq!(TypeRef::of_request::<Vec<ShapeReq>>().kind, TypeKind::Array);
        assert_eq!(TypeRef::of_request::<i64>().kind, TypeKind::Primitive);
        assert_eq!(TypeRef::of_request::<String>().kind, TypeKind::Primitive);
    }

    #[test]
    fn test_scoped_route() {
        let route = derive_handler_route(&RouteConvention::default(), &find_v1()).unwrap();
        assert_eq!(route.method, HttpMethod::Post);
        assert_eq!(route.path, "/ScopeV1/Test/FindV1");
    }

    #[test]
    fn test_unscoped_route() {
        let mut descriptor = find_v1();
        descriptor.module_path = "shop::api".to_string();
        let route = derive_handler_route(&RouteConvention::default(), &descriptor).unwrap();
        assert_eq!(route.path, "/Test/FindV1");
    }

    #[test]
    fn test_idempotent_uses_put() {
        let descriptor = descriptor(
            "shop::api::scope_v1",
            RouteSpec::new("test", "query").variant(1).idempotent(true),
            "TestQueryV1",
        );
        let route = derive_handler_route(&RouteConvention::default(), &descriptor).unwrap();
        assert_eq!(route.method, HttpMethod::Put);
        assert_eq!(route.path, "/ScopeV1/Test/QueryV1");
    }

    #[test]
    fn test_resource_and_zero_variant() {
        let descriptor = descriptor(
            "shop::api::orders",
            RouteSpec::new("order", "cancel").resource("item"),
            "OrderItemCancel",
        );
        let route = derive_handler_route(&RouteConvention::default(), &descriptor).unwrap();
        assert_eq!(route.path, "/Orders/Order/ItemCancel");

        let convention = RouteConvention {
            suppress_zero_variant: false,
            ..RouteConvention::default()
        };
        let err = derive_handler_route(&convention, &descriptor).unwrap_err();
        assert_eq!(
            err,
            RouteError::HandlerName {
                actual: "OrderItemCancelApi".to_string(),
                expected: "OrderItemCancelV0Api".to_string(),
            }
        );
    }

    #[test]
    fn test_non_entry_point_is_skipped() {
        let descriptor = find_v1();
        let mut helper = descriptor.methods[0].clone();
        helper.name = "helper".to_string();
        let route = derive_route(&RouteConvention::default(), &descriptor, &helper).unwrap();
        assert!(route.is_none());
    }

    #[test]
    fn test_missing_entry_point() {
        let mut descriptor = find_v1();
        descriptor.methods[0].name = "handle".to_string();
        let err = derive_handler_route(&RouteConvention::default(), &descriptor).unwrap_err();
        assert!(matches!(err, RouteError::MissingEntryPoint { .. }));
    }

    #[test]
    fn test_required_scope() {
        let mut descriptor = find_v1();
        descriptor.module_path = "shop::handlers".to_string();
        let convention = RouteConvention {
            require_scope: true,
            ..RouteConvention::default()
        };
        let err = derive_handler_route(&convention, &descriptor).unwrap_err();
        assert!(matches!(err, RouteError::BlankScope { .. }));
    }

    #[test]
    fn test_blank_domain_and_action() {
        let mut descriptor = find_v1();
        descriptor.spec.domain = " ";
        assert!(matches!(
            derive_handler_route(&RouteConvention::default(), &descriptor),
            Err(RouteError::BlankDomain { .. })
        ));

        let mut descriptor = find_v1();
        descriptor.spec.action = "";
        assert!(matches!(
            derive_handler_route(&RouteConvention::default(), &descriptor),
            Err(RouteError::BlankAction { .. })
        ));
    }

    #[test]
    fn test_name_mismatches() {
        let convention = RouteConvention::default();

        let mut descriptor = find_v1();
        descriptor.handler = "FindApi".to_string();
        assert!(matches!(
            derive_handler_route(&convention, &descriptor),
            Err(RouteError::HandlerName { .. })
        ));

        let mut descriptor = find_v1();
        descriptor.methods[0].params[0].ty.name = "FindReq".to_string();
        assert!(matches!(
            derive_handler_route(&convention, &descriptor),
            Err(RouteError::ParameterName { .. })
        ));

        let mut descriptor = find_v1();
        descriptor.methods[0].returns.name = "FindRsp".to_string();
        assert!(matches!(
            derive_handler_route(&convention, &descriptor),
            Err(RouteError::ReturnName { .. })
        ));
    }

    #[test]
    fn test_signature_defects() {
        let convention = RouteConvention::default();

        let mut descriptor = find_v1();
        descriptor.methods[0].public = false;
        assert!(matches!(
            derive_handler_route(&convention, &descriptor),
            Err(RouteError::EntryPointNotPublic { .. })
        ));

        let mut descriptor = find_v1();
        let extra = descriptor.methods[0].params[0].clone();
        descriptor.methods[0].params.push(extra);
        assert!(matches!(
            derive_handler_route(&convention, &descriptor),
            Err(RouteError::ParameterCount { count: 2, .. })
        ));

        let mut descriptor = find_v1();
        descriptor.methods[0].params[0].markers = vec![ParamMarker::Body];
        assert!(matches!(
            derive_handler_route(&convention, &descriptor),
            Err(RouteError::MissingMarker {
                marker: ParamMarker::Validated,
                ..
            })
        ));

        let mut descriptor = find_v1();
        descriptor.methods[0].params[0].ty.kind = TypeKind::Enum;
        assert!(matches!(
            derive_handler_route(&convention, &descriptor),
            Err(RouteError::ParameterKind {
                kind: TypeKind::Enum,
                ..
            })
        ));

        let mut descriptor = find_v1();
        descriptor.methods[0].returns.kind = TypeKind::Interface;
        assert!(matches!(
            derive_handler_route(&convention, &descriptor),
            Err(RouteError::ReturnKind { .. })
        ));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let convention = RouteConvention::default();
        let first = derive_handler_route(&convention, &find_v1()).unwrap();
        let second = derive_handler_route(&convention, &find_v1()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_scope_from_module_path() {
        assert_eq!(
            scope_from_module_path("a::api::b::api::user_profile", "api"),
            Some("UserProfile".to_string())
        );
        assert_eq!(scope_from_module_path("api", "api"), None);
        assert_eq!(scope_from_module_path("shop::web", "api"), None);
    }

    #[test]
    fn test_type_ref_kinds() {
        struct TestFindV1Req;
        assert_eq!(TypeRef::of::<TestFindV1Req>().name, "TestFindV1Req");
        assert_eq!(TypeRef::of::<TestFindV1Req>().kind, TypeKind::Struct);
        assert_eq!(TypeRef::of::<Vec<u8>>().kind, TypeKind::Array);
        assert_eq!(TypeRef::of::<[u8]>().kind, TypeKind::Array);
        assert_eq!(TypeRef::of::<i64>().kind, TypeKind::Primitive);
        assert_eq!(TypeRef::of::<()>().kind, TypeKind::Primitive);
        assert_eq!(TypeRef::of::<dyn std::error::Error>().kind, TypeKind::Interface);
    }

    #[test]
    fn test_module_path() {
        assert_eq!(module_path("shop::api::v1::TestFindV1Api"), "shop::api::v1");
        assert_eq!(simple_name("alloc::vec::Vec<u8>"), "Vec");
        assert_eq!(module_path("Plain"), "");
    }
}
