//! Configuration management using Figment
//!
//! Configuration is loaded from multiple sources with the following precedence (highest to lowest):
//! 1. Environment variables (prefix: ORZ_, `__` separates nested keys)
//! 2. Current working directory: ./config.toml
//! 3. XDG config directory: ~/.config/orz-web/{service_name}/config.toml
//! 4. System directory: /etc/orz-web/{service_name}/config.toml
//! 5. Default values
//!
//! ```toml
//! [service]
//! name = "orders"
//! port = 8080
//!
//! [web]
//! expose_error_reason = true
//! context_path = "/shop"
//!
//! [web.request_headers.device_id]
//! name = "Orz-Device-Id"
//! required = false
//! ```
//!
//! The same keys can be set from the environment, e.g.
//! `ORZ_WEB__EXPOSE_ERROR_TRACES=true`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cors::CorsRule;
use crate::error::Result;
use crate::headers::RequestHeaderRules;
use crate::pagination::PageConfig;
use crate::response::{ExposurePolicy, ResponseHeaderNames};
use crate::route::RouteConvention;

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "ORZ_";

/// Separator of nested keys in environment variable names
pub const ENV_SEPARATOR: &str = "__";

const XDG_PREFIX: &str = "orz-web";

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Service configuration
    pub service: ServiceConfig,

    /// API conventions
    #[serde(default)]
    pub web: WebConfig,
}

/// Service-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Service name
    pub name: String,

    /// Port to listen on
    #[serde(default = "default_port")]
    pub port: u16,

    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Environment (dev, staging, production)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Maximum request body size in megabytes
    #[serde(default = "default_body_limit_mb")]
    pub body_limit_mb: usize,
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn body_limit_bytes(&self) -> usize {
        self.body_limit_mb * 1024 * 1024
    }
}

/// API convention settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Service name reported in error traces, defaults to `service.name`
    pub service: Option<String>,

    /// Include the internal reason in error bodies
    pub expose_error_reason: bool,

    /// Include diagnostic traces in error bodies
    pub expose_error_traces: bool,

    /// Path prefix all API routes are served under
    pub context_path: String,

    /// Names and required flags of the well-known request headers
    pub request_headers: RequestHeaderRules,

    /// Names of the protocol response headers
    pub response_headers: ResponseHeaderNames,

    /// Route naming convention
    pub route: RouteConvention,

    /// Page size bounds
    pub page: PageConfig,

    /// CORS rules keyed by path pattern
    pub cors: HashMap<String, CorsRule>,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            service: None,
            expose_error_reason: false,
            expose_error_traces: false,
            context_path: String::new(),
            request_headers: RequestHeaderRules::default(),
            response_headers: ResponseHeaderNames::default(),
            route: RouteConvention::default(),
            page: PageConfig::default(),
            cors: HashMap::new(),
        }
    }
}

impl WebConfig {
    /// Name reported in error traces
    pub fn service_name<'a>(&'a self, service: &'a ServiceConfig) -> &'a str {
        self.service
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&service.name)
    }

    pub fn exposure(&self) -> ExposurePolicy {
        ExposurePolicy {
            expose_reason: self.expose_error_reason,
            expose_traces: self.expose_error_traces,
        }
    }
}

// Default value functions
fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_environment() -> String {
    "dev".to_string()
}

fn default_body_limit_mb() -> usize {
    10
}

impl Config {
    /// Load configuration from all sources
    ///
    /// The service name is inferred from the binary name.
    pub fn load() -> Result<Self> {
        let service_name = std::env::current_exe()
            .ok()
            .and_then(|p| p.file_stem().map(|s| s.to_string_lossy().into_owned()))
            .unwrap_or_else(|| XDG_PREFIX.to_string());

        Self::load_for_service(&service_name)
    }

    /// Load configuration for a specific service name
    pub fn load_for_service(service_name: &str) -> Result<Self> {
        let config_paths = Self::find_config_paths(service_name);

        tracing::debug!("Searching for config files in order:");
        for path in &config_paths {
            tracing::debug!("  - {}", path.display());
        }

        let mut figment = Figment::new().merge(Serialized::defaults(Config::named(service_name)));

        // Lowest priority first so later files override earlier ones
        for path in config_paths.iter().rev() {
            if path.exists() {
                tracing::info!("Loading configuration from: {}", path.display());
                figment = figment.merge(Toml::file(path));
            }
        }

        Ok(Self::with_env(figment, ENV_PREFIX).extract()?)
    }

    /// Load configuration from a specific file
    ///
    /// Bypasses the XDG and system directories. Environment variables still
    /// apply.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()));

        Ok(Self::with_env(figment, ENV_PREFIX).extract()?)
    }

    fn with_env(figment: Figment, prefix: &str) -> Figment {
        figment.merge(Env::prefixed(prefix).split(ENV_SEPARATOR))
    }

    /// Find all possible config file paths for a service, highest priority first
    fn find_config_paths(service_name: &str) -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("config.toml")];

        let xdg_dirs = xdg::BaseDirectories::with_prefix(XDG_PREFIX);
        let config_file_path = Path::new(service_name).join("config.toml");
        if let Ok(path) = xdg_dirs.place_config_file(&config_file_path) {
            paths.push(path);
        }

        paths.push(
            PathBuf::from("/etc")
                .join(XDG_PREFIX)
                .join(service_name)
                .join("config.toml"),
        );

        paths
    }

    /// Where the config file of a service should live in production
    ///
    /// Returns: ~/.config/orz-web/{service_name}/config.toml
    pub fn recommended_path(service_name: &str) -> PathBuf {
        let xdg_dirs = xdg::BaseDirectories::with_prefix(XDG_PREFIX);
        let config_file_path = Path::new(service_name).join("config.toml");

        xdg_dirs
            .place_config_file(&config_file_path)
            .unwrap_or_else(|_| {
                PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| String::from("~")))
                    .join(".config")
                    .join(XDG_PREFIX)
                    .join(service_name)
                    .join("config.toml")
            })
    }

    /// Default configuration for `service_name`
    pub fn named(service_name: &str) -> Self {
        let mut config = Self::default();
        config.service.name = service_name.to_string();
        config
    }

    /// Name reported in error traces
    pub fn service_name(&self) -> &str {
        self.web.service_name(&self.service)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: ServiceConfig {
                name: XDG_PREFIX.to_string(),
                port: default_port(),
                log_level: default_log_level(),
                timeout_secs: default_timeout(),
                environment: default_environment(),
                body_limit_mb: default_body_limit_mb(),
            },
            web: WebConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.service.port, 8080);
        assert_eq!(config.service.log_level, "info");
        assert!(!config.web.expose_error_reason);
        assert!(!config.web.expose_error_traces);
        assert_eq!(config.web.page.default_size, 50);
        assert_eq!(config.web.response_headers.code, "Orz-Code");
        assert!(config.web.request_headers.request_id.required);
        assert!(!config.web.request_headers.user_id.required);
        assert!(config.web.cors.is_empty());
    }

    #[test]
    fn test_service_name_fallback() {
        let mut config = Config::named("orders");
        assert_eq!(config.service_name(), "orders");
        config.web.service = Some("orders-api".to_string());
        assert_eq!(config.service_name(), "orders-api");
        config.web.service = Some(" ".to_string());
        assert_eq!(config.service_name(), "orders");
    }

    #[test]
    fn test_load_from_toml() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[service]
name = "orders"
port = 9090

[web]
expose_error_reason = true
context_path = "/shop"

[web.request_headers.device_id]
name = "X-Device"
required = false

[web.page]
max_size = 20

[web.cors."/**"]
allowed_origins = ["https://app.example.com"]
"#
        )
        .unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.service.name, "orders");
        assert_eq!(config.service.port, 9090);
        assert_eq!(config.service.timeout_secs, 30);
        assert!(config.web.expose_error_reason);
        assert!(!config.web.expose_error_traces);
        assert_eq!(config.web.context_path, "/shop");
        assert_eq!(config.web.request_headers.device_id.name, "X-Device");
        assert!(!config.web.request_headers.device_id.required);
        assert_eq!(config.web.request_headers.request_id.name, "Orz-Request-Id");
        assert_eq!(config.web.page.max_size, 20);
        assert_eq!(config.web.page.default_size, 50);
        assert_eq!(
            config.web.cors["/**"].allowed_origins,
            vec!["https://app.example.com".to_string()]
        );
    }

    #[test]
    fn test_env_overrides() {
        std::env::set_var("ORZ_CFGTEST_WEB__EXPOSE_ERROR_TRACES", "true");
        std::env::set_var("ORZ_CFGTEST_SERVICE__PORT", "7070");

        let figment = Figment::new().merge(Serialized::defaults(Config::default()));
        let config: Config = Config::with_env(figment, "ORZ_CFGTEST_").extract().unwrap();

        std::env::remove_var("ORZ_CFGTEST_WEB__EXPOSE_ERROR_TRACES");
        std::env::remove_var("ORZ_CFGTEST_SERVICE__PORT");

        assert!(config.web.expose_error_traces);
        assert_eq!(config.service.port, 7070);
    }

    #[test]
    fn test_derived_values() {
        let config = Config::default();
        assert_eq!(config.service.timeout(), Duration::from_secs(30));
        assert_eq!(config.service.body_limit_bytes(), 10 * 1024 * 1024);
        assert_eq!(config.web.exposure(), ExposurePolicy::default());
    }
}
