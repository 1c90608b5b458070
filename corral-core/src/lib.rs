pub mod binder;
pub mod builder;
pub mod config;
pub mod controller;
pub mod error;
pub mod http;
pub mod layers;
pub mod meta;
pub mod plugin;
pub mod plugins;
pub mod prelude;
pub mod types;
pub mod validation;

pub use binder::{bind, BindError, BindReport, RouteSink, RouteTable};
pub use builder::{AppBuilder, NoState};
pub use config::{ConfigError, ConfigValue, CorralConfig, FromConfigValue};
pub use controller::{BoundHandler, Controller, ControllerDescriptor, Handler};
pub use error::HttpError;
pub use http::RouteRequest;
pub use layers::{default_cors, default_trace, init_tracing};
pub use meta::{HttpVerb, RouteEntry, RouteRegistry};
pub use plugin::Plugin;
pub use types::ApiResult;
