//! Everything a controller needs, in one `use`.
//!
//! ```ignore
//! use corral_core::prelude::*;
//!
//! impl Controller<Services> for HelloController {
//!     fn from_state(state: &Services) -> Self { Self { greeting: state.greeting.clone() } }
//!
//!     fn declare(routes: &mut RouteRegistry) {
//!         routes.declare_group::<Self>("/hello");
//!         routes.declare_route::<Self>("hello", HttpVerb::Get, "");
//!     }
//!
//!     fn resolve(method: &str) -> Option<Handler<Self>> {
//!         handlers!(method => Self { hello })
//!     }
//! }
//! ```

pub use crate::handlers;

// ── Core types ──────────────────────────────────────────────────────────

pub use crate::builder::AppBuilder;
pub use crate::config::{ConfigError, ConfigValue, CorralConfig, FromConfigValue};
pub use crate::controller::{Controller, Handler};
pub use crate::error::HttpError;
pub use crate::meta::{HttpVerb, RouteRegistry};
pub use crate::plugin::Plugin;
pub use crate::plugins::{Cors, ErrorHandling, Health, Tracing};
pub use crate::types::ApiResult;
pub use crate::validation::{validate, Validate};

// ── HTTP re-exports ────────────────────────────────────────────────────────

pub use crate::http::{IntoResponse, Json, Response, RouteRequest, Router, StatusCode};
