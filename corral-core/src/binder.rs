//! Turns declared route metadata into live dispatch.
//!
//! [`bind`] walks the ordered controller list, builds one instance per
//! controller, resolves each declared method and registers it on a
//! [`RouteSink`] under `prefix + suffix`. Problems with a single route are
//! logged and reported in the returned [`BindReport`]; they never stop the
//! remaining routes from being bound.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

use axum::extract::Path;
use axum::routing::MethodRouter;
use bytes::Bytes;
use tracing::{debug, error, info, warn};

use crate::controller::{BoundHandler, ControllerDescriptor};
use crate::error::HttpError;
use crate::http::{IntoResponse, Response, RouteRequest, Router};
use crate::meta::{HttpVerb, RouteRegistry};

/// The router capability the binder needs: register a handler for a verb and path.
pub trait RouteSink {
    /// Register `handler`, or explain why the router cannot accept `path`.
    fn register(&mut self, verb: HttpVerb, path: &str, handler: BoundHandler) -> Result<(), String>;
}

/// Insertion-ordered routing table, turned into an `axum::Router` once binding is done.
///
/// Registering the same `(verb, path)` twice keeps the later handler. Every
/// new path is first tried against axum's own matcher, so a path axum would
/// refuse (malformed capture, conflicting capture names) is rejected here
/// instead of panicking in [`into_router`](Self::into_router).
pub struct RouteTable {
    paths: Vec<(String, Vec<(HttpVerb, BoundHandler)>)>,
    index: HashMap<String, usize>,
    matcher: matchit::Router<()>,
    matched: HashSet<String>,
    reserved: HashSet<(HttpVerb, String)>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            index: HashMap::new(),
            matcher: matchit::Router::new(),
            matched: HashSet::new(),
            reserved: HashSet::new(),
        }
    }

    /// Claim `(verb, path)` for a route served outside the table (e.g. a
    /// plugin's raw router), so controllers cannot bind over it.
    pub fn reserve(&mut self, verb: HttpVerb, path: &str) -> Result<(), String> {
        self.admit(path)?;
        self.reserved.insert((verb, path.to_string()));
        Ok(())
    }

    fn admit(&mut self, path: &str) -> Result<(), String> {
        if self.matched.contains(path) {
            return Ok(());
        }
        self.matcher.insert(path, ()).map_err(|e| e.to_string())?;
        self.matched.insert(path.to_string());
        Ok(())
    }

    /// Every `(verb, path)` pair currently bound, in registration order.
    pub fn bindings(&self) -> Vec<(HttpVerb, String)> {
        self.paths
            .iter()
            .flat_map(|(path, handlers)| handlers.iter().map(move |(verb, _)| (*verb, path.clone())))
            .collect()
    }

    /// Handler bound to `(verb, path)`, if any.
    pub fn handler(&self, verb: HttpVerb, path: &str) -> Option<BoundHandler> {
        let slot = *self.index.get(path)?;
        self.paths[slot]
            .1
            .iter()
            .find(|(v, _)| *v == verb)
            .map(|(_, handler)| Arc::clone(handler))
    }

    pub fn len(&self) -> usize {
        self.paths.iter().map(|(_, handlers)| handlers.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Materialize the table as an axum router.
    pub fn into_router<S>(self) -> Router<S>
    where
        S: Clone + Send + Sync + 'static,
    {
        let mut router = Router::new();
        for (path, handlers) in self.paths {
            let mut method_router: MethodRouter<S> = MethodRouter::new();
            for (verb, handler) in handlers {
                method_router = method_router.on(
                    verb.method_filter(),
                    move |params: Option<Path<HashMap<String, String>>>, body: Bytes| {
                        let handler = Arc::clone(&handler);
                        async move { dispatch(&handler, params, body) }
                    },
                );
            }
            router = router.route(&path, method_router);
        }
        router
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

impl RouteSink for RouteTable {
    fn register(&mut self, verb: HttpVerb, path: &str, handler: BoundHandler) -> Result<(), String> {
        if self.reserved.contains(&(verb, path.to_string())) {
            return Err(format!("{verb} {path} is already served by a plugin route"));
        }
        self.admit(path)?;
        let slot = match self.index.get(path) {
            Some(slot) => *slot,
            None => {
                self.paths.push((path.to_string(), Vec::new()));
                self.index.insert(path.to_string(), self.paths.len() - 1);
                self.paths.len() - 1
            }
        };
        let handlers = &mut self.paths[slot].1;
        match handlers.iter_mut().find(|(v, _)| *v == verb) {
            Some(existing) => {
                warn!(%verb, path, "Route registered twice, keeping the later handler");
                existing.1 = handler;
            }
            None => handlers.push((verb, handler)),
        }
        Ok(())
    }
}

/// Adapt an axum request to the controller calling convention.
fn dispatch(
    handler: &BoundHandler,
    params: Option<Path<HashMap<String, String>>>,
    body: Bytes,
) -> Response {
    let params = params.map(|Path(params)| params).unwrap_or_default();
    let body = if body.iter().all(u8::is_ascii_whitespace) {
        None
    } else {
        match serde_json::from_slice(&body) {
            Ok(value) => Some(value),
            Err(e) => {
                return HttpError::BadRequest(format!("malformed JSON body: {e}")).into_response()
            }
        }
    };
    match handler(RouteRequest::new(params, body)) {
        Ok(response) => response,
        Err(err) => err.into_response(),
    }
}

/// Why a declared route was not bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindError {
    /// The declared method name is unknown to the controller.
    UnresolvedMethod {
        controller: &'static str,
        method: &'static str,
    },
    /// `prefix + suffix` is not a path the router accepts.
    InvalidPath {
        controller: &'static str,
        method: &'static str,
        path: String,
        reason: String,
    },
}

impl fmt::Display for BindError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindError::UnresolvedMethod { controller, method } => {
                write!(f, "{controller} has no routable method '{method}'")
            }
            BindError::InvalidPath {
                controller,
                method,
                path,
                reason,
            } => write!(f, "{controller}::{method} has invalid path '{path}': {reason}"),
        }
    }
}

impl std::error::Error for BindError {}

/// Outcome of a [`bind`] pass.
#[derive(Debug, Default)]
pub struct BindReport {
    /// Successfully bound routes, in registration order.
    pub bound: Vec<(HttpVerb, String)>,
    /// Declared routes that were skipped.
    pub skipped: Vec<BindError>,
}

/// Bind every declared route of `groups` onto `sink`.
///
/// Each controller is instantiated exactly once from `state`, in the given
/// order. Paths are the literal concatenation of the group prefix (empty if
/// none was declared) and the route suffix.
pub fn bind<S: 'static>(
    sink: &mut impl RouteSink,
    registry: &RouteRegistry,
    groups: &[ControllerDescriptor<S>],
    state: &S,
) -> BindReport {
    let mut report = BindReport::default();

    for group in groups {
        let controller = group.type_name();
        let routes = registry.routes_of(group.type_id());
        if routes.is_empty() {
            debug!(controller, "Controller declares no routes, skipping");
            continue;
        }

        let prefix = registry.group_of(group.type_id()).unwrap_or("");
        let instance = group.instantiate(state);

        for route in routes {
            let path = format!("{prefix}{}", route.suffix);

            let Some(handler) = instance.bind(route.method) else {
                let err = BindError::UnresolvedMethod {
                    controller,
                    method: route.method,
                };
                error!(controller, method = route.method, "{err}");
                report.skipped.push(err);
                continue;
            };

            let registered = check_route_path(&path)
                .map_err(str::to_string)
                .and_then(|()| {
                    sink.register(route.verb, &path, guarded(handler, route.verb, path.clone()))
                });
            if let Err(reason) = registered {
                let err = BindError::InvalidPath {
                    controller,
                    method: route.method,
                    path,
                    reason,
                };
                error!(controller, method = route.method, "{err}");
                report.skipped.push(err);
                continue;
            }

            info!(controller, method = route.method, "{} {}", route.verb, path);
            report.bound.push((route.verb, path));
        }
    }

    report
}

/// Wrap a handler so panics become 500s and server-side failures are logged.
fn guarded(handler: BoundHandler, verb: HttpVerb, path: String) -> BoundHandler {
    Arc::new(move |req| {
        let result = match catch_unwind(AssertUnwindSafe(|| handler(req))) {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(%verb, path = %path, panic = %message, "Handler panicked");
                return Err(HttpError::Internal("Internal server error".into()));
            }
        };
        if let Err(err) = &result {
            if err.status().is_server_error() {
                error!(%verb, path = %path, error = %err, "Handler failed");
            }
        }
        result
    })
}

/// Paths must be absolute and use `{param}` captures.
fn check_route_path(path: &str) -> Result<(), &'static str> {
    if !path.starts_with('/') {
        return Err("path must start with '/'");
    }
    if path
        .split('/')
        .any(|segment| segment.starts_with(':') || segment.starts_with('*'))
    {
        return Err("use `{param}` / `{*rest}` captures instead of `:param` / `*rest`");
    }
    Ok(())
}
