use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use corral_core::prelude::*;
use corral_core::{bind, BindError, ControllerDescriptor, RouteRequest, RouteTable};
use http_body_util::BodyExt;
use tower::ServiceExt;

#[derive(Clone, Default)]
struct Counters {
    built: Arc<AtomicUsize>,
}

async fn body_text(resp: Response) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8_lossy(&bytes).to_string()
}

async fn call(router: Router, method: &str, path: &str, body: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method(method)
        .uri(path)
        .body(Body::from(body.to_string()))
        .unwrap();
    let resp = router.oneshot(req).await.unwrap();
    let status = resp.status();
    (status, body_text(resp).await)
}

// ── Fixtures ────────────────────────────────────────────────────────────────

struct AlphaController {
    label: &'static str,
}

impl Controller<Counters> for AlphaController {
    fn from_state(state: &Counters) -> Self {
        state.built.fetch_add(1, Ordering::SeqCst);
        Self { label: "alpha" }
    }

    fn declare(routes: &mut RouteRegistry) {
        routes.declare_group::<Self>("/a");
        routes.declare_route::<Self>("index", HttpVerb::Get, "");
        routes.declare_route::<Self>("echo", HttpVerb::Post, "/echo/{name}");
    }

    fn resolve(method: &str) -> Option<Handler<Self>> {
        handlers!(method => Self { index, echo })
    }
}

impl AlphaController {
    fn index(&self, _req: RouteRequest) -> ApiResult<Response> {
        Ok(self.label.into_response())
    }

    fn echo(&self, req: RouteRequest) -> ApiResult<Response> {
        let name = req.param("name").unwrap_or_default().to_string();
        let body = req.body().cloned().unwrap_or(serde_json::Value::Null);
        Ok(Json(serde_json::json!({ "name": name, "body": body })).into_response())
    }
}

struct BetaController;

impl Controller<Counters> for BetaController {
    fn from_state(state: &Counters) -> Self {
        state.built.fetch_add(1, Ordering::SeqCst);
        Self
    }

    fn declare(routes: &mut RouteRegistry) {
        routes.declare_group::<Self>("/b");
        routes.declare_route::<Self>("index", HttpVerb::Get, "");
        routes.declare_route::<Self>("does_not_exist", HttpVerb::Get, "/ghost");
        routes.declare_route::<Self>("boom", HttpVerb::Get, "/boom");
        routes.declare_route::<Self>("fail", HttpVerb::Delete, "/fail");
        routes.declare_route::<Self>("index", HttpVerb::Get, "/legacy/:id");
    }

    fn resolve(method: &str) -> Option<Handler<Self>> {
        handlers!(method => Self { index, boom, fail })
    }
}

impl BetaController {
    fn index(&self, _req: RouteRequest) -> ApiResult<Response> {
        Ok("beta".into_response())
    }

    fn boom(&self, _req: RouteRequest) -> ApiResult<Response> {
        panic!("handler exploded")
    }

    fn fail(&self, _req: RouteRequest) -> ApiResult<Response> {
        Err(HttpError::NotFound("nothing here".into()))
    }
}

/// Declares `GET /a` as well, after `AlphaController`.
struct ShadowController;

impl Controller<Counters> for ShadowController {
    fn from_state(_state: &Counters) -> Self {
        Self
    }

    fn declare(routes: &mut RouteRegistry) {
        routes.declare_group::<Self>("/a");
        routes.declare_route::<Self>("index", HttpVerb::Get, "");
    }

    fn resolve(method: &str) -> Option<Handler<Self>> {
        handlers!(method => Self { index })
    }
}

impl ShadowController {
    fn index(&self, _req: RouteRequest) -> ApiResult<Response> {
        Ok("shadow".into_response())
    }
}

/// Has a route declared but no prefix: paths are the bare suffix.
struct RootController;

impl Controller<Counters> for RootController {
    fn from_state(_state: &Counters) -> Self {
        Self
    }

    fn declare(routes: &mut RouteRegistry) {
        routes.declare_route::<Self>("ping", HttpVerb::Get, "/ping");
        routes.declare_route::<Self>("ping", HttpVerb::Get, "");
    }

    fn resolve(method: &str) -> Option<Handler<Self>> {
        handlers!(method => Self { ping })
    }
}

impl RootController {
    fn ping(&self, _req: RouteRequest) -> ApiResult<Response> {
        Ok("pong".into_response())
    }
}

/// Declares nothing at all.
struct SilentController;

impl Controller<Counters> for SilentController {
    fn from_state(state: &Counters) -> Self {
        state.built.fetch_add(100, Ordering::SeqCst);
        Self
    }

    fn declare(_routes: &mut RouteRegistry) {}

    fn resolve(_method: &str) -> Option<Handler<Self>> {
        None
    }
}

/// Paths axum's matcher refuses, next to ones it accepts.
struct TangledController;

impl Controller<Counters> for TangledController {
    fn from_state(_state: &Counters) -> Self {
        Self
    }

    fn declare(routes: &mut RouteRegistry) {
        routes.declare_group::<Self>("/t");
        routes.declare_route::<Self>("ok", HttpVerb::Get, "/x/{id}");
        routes.declare_route::<Self>("ok", HttpVerb::Put, "/x/{name}");
        routes.declare_route::<Self>("ok", HttpVerb::Get, "/y/{id");
        routes.declare_route::<Self>("ok", HttpVerb::Get, "/y/fine");
        routes.declare_route::<Self>("ok", HttpVerb::Get, "/health");
        routes.declare_route::<Self>("ok", HttpVerb::Post, "/health");
    }

    fn resolve(method: &str) -> Option<Handler<Self>> {
        handlers!(method => Self { ok })
    }
}

impl TangledController {
    fn ok(&self, _req: RouteRequest) -> ApiResult<Response> {
        Ok("tangled".into_response())
    }
}

/// Binds straight onto the path the `Health` plugin serves.
struct HealthClashController;

impl Controller<Counters> for HealthClashController {
    fn from_state(_state: &Counters) -> Self {
        Self
    }

    fn declare(routes: &mut RouteRegistry) {
        routes.declare_route::<Self>("status", HttpVerb::Get, "/health");
        routes.declare_route::<Self>("status", HttpVerb::Post, "/health");
        routes.declare_route::<Self>("status", HttpVerb::Get, "/status");
    }

    fn resolve(method: &str) -> Option<Handler<Self>> {
        handlers!(method => Self { status })
    }
}

impl HealthClashController {
    fn status(&self, _req: RouteRequest) -> ApiResult<Response> {
        Ok("clash".into_response())
    }
}

fn bind_all(
    state: &Counters,
    groups: Vec<ControllerDescriptor<Counters>>,
) -> (RouteTable, corral_core::BindReport) {
    let mut registry = RouteRegistry::new();
    for group in &groups {
        group.declare(&mut registry);
    }
    let mut table = RouteTable::new();
    let report = bind(&mut table, &registry, &groups, state);
    (table, report)
}

// ── bind() against a RouteTable ─────────────────────────────────────────────

#[tokio::test]
async fn two_groups_with_empty_suffix_bind_to_their_prefixes() {
    let state = Counters::default();
    let mut registry = RouteRegistry::new();
    let groups = vec![
        ControllerDescriptor::of::<AlphaController>(),
        ControllerDescriptor::of::<ShadowController>(),
    ];
    // Re-point the shadow group to /b so the two prefixes differ.
    for group in &groups {
        group.declare(&mut registry);
    }
    registry.declare_group::<ShadowController>("/b");

    let mut table = RouteTable::new();
    let report = bind(&mut table, &registry, &groups, &state);

    let gets: Vec<_> = report
        .bound
        .iter()
        .filter(|(verb, _)| *verb == HttpVerb::Get)
        .map(|(_, path)| path.as_str())
        .collect();
    assert_eq!(gets, vec!["/a", "/b"]);

    let a = table.handler(HttpVerb::Get, "/a").unwrap();
    let b = table.handler(HttpVerb::Get, "/b").unwrap();
    assert_eq!(body_text(a(RouteRequest::default()).unwrap()).await, "alpha");
    assert_eq!(body_text(b(RouteRequest::default()).unwrap()).await, "shadow");
}

#[tokio::test]
async fn one_instance_per_controller() {
    let state = Counters::default();
    let (_, report) = bind_all(
        &state,
        vec![
            ControllerDescriptor::of::<AlphaController>(),
            ControllerDescriptor::of::<BetaController>(),
        ],
    );
    assert!(report.bound.len() >= 4);
    assert_eq!(state.built.load(Ordering::SeqCst), 2);
}

#[test]
fn controllers_without_routes_are_not_instantiated() {
    let state = Counters::default();
    let (table, report) = bind_all(&state, vec![ControllerDescriptor::of::<SilentController>()]);
    assert!(table.is_empty());
    assert!(report.bound.is_empty());
    assert!(report.skipped.is_empty());
    assert_eq!(state.built.load(Ordering::SeqCst), 0);
}

#[test]
fn unresolved_method_is_skipped_and_others_still_bind() {
    let state = Counters::default();
    let (table, report) = bind_all(&state, vec![ControllerDescriptor::of::<BetaController>()]);

    assert!(report.skipped.iter().any(|err| matches!(
        err,
        BindError::UnresolvedMethod { method: "does_not_exist", .. }
    )));
    assert!(table.handler(HttpVerb::Get, "/b/ghost").is_none());

    assert_eq!(
        table.bindings(),
        vec![
            (HttpVerb::Get, "/b".to_string()),
            (HttpVerb::Get, "/b/boom".to_string()),
            (HttpVerb::Delete, "/b/fail".to_string()),
        ]
    );
}

#[test]
fn legacy_colon_params_are_rejected() {
    let state = Counters::default();
    let (table, report) = bind_all(&state, vec![ControllerDescriptor::of::<BetaController>()]);

    assert_eq!(invalid_paths(&report), vec!["/b/legacy/:id"]);
    assert!(table.handler(HttpVerb::Get, "/b/legacy/:id").is_none());
}

#[test]
fn missing_prefix_concatenates_to_bare_suffix() {
    let state = Counters::default();
    let (table, report) = bind_all(&state, vec![ControllerDescriptor::of::<RootController>()]);

    assert_eq!(report.bound, vec![(HttpVerb::Get, "/ping".to_string())]);
    assert!(table.handler(HttpVerb::Get, "/ping").is_some());
    // prefix "" + suffix "" is not a routable path.
    assert!(matches!(
        report.skipped.as_slice(),
        [BindError::InvalidPath { path, .. }] if path.is_empty()
    ));
}

#[tokio::test]
async fn duplicate_verb_and_path_keeps_the_later_registration() {
    let state = Counters::default();
    let (table, report) = bind_all(
        &state,
        vec![
            ControllerDescriptor::of::<AlphaController>(),
            ControllerDescriptor::of::<ShadowController>(),
        ],
    );

    // Both bindings are reported, only one survives in the table.
    let a_count = report.bound.iter().filter(|(_, p)| p == "/a").count();
    assert_eq!(a_count, 2);
    assert_eq!(table.len(), 2);

    let handler = table.handler(HttpVerb::Get, "/a").unwrap();
    assert_eq!(body_text(handler(RouteRequest::default()).unwrap()).await, "shadow");
}

fn invalid_paths(report: &corral_core::BindReport) -> Vec<&str> {
    report
        .skipped
        .iter()
        .filter_map(|err| match err {
            BindError::InvalidPath { path, .. } => Some(path.as_str()),
            _ => None,
        })
        .collect()
}

#[test]
fn paths_the_matcher_refuses_are_skipped_not_fatal() {
    let state = Counters::default();
    let (table, report) = bind_all(&state, vec![ControllerDescriptor::of::<TangledController>()]);

    assert_eq!(invalid_paths(&report), vec!["/t/x/{name}", "/t/y/{id"]);
    assert_eq!(
        table.bindings(),
        vec![
            (HttpVerb::Get, "/t/x/{id}".to_string()),
            (HttpVerb::Get, "/t/y/fine".to_string()),
            (HttpVerb::Get, "/t/health".to_string()),
            (HttpVerb::Post, "/t/health".to_string()),
        ]
    );
}

#[tokio::test]
async fn router_builds_despite_unroutable_declarations() {
    let (router, report) = AppBuilder::new()
        .with_state(Counters::default())
        .register_controller::<TangledController>()
        .build_with_report();
    assert_eq!(report.skipped.len(), 2);

    assert_eq!(call(router.clone(), "GET", "/t/y/fine", "").await.0, StatusCode::OK);
    assert_eq!(call(router, "GET", "/t/x/7", "").await.0, StatusCode::OK);
}

#[tokio::test]
async fn controller_route_cannot_shadow_a_plugin_route() {
    let (router, report) = AppBuilder::new()
        .with_state(Counters::default())
        .with(Health)
        .register_controller::<HealthClashController>()
        .build_with_report();

    assert_eq!(invalid_paths(&report), vec!["/health"]);
    assert_eq!(
        report.bound,
        vec![
            (HttpVerb::Post, "/health".to_string()),
            (HttpVerb::Get, "/status".to_string()),
        ]
    );

    assert_eq!(
        call(router.clone(), "GET", "/health", "").await,
        (StatusCode::OK, String::from("OK"))
    );
    assert_eq!(
        call(router, "POST", "/health", "").await,
        (StatusCode::OK, String::from("clash"))
    );
}

#[test]
fn reserved_route_rejects_only_its_own_verb() {
    use corral_core::RouteSink;

    let mut table = RouteTable::new();
    table.reserve(HttpVerb::Get, "/health").unwrap();

    let handler: corral_core::BoundHandler =
        Arc::new(|_req: RouteRequest| -> ApiResult<Response> { Ok("x".into_response()) });
    assert!(table.register(HttpVerb::Get, "/health", Arc::clone(&handler)).is_err());
    assert!(table.register(HttpVerb::Post, "/health", Arc::clone(&handler)).is_ok());
    assert!(table.register(HttpVerb::Get, "/{oops", handler).is_err());
    assert_eq!(table.bindings(), vec![(HttpVerb::Post, "/health".to_string())]);
}

#[test]
fn bind_errors_display_controller_and_method() {
    let err = BindError::UnresolvedMethod {
        controller: "app::Users",
        method: "list",
    };
    assert_eq!(err.to_string(), "app::Users has no routable method 'list'");
}

// ── Through the built router ────────────────────────────────────────────────

fn app() -> Router {
    AppBuilder::new()
        .with_state(Counters::default())
        .register_controller::<AlphaController>()
        .register_controller::<BetaController>()
        .build()
}

#[tokio::test]
async fn router_dispatches_to_the_right_instance() {
    assert_eq!(call(app(), "GET", "/a", "").await, (StatusCode::OK, String::from("alpha")));
    assert_eq!(call(app(), "GET", "/b", "").await, (StatusCode::OK, String::from("beta")));
}

#[tokio::test]
async fn router_passes_path_params_and_json_body() {
    let (status, body) = call(app(), "POST", "/a/echo/ada", r#"{"x": 1}"#).await;
    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["name"], "ada");
    assert_eq!(json["body"]["x"], 1);
}

#[tokio::test]
async fn malformed_json_body_is_rejected_before_the_handler() {
    let (status, body) = call(app(), "POST", "/a/echo/ada", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("malformed JSON body"));
}

#[tokio::test]
async fn panicking_handler_becomes_500() {
    let (status, body) = call(app(), "GET", "/b/boom", "").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["error"], "Internal server error");

    // The router keeps serving afterwards.
    assert_eq!(call(app(), "GET", "/b", "").await.0, StatusCode::OK);
}

#[tokio::test]
async fn handler_error_becomes_its_response() {
    let (status, body) = call(app(), "DELETE", "/b/fail", "").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("nothing here"));
}

#[tokio::test]
async fn undeclared_verb_is_method_not_allowed() {
    let (status, _) = call(app(), "DELETE", "/a", "").await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn registering_a_controller_twice_is_ignored() {
    let (_, report) = AppBuilder::new()
        .with_state(Counters::default())
        .register_controller::<AlphaController>()
        .register_controller::<AlphaController>()
        .build_with_report();
    assert_eq!(report.bound.len(), 2);
}
