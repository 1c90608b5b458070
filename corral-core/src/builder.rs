use std::any::TypeId;

use tracing::{debug, info, warn};

use crate::binder::{self, BindReport, RouteTable};
use crate::config::CorralConfig;
use crate::controller::{Controller, ControllerDescriptor};
use crate::http::Router;
use crate::meta::{HttpVerb, RouteRegistry};
use crate::plugin::Plugin;

type LayerFn = Box<dyn FnOnce(Router) -> Router + Send>;

/// Marker type: application state has not been set yet.
///
/// `AppBuilder<NoState>` is the initial phase returned by [`AppBuilder::new()`].
/// Call [`.with_state()`](AppBuilder::with_state) to transition to `AppBuilder<T>`.
#[derive(Clone)]
pub struct NoState;

/// Configuration that is independent of the application state type.
#[derive(Default)]
struct BuilderConfig {
    config: Option<CorralConfig>,
    custom_layers: Vec<LayerFn>,
    reserved: Vec<(HttpVerb, String)>,
}

/// Builder for assembling a Corral application.
///
/// Collects state, controllers, raw routes and Tower layers, then produces an
/// `axum::Router` (or starts serving directly) with everything wired together.
///
/// Controllers are bound in registration order when [`build`](Self::build)
/// runs, which is also the order of the route registration log lines.
///
/// ```ignore
/// AppBuilder::new()
///     .with_state(services)
///     .with(Tracing)
///     .with(ErrorHandling)
///     .with(Health)
///     .register_controller::<CustomerController>()
///     .serve("0.0.0.0:3000")
///     .await?;
/// ```
pub struct AppBuilder<T: Clone + Send + Sync + 'static = NoState> {
    shared: BuilderConfig,
    state: T,
    routes: Vec<Router<T>>,
    registry: RouteRegistry,
    controllers: Vec<ControllerDescriptor<T>>,
}

// ── NoState phase (pre-state) ───────────────────────────────────────────────

impl AppBuilder<NoState> {
    /// Create a new, empty builder in the pre-state phase.
    pub fn new() -> Self {
        Self {
            shared: BuilderConfig::default(),
            state: NoState,
            routes: Vec::new(),
            registry: RouteRegistry::new(),
            controllers: Vec::new(),
        }
    }

    /// Provide the application state that controllers are constructed from.
    pub fn with_state<S: Clone + Send + Sync + 'static>(self, state: S) -> AppBuilder<S> {
        AppBuilder {
            shared: self.shared,
            state,
            routes: Vec::new(),
            registry: RouteRegistry::new(),
            controllers: Vec::new(),
        }
    }
}

impl Default for AppBuilder<NoState> {
    fn default() -> Self {
        Self::new()
    }
}

// ── Typed phase (state resolved) ────────────────────────────────────────────

impl<T: Clone + Send + Sync + 'static> AppBuilder<T> {
    /// Install a [`Plugin`] into this builder.
    pub fn with<Pl: Plugin>(self, plugin: Pl) -> Self {
        debug!(plugin = Pl::name(), "Installing plugin");
        plugin.install(self)
    }

    /// Store a [`CorralConfig`] in the builder.
    pub fn with_config(mut self, config: CorralConfig) -> Self {
        self.shared.config = Some(config);
        self
    }

    /// The configuration stored with [`with_config`](Self::with_config), if any.
    pub fn config(&self) -> Option<&CorralConfig> {
        self.shared.config.as_ref()
    }

    /// Apply a custom transformation to the final router.
    ///
    /// Transformations run in registration order during `build()`.
    ///
    /// ```ignore
    /// AppBuilder::new()
    ///     .with_state(state)
    ///     .with_layer_fn(|router| router.layer(TimeoutLayer::new(Duration::from_secs(30))))
    /// ```
    pub fn with_layer_fn<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Router) -> Router + Send + 'static,
    {
        self.shared.custom_layers.push(Box::new(f));
        self
    }

    /// Register a raw `axum::Router` fragment to be merged into the application.
    ///
    /// Raw routes benefit from global plugins (Tracing, CORS, ErrorHandling)
    /// but are not part of the controller route metadata.
    pub fn register_routes(mut self, router: Router<T>) -> Self {
        self.routes.push(router);
        self
    }

    /// Declare that a raw route serves `verb path`.
    ///
    /// Controller routes that would collide with it are skipped at build
    /// time instead of making the router merge panic.
    pub fn reserve_route(mut self, verb: HttpVerb, path: impl Into<String>) -> Self {
        self.shared.reserved.push((verb, path.into()));
        self
    }

    /// Register a [`Controller`] whose declared routes will be bound at build time.
    ///
    /// The controller's declarations are recorded immediately; registering
    /// the same controller type twice is ignored.
    pub fn register_controller<C: Controller<T>>(mut self) -> Self {
        let descriptor = ControllerDescriptor::of::<C>();
        if self.is_registered(descriptor.type_id()) {
            warn!(
                controller = descriptor.type_name(),
                "Controller registered twice, ignoring the second registration"
            );
            return self;
        }
        descriptor.declare(&mut self.registry);
        self.controllers.push(descriptor);
        self
    }

    /// The route metadata collected so far.
    pub fn registry(&self) -> &RouteRegistry {
        &self.registry
    }

    fn is_registered(&self, id: TypeId) -> bool {
        self.controllers.iter().any(|c| c.type_id() == id)
    }

    /// Assemble the final `axum::Router` from all registered routes and layers.
    pub fn build(self) -> Router {
        self.build_with_report().0
    }

    /// Like [`build`](Self::build), also returning what the binder bound and skipped.
    pub fn build_with_report(self) -> (Router, BindReport) {
        let mut table = RouteTable::new();
        for (verb, path) in &self.shared.reserved {
            if let Err(reason) = table.reserve(*verb, path) {
                warn!(%verb, path, %reason, "Could not reserve raw route");
            }
        }
        let report = binder::bind(&mut table, &self.registry, &self.controllers, &self.state);
        if !report.skipped.is_empty() {
            warn!(
                bound = report.bound.len(),
                skipped = report.skipped.len(),
                "Some declared routes could not be bound"
            );
        }

        let mut router: Router<T> = table.into_router();
        for r in self.routes {
            router = router.merge(r);
        }

        let mut app = router.with_state(self.state);
        for layer_fn in self.shared.custom_layers {
            app = layer_fn(app);
        }
        (app, report)
    }

    /// Build the application and start serving on the given address.
    ///
    /// Returns once a shutdown signal (Ctrl-C / SIGTERM) has been received
    /// and in-flight requests have completed.
    pub async fn serve(self, addr: &str) -> Result<(), Box<dyn std::error::Error>> {
        let app = self.build();
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!(%addr, "Corral server listening");
        crate::http::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        info!("Corral server stopped");
        Ok(())
    }
}

/// Wait for a shutdown signal (Ctrl-C or SIGTERM on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received, starting graceful shutdown");
}
