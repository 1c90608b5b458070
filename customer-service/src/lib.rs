//! Customer CRUD service: a `/customers` controller over an in-memory repository.

pub mod controllers;
pub mod models;
pub mod services;
pub mod state;

use corral_core::plugins::{ErrorHandling, Health, Tracing};
use corral_core::{AppBuilder, CorralConfig};

use controllers::CustomerController;
use state::Services;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Assemble the application around `services`.
pub fn app(services: Services) -> AppBuilder<Services> {
    AppBuilder::new()
        .with_state(services)
        .with(Tracing)
        .with(ErrorHandling)
        .with(Health)
        .register_controller::<CustomerController>()
}

/// Listen address: `server.host` / `server.port`, falling back to the bare
/// `PORT` variable and then the defaults.
pub fn listen_addr(config: &CorralConfig) -> String {
    let host: String = config.get_or("server.host", DEFAULT_HOST.to_string());
    let port = config
        .get::<u16>("server.port")
        .or_else(|_| config.get::<u16>("port"))
        .unwrap_or(DEFAULT_PORT);
    format!("{host}:{port}")
}
