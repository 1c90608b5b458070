use corral_core::CorralConfig;
use customer_service::state::Services;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    corral_core::init_tracing();

    let config = match CorralConfig::load("dev") {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to load configuration, using defaults");
            CorralConfig::empty()
        }
    };
    let addr = customer_service::listen_addr(&config);

    customer_service::app(Services::new())
        .with_config(config)
        .serve(&addr)
        .await
}
