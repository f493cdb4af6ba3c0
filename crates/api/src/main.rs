use std::sync::Arc;

use launchkit_api::app::{self, services::AppConfig};

#[tokio::main]
async fn main() {
    launchkit_observability::init();

    let config = AppConfig::from_env();
    let addr = config.bind_addr.clone();

    let services = app::services::build_services(config)
        .await
        .expect("failed to build services");
    let router = app::build_app(Arc::new(services));

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {addr}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, router).await.unwrap();
}
