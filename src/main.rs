use std::net::SocketAddr;
use std::sync::Arc;

use bg_removal_api::{api, config, session};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    config::Config::dotenv_load();
    let config = config::Config::new().expect("Failed to load configuration");
    config::Config::print_env_vars();

    // The factory builds the real ONNX session; tests inject stubs instead.
    let model_path = config.model_path.clone();
    let input_size = config.model_input_size;
    let sessions = Arc::new(session::SessionManager::new(Box::new(move || {
        session::OnnxSession::load(&model_path, input_size)
            .map(|s| Arc::new(s) as Arc<dyn session::RemovalSession>)
    })));

    // Fire-and-forget warm-up so model load overlaps with listener binding.
    if config.preload_model {
        let warm = sessions.clone();
        tokio::task::spawn_blocking(move || {
            if !warm.ensure_ready() {
                tracing::warn!("Model preload failed; it will be retried on first request");
            }
        });
    }

    let state = Arc::new(api::routes::AppState {
        config: config.clone(),
        sessions,
    });
    let app = api::routes::router(state);

    // Run our application with safe parsing
    let host_str = config.api_host.clone();
    let port_str = config.api_port.clone();
    let ip: std::net::IpAddr = host_str.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_HOST '{}', falling back to 0.0.0.0", host_str);
        std::net::IpAddr::from([0, 0, 0, 0])
    });
    let port: u16 = port_str.parse().unwrap_or_else(|_| {
        tracing::warn!("Invalid API_PORT '{}', falling back to 8000", port_str);
        8000
    });
    let socket_address = SocketAddr::new(ip, port);
    tracing::info!("listening on {}", socket_address);
    axum::Server::bind(&socket_address)
        .serve(app.into_make_service())
        .await
        .unwrap();
}
