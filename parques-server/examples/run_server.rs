//! Example to run the Parqués server standalone
//!
//! Run with: cargo run -p parques-server --example run_server

use parques_server::{run_server, ServerConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    let config = ServerConfig {
        port: 8002,
        turn_timeout_ms: Some(30_000),
        ..ServerConfig::default()
    };

    println!("Starting Parqués server on port {}", config.port);
    println!("Create a match with: POST http://localhost:{}/api/matches", config.port);

    run_server(config).await
}
