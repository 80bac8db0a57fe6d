mod aggregation;
mod broadcast;
mod commands;
mod config;
mod engine;
mod error;
mod handlers;
mod models;
mod participants;
mod session;
mod tasks;

use config::Config;
use engine::Engine;
use handlers::ws::{AppState, router};
use log::{error, info};
use tokio::net::TcpListener;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;

    // One queue feeds the engine; sockets and the quiz countdown all post to it
    let (commands, inbox) = mpsc::unbounded_channel();
    let engine = Engine::new(commands.clone());
    tokio::spawn(engine.run(inbox));

    let app = router(AppState::new(commands, &config.admin_password));
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("Listening on {}", config.bind_addr);

    if let Err(why) = axum::serve(listener, app).await {
        error!("Server error: {:?}", why);
    }
    Ok(())
}
