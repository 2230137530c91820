use actix::SyncArbiter;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use log::info;

use chess_relay::config::ServerConfig;
use chess_relay::engine::{EngineActor, UciEngine};
use chess_relay::models::AppState;
use chess_relay::routes::{configure_routes, EngineService};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = ServerConfig::parse();
    let (host, port) = config.bind_address();
    info!("Starting chess relay at http://{}:{}", host, port);
    info!(
        "Engine {} with {} workers",
        config.engine_path.display(),
        config.engine_workers
    );

    let engine = UciEngine::new(config.engine_path.clone());
    let engine_service = web::Data::new(EngineService {
        engine: SyncArbiter::start(config.engine_workers.max(1), move || {
            EngineActor::new(engine.clone())
        }),
        defaults: config.engine_settings(),
    });
    let app_state = web::Data::new(AppState::default());
    let static_dir = config.static_dir.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(engine_service.clone())
            .configure(|cfg| configure_routes(cfg, static_dir.clone()))
    })
    .bind((host, port))?
    .run()
    .await
}
