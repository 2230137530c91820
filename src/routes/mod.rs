use std::path::PathBuf;

use actix::Addr;
use actix_files as fs;
use actix_web::{web, HttpResponse, Responder};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::engine::actor::{EngineActor, SuggestMove};
use crate::error::EngineError;
use crate::game::config::EngineSettings;

/// Engine pool plus the defaults applied to HTTP requests.
pub struct EngineService {
    pub engine: Addr<EngineActor>,
    pub defaults: EngineSettings,
}

#[derive(Deserialize, Debug)]
pub struct MoveRequest {
    pub fen: String,
    pub depth: Option<u32>,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct MoveResponse {
    pub best_move: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

fn error_body(error: impl ToString) -> ErrorResponse {
    ErrorResponse {
        error: error.to_string(),
    }
}

/// HTTP handler for the index page
pub async fn index() -> impl Responder {
    HttpResponse::Ok().body("Chess Relay")
}

/// Ask the engine for its preferred move in a position
pub async fn suggest_move(body: web::Json<MoveRequest>, service: web::Data<EngineService>) -> HttpResponse {
    let MoveRequest { fen, depth } = body.into_inner();
    let settings = EngineSettings {
        search_depth: depth.unwrap_or(service.defaults.search_depth),
        ..service.defaults
    };
    info!("Move requested for {} at depth {}", fen, settings.search_depth);

    let reply = service
        .engine
        .send(SuggestMove {
            fen: fen.clone(),
            settings,
        })
        .await;
    match reply {
        Ok(Ok(Some(mv))) => HttpResponse::Ok().json(MoveResponse {
            best_move: mv.to_string(),
        }),
        Ok(Ok(None)) => HttpResponse::NotFound().json(error_body(format!("No move found for {}", fen))),
        Ok(Err(e @ EngineError::Unavailable(_))) => {
            warn!("Engine unavailable: {}", e);
            HttpResponse::ServiceUnavailable().json(error_body(e))
        }
        Ok(Err(e)) => {
            warn!("Engine failed: {}", e);
            HttpResponse::InternalServerError().json(error_body(e))
        }
        Err(e) => {
            warn!("Engine worker unreachable: {}", e);
            HttpResponse::ServiceUnavailable().json(error_body(e))
        }
    }
}

/// Configure the HTTP routes
pub fn configure_routes(cfg: &mut web::ServiceConfig, static_dir: PathBuf) {
    cfg.service(web::resource("/ws/{session_id}").route(web::get().to(crate::websocket::ws_index)))
        .service(web::resource("/move").route(web::post().to(suggest_move)))
        .service(web::resource("/").route(web::get().to(index)))
        .service(fs::Files::new("/static", static_dir).show_files_listing());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::uci::UciEngine;
    use crate::models::AppState;
    use actix::SyncArbiter;
    use actix_web::{http::StatusCode, test, App};

    fn missing_engine() -> web::Data<EngineService> {
        web::Data::new(EngineService {
            engine: SyncArbiter::start(1, || EngineActor::new(UciEngine::new("/nonexistent/engine-binary"))),
            defaults: EngineSettings::default(),
        })
    }

    #[actix_web::test]
    async fn index_responds() {
        let app = test::init_service(App::new().route("/", web::get().to(index))).await;
        let resp = test::call_service(&app, test::TestRequest::get().uri("/").to_request()).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn unavailable_engine_is_503() {
        let app = test::init_service(
            App::new()
                .app_data(missing_engine())
                .app_data(web::Data::new(AppState::default()))
                .configure(|cfg| configure_routes(cfg, "./static".into())),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/move")
            .set_json(serde_json::json!({
                "fen": "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body: ErrorResponse = test::read_body_json(resp).await;
        assert!(body.error.contains("engine unavailable"));
    }

    #[actix_web::test]
    async fn malformed_request_is_rejected() {
        let app = test::init_service(
            App::new()
                .app_data(missing_engine())
                .route("/move", web::post().to(suggest_move)),
        )
        .await;
        let req = test::TestRequest::post()
            .uri("/move")
            .set_json(serde_json::json!({ "depth": 2 }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}
