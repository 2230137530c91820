use actix::*;
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use log::{info, warn};
use uuid::Uuid;

use crate::models::{AppState, ControlMessage, Deliver};

/// WebSocket endpoint of one relay participant
pub struct RelayConnection {
    pub id: String,
    pub session_id: String,
    pub app_state: web::Data<AppState>,
    joined: bool,
}

impl RelayConnection {
    pub fn new(session_id: String, app_state: web::Data<AppState>) -> Self {
        RelayConnection {
            id: Uuid::new_v4().to_string(),
            session_id,
            app_state,
            joined: false,
        }
    }

    fn send_error(&self, message: impl Into<String>, ctx: &mut ws::WebsocketContext<Self>) {
        let error = ControlMessage::Error {
            message: message.into(),
        };
        match serde_json::to_string(&error) {
            Ok(frame) => ctx.text(frame),
            Err(e) => warn!("Error serializing error frame: {}", e),
        }
    }
}

impl Actor for RelayConnection {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.app_state.register(&self.id, ctx.address());
        info!("WebSocket connection {} started for session {}", self.id, self.session_id);

        match self.app_state.join(&self.session_id, &self.id) {
            Ok(()) => self.joined = true,
            Err(e) => {
                info!("Cannot join session {}: {}", self.session_id, e);
                self.send_error(e.to_string(), ctx);
                ctx.close(Some(ws::CloseReason {
                    code: ws::CloseCode::Policy,
                    description: Some(e.to_string()),
                }));
                ctx.stop();
            }
        }
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if self.joined {
            self.app_state.leave(&self.session_id, &self.id);
            self.joined = false;
        }
        self.app_state.unregister(&self.id);
        info!("WebSocket connection closed: {}", self.id);
        Running::Stop
    }
}

impl Handler<Deliver> for RelayConnection {
    type Result = ();

    fn handle(&mut self, msg: Deliver, ctx: &mut Self::Context) {
        ctx.text(msg.0);
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for RelayConnection {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Text(text)) => {
                if self.joined {
                    self.app_state.route(&self.session_id, &self.id, &text);
                }
            }
            Ok(ws::Message::Ping(msg)) => {
                ctx.pong(&msg);
            }
            Ok(ws::Message::Pong(_)) => {}
            Ok(ws::Message::Binary(_)) => {
                warn!("Binary messages are not supported");
                self.send_error("Binary messages are not supported", ctx);
            }
            Ok(ws::Message::Close(reason)) => {
                info!("Connection closed: {:?}", reason);
                ctx.close(reason);
                ctx.stop();
            }
            Ok(ws::Message::Continuation(_)) | Ok(ws::Message::Nop) => {}
            Err(e) => {
                warn!("WebSocket protocol error on {}: {}", self.id, e);
                ctx.stop();
            }
        }
    }
}

/// WebSocket connection handler for `/ws/{session_id}`
pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    path: web::Path<String>,
    app_state: web::Data<AppState>,
) -> Result<HttpResponse, Error> {
    let session_id = path.into_inner();
    info!("New WebSocket connection request for session {}", session_id);
    ws::start(RelayConnection::new(session_id, app_state), &req, stream)
}
