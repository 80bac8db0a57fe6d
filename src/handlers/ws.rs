use crate::broadcast::Reply;
use crate::commands::Command;
use crate::handlers::decode;
use crate::models::{Activity, Role};
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use axum::routing::get;
use futures_util::{SinkExt, StreamExt};
use log::{debug, info, warn};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedSender};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    commands: UnboundedSender<Command>,
    admin_password: Arc<str>,
}

impl AppState {
    pub fn new(commands: UnboundedSender<Command>, admin_password: &str) -> Self {
        Self {
            commands,
            admin_password: Arc::from(admin_password),
        }
    }

    fn authorizes(&self, role: Role, password: &str) -> bool {
        !role.is_admin() || password == &*self.admin_password
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectParams {
    role: Option<String>,
    #[serde(default)]
    admin_password: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(quiz_socket))
        .route("/poll/ws", get(poll_socket))
        .with_state(state)
}

async fn quiz_socket(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    upgrade(ws, Activity::Quiz, params, state)
}

async fn poll_socket(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    upgrade(ws, Activity::Poll, params, state)
}

fn upgrade(
    ws: WebSocketUpgrade,
    activity: Activity,
    params: ConnectParams,
    state: AppState,
) -> impl IntoResponse {
    let role = Role::from_query(activity, params.role.as_deref());
    let authorized = state.authorizes(role, &params.admin_password);
    ws.on_upgrade(move |socket| handle_socket(socket, role, authorized, state))
}

async fn handle_socket(socket: WebSocket, role: Role, authorized: bool, state: AppState) {
    let (mut sender, mut receiver) = socket.split();

    if !authorized {
        warn!("Admin authentication failed for {:?}", role);
        let frame = json!({ "event": Reply::AdminAuthFailed.name(), "data": null }).to_string();
        let _ = sender.send(Message::Text(frame.into())).await;
        let _ = sender.close().await;
        return;
    }

    let id = Uuid::new_v4();
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<String>();
    if state
        .commands
        .send(Command::Connect { id, role, outbox })
        .is_err()
    {
        warn!("Engine unavailable, closing {}", id);
        return;
    }

    // Forward engine output to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(text) = outbox_rx.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let commands = state.commands.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Some(command) = decode(id, role, text.as_str()) {
                        if commands.send(command).is_err() {
                            break;
                        }
                    }
                }
                Ok(Message::Close(_)) => break,
                Err(e) => {
                    debug!("WebSocket error on {}: {}", id, e);
                    break;
                }
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    let _ = state.commands.send(Command::Disconnect { id });
    info!("Connection {} closed", id);
}
