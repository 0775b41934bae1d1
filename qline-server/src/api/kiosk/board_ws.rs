use axum::{
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
};
use qline_core::events::BoardUpdateReceiver;
use tokio::sync::broadcast::error::RecvError;

use crate::state::AppState;

/// `GET /board/ws` — stream board updates to a waiting-room display.
///
/// Each update is one JSON text frame. The stream is a live view: a display
/// that lags far behind skips missed updates rather than replaying them.
pub(super) async fn board_ws(
    state: State<AppState>,
    ws: WebSocketUpgrade,
) -> impl IntoResponse {
    let updates = state.board_tx.subscribe();
    ws.on_upgrade(move |socket| stream_board(socket, updates))
}

async fn stream_board(mut socket: WebSocket, mut updates: BoardUpdateReceiver) {
    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    // Displays only listen; any close or error ends the stream.
                    None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                    Some(Ok(_)) => {}
                }
            }

            update = updates.recv() => {
                match update {
                    Ok(update) => {
                        let json = match serde_json::to_string(&update) {
                            Ok(json) => json,
                            Err(e) => {
                                tracing::error!(error = %e, "failed to serialize board update");
                                continue;
                            }
                        };
                        if socket.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::debug!(skipped, "board subscriber lagged");
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        }
    }
}
