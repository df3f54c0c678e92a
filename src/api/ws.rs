// =============================================================================
// WebSocket Handler — Push-based dashboard updates
// =============================================================================
//
// Clients connect to `/api/v1/ws` and receive:
//   1. An immediate full DashboardSnapshot on connect.
//   2. A fresh snapshot every 500 ms whenever the state_version has changed
//      since the last push (live ticks, view changes, reloads).
//
// The handler also answers Ping frames with Pong and ends on Close.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use futures_util::{Sink, SinkExt, StreamExt};
use tokio::time::{interval, Duration};
use tracing::{debug, info, warn};

use crate::app_state::AppState;

const PUSH_INTERVAL: Duration = Duration::from_millis(500);

/// Axum handler for the WebSocket upgrade request.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    info!("WebSocket connection accepted — upgrading");
    ws.on_upgrade(move |socket| handle_ws_connection(socket, state))
}

/// Manages a single WebSocket connection lifecycle.
///
/// Push and receive run concurrently via `tokio::select!`.
async fn handle_ws_connection(socket: WebSocket, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();
    let mut sequence: u64 = 0;

    // Read the version before building so a concurrent change is re-sent.
    let mut last_sent_version = state.current_state_version();
    if let Err(e) = send_snapshot(&mut sender, &state, &mut sequence).await {
        warn!(error = %e, "failed to send initial WebSocket snapshot");
        return;
    }

    let mut push_interval = interval(PUSH_INTERVAL);

    loop {
        tokio::select! {
            _ = push_interval.tick() => {
                let current_version = state.current_state_version();
                if current_version != last_sent_version {
                    if let Err(e) = send_snapshot(&mut sender, &state, &mut sequence).await {
                        debug!(error = %e, "WebSocket send failed — disconnecting");
                        break;
                    }
                    last_sent_version = current_version;
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Ping(data))) => {
                        if let Err(e) = sender.send(Message::Pong(data)).await {
                            debug!(error = %e, "failed to send Pong — disconnecting");
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!("WebSocket Close frame received — disconnecting");
                        break;
                    }
                    Some(Ok(Message::Text(text))) => {
                        debug!(msg = %text, "WebSocket text message ignored");
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "WebSocket receive error — disconnecting");
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    info!(messages = sequence, "WebSocket connection closed");
}

/// Serialize and send the current DashboardSnapshot.
async fn send_snapshot<S>(
    sender: &mut S,
    state: &Arc<AppState>,
    sequence: &mut u64,
) -> Result<(), axum::Error>
where
    S: Sink<Message, Error = axum::Error> + Unpin,
{
    let snapshot = state.build_snapshot();

    match serde_json::to_string(&snapshot) {
        Ok(json) => {
            sender.send(Message::Text(json)).await?;
            *sequence += 1;
            debug!(
                version = snapshot.state_version,
                seq = *sequence,
                "WebSocket snapshot sent"
            );
            Ok(())
        }
        Err(e) => {
            // Not a network error; keep the connection.
            warn!(error = %e, "failed to serialize snapshot");
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime_config::RuntimeConfig;
    use crate::types::{Bar, DataSource, SymbolMeta};
    use chrono::NaiveDate;
    use tokio::net::{TcpListener, TcpStream};
    use tokio::time::timeout;
    use tokio_tungstenite::tungstenite::Message as WsMessage;
    use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

    type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

    async fn serve(state: Arc<AppState>) -> Client {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = crate::api::rest::router(state);
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        let (client, _) = connect_async(format!("ws://{addr}/api/v1/ws")).await.unwrap();
        client
    }

    async fn next_snapshot(client: &mut Client) -> serde_json::Value {
        loop {
            match client.next().await {
                Some(Ok(WsMessage::Text(text))) => return serde_json::from_str(&text).unwrap(),
                Some(Ok(_)) => continue,
                other => panic!("stream ended before a snapshot: {other:?}"),
            }
        }
    }

    fn state_with_series() -> Arc<AppState> {
        let state = AppState::new(RuntimeConfig::default(), None);
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let bars = (0..30)
            .map(|i| Bar {
                date: start + chrono::Duration::days(i),
                open: 10.0,
                high: 11.0,
                low: 9.0,
                close: 10.0 + i as f64,
                volume: 1_000.0,
            })
            .collect();
        state
            .series
            .insert(SymbolMeta::new("NVDA", DataSource::Synthetic), bars);
        Arc::new(state)
    }

    #[tokio::test]
    async fn sends_snapshot_on_connect_then_only_on_change() {
        let state = state_with_series();
        let mut client = serve(state.clone()).await;

        let first = timeout(Duration::from_secs(2), next_snapshot(&mut client))
            .await
            .unwrap();
        assert_eq!(first["active_symbol"], "NVDA");
        assert_eq!(first["dashboard"]["total_bars"], 30);
        let first_version = first["state_version"].as_u64().unwrap();

        // Nothing changed: no push across a full interval.
        assert!(timeout(Duration::from_millis(800), next_snapshot(&mut client))
            .await
            .is_err());

        state.increment_version();
        let second = timeout(Duration::from_secs(2), next_snapshot(&mut client))
            .await
            .unwrap();
        assert!(second["state_version"].as_u64().unwrap() > first_version);
    }

    #[tokio::test]
    async fn ping_gets_pong_and_close_ends_connection() {
        let state = state_with_series();
        let mut client = serve(state).await;
        timeout(Duration::from_secs(2), next_snapshot(&mut client))
            .await
            .unwrap();

        client.send(WsMessage::Ping(vec![7, 7, 7])).await.unwrap();
        let pong = timeout(Duration::from_secs(2), async {
            loop {
                match client.next().await {
                    Some(Ok(WsMessage::Pong(data))) => return data,
                    Some(Ok(_)) => continue,
                    other => panic!("no pong: {other:?}"),
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(pong, vec![7, 7, 7]);

        client.send(WsMessage::Close(None)).await.unwrap();
        let ended = timeout(Duration::from_secs(2), async {
            loop {
                match client.next().await {
                    Some(Ok(WsMessage::Close(_))) | None | Some(Err(_)) => return true,
                    Some(Ok(_)) => continue,
                }
            }
        })
        .await
        .unwrap();
        assert!(ended);
    }
}
