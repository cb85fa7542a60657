use std::time::Duration;

use futures_util::SinkExt;
use tokio::net::TcpListener;
use tokio::time::timeout;
use tokio_tungstenite::{accept_async, tungstenite::Message};

use shelfwatch_events::RealtimeEvent;
use shelfwatch_realtime::{ChannelConfig, ConnectionStatus, RealtimeChannel, ReconnectPolicy};

/// Accepts connections forever. Each one gets a single event; the first is
/// then closed by the server, later ones stay open.
async fn spawn_server() -> (String, tokio::task::JoinHandle<()>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind ephemeral port");
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let mut open = Vec::new();
        for connection in 1u64.. {
            let (tcp, _) = listener.accept().await.unwrap();
            let mut ws = accept_async(tcp).await.unwrap();

            let event = RealtimeEvent::deleted(format!("evt-{connection}"), connection, "p-1");
            let text = serde_json::to_string(&event).unwrap();
            ws.send(Message::Text(text.into())).await.unwrap();

            if connection == 1 {
                let _ = ws.close(None).await;
            } else {
                open.push(ws);
            }
        }
    });

    (format!("ws://{addr}"), handle)
}

#[tokio::test]
async fn delivers_events_and_reconnects_after_server_close() {
    let (url, server) = spawn_server().await;
    let config = ChannelConfig::default()
        .with_quiet_period(Duration::from_millis(10))
        .with_reconnect(ReconnectPolicy::fixed(Duration::from_millis(50)));
    let mut channel = RealtimeChannel::connect(url, config);

    let mut seen = Vec::new();
    while seen.len() < 2 {
        let batch = timeout(Duration::from_secs(5), channel.next_batch())
            .await
            .expect("timed out waiting for events")
            .expect("channel stopped");
        seen.extend(batch.iter().map(|e| e.id.as_str().to_string()));
    }

    assert_eq!(seen, vec!["evt-1", "evt-2"]);
    assert_eq!(channel.status(), ConnectionStatus::Connected);
    assert_eq!(channel.history().len(), 2);

    channel.shutdown().await;
    server.abort();
}

#[tokio::test]
async fn unreachable_endpoint_stays_disconnected() {
    let config = ChannelConfig::default().with_reconnect(ReconnectPolicy::fixed(Duration::from_millis(20)));
    let channel = RealtimeChannel::connect("ws://127.0.0.1:9/ws", config);

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(!channel.is_connected());
    assert!(channel.latest_batch().is_none());

    channel.shutdown().await;
}
