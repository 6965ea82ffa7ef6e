//! Integration tests for the WebSocket protocol against a bound listener.

mod helpers;

use std::net::SocketAddr;
use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use helpers::TestApp;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr) -> Client {
    let (client, _) = connect_async(format!("ws://{addr}/ws"))
        .await
        .expect("WebSocket handshake");
    client
}

async fn send(client: &mut Client, value: Value) {
    client
        .send(Message::text(value.to_string()))
        .await
        .expect("send frame");
}

async fn recv(client: &mut Client) -> Value {
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), client.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("connection closed")
            .expect("frame error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).expect("JSON frame");
        }
    }
}

#[tokio::test]
async fn test_subscriber_sees_transitions_but_not_rejections() {
    let app = TestApp::new();
    let addr = app.spawn().await;

    let mut watcher = connect(addr).await;
    send(&mut watcher, json!({ "type": "subscribe", "topic": "space/10" })).await;

    let subscribed = recv(&mut watcher).await;
    assert_eq!(subscribed["type"], "subscribed");
    assert_eq!(subscribed["topic"], "space/10");

    let initial = recv(&mut watcher).await;
    assert_eq!(initial["type"], "event");
    assert_eq!(initial["payload"]["action"], "INITIAL_STATUS");
    assert_eq!(initial["payload"]["availableSlots"], 10);

    let mut driver = connect(addr).await;
    let reserve = json!({
        "type": "reserve", "slotId": 1, "spaceId": 10, "userId": 5, "userName": "Ana"
    });
    send(&mut driver, reserve.clone()).await;

    let ack = recv(&mut driver).await;
    assert_eq!(ack["type"], "ack");
    assert_eq!(ack["request"], "reserve");
    assert_eq!(ack["slotId"], 1);
    assert!(ack["expiresAt"].is_i64());

    let reserved = recv(&mut watcher).await;
    assert_eq!(reserved["type"], "event");
    assert_eq!(reserved["payload"]["action"], "RESERVED");
    assert_eq!(reserved["payload"]["userName"], "Ana");

    send(&mut driver, reserve).await;
    let rejected = recv(&mut driver).await;
    assert_eq!(rejected["type"], "rejected");
    assert_eq!(rejected["code"], "ALREADY_RESERVED");
    assert_eq!(rejected["event"]["action"], "NOT_AVAILABLE");

    send(
        &mut driver,
        json!({ "type": "release", "slotId": 1, "spaceId": 10, "userId": 5 }),
    )
    .await;
    assert_eq!(recv(&mut driver).await["request"], "release");

    let released = recv(&mut watcher).await;
    assert_eq!(
        released["payload"]["action"], "RELEASED",
        "the rejected attempt must not reach other subscribers"
    );
}

#[tokio::test]
async fn test_http_transitions_reach_websocket_subscribers() {
    let app = TestApp::new();
    let addr = app.spawn().await;

    let mut watcher = connect(addr).await;
    send(&mut watcher, json!({ "type": "subscribe", "topic": "space-aggregate/10" })).await;
    assert_eq!(recv(&mut watcher).await["type"], "subscribed");

    let response = app
        .request(
            "POST",
            "/api/slots/2/reserve",
            Some(json!({ "spaceId": 10, "userId": 1, "userName": "Bo" })),
        )
        .await;
    assert!(response.status.is_success());

    let update = recv(&mut watcher).await;
    assert_eq!(update["topic"], "space-aggregate/10");
    assert_eq!(update["payload"]["action"], "AVAILABILITY_UPDATE");
    assert_eq!(update["payload"]["availableSlots"], 9);
}

#[tokio::test]
async fn test_protocol_errors() {
    let app = TestApp::new();
    let addr = app.spawn().await;
    let mut client = connect(addr).await;

    send(&mut client, json!({ "type": "ping" })).await;
    assert_eq!(recv(&mut client).await["type"], "pong");

    client
        .send(Message::text("not json"))
        .await
        .expect("send frame");
    let invalid = recv(&mut client).await;
    assert_eq!(invalid["type"], "error");
    assert_eq!(invalid["code"], "INVALID_MESSAGE");

    send(&mut client, json!({ "type": "subscribe", "topic": "slots/1" })).await;
    assert_eq!(recv(&mut client).await["code"], "INVALID_TOPIC");

    send(&mut client, json!({ "type": "unsubscribe", "topic": "all-slots" })).await;
    assert_eq!(recv(&mut client).await["code"], "NOT_SUBSCRIBED");

    send(&mut client, json!({ "type": "subscribe", "topic": "all-slots" })).await;
    assert_eq!(recv(&mut client).await["type"], "subscribed");
    send(&mut client, json!({ "type": "unsubscribe", "topic": "all-slots" })).await;
    assert_eq!(recv(&mut client).await["type"], "unsubscribed");

    send(
        &mut client,
        json!({ "type": "release", "slotId": 3, "spaceId": 10 }),
    )
    .await;
    let rejected = recv(&mut client).await;
    assert_eq!(rejected["type"], "rejected");
    assert_eq!(rejected["code"], "NOT_RESERVED");
    assert!(rejected.get("event").is_none());
}
