//! WebSocket upgrade handler and per-connection message loop.

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use parking_core::error::AppError;
use parking_core::events::NotificationEvent;
use parking_core::types::id::{SlotId, SpaceId, UserId};
use parking_core::types::topic::Topic;
use parking_realtime::connection::ConnectionHandle;
use parking_realtime::message::serializer::{deserialize_inbound, serialize_outbound};
use parking_realtime::message::types::{InboundMessage, OutboundMessage, RequestKind};
use parking_reservation::coordinator::{ReleaseRequest, ReserveRequest};

use crate::state::AppState;

/// GET /ws: WebSocket upgrade
pub async fn ws_upgrade(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_ws_connection(state, socket))
}

/// Handles an established WebSocket connection.
async fn handle_ws_connection(state: AppState, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let (handle, mut outbound_rx) = state.realtime.open_connection();
    let conn_id = handle.id;
    let mut shutdown = state.realtime.shutdown_receiver();

    info!(conn_id = %conn_id, "WebSocket connection established");

    // Spawn outbound message forwarder
    let outbound_task = tokio::spawn(async move {
        while let Some(msg) = outbound_rx.recv().await {
            let text = match serialize_outbound(&msg) {
                Ok(text) => text,
                Err(e) => {
                    warn!(conn_id = %conn_id, error = %e, "Failed to serialize outbound message");
                    continue;
                }
            };
            if ws_tx.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
        let _ = ws_tx.close().await;
    });

    // Process inbound messages
    loop {
        tokio::select! {
            _ = shutdown.recv() => {
                debug!(conn_id = %conn_id, "Closing WebSocket for shutdown");
                break;
            }
            frame = ws_rx.next() => match frame {
                Some(Ok(Message::Text(text))) => {
                    state.realtime.metrics.inc_received();
                    handle_inbound(&state, &handle, text.as_str()).await;
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    warn!(conn_id = %conn_id, error = %e, "WebSocket error");
                    break;
                }
            }
        }
    }

    // Cleanup
    state.realtime.close_connection(&handle);
    outbound_task.abort();

    info!(conn_id = %conn_id, "WebSocket connection closed");
}

/// Dispatches one inbound text frame.
async fn handle_inbound(state: &AppState, handle: &ConnectionHandle, text: &str) {
    let msg = match deserialize_inbound(text) {
        Ok(msg) => msg,
        Err(e) => {
            handle.send(OutboundMessage::Error {
                code: "INVALID_MESSAGE".to_string(),
                message: e.to_string(),
            });
            return;
        }
    };

    match msg {
        InboundMessage::Reserve {
            slot_id,
            space_id,
            user_id,
            user_name,
            reservation_timeout_minutes,
        } => {
            reserve(
                state,
                handle,
                slot_id,
                space_id,
                user_id,
                user_name,
                reservation_timeout_minutes,
            )
            .await
        }
        InboundMessage::Release {
            slot_id,
            space_id,
            user_id,
        } => {
            let outcome = state
                .coordinator
                .release(ReleaseRequest {
                    slot_id,
                    space_id,
                    user_id,
                })
                .await;
            let reply = match outcome {
                Ok(_) => OutboundMessage::Ack {
                    request: RequestKind::Release,
                    slot_id,
                    expires_at: None,
                },
                Err(e) => failure(e, None),
            };
            handle.send(reply);
        }
        InboundMessage::Subscribe { topic } => subscribe(state, handle, &topic).await,
        InboundMessage::Unsubscribe { topic } => {
            let reply = match Topic::parse(&topic) {
                Some(topic) if handle.detach(&topic) => OutboundMessage::Unsubscribed { topic },
                Some(topic) => OutboundMessage::Error {
                    code: "NOT_SUBSCRIBED".to_string(),
                    message: format!("Not subscribed to '{topic}'"),
                },
                None => invalid_topic(&topic),
            };
            handle.send(reply);
        }
        InboundMessage::Ping => {
            handle.send(OutboundMessage::Pong {
                timestamp: Utc::now().timestamp_millis(),
            });
        }
    }
}

async fn reserve(
    state: &AppState,
    handle: &ConnectionHandle,
    slot_id: SlotId,
    space_id: SpaceId,
    user_id: UserId,
    user_name: String,
    timeout_minutes: Option<u64>,
) {
    let ttl = match state.config.reservation.ttl_from_minutes(timeout_minutes) {
        Ok(ttl) => ttl,
        Err(e) => {
            handle.send(failure(e, None));
            return;
        }
    };

    let outcome = state
        .coordinator
        .reserve(ReserveRequest {
            slot_id,
            space_id,
            user_id,
            user_name,
            ttl: Some(ttl),
        })
        .await;

    let reply = match outcome {
        Ok(reservation) => OutboundMessage::Ack {
            request: RequestKind::Reserve,
            slot_id,
            expires_at: Some(reservation.expires_at().timestamp_millis()),
        },
        Err(e) => failure(e, Some(NotificationEvent::not_available(slot_id, space_id))),
    };
    handle.send(reply);
}

async fn subscribe(state: &AppState, handle: &ConnectionHandle, raw: &str) {
    let Some(topic) = Topic::parse(raw) else {
        handle.send(invalid_topic(raw));
        return;
    };

    if let Err(e) = handle.can_subscribe(&topic) {
        handle.send(failure(e, None));
        return;
    }

    let stream = match state.coordinator.subscribe(topic).await {
        Ok(stream) => stream,
        Err(e) => {
            handle.send(failure(e, None));
            return;
        }
    };

    handle.send(OutboundMessage::Subscribed { topic });
    if let Err(e) = handle.attach(topic, stream) {
        handle.send(failure(e, None));
    }
}

/// Rejections become `rejected` (with the `NOT_AVAILABLE` event for failed
/// reservations); anything else becomes `error`.
fn failure(e: AppError, not_available: Option<NotificationEvent>) -> OutboundMessage {
    if e.is_rejection() {
        OutboundMessage::Rejected {
            code: e.kind.to_string(),
            message: e.message,
            event: not_available,
        }
    } else {
        OutboundMessage::Error {
            code: e.kind.to_string(),
            message: e.message,
        }
    }
}

fn invalid_topic(raw: &str) -> OutboundMessage {
    OutboundMessage::Error {
        code: "INVALID_TOPIC".to_string(),
        message: format!("Unknown topic '{raw}'"),
    }
}
