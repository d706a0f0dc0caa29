//! Phoenix-channel websocket client for row change notifications.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{connect_async, tungstenite::Message};
use url::Url;

use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::remote::{
    ChangeEvent, ChangeKind, ChangeSubscription, SubscriptionHandle, TableFilter,
};
use crate::repository::rest::base_url;

const EVENT_BUFFER: usize = 64;
const PROTOCOL_VERSION: &str = "1.0.0";

/// Websocket endpoint for `backend_url`, with `http(s)` swapped for `ws(s)`.
pub fn realtime_url(backend_url: &str, api_key: &str) -> RepositoryResult<Url> {
    let mut url = base_url(backend_url)?.join("realtime/v1/websocket")?;
    let scheme = match url.scheme() {
        "https" => "wss",
        "http" => "ws",
        other => {
            return Err(RepositoryError::ValidationError(format!(
                "Unsupported backend scheme: {other}"
            )));
        }
    };
    url.set_scheme(scheme).map_err(|_| {
        RepositoryError::ValidationError(format!("Cannot switch {backend_url} to {scheme}"))
    })?;
    url.query_pairs_mut()
        .append_pair("apikey", api_key)
        .append_pair("vsn", PROTOCOL_VERSION);
    Ok(url)
}

pub fn join_message(topic: &str, filter: &TableFilter, join_ref: &str) -> Value {
    json!({
        "topic": topic,
        "event": "phx_join",
        "payload": {
            "config": {
                "broadcast": { "ack": false, "self": false },
                "presence": { "key": "" },
                "postgres_changes": [{
                    "event": filter.event_wire(),
                    "schema": filter.schema,
                    "table": filter.table,
                }],
            },
        },
        "ref": join_ref,
        "join_ref": join_ref,
    })
}

pub fn heartbeat_message(message_ref: &str) -> Value {
    json!({
        "topic": "phoenix",
        "event": "heartbeat",
        "payload": {},
        "ref": message_ref,
    })
}

pub fn leave_message(topic: &str, message_ref: &str) -> Value {
    json!({
        "topic": topic,
        "event": "phx_leave",
        "payload": {},
        "ref": message_ref,
    })
}

#[derive(Debug, Deserialize)]
struct PhoenixFrame {
    topic: String,
    event: String,
    #[serde(default)]
    payload: Value,
}

/// What an incoming frame means for the subscriber.
#[derive(Debug, Clone, PartialEq)]
pub enum RealtimeFrame {
    Change(ChangeEvent),
    /// The server refused the join or dropped the channel.
    ChannelError(String),
    Other,
}

fn text_field(data: &Value, field: &str) -> RepositoryResult<String> {
    data.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| RepositoryError::DecodeError(format!("Change payload without {field}")))
}

pub fn parse_frame(text: &str) -> RepositoryResult<RealtimeFrame> {
    let frame: PhoenixFrame = serde_json::from_str(text)?;

    match frame.event.as_str() {
        "postgres_changes" => {
            let data = frame.payload.get("data").ok_or_else(|| {
                RepositoryError::DecodeError(format!("Change on {} without data", frame.topic))
            })?;
            let kind_wire = text_field(data, "type")?;
            let kind = ChangeKind::from_wire(&kind_wire).ok_or_else(|| {
                RepositoryError::DecodeError(format!("Unknown change type {kind_wire}"))
            })?;
            Ok(RealtimeFrame::Change(ChangeEvent {
                kind,
                schema: text_field(data, "schema")?,
                table: text_field(data, "table")?,
                record: data.get("record").cloned().unwrap_or(Value::Null),
                old_record: data.get("old_record").cloned().unwrap_or(Value::Null),
            }))
        }
        "phx_reply" if frame.payload.get("status").and_then(Value::as_str) == Some("error") => {
            Ok(RealtimeFrame::ChannelError(
                frame
                    .payload
                    .get("response")
                    .map(Value::to_string)
                    .unwrap_or_default(),
            ))
        }
        "phx_error" | "phx_close" => Ok(RealtimeFrame::ChannelError(format!(
            "{} on {}",
            frame.event, frame.topic
        ))),
        _ => Ok(RealtimeFrame::Other),
    }
}

#[derive(Clone, Debug)]
pub struct RealtimeClient {
    socket_url: Url,
    heartbeat: Duration,
}

impl RealtimeClient {
    pub fn new(backend_url: &str, api_key: &str, heartbeat: Duration) -> RepositoryResult<Self> {
        Ok(Self {
            socket_url: realtime_url(backend_url, api_key)?,
            heartbeat,
        })
    }

    /// Opens a socket, joins `realtime:<channel>` and forwards change events
    /// until the handle is closed or the connection ends.
    pub async fn subscribe(
        &self,
        channel: &str,
        filter: &TableFilter,
    ) -> RepositoryResult<ChangeSubscription> {
        let (socket, _) = connect_async(self.socket_url.as_str()).await?;
        let (mut writer, mut reader) = socket.split();

        let topic = format!("realtime:{channel}");
        writer
            .send(Message::Text(join_message(&topic, filter, "1").to_string()))
            .await?;
        log::info!("Joined realtime channel {topic}");

        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER);
        let (close_tx, mut close_rx) = oneshot::channel::<()>();
        let heartbeat = self.heartbeat;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(heartbeat);
            // The first tick completes immediately.
            ticker.tick().await;
            let mut next_ref: u64 = 2;

            loop {
                tokio::select! {
                    _ = &mut close_rx => {
                        let leave = leave_message(&topic, &next_ref.to_string());
                        if let Err(e) = writer.send(Message::Text(leave.to_string())).await {
                            log::debug!("Failed to leave {topic}: {e}");
                        }
                        let _ = writer.close().await;
                        log::info!("Left realtime channel {topic}");
                        break;
                    }
                    _ = ticker.tick() => {
                        let beat = heartbeat_message(&next_ref.to_string());
                        next_ref += 1;
                        if let Err(e) = writer.send(Message::Text(beat.to_string())).await {
                            log::warn!("Realtime heartbeat failed on {topic}: {e}");
                            break;
                        }
                    }
                    frame = reader.next() => match frame {
                        Some(Ok(Message::Text(text))) => match parse_frame(&text) {
                            Ok(RealtimeFrame::Change(event)) => match events_tx.try_send(event) {
                                Ok(()) => {}
                                // The listener re-fetches on any event, so a
                                // full buffer already guarantees a refresh.
                                Err(TrySendError::Full(_)) => {
                                    log::debug!("Change buffer full on {topic}; dropping event");
                                }
                                Err(TrySendError::Closed(_)) => break,
                            },
                            Ok(RealtimeFrame::ChannelError(reason)) => {
                                log::error!("Realtime channel {topic} failed: {reason}");
                                break;
                            }
                            Ok(RealtimeFrame::Other) => {}
                            Err(e) => log::warn!("Skipping realtime frame: {e}"),
                        },
                        Some(Ok(Message::Close(_))) | None => {
                            log::warn!("Realtime connection for {topic} closed");
                            break;
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            log::warn!("Realtime connection for {topic} failed: {e}");
                            break;
                        }
                    }
                }
            }
        });

        let handle = SubscriptionHandle::new(move || {
            let _ = close_tx.send(());
        });
        Ok(ChangeSubscription::new(events_rx, handle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn socket_url_uses_websocket_scheme() {
        let url = realtime_url("https://project.supabase.co/", "anon-key").unwrap();
        assert_eq!(
            url.as_str(),
            "wss://project.supabase.co/realtime/v1/websocket?apikey=anon-key&vsn=1.0.0"
        );

        let local = realtime_url("http://localhost:54321", "k").unwrap();
        assert_eq!(local.scheme(), "ws");
        assert!(realtime_url("ftp://host", "k").is_err());
    }

    #[test]
    fn join_requests_all_changes_of_the_table() {
        let filter = TableFilter::all_changes("public", "orders");
        let message = join_message("realtime:public:orders", &filter, "1");

        assert_eq!(message["event"], "phx_join");
        assert_eq!(
            message["payload"]["config"]["postgres_changes"][0],
            json!({"event": "*", "schema": "public", "table": "orders"})
        );
    }

    #[test]
    fn change_frames_become_events() {
        let frame = json!({
            "topic": "realtime:public:orders",
            "event": "postgres_changes",
            "payload": {
                "data": {
                    "type": "UPDATE",
                    "schema": "public",
                    "table": "orders",
                    "commit_timestamp": "2025-05-01T12:00:00Z",
                    "record": {"id": "a", "status": "agendada"},
                    "old_record": {"id": "a"}
                },
                "ids": [1]
            },
            "ref": null
        });

        let parsed = parse_frame(&frame.to_string()).unwrap();

        let RealtimeFrame::Change(event) = parsed else {
            panic!("expected a change");
        };
        assert_eq!(event.kind, ChangeKind::Update);
        assert_eq!(event.table, "orders");
        assert_eq!(event.record["status"], "agendada");
    }

    #[test]
    fn replies_and_errors_are_classified() {
        let ok = json!({"topic": "phoenix", "event": "phx_reply", "payload": {"status": "ok", "response": {}}, "ref": "2"});
        assert_eq!(parse_frame(&ok.to_string()).unwrap(), RealtimeFrame::Other);

        let refused = json!({"topic": "realtime:public:orders", "event": "phx_reply", "payload": {"status": "error", "response": {"reason": "unauthorized"}}, "ref": "1"});
        assert!(matches!(
            parse_frame(&refused.to_string()).unwrap(),
            RealtimeFrame::ChannelError(reason) if reason.contains("unauthorized")
        ));

        assert!(parse_frame("not json").is_err());
    }
}
