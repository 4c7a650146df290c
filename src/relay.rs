//! WebSocket session with a single Nostr relay.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::time::{sleep_until, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

use crate::error::Error;
use crate::event::Event;
use crate::filter::Filter;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A live session with one relay. A constructed value is connected by
/// definition; dropping or closing it is the only way back to disconnected.
pub struct RelayConnection {
    endpoint: String,
    ws: WsStream,
}

impl RelayConnection {
    /// Open a WebSocket session to the relay at `url`.
    pub async fn connect(url: &str) -> Result<Self, Error> {
        let parsed = Url::parse(url).map_err(|e| Error::Connection {
            url: url.into(),
            reason: e.to_string(),
        })?;
        match parsed.scheme() {
            "ws" | "wss" => {}
            other => {
                return Err(Error::Connection {
                    url: url.into(),
                    reason: format!("unsupported scheme {other}"),
                })
            }
        }
        let (ws, _) = connect_async(url).await.map_err(|e| Error::Connection {
            url: url.into(),
            reason: e.to_string(),
        })?;
        debug!(endpoint = url, "relay session established");
        Ok(Self {
            endpoint: url.to_string(),
            ws,
        })
    }

    /// The relay URL this session is connected to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Open one subscription covering all `filters` (logical OR) and collect
    /// every event the relay pushes until `window` elapses, then cancel the
    /// subscription and return the events in arrival order.
    ///
    /// Arrival and the deadline race inside `select!`; the deadline arm is
    /// checked first so a zero window returns empty without reading a frame.
    /// `EOSE` does not end collection, live events keep arriving until the
    /// window closes. If the relay closes the stream early nothing further
    /// can arrive and the collected prefix is returned.
    pub async fn subscribe_collect(
        &mut self,
        filters: &[Filter],
        window: Duration,
    ) -> Result<Vec<Event>, Error> {
        let sub_id = format!("{:08x}", rand::random::<u32>());
        let mut req = vec![json!("REQ"), json!(sub_id)];
        if filters.is_empty() {
            req.push(json!({}));
        } else {
            for f in filters {
                req.push(serde_json::to_value(f)?);
            }
        }
        self.ws.send(Message::Text(Value::Array(req).to_string())).await?;

        let deadline = Instant::now() + window;
        let mut events = Vec::new();
        loop {
            tokio::select! {
                biased;
                _ = sleep_until(deadline) => break,
                msg = self.ws.next() => match msg {
                    Some(Ok(Message::Text(txt))) => {
                        self.collect_frame(&sub_id, &txt, &mut events);
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(endpoint = %self.endpoint, error = %e, "transport error during collection");
                        break;
                    }
                },
            }
        }

        let close = json!(["CLOSE", sub_id]);
        if let Err(e) = self.ws.send(Message::Text(close.to_string())).await {
            debug!(endpoint = %self.endpoint, error = %e, "subscription cancel not delivered");
        }
        Ok(events)
    }

    /// Append the event carried by one relay frame, if any.
    fn collect_frame(&self, sub_id: &str, txt: &str, events: &mut Vec<Event>) {
        let val = match serde_json::from_str::<Value>(txt) {
            Ok(v) => v,
            Err(_) => return,
        };
        let arr = match val.as_array() {
            Some(a) => a,
            None => return,
        };
        match arr.first().and_then(|v| v.as_str()) {
            Some("EVENT") if arr.len() >= 3 => {
                if arr.get(1).and_then(|v| v.as_str()) == Some(sub_id) {
                    if let Ok(ev) = serde_json::from_value::<Event>(arr[2].clone()) {
                        events.push(ev);
                    }
                }
            }
            Some("EOSE") => {
                debug!(endpoint = %self.endpoint, "end of stored events");
            }
            Some("NOTICE") => {
                warn!(endpoint = %self.endpoint, notice = %arr.get(1).and_then(|v| v.as_str()).unwrap_or(""), "relay notice");
            }
            _ => {}
        }
    }

    /// Send an event and wait for the relay's acknowledgement. The ack is
    /// interpreted only as accepted or rejected.
    pub async fn publish(&mut self, event: &Event) -> Result<(), Error> {
        let msg = json!(["EVENT", event]);
        self.ws
            .send(Message::Text(msg.to_string()))
            .await
            .map_err(|e| Error::Publish(e.to_string()))?;

        while let Some(msg) = self.ws.next().await {
            let msg = msg.map_err(|e| Error::Publish(e.to_string()))?;
            match msg {
                Message::Text(txt) => {
                    if let Ok(val) = serde_json::from_str::<Value>(&txt) {
                        if let Some(arr) = val.as_array() {
                            match arr.first().and_then(|v| v.as_str()) {
                                Some("OK")
                                    if arr.len() >= 3
                                        && arr.get(1).and_then(|v| v.as_str())
                                            == Some(event.id.as_str()) =>
                                {
                                    if arr.get(2).and_then(|v| v.as_bool()).unwrap_or(false) {
                                        return Ok(());
                                    }
                                    let reason = arr
                                        .get(3)
                                        .and_then(|v| v.as_str())
                                        .unwrap_or("rejected by relay");
                                    return Err(Error::Publish(reason.to_string()));
                                }
                                Some("NOTICE") => {
                                    warn!(endpoint = %self.endpoint, notice = %arr.get(1).and_then(|v| v.as_str()).unwrap_or(""), "relay notice");
                                }
                                _ => {}
                            }
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
        Err(Error::Publish(
            "connection closed before acknowledgement".into(),
        ))
    }

    /// Close the session, consuming it.
    pub async fn close(mut self) {
        if let Err(e) = self.ws.close(None).await {
            debug!(endpoint = %self.endpoint, error = %e, "close frame not delivered");
        }
    }
}
