//! STOMP-based push notifications over the HMC's JMS broker.
//!
//! Topic names are obtained from [`crate::session::Session::get_notification_topics`]
//! and subscribed to as `/topic/<topic-name>`. The JMS broker authenticates
//! with the same userid/password used for the Web Services logon, not the
//! session-id — a separate credential path from every other operation in
//! this crate.

mod stomp_frame;
mod tls;

pub use stomp_frame::StompFrame;

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::error::HmcError;
use crate::session::{Session, VerifyCert};

/// The HMC's default JMS/STOMP port. The real port is deployment-specific
/// and typically supplied by the operator alongside the HMC host; this is
/// used only when the caller doesn't override it.
pub const DEFAULT_NOTIFICATION_PORT: u16 = 61612;

/// The logical topic kinds the HMC's notification facility exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationTopicKind {
    Job,
    Object,
    Audit,
    Security,
    OsMessage,
}

impl NotificationTopicKind {
    #[must_use]
    pub fn as_topic_type(self) -> &'static str {
        match self {
            Self::Job => "job-notification",
            Self::Object => "object-notification",
            Self::Audit => "audit-notification",
            Self::Security => "security-notification",
            Self::OsMessage => "os-message-notification",
        }
    }

    #[must_use]
    pub fn from_topic_type(s: &str) -> Option<Self> {
        match s {
            "job-notification" => Some(Self::Job),
            "object-notification" => Some(Self::Object),
            "audit-notification" => Some(Self::Audit),
            "security-notification" => Some(Self::Security),
            "os-message-notification" => Some(Self::OsMessage),
            _ => None,
        }
    }
}

/// One entry from `GET get-notification-topics`.
#[derive(Debug, Clone)]
pub struct NotificationTopic {
    pub topic_name: String,
    pub topic_type: String,
}

/// Parse the `{"topics": [...]}` body returned by
/// [`crate::session::Session::get_notification_topics`].
pub fn parse_topics(body: &Value) -> Vec<NotificationTopic> {
    body.get("topics")
        .and_then(Value::as_array)
        .map(|arr| {
            arr.iter()
                .filter_map(|t| {
                    let topic_name = t.get("topic-name")?.as_str()?.to_string();
                    let topic_type = t.get("topic-type")?.as_str()?.to_string();
                    Some(NotificationTopic {
                        topic_name,
                        topic_type,
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

/// One delivered notification: headers plus the JSON-decoded body.
#[derive(Debug, Clone)]
pub struct NotificationMessage {
    pub headers: HashMap<String, String>,
    pub body: Value,
}

/// A subscription to one or more HMC notification topics.
///
/// Delivery runs on a single background task that reads STOMP frames off
/// a TLS connection to the HMC's JMS port and forwards parsed `MESSAGE`
/// frames into a bounded channel. [`Self::recv`] blocks the caller until
/// a message arrives, an error is reported by the broker, or [`Self::close`]
/// is called from any task.
pub struct NotificationReceiver {
    rx: tokio::sync::Mutex<mpsc::Receiver<Result<NotificationMessage, HmcError>>>,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<()>,
}

static SUBSCRIPTION_COUNTER: AtomicU32 = AtomicU32::new(1);

impl NotificationReceiver {
    /// Open a STOMP connection for `session` against `port` (pass
    /// [`DEFAULT_NOTIFICATION_PORT`] absent an operator-supplied override),
    /// subscribe to each of `topic_names`, and start the background
    /// delivery task. `queue_size` bounds the delivery channel.
    pub async fn connect(
        session: &Session,
        port: u16,
        topic_names: &[String],
        verify_cert: &VerifyCert,
        queue_size: usize,
    ) -> Result<Self, HmcError> {
        let (userid, password) = session.notification_credentials()?;

        let tcp = TcpStream::connect((session.host(), port))
            .await
            .map_err(|e| HmcError::NotificationError(format!("connect failed: {e}")))?;
        let mut conn = tls::connect(tcp, session.host(), verify_cert).await?;

        let connect_frame = StompFrame::new("CONNECT")
            .with_header("accept-version", "1.2")
            .with_header("host", session.host())
            .with_header("login", userid)
            .with_header("passcode", password);
        conn.write_all(&connect_frame.encode())
            .await
            .map_err(|e| HmcError::NotificationError(format!("CONNECT write failed: {e}")))?;

        let mut buffer = Vec::new();
        let connected = read_one_frame(&mut conn, &mut buffer).await?;
        if connected.command != "CONNECTED" {
            return Err(HmcError::NotificationError(format!(
                "broker rejected CONNECT: {} {:?}",
                connected.command, connected.headers
            )));
        }

        for topic_name in topic_names {
            let id = SUBSCRIPTION_COUNTER.fetch_add(1, Ordering::Relaxed).to_string();
            let subscribe_frame = StompFrame::new("SUBSCRIBE")
                .with_header("destination", format!("/topic/{topic_name}"))
                .with_header("id", id)
                .with_header("ack", "auto");
            conn.write_all(&subscribe_frame.encode())
                .await
                .map_err(|e| HmcError::NotificationError(format!("SUBSCRIBE write failed: {e}")))?;
        }

        let (tx, rx) = mpsc::channel(queue_size.max(1));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(delivery_loop(conn, buffer, tx, cancel.clone()));

        Ok(Self {
            rx: tokio::sync::Mutex::new(rx),
            cancel,
            task,
        })
    }

    /// Receive the next notification, or `None` once the connection has
    /// been closed (via [`Self::close`] or a broker disconnect).
    pub async fn recv(&self) -> Option<Result<NotificationMessage, HmcError>> {
        self.rx.lock().await.recv().await
    }

    /// Signal the delivery task to disconnect and stop. Safe to call from
    /// any task, including one that is itself awaiting [`Self::recv`].
    /// Idempotent.
    pub fn close(&self) {
        self.cancel.cancel();
    }

    /// Wait for the background delivery task to fully stop after
    /// [`Self::close`].
    pub async fn join(self) {
        self.cancel.cancel();
        let _ = self.task.await;
    }
}

async fn delivery_loop(
    mut conn: tls::NotificationStream,
    mut buffer: Vec<u8>,
    tx: mpsc::Sender<Result<NotificationMessage, HmcError>>,
    cancel: CancellationToken,
) {
    let mut read_buf = [0_u8; 8192];
    loop {
        for frame_text in stomp_frame::split_frames(&mut buffer) {
            let Some(frame) = StompFrame::decode(&frame_text) else {
                continue;
            };
            match frame.command.as_str() {
                "MESSAGE" => {
                    let body: Value = serde_json::from_str(&frame.body)
                        .unwrap_or_else(|_| Value::String(frame.body.clone()));
                    let message = NotificationMessage {
                        headers: frame.header_map(),
                        body,
                    };
                    if tx.send(Ok(message)).await.is_err() {
                        let _ = send_disconnect(&mut conn).await;
                        return;
                    }
                }
                "ERROR" => {
                    let summary = frame.header("message").unwrap_or("broker error").to_string();
                    warn!(summary, "STOMP broker reported an error");
                    let _ = tx.send(Err(HmcError::NotificationError(summary))).await;
                }
                "RECEIPT" => {
                    trace!("STOMP receipt received");
                }
                other => {
                    debug!(command = other, "ignoring unexpected STOMP frame");
                }
            }
        }

        tokio::select! {
            () = cancel.cancelled() => {
                let _ = send_disconnect(&mut conn).await;
                return;
            }
            result = conn.read(&mut read_buf) => {
                match result {
                    Ok(0) => return,
                    Ok(n) => buffer.extend_from_slice(&read_buf[..n]),
                    Err(e) => {
                        let _ = tx
                            .send(Err(HmcError::NotificationError(format!("read failed: {e}"))))
                            .await;
                        return;
                    }
                }
            }
        }
    }
}

async fn send_disconnect(conn: &mut tls::NotificationStream) -> Result<(), HmcError> {
    let frame = StompFrame::new("DISCONNECT").with_header("receipt", "bye");
    conn.write_all(&frame.encode())
        .await
        .map_err(|e| HmcError::NotificationError(format!("DISCONNECT write failed: {e}")))
}

async fn read_one_frame(
    conn: &mut tls::NotificationStream,
    buffer: &mut Vec<u8>,
) -> Result<StompFrame, HmcError> {
    let mut read_buf = [0_u8; 4096];
    loop {
        let frames = stomp_frame::split_frames(buffer);
        if let Some(first) = frames.into_iter().next() {
            return StompFrame::decode(&first)
                .ok_or_else(|| HmcError::NotificationError("malformed STOMP frame".to_string()));
        }
        let n = conn
            .read(&mut read_buf)
            .await
            .map_err(|e| HmcError::NotificationError(format!("read failed: {e}")))?;
        if n == 0 {
            return Err(HmcError::NotificationError(
                "connection closed before CONNECTED frame".to_string(),
            ));
        }
        buffer.extend_from_slice(&read_buf[..n]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_topics_body() {
        let body = json!({
            "topics": [
                {"topic-name": "ensadmin.145", "topic-type": "object-notification"},
                {"topic-name": "ensadmin.145job", "topic-type": "job-notification"},
            ]
        });
        let topics = parse_topics(&body);
        assert_eq!(topics.len(), 2);
        assert_eq!(topics[1].topic_name, "ensadmin.145job");
        assert_eq!(
            NotificationTopicKind::from_topic_type(&topics[1].topic_type),
            Some(NotificationTopicKind::Job)
        );
    }

    #[test]
    fn topic_kind_round_trips() {
        for kind in [
            NotificationTopicKind::Job,
            NotificationTopicKind::Object,
            NotificationTopicKind::Audit,
            NotificationTopicKind::Security,
            NotificationTopicKind::OsMessage,
        ] {
            assert_eq!(
                NotificationTopicKind::from_topic_type(kind.as_topic_type()),
                Some(kind)
            );
        }
    }
}
