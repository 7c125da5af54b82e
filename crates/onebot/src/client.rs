use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use {
    async_trait::async_trait,
    corelink_config::PlatformConfig,
    corelink_platform::{MessageEvent, MessageRecord, PlatformActions, Segment},
    futures::{SinkExt, StreamExt},
    secrecy::ExposeSecret,
    serde_json::{Value, json},
    tokio::sync::{Mutex, mpsc, oneshot},
    tokio_tungstenite::{
        connect_async,
        tungstenite::{
            Message,
            client::IntoClientRequest,
            http::{HeaderValue, header::AUTHORIZATION},
        },
    },
    tokio_util::sync::CancellationToken,
    tracing::{debug, info, trace, warn},
};

use crate::{
    error::{Error, Result},
    frame::{ActionRequest, ActionResponse, Inbound, classify, numeric_id},
};

type Pending = Mutex<HashMap<String, oneshot::Sender<ActionResponse>>>;

struct Shared {
    write_tx: mpsc::UnboundedSender<String>,
    pending: Pending,
    connected: AtomicBool,
    action_timeout: Duration,
}

/// Handle to the OneBot connection. Cheap to clone.
#[derive(Clone)]
pub struct OneBotClient {
    shared: Arc<Shared>,
}

impl OneBotClient {
    /// Spawn the connection task. Message events are forwarded to `events`
    /// until `cancel` fires.
    pub fn spawn(
        config: &PlatformConfig,
        events: mpsc::UnboundedSender<MessageEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let (write_tx, write_rx) = mpsc::unbounded_channel();
        let client = Self {
            shared: Arc::new(Shared {
                write_tx,
                pending: Mutex::new(HashMap::new()),
                connected: AtomicBool::new(false),
                action_timeout: Duration::from_millis(config.action_timeout_ms),
            }),
        };

        tokio::spawn(connection_loop(
            client.clone(),
            config.clone(),
            events,
            write_rx,
            cancel,
        ));

        client
    }

    pub fn is_connected(&self) -> bool {
        self.shared.connected.load(Ordering::Acquire)
    }

    /// Call an action and wait for its echo-matched response data.
    pub async fn call(&self, action: &str, params: Value) -> Result<Value> {
        if !self.is_connected() {
            return Err(Error::NotConnected);
        }

        let echo = uuid::Uuid::new_v4().to_string();
        let request = ActionRequest {
            action,
            params,
            echo: echo.clone(),
        };
        let json = serde_json::to_string(&request)?;

        let (tx, rx) = oneshot::channel();
        self.shared.pending.lock().await.insert(echo.clone(), tx);

        if self.shared.write_tx.send(json).is_err() {
            self.shared.pending.lock().await.remove(&echo);
            return Err(Error::NotConnected);
        }

        match tokio::time::timeout(self.shared.action_timeout, rx).await {
            Ok(Ok(response)) if response.is_ok() => Ok(response.data),
            Ok(Ok(response)) => Err(Error::ActionFailed {
                action: action.to_string(),
                retcode: response.retcode,
                message: response.error_message(),
            }),
            Ok(Err(_)) => Err(Error::message(format!(
                "connection closed during {action}"
            ))),
            Err(_) => {
                self.shared.pending.lock().await.remove(&echo);
                Err(Error::Timeout {
                    action: action.to_string(),
                    timeout_ms: self.shared.action_timeout.as_millis() as u64,
                })
            },
        }
    }

    async fn route_frame(&self, bytes: &[u8], events: &mpsc::UnboundedSender<MessageEvent>) {
        match classify(bytes) {
            Ok(Inbound::Response(response)) => {
                let Some(echo) = response.echo_key() else {
                    trace!("response without echo");
                    return;
                };
                match self.shared.pending.lock().await.remove(&echo) {
                    Some(tx) => {
                        let _ = tx.send(response);
                    },
                    None => debug!(echo, "response for unknown or expired call"),
                }
            },
            Ok(Inbound::Message(event)) => {
                let _ = events.send(*event);
            },
            Ok(Inbound::Other { post_type }) => trace!(post_type, "ignoring platform event"),
            Err(e) => warn!(error = %e, "dropping malformed platform frame"),
        }
    }

    /// Fail every in-flight call; their senders are dropped.
    async fn abandon_pending(&self) {
        let mut pending = self.shared.pending.lock().await;
        if !pending.is_empty() {
            debug!(count = pending.len(), "abandoning in-flight actions");
        }
        pending.clear();
    }
}

#[async_trait]
impl PlatformActions for OneBotClient {
    async fn get_message(&self, message_id: &str) -> corelink_platform::Result<MessageRecord> {
        let data = self
            .call("get_msg", json!({ "message_id": numeric_id(message_id) }))
            .await?;
        Ok(serde_json::from_value(data)?)
    }

    async fn send_private_message(
        &self,
        user_id: &str,
        message: Vec<Segment>,
    ) -> corelink_platform::Result<()> {
        check_send(user_id, &message)?;
        self.call(
            "send_private_msg",
            json!({ "user_id": numeric_id(user_id), "message": message }),
        )
        .await?;
        Ok(())
    }

    async fn send_group_message(
        &self,
        group_id: &str,
        message: Vec<Segment>,
    ) -> corelink_platform::Result<()> {
        check_send(group_id, &message)?;
        self.call(
            "send_group_msg",
            json!({ "group_id": numeric_id(group_id), "message": message }),
        )
        .await?;
        Ok(())
    }
}

fn check_send(target: &str, message: &[Segment]) -> corelink_platform::Result<()> {
    if target.is_empty() {
        return Err(corelink_platform::Error::invalid_input("empty target id"));
    }
    if message.is_empty() {
        return Err(corelink_platform::Error::invalid_input("empty message"));
    }
    Ok(())
}

/// Connection loop with a fixed reconnect interval.
async fn connection_loop(
    client: OneBotClient,
    config: PlatformConfig,
    events: mpsc::UnboundedSender<MessageEvent>,
    mut write_rx: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    let delay = Duration::from_millis(config.reconnect_interval_ms);

    loop {
        // Calls queued while down have already failed or timed out.
        while write_rx.try_recv().is_ok() {}

        info!(url = %config.url, "connecting to OneBot");
        match connect_and_run(&client, &config, &events, &mut write_rx, &cancel).await {
            Ok(()) => debug!("OneBot connection closed"),
            Err(e) => warn!(error = %e, "OneBot connection error"),
        }
        client.shared.connected.store(false, Ordering::Release);
        client.abandon_pending().await;

        if cancel.is_cancelled() {
            info!("OneBot client stopped");
            return;
        }
        info!(delay_ms = config.reconnect_interval_ms, "reconnecting to OneBot after delay");
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {},
        }
    }
}

/// Single connection attempt: connect, then forward frames until closed.
async fn connect_and_run(
    client: &OneBotClient,
    config: &PlatformConfig,
    events: &mpsc::UnboundedSender<MessageEvent>,
    write_rx: &mut mpsc::UnboundedReceiver<String>,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut request = config.url.as_str().into_client_request()?;
    let token = config.access_token.expose_secret();
    if !token.is_empty() {
        let value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|_| Error::message("access token is not a valid header value"))?;
        request.headers_mut().insert(AUTHORIZATION, value);
    }

    let (ws_stream, _response) = tokio::select! {
        _ = cancel.cancelled() => return Ok(()),
        res = connect_async(request) => res?,
    };
    let (mut ws_sink, mut ws_reader) = ws_stream.split();
    client.shared.connected.store(true, Ordering::Release);
    info!("connected to OneBot");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = ws_sink.send(Message::Close(None)).await;
                return Ok(());
            },
            msg = ws_reader.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        client.route_frame(text.as_bytes(), events).await;
                    },
                    Some(Ok(Message::Binary(data))) => {
                        client.route_frame(&data, events).await;
                    },
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    },
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Ok(_)) => {},
                    Some(Err(e)) => return Err(e.into()),
                }
            },
            json = write_rx.recv() => {
                match json {
                    Some(text) => ws_sink.send(Message::Text(text.into())).await?,
                    None => {
                        let _ = ws_sink.send(Message::Close(None)).await;
                        return Ok(());
                    },
                }
            },
        }
    }
}
