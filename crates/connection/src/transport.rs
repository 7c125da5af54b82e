use {
    futures::{SinkExt, StreamExt},
    tokio::sync::mpsc,
    tokio_tungstenite::{connect_async, tungstenite::Message},
    tokio_util::sync::CancellationToken,
    tracing::debug,
    url::Url,
};

use crate::error::Result;

/// Lifecycle and data events reported by one transport link.
///
/// A link reports at most one `Opened` and always ends with exactly one
/// `Closed`, whether or not it ever opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    /// Payload of a text or binary frame.
    Frame(Vec<u8>),
    Error(String),
    Closed,
}

/// Handle to one in-flight or open socket.
pub struct TransportLink {
    /// Frames to write; each becomes one binary message.
    pub outgoing: mpsc::UnboundedSender<Vec<u8>>,
    pub events: mpsc::UnboundedReceiver<TransportEvent>,
    /// Cancelling closes the socket (or abandons the open).
    pub cancel: CancellationToken,
}

/// Opens sockets. Opening never blocks: progress is reported on the
/// link's event channel.
pub trait Transport: Send + Sync + 'static {
    fn open(&self, url: &Url) -> TransportLink;
}

/// WebSocket transport over tokio-tungstenite.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsTransport;

impl Transport for WsTransport {
    fn open(&self, url: &Url) -> TransportLink {
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        let (events_tx, events) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();

        tokio::spawn(socket_task(
            url.clone(),
            outgoing_rx,
            events_tx,
            cancel.clone(),
        ));

        TransportLink {
            outgoing,
            events,
            cancel,
        }
    }
}

async fn socket_task(
    url: Url,
    mut outgoing: mpsc::UnboundedReceiver<Vec<u8>>,
    events: mpsc::UnboundedSender<TransportEvent>,
    cancel: CancellationToken,
) {
    if let Err(e) = connect_and_run(&url, &mut outgoing, &events, &cancel).await {
        let _ = events.send(TransportEvent::Error(e.to_string()));
    }
    let _ = events.send(TransportEvent::Closed);
}

async fn connect_and_run(
    url: &Url,
    outgoing: &mut mpsc::UnboundedReceiver<Vec<u8>>,
    events: &mpsc::UnboundedSender<TransportEvent>,
    cancel: &CancellationToken,
) -> Result<()> {
    let (ws_stream, _response) = tokio::select! {
        _ = cancel.cancelled() => return Ok(()),
        res = connect_async(url.as_str()) => res?,
    };
    let _ = events.send(TransportEvent::Opened);
    let (mut ws_sink, mut ws_reader) = ws_stream.split();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                let _ = ws_sink.send(Message::Close(None)).await;
                return Ok(());
            },
            msg = ws_reader.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let _ = events.send(TransportEvent::Frame(text.as_bytes().to_vec()));
                    },
                    Some(Ok(Message::Binary(data))) => {
                        let _ = events.send(TransportEvent::Frame(data.to_vec()));
                    },
                    Some(Ok(Message::Ping(data))) => {
                        ws_sink.send(Message::Pong(data)).await?;
                    },
                    Some(Ok(Message::Close(_))) | None => {
                        debug!("engine closed the WebSocket");
                        return Ok(());
                    },
                    Some(Ok(_)) => {},
                    Some(Err(e)) => return Err(e.into()),
                }
            },
            frame = outgoing.recv() => {
                match frame {
                    Some(bytes) => {
                        ws_sink.send(Message::Binary(bytes.into())).await?;
                    },
                    None => {
                        let _ = ws_sink.send(Message::Close(None)).await;
                        return Ok(());
                    },
                }
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, std::time::Duration, tokio::net::TcpListener};

    async fn next_event(link: &mut TransportLink) -> TransportEvent {
        tokio::time::timeout(Duration::from_secs(5), link.events.recv())
            .await
            .expect("timed out waiting for transport event")
            .expect("event channel closed")
    }

    #[tokio::test]
    async fn ws_transport_exchanges_frames() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            ws.send(Message::Text(String::from(r#"{"content":[]}"#).into()))
                .await
                .unwrap();
            let received = loop {
                match ws.next().await.unwrap().unwrap() {
                    Message::Binary(data) => break data.to_vec(),
                    _ => continue,
                }
            };
            ws.close(None).await.unwrap();
            received
        });

        let url = Url::parse(&format!("ws://{addr}/ws/corelink")).unwrap();
        let mut link = WsTransport.open(&url);

        assert_eq!(next_event(&mut link).await, TransportEvent::Opened);
        assert_eq!(
            next_event(&mut link).await,
            TransportEvent::Frame(br#"{"content":[]}"#.to_vec())
        );

        link.outgoing.send(b"hello".to_vec()).unwrap();
        assert_eq!(server.await.unwrap(), b"hello".to_vec());
        assert_eq!(next_event(&mut link).await, TransportEvent::Closed);
    }

    #[tokio::test]
    async fn refused_connection_reports_error_then_closed() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("ws://{addr}/")).unwrap();
        let mut link = WsTransport.open(&url);

        assert!(matches!(next_event(&mut link).await, TransportEvent::Error(_)));
        assert_eq!(next_event(&mut link).await, TransportEvent::Closed);
    }

    #[tokio::test]
    async fn cancel_during_handshake_closes_without_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let url = Url::parse(&format!("ws://{addr}/")).unwrap();
        let mut link = WsTransport.open(&url);
        link.cancel.cancel();

        assert_eq!(next_event(&mut link).await, TransportEvent::Closed);
        drop(listener);
    }
}
