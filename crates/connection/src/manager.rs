use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use {
    corelink_protocol::MessageSend,
    tokio::sync::mpsc,
    tokio_util::sync::CancellationToken,
    tracing::{debug, error, info, trace, warn},
};

use crate::{
    config::ConnectionConfig,
    endpoint::display_url,
    error::Result,
    transport::{Transport, TransportEvent},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// Events published by the manager.
#[derive(Debug)]
pub enum ConnectionEvent {
    Connected,
    Disconnected,
    /// A parsed engine frame.
    Frame(Box<MessageSend>),
    /// The reconnect budget is spent; the manager stays disconnected until
    /// it is reconfigured or connected again.
    GaveUp { attempts: u32 },
}

/// Outbound side of the connection as seen by the bridges.
pub trait Upstream: Send + Sync {
    /// Write one frame; dropped unless connected.
    fn send(&self, frame: Vec<u8>);
    fn status(&self) -> ConnectionState;
}

struct LinkHandle {
    outgoing: mpsc::UnboundedSender<Vec<u8>>,
    cancel: CancellationToken,
}

struct TimerHandle {
    id: u64,
    cancel: CancellationToken,
}

struct Shared {
    state: ConnectionState,
    config: Option<ConnectionConfig>,
    attempts: u32,
    /// Bumped on every open and every disconnect; events tagged with an
    /// older generation are ignored.
    generation: u64,
    link: Option<LinkHandle>,
    timer: Option<TimerHandle>,
    next_timer_id: u64,
}

struct Inner {
    transport: Arc<dyn Transport>,
    events: mpsc::UnboundedSender<ConnectionEvent>,
    shared: Mutex<Shared>,
}

/// Owns the single engine connection and its reconnect policy.
///
/// All transitions happen under one `std::sync::Mutex` that is never held
/// across an `.await`. Cheap to clone; clones share state.
#[derive(Clone)]
pub struct ConnectionManager {
    inner: Arc<Inner>,
}

impl ConnectionManager {
    pub fn new(
        transport: Arc<dyn Transport>,
    ) -> (Self, mpsc::UnboundedReceiver<ConnectionEvent>) {
        let (events, events_rx) = mpsc::unbounded_channel();
        let manager = Self {
            inner: Arc::new(Inner {
                transport,
                events,
                shared: Mutex::new(Shared {
                    state: ConnectionState::Disconnected,
                    config: None,
                    attempts: 0,
                    generation: 0,
                    link: None,
                    timer: None,
                    next_timer_id: 0,
                }),
            }),
        };
        (manager, events_rx)
    }

    fn lock(&self) -> MutexGuard<'_, Shared> {
        self.inner
            .shared
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: ConnectionEvent) {
        let _ = self.inner.events.send(event);
    }

    /// Start connecting with the given parameters.
    ///
    /// A no-op while connecting or connected. A pending reconnect timer is
    /// superseded. An unusable URL is returned as an error and the state
    /// stays `Disconnected`.
    pub fn connect(&self, config: ConnectionConfig) -> Result<()> {
        let mut shared = self.lock();
        if shared.state != ConnectionState::Disconnected {
            debug!(state = ?shared.state, "connect ignored, already active");
            return Ok(());
        }
        if let Some(timer) = shared.timer.take() {
            timer.cancel.cancel();
        }
        shared.config = Some(config);
        self.open_locked(&mut shared)
    }

    fn open_locked(&self, shared: &mut Shared) -> Result<()> {
        let Some(config) = shared.config.as_ref() else {
            return Ok(());
        };
        let url = config.endpoint().inspect_err(|e| {
            error!(error = %e, "cannot connect to engine");
        })?;

        shared.state = ConnectionState::Connecting;
        shared.generation += 1;
        info!(url = %display_url(&url), attempt = shared.attempts, "connecting to engine");

        let link = self.inner.transport.open(&url);
        shared.link = Some(LinkHandle {
            outgoing: link.outgoing,
            cancel: link.cancel,
        });
        tokio::spawn(self.clone().pump(shared.generation, link.events));
        Ok(())
    }

    async fn pump(self, generation: u64, mut events: mpsc::UnboundedReceiver<TransportEvent>) {
        while let Some(event) = events.recv().await {
            let closed = event == TransportEvent::Closed;
            if !self.on_transport_event(generation, event) || closed {
                return;
            }
        }
        // Sender dropped without a Closed event.
        self.on_transport_event(generation, TransportEvent::Closed);
    }

    /// Returns `false` once the link is stale.
    fn on_transport_event(&self, generation: u64, event: TransportEvent) -> bool {
        let mut shared = self.lock();
        if shared.generation != generation {
            trace!(generation, "ignoring event from stale link");
            return false;
        }
        match event {
            TransportEvent::Opened => {
                shared.state = ConnectionState::Connected;
                shared.attempts = 0;
                if let Some(timer) = shared.timer.take() {
                    timer.cancel.cancel();
                }
                info!("connected to engine");
                self.publish(ConnectionEvent::Connected);
            },
            TransportEvent::Frame(bytes) => {
                drop(shared);
                self.on_frame(&bytes);
            },
            TransportEvent::Error(message) => {
                warn!(error = %message, "engine transport error");
            },
            TransportEvent::Closed => {
                shared.state = ConnectionState::Disconnected;
                shared.link = None;
                info!("engine connection closed");
                self.publish(ConnectionEvent::Disconnected);
                self.schedule_reconnect_locked(&mut shared);
            },
        }
        true
    }

    fn on_frame(&self, bytes: &[u8]) {
        match MessageSend::from_slice(bytes) {
            Ok(envelope) => self.publish(ConnectionEvent::Frame(Box::new(envelope))),
            Err(e) => warn!(error = %e, len = bytes.len(), "dropping malformed engine frame"),
        }
    }

    fn schedule_reconnect_locked(&self, shared: &mut Shared) {
        let Some(policy) = shared.config.as_ref().map(|c| c.reconnect.clone()) else {
            return;
        };
        if !policy.enabled {
            debug!("reconnect disabled");
            return;
        }
        if policy.exhausted(shared.attempts) {
            error!(
                attempts = shared.attempts,
                max_attempts = policy.max_attempts,
                "giving up on engine connection"
            );
            self.publish(ConnectionEvent::GaveUp {
                attempts: shared.attempts,
            });
            return;
        }
        if shared.timer.is_some() {
            return;
        }

        shared.next_timer_id += 1;
        let id = shared.next_timer_id;
        let cancel = CancellationToken::new();
        shared.timer = Some(TimerHandle {
            id,
            cancel: cancel.clone(),
        });
        info!(
            delay_ms = policy.interval_ms,
            attempt = shared.attempts + 1,
            "reconnecting after delay"
        );

        let this = self.clone();
        let delay = policy.interval();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {},
                _ = tokio::time::sleep(delay) => this.fire_timer(id),
            }
        });
    }

    fn fire_timer(&self, id: u64) {
        let mut shared = self.lock();
        if shared.timer.as_ref().map(|t| t.id) != Some(id) {
            return;
        }
        shared.timer = None;
        if shared.state != ConnectionState::Disconnected {
            return;
        }
        shared.attempts += 1;
        if let Err(e) = self.open_locked(&mut shared) {
            debug!(error = %e, attempt = shared.attempts, "reconnect attempt not started");
        }
    }

    /// Cancel any pending reconnect and close the current link.
    pub fn disconnect(&self) {
        let mut shared = self.lock();
        self.disconnect_locked(&mut shared);
    }

    fn disconnect_locked(&self, shared: &mut Shared) {
        if let Some(timer) = shared.timer.take() {
            timer.cancel.cancel();
        }
        if let Some(link) = shared.link.take() {
            link.cancel.cancel();
        }
        shared.generation += 1;
        shared.attempts = 0;
        let was = std::mem::replace(&mut shared.state, ConnectionState::Disconnected);
        if was != ConnectionState::Disconnected {
            info!("disconnected from engine");
            self.publish(ConnectionEvent::Disconnected);
        }
    }

    /// Apply new parameters. Reconnects only when the derived socket URL
    /// changed; a new reconnect policy always takes effect. Returns whether
    /// a reconnect happened.
    pub fn reconfigure(&self, config: ConnectionConfig) -> Result<bool> {
        let url = config.endpoint()?;
        let mut shared = self.lock();
        let changed = match shared.config.as_ref() {
            Some(old) => old.endpoint().ok().as_ref() != Some(&url),
            None => true,
        };
        shared.config = Some(config);
        if !changed {
            debug!("engine parameters unchanged");
            return Ok(false);
        }
        info!(url = %display_url(&url), "engine parameters changed, reconnecting");
        self.disconnect_locked(&mut shared);
        self.open_locked(&mut shared)?;
        Ok(true)
    }

    /// Write a frame; silently dropped unless connected.
    pub fn send(&self, frame: Vec<u8>) {
        let shared = self.lock();
        match (&shared.state, &shared.link) {
            (ConnectionState::Connected, Some(link)) => {
                let _ = link.outgoing.send(frame);
            },
            _ => trace!(state = ?shared.state, "dropping frame, not connected"),
        }
    }

    pub fn status(&self) -> ConnectionState {
        self.lock().state
    }

    /// Reconnect attempts since the last successful open.
    pub fn attempts(&self) -> u32 {
        self.lock().attempts
    }
}

impl Upstream for ConnectionManager {
    fn send(&self, frame: Vec<u8>) {
        ConnectionManager::send(self, frame);
    }

    fn status(&self) -> ConnectionState {
        ConnectionManager::status(self)
    }
}
