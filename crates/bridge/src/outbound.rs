use std::sync::Arc;

use {
    corelink_codec::{RemoteLog, decode_content, remote_log},
    corelink_connection::ConnectionEvent,
    corelink_platform::{PlatformActions, Segment},
    corelink_protocol::{MessageSend, target_types},
    tokio::sync::mpsc,
    tracing::{debug, error, warn},
};

/// What to do with one engine envelope.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Private {
        user_id: String,
        message: Vec<Segment>,
    },
    Group {
        group_id: String,
        message: Vec<Segment>,
    },
    /// Diagnostic envelope: log it, send nothing.
    Log(RemoteLog),
    /// Not deliverable; the reason is logged.
    Drop(&'static str),
}

/// Decide how an envelope is delivered. Pure.
pub fn plan(envelope: &MessageSend) -> Dispatch {
    let items = envelope.items();
    if items.is_empty() {
        return Dispatch::Drop("empty content");
    }
    if let Some(log) = remote_log(items) {
        return Dispatch::Log(log);
    }
    let Some(target_id) = envelope.target_id.as_deref().filter(|id| !id.is_empty()) else {
        return Dispatch::Drop("missing target_id");
    };
    let Some(target_type) = envelope.target_type.as_deref() else {
        return Dispatch::Drop("missing target_type");
    };

    let message = decode_content(items);
    if message.is_empty() {
        return Dispatch::Drop("nothing deliverable after decoding");
    }

    if target_type == target_types::DIRECT {
        Dispatch::Private {
            user_id: target_id.to_string(),
            message,
        }
    } else {
        Dispatch::Group {
            group_id: target_id.to_string(),
            message,
        }
    }
}

/// Engine envelopes → platform sends.
pub struct OutboundBridge {
    actions: Arc<dyn PlatformActions>,
}

impl OutboundBridge {
    pub fn new(actions: Arc<dyn PlatformActions>) -> Self {
        Self { actions }
    }

    /// Deliver one envelope. Failures are logged, never retried.
    pub async fn deliver(&self, envelope: &MessageSend) {
        let msg_id = envelope.msg_id.as_str();
        let result = match plan(envelope) {
            Dispatch::Log(log) => {
                log.emit();
                return;
            },
            Dispatch::Drop(reason) => {
                warn!(msg_id, reason, "dropping engine message");
                return;
            },
            Dispatch::Private { user_id, message } => {
                debug!(msg_id, user_id = %user_id, segments = message.len(), "sending private message");
                self.actions.send_private_message(&user_id, message).await
            },
            Dispatch::Group { group_id, message } => {
                debug!(msg_id, group_id = %group_id, segments = message.len(), "sending group message");
                self.actions.send_group_message(&group_id, message).await
            },
        };
        if let Err(e) = result {
            error!(msg_id, error = %e, "platform delivery failed");
        }
    }

    /// Consume connection events until the channel closes, delivering each
    /// frame in its own task.
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<ConnectionEvent>) {
        while let Some(event) = events.recv().await {
            match event {
                ConnectionEvent::Frame(envelope) => {
                    let bridge = Arc::clone(&self);
                    tokio::spawn(async move { bridge.deliver(&envelope).await });
                },
                ConnectionEvent::Connected => debug!("engine link up"),
                ConnectionEvent::Disconnected => debug!("engine link down"),
                ConnectionEvent::GaveUp { attempts } => {
                    warn!(attempts, "engine unreachable, outbound delivery stopped");
                },
            }
        }
        debug!("engine event stream ended");
    }
}
