use std::sync::Arc;

use {
    corelink_codec::{encode_message, quoted_images, reply_target},
    corelink_config::BridgeConfig,
    corelink_connection::{ConnectionState, Upstream},
    corelink_platform::{MessageEvent, PlatformActions, Role},
    corelink_protocol::{BOT_ID, MessageReceive, UserType, permission},
    tokio::sync::mpsc,
    tracing::{debug, error, warn},
};

/// Engine permission level for a platform role.
pub fn permission_level(role: Role) -> i64 {
    match role {
        Role::Owner => permission::OWNER,
        Role::Admin => permission::ADMIN,
        Role::Member => permission::MEMBER,
    }
}

/// Platform message events → engine envelopes.
pub struct InboundBridge {
    upstream: Arc<dyn Upstream>,
    actions: Arc<dyn PlatformActions>,
    config: BridgeConfig,
}

impl InboundBridge {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        actions: Arc<dyn PlatformActions>,
        config: BridgeConfig,
    ) -> Self {
        Self {
            upstream,
            actions,
            config,
        }
    }

    /// Translate one event and hand it to the engine connection.
    ///
    /// Dropped when the engine is not connected or nothing encodes.
    pub async fn handle(&self, event: &MessageEvent) {
        if self.upstream.status() != ConnectionState::Connected {
            debug!(msg_id = %event.message_id, "engine not connected, dropping event");
            return;
        }

        let envelope = self.build_envelope(event).await;
        if envelope.content.is_empty() {
            debug!(msg_id = %envelope.msg_id, "event has no translatable content");
            return;
        }

        match envelope.to_bytes() {
            Ok(bytes) => {
                debug!(
                    msg_id = %envelope.msg_id,
                    items = envelope.content.len(),
                    "forwarding message to engine"
                );
                self.upstream.send(bytes);
            },
            Err(e) => error!(error = %e, msg_id = %envelope.msg_id, "failed to serialize envelope"),
        }
    }

    /// Build the upstream envelope, looking up the quoted message when
    /// reply enrichment is on.
    pub async fn build_envelope(&self, event: &MessageEvent) -> MessageReceive {
        let segments = event.message.segments();
        let mut content = encode_message(segments, event.raw_text());

        if self.config.enrich_replies
            && let Some(quoted_id) = reply_target(segments)
        {
            match self.actions.get_message(&quoted_id).await {
                Ok(record) => content.extend(quoted_images(&record)),
                Err(e) => warn!(error = %e, quoted_id = %quoted_id, "quoted message lookup failed"),
            }
        }

        let (user_type, group_id) = if event.is_group() {
            (
                UserType::Group,
                event.group_id.as_ref().map(ToString::to_string),
            )
        } else {
            (UserType::Direct, None)
        };

        MessageReceive {
            bot_id: BOT_ID.to_string(),
            bot_self_id: event.self_id.to_string(),
            msg_id: event.message_id.to_string(),
            user_type,
            group_id,
            user_id: event.user_id.to_string(),
            sender: event.sender.attributes.clone(),
            user_pm: permission_level(event.sender.role()),
            content,
        }
    }

    /// Handle events until the channel closes, each in its own task.
    pub async fn run(self: Arc<Self>, mut events: mpsc::UnboundedReceiver<MessageEvent>) {
        while let Some(event) = events.recv().await {
            let bridge = Arc::clone(&self);
            tokio::spawn(async move { bridge.handle(&event).await });
        }
        debug!("platform event stream ended");
    }
}
